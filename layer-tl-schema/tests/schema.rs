use layer_tl_parser::ParseOptions;
use layer_tl_schema::{
    EntryKind, SchemaError, TlEntry, TlFullSchema, TlPackedSchema, TlType,
};

const SRC: &str = "
// LAYER 7
inputPeerEmpty#7f3b18ea = InputPeer;
inputPeerSelf#7da07ec9 = InputPeer;
// A user of the service
user#abcdef12 flags:# id:long first_name:flags.0?string = User;
storage.fileJpeg#7efe0e = storage.FileType;
---functions---
users.getUsers#d91a548 id:Vector<InputPeer> = Vector<User>;
help.getConfig#c4f9186b = User;
";

fn schema() -> TlFullSchema {
    TlFullSchema::from_tl(SRC, ParseOptions::default()).unwrap()
}

#[test]
fn indexes_by_id_and_name() {
    let s = schema();
    assert_eq!(s.entry_by_id(0xabcdef12).unwrap().name, "user");
    assert_eq!(s.class("storage.fileJpeg").unwrap().id, 0x7efe0e);
    assert_eq!(s.method("users.getUsers").unwrap().kind, EntryKind::Method);
    assert!(s.class("users.getUsers").is_none());
    assert!(s.entry_by_id(0xdeadbeef).is_none());
}

#[test]
fn arguments_keep_declaration_order() {
    let s = schema();
    let names: Vec<_> = s.class("user").unwrap().arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["flags", "id", "first_name"]);
    assert_eq!(s.class("user").unwrap().comment.as_deref(), Some("A user of the service"));
}

#[test]
fn union_index_includes_single_member_unions() {
    let s = schema();
    let peers: Vec<_> = s.union_members("InputPeer").map(|e| e.name.as_str()).collect();
    assert_eq!(peers, ["inputPeerEmpty", "inputPeerSelf"]);

    let users = s.union("User").unwrap();
    assert_eq!(users.classes, ["user"]);
    assert_eq!(s.union("storage.FileType").unwrap().classes, ["storage.fileJpeg"]);

    // Methods never register in unions.
    assert_eq!(s.unions().len(), 3);
}

#[test]
fn method_return_types_resolve() {
    let s = schema();
    let m = s.method("users.getUsers").unwrap();
    assert_eq!(m.ty.to_string(), "Vector<User>");
    assert!(matches!(&m.arguments[0].ty, TlType::Vector { boxed: true, .. }));
}

#[test]
fn groups_by_namespace() {
    let s = schema();
    let classes = s.namespaces(EntryKind::Class);
    let ns: Vec<_> = classes.iter().map(|(ns, _)| ns.as_str()).collect();
    assert_eq!(ns, ["", "storage"]);
    let methods = s.namespaces(EntryKind::Method);
    let ns: Vec<_> = methods.iter().map(|(ns, _)| ns.as_str()).collect();
    assert_eq!(ns, ["help", "users"]);

    let unions = s.union_namespaces();
    assert_eq!(unions[1].0, "storage");
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = TlFullSchema::from_tl("a#00000001 = A;\nb#00000001 = B;", ParseOptions::default()).unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateId { id: 1, .. }));
}

#[test]
fn duplicate_names_are_rejected() {
    let err = TlFullSchema::from_tl("a#00000001 = A;\na#00000002 = A;", ParseOptions::default()).unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateName { kind: EntryKind::Class, .. }));
}

#[test]
fn parse_errors_surface_with_line() {
    let err = TlFullSchema::from_tl("a#00000001 = A;\nbroken", ParseOptions::default()).unwrap_err();
    match err {
        SchemaError::Parse(e) => assert_eq!(e.line, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn packed_round_trip_keeps_union_comments() {
    let mut packed = TlPackedSchema::pack(&schema(), 7);
    packed.union_comments.insert("InputPeer".into(), "Peer to address".into());

    let json = packed.to_json().unwrap();
    assert!(json.contains("\"unionComments\""));
    assert!(json.contains("\"flags.0\""));

    let back = TlPackedSchema::from_json(&json).unwrap().unpack().unwrap();
    assert_eq!(back.layer, 7);
    assert_eq!(back.schema.union("InputPeer").unwrap().comment.as_deref(), Some("Peer to address"));
    assert_eq!(back.schema.entries(), schema().entries());
}

#[test]
fn packed_entry_json_shape() {
    let user: TlEntry = schema().class("user").unwrap().clone();
    let value = serde_json::to_value(&user).unwrap();
    assert_eq!(value["kind"], "class");
    assert_eq!(value["type"], "User");
    assert_eq!(value["arguments"][0]["type"], "#");
    assert_eq!(value["arguments"][2]["type"], "string");
    assert_eq!(value["arguments"][2]["predicate"], "flags.0");
}

#[test]
fn packed_predicates_are_validated() {
    let json = TlPackedSchema::pack(&schema(), 7).to_json().unwrap();
    let broken = json.replace("\"flags.0\"", "\"flags9.0\"");

    let err = TlPackedSchema::from_json(&broken).unwrap().unpack().unwrap_err();
    match err {
        SchemaError::InvalidPredicate { entry, argument, predicate, reason } => {
            assert_eq!((entry.as_str(), argument.as_str(), predicate.as_str()), ("user", "first_name", "flags9.0"));
            assert_eq!(reason, "does not name an earlier `#` argument");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn hand_built_predicates_are_validated() {
    let user = schema().class("user").unwrap().clone();

    // flags declared after the field it gates
    let mut reordered = user.clone();
    reordered.arguments.swap(0, 2);
    assert!(matches!(
        TlFullSchema::from_entries(vec![reordered]),
        Err(SchemaError::InvalidPredicate { ref argument, .. }) if argument == "first_name"
    ));

    let mut wide = user.clone();
    if let Some(p) = wide.arguments[2].predicate.as_mut() {
        p.bit = 40;
    }
    assert!(matches!(
        TlFullSchema::from_entries(vec![wide]),
        Err(SchemaError::InvalidPredicate { reason: "uses a bit above 31", .. })
    ));

    assert!(TlFullSchema::from_entries(vec![user]).is_ok());
}
