use layer_tl_parser::ParseOptions;
use layer_tl_schema::{diff_schemas, TlEntry, TlFullSchema};

fn schema(src: &str) -> TlFullSchema {
    TlFullSchema::from_tl(src, ParseOptions::default()).unwrap()
}

fn names(entries: &[TlEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

const OLD: &str = "
peerUser#00000001 user_id:long = Peer;
peerChat#00000002 chat_id:long = Peer;
photoEmpty#00000003 = Photo;
---functions---
help.getConfig#00000010 = Peer;
";

const NEW: &str = "
peerUser#00000001 user_id:long = Peer;
peerChannel#00000004 channel_id:long = Peer;
document#00000005 id:long = Document;
---functions---
help.getConfig#00000011 = Peer;
help.getNearestDc#00000012 = Peer;
";

#[test]
fn identical_schemas_have_empty_diff() {
    let diff = diff_schemas(&schema(OLD), &schema(OLD));
    assert!(diff.is_empty());
}

#[test]
fn reports_added_removed_and_modified() {
    let diff = diff_schemas(&schema(OLD), &schema(NEW));

    assert_eq!(names(&diff.classes.added), ["peerChannel", "document"]);
    assert_eq!(names(&diff.classes.removed), ["peerChat", "photoEmpty"]);
    assert!(diff.classes.modified.is_empty());

    assert_eq!(names(&diff.methods.added), ["help.getNearestDc"]);
    assert_eq!(diff.methods.modified.len(), 1);
    let id = diff.methods.modified[0].id.as_ref().unwrap();
    assert_eq!((id.old, id.new), (0x10, 0x11));

    assert_eq!(diff.unions.added.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(), ["Document"]);
    assert_eq!(diff.unions.removed.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(), ["Photo"]);
    assert_eq!(diff.unions.modified.len(), 1);
    assert_eq!(diff.unions.modified[0].name, "Peer");
    assert_eq!(diff.unions.modified[0].added, ["peerChannel"]);
    assert_eq!(diff.unions.modified[0].removed, ["peerChat"]);
}

#[test]
fn parent_union_change_is_a_modification() {
    let diff = diff_schemas(&schema("a#00000001 = A;"), &schema("a#00000001 = B;"));
    assert_eq!(diff.classes.modified.len(), 1);
    let ty = diff.classes.modified[0].ty.as_ref().unwrap();
    assert_eq!((ty.old.to_string(), ty.new.to_string()), ("A".to_owned(), "B".to_owned()));
}

#[test]
fn diff_serializes_to_json() {
    let diff = diff_schemas(&schema(OLD), &schema(NEW));
    let value = serde_json::to_value(&diff).unwrap();
    assert_eq!(value["methods"]["modified"][0]["id"]["new"], 0x11);
    assert!(value["methods"]["modified"][0].get("arguments").is_none());
}
