use std::collections::BTreeMap;

use layer_tl_parser::ParseOptions;
use layer_tl_schema::{
    merge_schemas, Conflict, EntryKind, LayeredSchema, MergeError, Resolution, Strict, TlFullSchema,
};

fn layered(layer: i32, src: &str) -> LayeredSchema {
    LayeredSchema::new(layer, TlFullSchema::from_tl(src, ParseOptions::default()).unwrap())
}

#[test]
fn merging_with_itself_is_idempotent() {
    let a = layered(
        5,
        "inputPeerEmpty#7f3b18ea = InputPeer;\nuser#abcdef12 flags:# id:long first_name:flags.0?string = User;",
    );
    let merged = merge_schemas(&[a.clone(), a.clone()], &mut Strict).unwrap();
    assert!(merged.conflicts.is_empty());
    assert_eq!(merged.layer, 5);
    assert_eq!(merged.schema, a.schema);
}

#[test]
fn highest_layer_wins() {
    let old = layered(1, "user#00000001 id:int = User;\nchat#00000002 = Chat;");
    let new = layered(2, "user#00000003 id:long = User;");
    let merged = merge_schemas(&[old, new], &mut Strict).unwrap();

    assert!(merged.conflicts.is_empty());
    assert_eq!(merged.layer, 2);
    assert_eq!(merged.schema.class("user").unwrap().id, 3);
    // Only defined by the older source, still kept.
    assert_eq!(merged.schema.class("chat").unwrap().id, 2);
}

#[test]
fn comment_differences_are_not_conflicts() {
    let a = layered(3, "// first\nuser#00000001 id:int = User;");
    let b = layered(3, "user#00000001 id:int = User;");
    let merged = merge_schemas(&[b, a], &mut Strict).unwrap();
    assert!(merged.conflicts.is_empty());
    assert_eq!(merged.schema.class("user").unwrap().comment.as_deref(), Some("first"));
}

#[test]
fn strict_rejects_conflicts() {
    let a = layered(3, "user#00000001 id:int = User;");
    let b = layered(3, "user#00000002 id:int = User;");
    let err = merge_schemas(&[a, b], &mut Strict).unwrap_err();
    match err {
        MergeError::Conflict { kind, name, reason } => {
            assert_eq!(kind, EntryKind::Class);
            assert_eq!(name, "user");
            assert_eq!(reason, "id mismatch");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn conflicts_are_delegated_with_all_candidates() {
    let a = layered(3, "user#00000001 id:int = User;");
    let b = layered(3, "user#00000002 id:int = User;");
    let c = layered(1, "chat#00000003 = Chat;");

    let mut seen = Vec::new();
    let mut pick_last = |conflict: &Conflict<'_>| {
        seen.push((conflict.name.to_owned(), conflict.candidates.len()));
        assert!(conflict.candidates[2].entry.is_none());
        conflict.top_candidates().last().cloned().map(Resolution::Keep)
    };
    let merged = merge_schemas(&[a, b, c], &mut pick_last).unwrap();

    assert_eq!(seen, [("user".to_owned(), 3)]);
    assert_eq!(merged.conflicts, ["user"]);
    assert_eq!(merged.schema.class("user").unwrap().id, 2);
}

#[test]
fn resolver_can_drop_entries() {
    let a = layered(3, "user#00000001 id:int = User;\nchat#00000003 = Chat;");
    let b = layered(3, "user#00000001 id:long = User;\nchat#00000003 = Chat;");
    let merged = merge_schemas(&[a, b], &mut |_: &Conflict<'_>| Some(Resolution::Drop)).unwrap();

    assert!(merged.schema.class("user").is_none());
    assert!(merged.schema.union("User").is_none());
    assert_eq!(merged.schema.union("Chat").unwrap().classes, ["chat"]);
    assert_eq!(merged.conflicts, ["user"]);
}

#[test]
fn unions_are_recomputed() {
    let a = layered(1, "peerUser#00000001 = Peer;");
    let b = layered(2, "peerChat#00000002 = Peer;");
    let merged = merge_schemas(&[a, b], &mut Strict).unwrap();
    assert_eq!(merged.schema.union("Peer").unwrap().classes, ["peerUser", "peerChat"]);
}

#[test]
fn layer_marker_is_read_from_text() {
    let s = LayeredSchema::from_tl("// LAYER 181\na#00000001 = A;", ParseOptions::default()).unwrap();
    assert_eq!(s.layer, 181);
}

fn with_union_comment(layer: i32, comment: &str) -> LayeredSchema {
    let entries = layered(layer, "user#00000001 id:int = User;").schema.into_entries();
    let comments = BTreeMap::from([("User".to_owned(), comment.to_owned())]);
    LayeredSchema::new(layer, TlFullSchema::from_parts(entries, &comments).unwrap())
}

#[test]
fn union_comment_comes_from_newest_layer() {
    let sources = [
        with_union_comment(1, "old"),
        with_union_comment(2, "new"),
        with_union_comment(2, "also new"),
    ];
    let merged = merge_schemas(&sources, &mut Strict).unwrap();
    assert_eq!(merged.schema.union("User").unwrap().comment.as_deref(), Some("new"));

    // An older comment still fills in when the newer sources have none
    let sources = [with_union_comment(1, "old"), layered(2, "user#00000001 id:int = User;")];
    let merged = merge_schemas(&sources, &mut Strict).unwrap();
    assert_eq!(merged.schema.union("User").unwrap().comment.as_deref(), Some("old"));
}
