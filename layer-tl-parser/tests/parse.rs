use layer_tl_parser::errors::{ParamParseError, ParseErrorKind};
use layer_tl_parser::tl::{Category, ParameterType};
use layer_tl_parser::{parse_tl_file, parse_tl_schema, ParseOptions};

fn parse(src: &str) -> Vec<layer_tl_parser::tl::Definition> {
    parse_tl_file(src, ParseOptions::default())
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn parses_simple_type() {
    let defs = parse("inputPeerEmpty#7f3b18ea = InputPeer;");
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].name, "inputPeerEmpty");
    assert_eq!(defs[0].id, 0x7f3b18ea);
    assert_eq!(defs[0].ty.name, "InputPeer");
    assert_eq!(defs[0].category, Category::Types);
}

#[test]
fn parses_function_category() {
    let src = "
---functions---
help.getConfig#c4f9186b = Config;
";
    let defs = parse(src);
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].category, Category::Functions);
    assert_eq!(defs[0].name, "getConfig");
    assert_eq!(defs[0].namespace, vec!["help"]);
    assert_eq!(defs[0].full_name(), "help.getConfig");
}

#[test]
fn types_sentinel_switches_back() {
    let src = "
a#00000001 = A;
---functions---
b#00000002 = A;
---types---
c#00000003 = C;
";
    let cats: Vec<_> = parse(src).into_iter().map(|d| d.category).collect();
    assert_eq!(cats, [Category::Types, Category::Functions, Category::Types]);
}

#[test]
fn parses_flagged_parameter() {
    let defs = parse("user#3ff6ecb0 flags:# id:long username:flags.0?string = User;");
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].params.len(), 3); // flags, id, username
    assert_eq!(defs[0].params[0].ty, ParameterType::Flags);
    match &defs[0].params[2].ty {
        ParameterType::Normal { ty, flag: Some(flag) } => {
            assert_eq!(ty.name, "string");
            assert_eq!(flag.name, "flags");
            assert_eq!(flag.index, 0);
        }
        other => panic!("unexpected parameter type {other:?}"),
    }
}

#[test]
fn skips_blank_lines_comments_and_builtins() {
    let src = "
// this is a comment
boolTrue#997275b5 = Bool;
vector#1cb5c415 {t:Type} # [ t ] = Vector t;
int ? = Int;

inputPeerSelf#7da07ec9 = InputPeer;
";
    let defs = parse(src);
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].name, "inputPeerSelf");
}

#[test]
fn comment_block_attaches_to_next_definition() {
    let src = "
// Orphan comment.

// The current user.
// Always resolvable.
inputPeerSelf#7da07ec9 = InputPeer;
inputPeerEmpty#7f3b18ea = InputPeer;
";
    let defs = parse(src);
    assert_eq!(defs[0].comment.as_deref(), Some("The current user. Always resolvable."));
    assert_eq!(defs[1].comment, None);
}

#[test]
fn layer_marker_is_reported() {
    let src = "// LAYER 158\ninputPeerSelf#7da07ec9 = InputPeer;\n";
    let parsed = parse_tl_schema(src, ParseOptions::default()).unwrap();
    assert_eq!(parsed.layer, Some(158));
    assert_eq!(parsed.definitions.len(), 1);
}

#[test]
fn malformed_line_reports_line_number_and_text() {
    let src = "a#00000001 = A;\n\nb#zz = B;\n";
    let err = parse_tl_schema(src, ParseOptions::default()).unwrap_err();
    assert_eq!(err.line, 3);
    assert_eq!(err.raw, "b#zz = B;");
    assert!(matches!(err.kind, ParseErrorKind::InvalidId(_)));
}

#[test]
fn missing_semicolon_is_an_error() {
    let err = parse_tl_schema("a#00000001 = A", ParseOptions::default()).unwrap_err();
    assert_eq!(err.line, 1);
    assert_eq!(err.kind, ParseErrorKind::MissingSemicolon);
}

#[test]
fn flag_bit_out_of_range() {
    let err = parse_tl_schema("a#00000001 flags:# x:flags.32?int = A;", ParseOptions::default())
        .unwrap_err();
    assert_eq!(
        err.kind,
        ParseErrorKind::InvalidParam(ParamParseError::FlagBitOutOfRange(32))
    );
}

#[test]
fn missing_id_requires_hasher() {
    let src = "boolFalseAlias = Bool;";
    let err = parse_tl_schema(src, ParseOptions::default()).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MissingId);

    fn fixed(_: &str) -> u32 {
        0xdeadbeef
    }
    let custom = ParseOptions { id_hasher: Some(fixed) };
    let parsed = parse_tl_schema(src, custom).unwrap();
    assert_eq!(parsed.definitions[0].id, 0xdeadbeef);
}

#[test]
fn crc32_derived_id() {
    let parsed = parse_tl_schema("inputPeerSelf = InputPeer;", ParseOptions::derive_ids()).unwrap();
    assert_eq!(parsed.definitions[0].id, layer_tl_parser::crc32_id("inputPeerSelf = InputPeer"));
}

#[test]
fn generics_and_bare_vectors() {
    let src = "
msg_container#73f1f8dc messages:vector<%Message> = MessageContainer;
---functions---
invokeWithLayer#da9b0d0d {X:Type} layer:int query:!X = X;
";
    let defs = parse(src);
    match &defs[0].params[0].ty {
        ParameterType::Normal { ty, .. } => {
            assert_eq!(ty.name, "vector");
            assert!(ty.bare);
            assert!(ty.generic_arg.as_ref().unwrap().bare);
        }
        other => panic!("unexpected parameter type {other:?}"),
    }
    assert_eq!(defs[1].generics.len(), 1);
    assert_eq!(defs[1].generics[0].name, "X");
    assert!(defs[1].ty.generic_ref);
}
