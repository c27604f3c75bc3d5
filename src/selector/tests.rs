use super::*;
use rstest::rstest;
use serde_json::{json, Value};

fn sel(text: &str) -> Selector {
    Selector::parse(text).unwrap()
}

fn key(k: &str) -> Segment {
    Segment::Key(k.to_string())
}

fn sample() -> Value {
    json!({
        "users": [
            {"name": "ann", "age": 30},
            {"name": "bob"}
        ],
        "server": {"ports": [80, 443]},
        "tag": "x"
    })
}

// ---- Test macros ----

/// select() on the sample document → expected list of values.
macro_rules! select_test {
    ($name:ident, $selector:expr, expect: $expected:expr) => {
        #[test]
        fn $name() {
            let found = select(&sample(), &sel($selector)).unwrap();
            assert_eq!(Value::Array(found), $expected);
        }
    };
}

/// select() on the sample document → expected error.
macro_rules! select_error_test {
    ($name:ident, $selector:expr, expect: $expected:expr) => {
        #[test]
        fn $name() {
            assert_eq!(select(&sample(), &sel($selector)), Err($expected));
        }
    };
}

// ---- parse ----

#[rstest]
#[case("", vec![])]
#[case(".", vec![])]
#[case("  a  ", vec![key("a")])]
#[case(".a", vec![key("a")])]
#[case("a.b[0]", vec![key("a"), key("b"), Segment::Index(0)])]
#[case("users[-1].name", vec![key("users"), Segment::Index(-1), key("name")])]
#[case("users.*.name", vec![key("users"), Segment::Wildcard, key("name")])]
#[case("users[*]", vec![key("users"), Segment::Wildcard])]
#[case("..password", vec![Segment::Recursive("password".into())])]
#[case("a..b", vec![key("a"), Segment::Recursive("b".into())])]
#[case(r#""odd.key"['x y']"#, vec![key("odd.key"), key("x y")])]
#[case(r#"a["q\"uote"]"#, vec![key("a"), key("q\"uote")])]
#[case("items[]", vec![key("items"), Segment::Append])]
#[case("users.len()", vec![key("users"), Segment::Function(Function::Len)])]
#[case("keys()", vec![Segment::Function(Function::Keys)])]
#[case("a.*x", vec![key("a"), key("*x")])]
#[case("ports.0", vec![key("ports"), key("0")])]
fn parse_accepts(#[case] input: &str, #[case] expected: Vec<Segment>) {
    assert_eq!(sel(input).segments(), expected.as_slice());
}

#[rstest]
#[case("a.", 3, "selector ends with `.`")]
#[case("a[", 3, "unclosed `[`")]
#[case("a[1", 4, "expected `]` before end of selector")]
#[case("a[x]", 3, "unexpected `x` in brackets")]
#[case("[-]", 2, "invalid index `-`")]
#[case("a b", 2, "expected `.` or `[`, found ` `")]
#[case("\"abc", 1, "unterminated quoted key")]
#[case("nope()", 1, "unknown function `nope()`")]
#[case("len().a", 1, "`len()` must be the last segment")]
#[case("a.]", 3, "expected a key, found `]`")]
fn parse_rejects(#[case] input: &str, #[case] column: usize, #[case] message: &str) {
    let err = Selector::parse(input).unwrap_err();
    assert_eq!(err.column, column, "{err}");
    assert_eq!(err.message, message);
    assert_eq!(err.selector, input.trim());
}

#[test]
fn parse_error_display_names_selector_and_column() {
    let err = Selector::parse("a.").unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid selector `a.` at column 3: selector ends with `.`"
    );
}

#[rstest]
#[case("", ".")]
#[case("users[-1].name", "users[-1].name")]
#[case("users.*.name", "users[*].name")]
#[case("..password", "..password")]
#[case(r#""odd.key"['x y']"#, r#""odd.key"."x y""#)]
#[case("a.len()", "a.len()")]
#[case("items[]", "items[]")]
fn display_renders_reparseable_text(#[case] input: &str, #[case] shown: &str) {
    let selector = sel(input);
    assert_eq!(selector.to_string(), shown);
    assert_eq!(sel(shown), selector);
}

#[test]
fn from_str_matches_parse() {
    let parsed: Selector = "a.b".parse().unwrap();
    assert_eq!(parsed, sel("a.b"));
    assert!(Selector::root().is_root());
}

// ---- select ----

select_test!(select_root,              "",                    expect: json!([sample()]));
select_test!(select_nested_key,        "users[0].name",       expect: json!(["ann"]));
select_test!(select_negative_index,    "users[-1].name",      expect: json!(["bob"]));
select_test!(select_numeric_key,       "users.1.name",        expect: json!(["bob"]));
select_test!(select_wildcard,          "users.*.name",        expect: json!(["ann", "bob"]));
select_test!(select_wildcard_skips,    "users.*.age",         expect: json!([30]));
select_test!(select_object_wildcard,   "server.*",            expect: json!([[80, 443]]));
select_test!(select_recursive,         "..name",              expect: json!(["ann", "bob"]));
select_test!(select_len_array,         "server.ports.len()",  expect: json!([2]));
select_test!(select_len_per_node,      "users.*.name.len()",  expect: json!([3, 3]));
select_test!(select_keys_object,       "server.keys()",       expect: json!([["ports"]]));
select_test!(select_keys_array,        "users.keys()",        expect: json!([[0, 1]]));
select_test!(select_type,              "tag.type()",          expect: json!(["string"]));
select_test!(select_type_of_root,      "type()",              expect: json!(["object"]));

select_error_test!(select_missing_key,     "missing",     expect: SelectError::NotFound { path: "missing".into() });
select_error_test!(select_index_past_end,  "users[5]",    expect: SelectError::NotFound { path: "users[5]".into() });
select_error_test!(select_into_scalar,     "tag.x",       expect: SelectError::TypeMismatch { path: "tag.x".into(), found: "string" });
select_error_test!(select_word_on_array,   "users.first", expect: SelectError::TypeMismatch { path: "users.first".into(), found: "array" });
select_error_test!(select_append,          "users[]",     expect: SelectError::Unsupported { segment: "[]".into(), operation: "query" });
select_error_test!(select_recursive_none,  "..nothing",   expect: SelectError::NotFound { path: "..nothing".into() });
select_error_test!(select_keys_of_string,  "tag.keys()",  expect: SelectError::TypeMismatch { path: "tag.keys()".into(), found: "string" });
select_error_test!(select_wildcard_scalar, "tag.*",       expect: SelectError::NotFound { path: "tag[*]".into() });

#[test]
fn select_wildcard_on_empty_container_is_empty() {
    let doc = json!({"a": [], "b": {}});
    assert_eq!(select(&doc, &sel("a.*")), Ok(vec![]));
    assert_eq!(select(&doc, &sel("b[*].name")), Ok(vec![]));
}

#[test]
fn select_on_null_document_is_not_found() {
    assert_eq!(
        select(&Value::Null, &sel("a")),
        Err(SelectError::NotFound { path: "a".into() })
    );
}

// ---- put ----

#[rstest]
#[case(json!(null), "a.b", json!(1), json!({"a": {"b": 1}}))]
#[case(json!(null), "list[0]", json!("x"), json!({"list": ["x"]}))]
#[case(json!({"list": [1]}), "list[]", json!(2), json!({"list": [1, 2]}))]
#[case(json!({"list": [1]}), "list[1]", json!(2), json!({"list": [1, 2]}))]
#[case(json!({"list": [1, 2]}), "list[-1]", json!(9), json!({"list": [1, 9]}))]
#[case(json!({"list": [1, 2]}), "list.0", json!(9), json!({"list": [9, 2]}))]
#[case(json!({"a": 1}), "", json!([true]), json!([true]))]
#[case(
    json!({"users": [{"n": 1}, {"n": 2}]}),
    "users.*.active",
    json!(true),
    json!({"users": [{"n": 1, "active": true}, {"n": 2, "active": true}]})
)]
fn put_sets_value(
    #[case] mut doc: Value,
    #[case] selector: &str,
    #[case] value: Value,
    #[case] expected: Value,
) {
    put(&mut doc, &sel(selector), value).unwrap();
    assert_eq!(doc, expected);
}

#[test]
fn put_keeps_key_order() {
    let mut doc = json!({"a": 1, "b": 2});
    put(&mut doc, &sel("a"), json!(3)).unwrap();
    put(&mut doc, &sel("c"), json!(4)).unwrap();
    assert_eq!(doc.to_string(), r#"{"a":3,"b":2,"c":4}"#);
}

#[rstest]
#[case(json!({"list": [1]}), "list[5]", SelectError::IndexOutOfRange { path: "list[5]".into(), index: 5, len: 1 })]
#[case(json!({"list": [1]}), "list[-3]", SelectError::IndexOutOfRange { path: "list[-3]".into(), index: -3, len: 1 })]
#[case(json!({"a": "s"}), "a.b", SelectError::TypeMismatch { path: "a.b".into(), found: "string" })]
#[case(json!({"a": {}}), "a[0]", SelectError::TypeMismatch { path: "a[0]".into(), found: "object" })]
#[case(json!({}), "..x", SelectError::Unsupported { segment: "..x".into(), operation: "put" })]
#[case(json!({}), "len()", SelectError::Unsupported { segment: "len()".into(), operation: "put" })]
#[case(json!({"items": [1, 2]}), "items.18446744073709551615", SelectError::IndexOutOfRange { path: "items.18446744073709551615".into(), index: 18446744073709551615, len: 2 })]
#[case(json!({"a": 1}), "x[5]", SelectError::IndexOutOfRange { path: "x[5]".into(), index: 5, len: 0 })]
#[case(json!({"a": null}), "a.b.c[2]", SelectError::IndexOutOfRange { path: "a.b.c[2]".into(), index: 2, len: 0 })]
#[case(json!({"u": [{"n": 1}, "s"]}), "u.*.n", SelectError::TypeMismatch { path: "u[*].n".into(), found: "string" })]
fn put_rejects(#[case] mut doc: Value, #[case] selector: &str, #[case] expected: SelectError) {
    let before = doc.clone();
    assert_eq!(put(&mut doc, &sel(selector), json!(1)), Err(expected));
    assert_eq!(doc, before);
}

// ---- delete ----

#[rstest]
#[case(json!({"a": 1, "b": 2}), "a", json!({"b": 2}))]
#[case(json!({"list": [1, 2, 3]}), "list[-1]", json!({"list": [1, 2]}))]
#[case(json!({"list": [1, 2, 3]}), "list.0", json!({"list": [2, 3]}))]
#[case(json!({"list": [1, 2, 3]}), "list[*]", json!({"list": []}))]
#[case(json!({"a": {"b": 1, "c": 2}}), "a.*", json!({"a": {}}))]
#[case(json!({"a": 1}), "", json!(null))]
#[case(
    json!({"users": [{"name": "ann", "age": 30}, {"name": "bob"}]}),
    "users.*.age",
    json!({"users": [{"name": "ann"}, {"name": "bob"}]})
)]
#[case(
    json!({"users": [{"name": "a", "id": 1}, "x", [3]]}),
    "users.*.name",
    json!({"users": [{"id": 1}, "x", [3]]})
)]
#[case(
    json!({"a": [{"b": {"c": 1}}, {"b": 2}]}),
    "a[*].b.c",
    json!({"a": [{"b": {}}, {"b": 2}]})
)]
fn delete_removes_value(#[case] mut doc: Value, #[case] selector: &str, #[case] expected: Value) {
    delete(&mut doc, &sel(selector)).unwrap();
    assert_eq!(doc, expected);
}

#[test]
fn delete_keeps_remaining_key_order() {
    let mut doc = json!({"a": 1, "b": 2, "c": 3});
    delete(&mut doc, &sel("b")).unwrap();
    assert_eq!(doc.to_string(), r#"{"a":1,"c":3}"#);
}

#[rstest]
#[case(json!({"a": 1}), "missing", SelectError::NotFound { path: "missing".into() })]
#[case(json!({"list": [1]}), "list[4]", SelectError::NotFound { path: "list[4]".into() })]
#[case(json!({"a": 1}), "a.b", SelectError::TypeMismatch { path: "a.b".into(), found: "number" })]
#[case(json!({"a": 1}), "..a", SelectError::Unsupported { segment: "..a".into(), operation: "delete" })]
#[case(json!({"a": []}), "a[]", SelectError::Unsupported { segment: "[]".into(), operation: "delete" })]
fn delete_rejects(#[case] mut doc: Value, #[case] selector: &str, #[case] expected: SelectError) {
    let before = doc.clone();
    assert_eq!(delete(&mut doc, &sel(selector)), Err(expected));
    assert_eq!(doc, before);
}
