use conference_dashboard::coerce::{
    bool_str, display_string, file_label, flatten_nested, normalize_keywords, parse_blob,
};
use conference_dashboard::columns::ORGANIZER_FIELDS;
use serde_json::{json, Value};

#[test]
fn test_bool_str_is_three_way() {
    assert_eq!(bool_str(Some(&json!(true))), "Yes");
    assert_eq!(bool_str(Some(&json!(false))), "No");
    assert_eq!(bool_str(Some(&Value::Null)), "");
    assert_eq!(bool_str(None), "");
    assert_eq!(bool_str(Some(&json!("true"))), "");
    assert_eq!(bool_str(Some(&json!(1))), "");
}

#[test]
fn test_display_string() {
    assert_eq!(display_string(None), "");
    assert_eq!(display_string(Some(&Value::Null)), "");
    assert_eq!(display_string(Some(&json!("Lisbon"))), "Lisbon");
    assert_eq!(display_string(Some(&json!(42))), "42");
    assert_eq!(display_string(Some(&json!(12.5))), "12.5");
    assert_eq!(display_string(Some(&json!(150.0))), "150");
    assert_eq!(display_string(Some(&json!(false))), "false");
    assert_eq!(display_string(Some(&json!({"a": 1}))), r#"{"a":1}"#);
}

#[test]
fn test_flatten_partial_blob() {
    let blob = json!({"email": "a@b.com"});
    let flat = flatten_nested(Some(&blob), "p", &ORGANIZER_FIELDS);
    let expected: Vec<(String, String)> = [
        ("p_email", "a@b.com"),
        ("p_country", ""),
        ("p_lastName", ""),
        ("p_firstName", ""),
        ("p_affiliation", ""),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(flat, expected);
}

#[test]
fn test_flatten_json_string_blob() {
    let blob = json!(r#"{"email":"x@y.org","country":"PT","lastName":"Silva","firstName":"Ana","affiliation":"ULisboa"}"#);
    let flat = flatten_nested(Some(&blob), "organizer_primary", &ORGANIZER_FIELDS);
    assert_eq!(flat[0], ("organizer_primary_email".to_string(), "x@y.org".to_string()));
    assert_eq!(flat[2], ("organizer_primary_lastName".to_string(), "Silva".to_string()));
    assert_eq!(flat[4], ("organizer_primary_affiliation".to_string(), "ULisboa".to_string()));
}

#[test]
fn test_flatten_malformed_blob_is_all_empty() {
    for raw in [json!("{not json"), json!(""), json!("   "), json!("[1,2]"), json!(7), Value::Null] {
        let flat = flatten_nested(Some(&raw), "p", &ORGANIZER_FIELDS);
        assert_eq!(flat.len(), ORGANIZER_FIELDS.len());
        assert!(flat.iter().all(|(_, v)| v.is_empty()), "input {raw} leaked a value");
    }
    let flat = flatten_nested(None, "p", &ORGANIZER_FIELDS);
    assert_eq!(flat.len(), 5);
    assert!(flat.iter().all(|(_, v)| v.is_empty()));
}

#[test]
fn test_parse_blob_accepts_objects_only() {
    assert!(parse_blob(Some(&json!({"email": "a"}))).is_some());
    assert!(parse_blob(Some(&json!(r#"  {"email": "a"}  "#))).is_some());
    assert!(parse_blob(Some(&json!("[]"))).is_none());
    assert!(parse_blob(None).is_none());
}

#[test]
fn test_keywords() {
    assert_eq!(normalize_keywords(Some(&json!(["a", "b"]))), "a, b");
    assert_eq!(normalize_keywords(Some(&json!(r#"["a","b"]"#))), "a, b");
    assert_eq!(normalize_keywords(Some(&json!("[oops"))), "[oops");
    assert_eq!(normalize_keywords(Some(&json!("plain text"))), "plain text");
    assert_eq!(normalize_keywords(None), "");
    assert_eq!(normalize_keywords(Some(&Value::Null)), "");
}

#[test]
fn test_keywords_edge_cases() {
    // leading whitespace before the bracket still decodes
    assert_eq!(normalize_keywords(Some(&json!(r#"  ["x", "y"]"#))), "x, y");
    // object-shaped JSON is not a list and passes through verbatim
    assert_eq!(normalize_keywords(Some(&json!(r#"{"a":1}"#))), r#"{"a":1}"#);
    assert_eq!(normalize_keywords(Some(&json!("a, [b]"))), "a, [b]");
    assert_eq!(normalize_keywords(Some(&json!([1, null, "z"]))), "1, , z");
    assert_eq!(normalize_keywords(Some(&json!(3))), "3");
}

#[test]
fn test_file_label() {
    assert_eq!(file_label("abstracts/uuid-name.pdf"), "uuid-name.pdf");
    assert_eq!(file_label(r"uploads\2024\receipt.png"), "receipt.png");
    assert_eq!(file_label("mixed/dir\\file.txt"), "file.txt");
    assert_eq!(file_label("plain.pdf"), "plain.pdf");
    assert_eq!(file_label("folder/"), "folder/");
    assert_eq!(file_label(""), "");
}
