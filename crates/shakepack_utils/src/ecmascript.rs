use oxc::syntax::identifier;

use crate::concat_string;

pub fn is_validate_identifier_name(name: &str) -> bool {
  identifier::is_identifier_name(name)
}

pub fn property_access_str(obj: &str, prop: &str) -> String {
  if is_validate_identifier_name(prop) {
    concat_string!(obj, ".", prop)
  } else {
    concat_string!(obj, "[", to_js_string_literal(prop), "]")
  }
}

/// JSON string escaping, plus the two line terminators JSON allows but JS string literals don't.
pub fn to_js_string_literal(value: &str) -> String {
  let json = serde_json::to_string(value).unwrap_or_else(|_| String::from("\"\""));
  json.replace('\u{2028}', "\\u2028").replace('\u{2029}', "\\u2029")
}

pub fn to_module_import_export_name(name: &str) -> String {
  if is_validate_identifier_name(name) { name.into() } else { to_js_string_literal(name) }
}

#[test]
fn test_is_validate_identifier_name() {
  assert!(is_validate_identifier_name("foo"));
  assert!(!is_validate_identifier_name("1aaaa"));
  assert!(!is_validate_identifier_name("😈"));
}

#[test]
fn test_property_access_str() {
  assert_eq!(property_access_str("_a", "foo"), "_a.foo");
  assert_eq!(property_access_str("_a", "foo-bar"), "_a[\"foo-bar\"]");
}
