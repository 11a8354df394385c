pub fn sanitize_file_name(str: &str) -> String {
  let mut sanitized = String::with_capacity(str.len());
  for char in str.chars() {
    if char.is_ascii_alphanumeric() || matches!(char, '-' | '_') {
      sanitized.push(char);
    } else {
      sanitized.push('_');
    }
  }
  sanitized
}

/// Turns a module specifier into a readable binding name, e.g. `./foo-bar.js` into `_fooBar`.
pub fn specifier_to_binding_name(specifier: &str) -> String {
  let stem = specifier
    .rsplit('/')
    .find(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
    .unwrap_or("module");
  let stem = stem.split('.').next().filter(|s| !s.is_empty()).unwrap_or("module");

  let mut name = String::with_capacity(stem.len() + 1);
  name.push('_');
  let mut upper_next = false;
  for char in stem.chars() {
    if char.is_ascii_alphanumeric() || char == '_' || char == '$' {
      if upper_next {
        name.push(char.to_ascii_uppercase());
      } else {
        name.push(char);
      }
      upper_next = false;
    } else {
      upper_next = name.len() > 1;
    }
  }
  name
}

#[test]
fn test_sanitize_file_name() {
  assert_eq!(sanitize_file_name("\0+a=Z_0-"), "__a_Z_0-");
}

#[test]
fn test_specifier_to_binding_name() {
  assert_eq!(specifier_to_binding_name("./foo-bar.js"), "_fooBar");
  assert_eq!(specifier_to_binding_name("react"), "_react");
  assert_eq!(specifier_to_binding_name("@scope/pkg/"), "_pkg");
  assert_eq!(specifier_to_binding_name(".."), "_module");
}
