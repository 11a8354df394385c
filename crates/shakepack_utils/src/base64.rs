use base64_simd::STANDARD;

pub fn to_standard_base64(input: impl AsRef<[u8]>) -> String {
  STANDARD.encode_to_string(input.as_ref())
}

/// `data:` url consumed by devtools for inlined source maps.
pub fn to_source_map_data_url(json: &str) -> String {
  let mut url = String::from("data:application/json;charset=utf-8;base64,");
  url.push_str(&to_standard_base64(json));
  url
}

#[test]
fn test_to_source_map_data_url() {
  assert_eq!(
    to_source_map_data_url("{}"),
    "data:application/json;charset=utf-8;base64,e30="
  );
}
