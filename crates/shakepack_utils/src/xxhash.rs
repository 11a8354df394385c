use xxhash_rust::xxh3::xxh3_128;

/// Lowercase hex of the 128-bit xxh3 digest; stable across platforms.
pub fn xxhash_hex(input: &[u8]) -> String {
  format!("{:032x}", xxh3_128(input))
}

#[test]
fn test_xxhash_hex() {
  let hash = xxhash_hex(b"hello");
  assert_eq!(hash.len(), 32);
  assert_eq!(hash, xxhash_hex(b"hello"));
  assert_ne!(hash, xxhash_hex(b"hello!"));
}
