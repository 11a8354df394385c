/// Concatenates string slices into a `String` with a single allocation.
#[macro_export]
macro_rules! concat_string {
  () => { String::with_capacity(0) };
  ($($s:expr),+ $(,)?) => {{
    use std::ops::AddAssign;
    let mut len = 0;
    $(len.add_assign(AsRef::<str>::as_ref(&$s).len());)+
    let mut buf = String::with_capacity(len);
    $(buf.push_str($s.as_ref());)+
    buf
  }};
}

#[test]
fn test_concat_string() {
  let name = String::from("b");
  assert_eq!(concat_string!("a", name, "c"), "abc");
  assert_eq!(concat_string!(), "");
}
