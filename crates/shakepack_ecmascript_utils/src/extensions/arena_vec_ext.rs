use oxc::allocator::{Allocator, Vec as ArenaVec};

/// Keeps the elements `keep` accepts and returns how many were dropped. `keep` may rewrite the
/// element it inspects.
pub fn retain_in_arena<'a, T>(
  vec: &mut ArenaVec<'a, T>,
  alloc: &'a Allocator,
  mut keep: impl FnMut(&mut T) -> bool,
) -> usize {
  let capacity = vec.len();
  let old = std::mem::replace(vec, ArenaVec::with_capacity_in(capacity, alloc));
  let mut removed = 0;
  for mut item in old {
    if keep(&mut item) {
      vec.push(item);
    } else {
      removed += 1;
    }
  }
  removed
}

#[test]
fn test_retain_in_arena() {
  let alloc = Allocator::default();
  let mut vec = ArenaVec::from_iter_in([1, 2, 3, 4], &alloc);
  let removed = retain_in_arena(&mut vec, &alloc, |n| {
    *n *= 10;
    *n != 20
  });
  assert_eq!(removed, 1);
  assert_eq!(&vec[..], &[10, 30, 40]);
}
