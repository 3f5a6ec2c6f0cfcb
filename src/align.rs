/// Rounds `value` up to the next multiple of `align`.
///
/// `align` must be a power of two.
#[inline(always)]
pub const fn align_up(
  value: usize,
  align: usize,
) -> usize {
  debug_assert!(align.is_power_of_two());
  (value + align - 1) & !(align - 1)
}

/// Rounds a byte count up to the machine word, or to an explicit power of two.
///
/// # Examples
///
/// ```rust
/// use poolalloc::align;
///
/// match std::mem::size_of::<usize>() {
///     8 => assert_eq!(align!(10), 16), // 64 bit machine.
///     4 => assert_eq!(align!(10), 12), // 32 bit machine.
///     _ => {},
/// };
///
/// assert_eq!(align!(17, 32), 32);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align::align_up($value, ::core::mem::size_of::<usize>())
  };
  ($value:expr, $align:expr) => {
    $crate::align::align_up($value, $align)
  };
}

#[cfg(test)]
mod tests {
  use super::align_up;
  use std::mem;

  #[test]
  fn test_word_alignment() {
    let word = mem::size_of::<usize>();

    for i in 0..8 {
      for size in (word * i + 1)..=(word * (i + 1)) {
        assert_eq!(word * (i + 1), align!(size));
      }
    }
  }

  #[test]
  fn test_explicit_alignment() {
    assert_eq!(align_up(0, 8), 0);
    assert_eq!(align_up(1, 2), 2);
    assert_eq!(align_up(9, 4), 12);
    assert_eq!(align!(33, 16), 48);
    assert_eq!(align!(64, 64), 64);
  }
}
