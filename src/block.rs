use std::fmt;

/// A position inside the pool, counted in bytes from its first byte.
///
/// Addresses are what [`crate::MemoryManager::alloc`] hands out. They stay
/// meaningful only while the block they start is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Addr(usize);

impl Addr {
  pub const fn new(offset: usize) -> Self {
    Self(offset)
  }

  pub const fn offset(self) -> usize {
    self.0
  }
}

impl fmt::Display for Addr {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{:#06x}", self.0)
  }
}

/// Descriptor of one contiguous region of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
  pub offset: usize,
  pub size: usize,
  pub available: bool,
}

impl Block {
  pub fn new(
    offset: usize,
    size: usize,
    available: bool,
  ) -> Self {
    Self {
      offset,
      size,
      available,
    }
  }

  pub fn addr(&self) -> Addr {
    Addr(self.offset)
  }

  /// One past the last byte covered by this block.
  pub fn end(&self) -> usize {
    self.offset + self.size
  }
}

impl fmt::Display for Block {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    let state = if self.available { "free" } else { "used" };
    write!(f, "{}+{} {}", self.addr(), self.size, state)
  }
}
