//! Block bookkeeping for a pool.
//!
//! The registry keeps an ordered chain of [`Block`] descriptors that
//! partitions `[0, total_size)` with no gaps:
//!
//! ```text
//!   offset 0                                                   total_size
//!   ┌──────────┬──────────┬────────────────────┬──────────────────────┐
//!   │ 16 used  │ 16 free  │      32 used       │       64 free        │
//!   └──────────┴──────────┴────────────────────┴──────────────────────┘
//!        ▲                          ▲
//!        └── Addr(0x00)             └── Addr(0x20)
//! ```
//!
//! Allocation scans from the head and takes the first free block that is
//! large enough, splitting off the unused tail. Release marks a block free
//! and merges it with free neighbours on both sides.

use crate::{
  block::{Addr, Block},
  error::{Error, Result},
};

/// Outcome of a successful [`Registry::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
  /// The block was in use and is now free.
  Freed,
  /// The block was already free; nothing changed.
  AlreadyFree,
}

/// Summary of how a pool is carved up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
  pub total: usize,
  pub used: usize,
  pub free: usize,
  pub blocks: usize,
  pub largest_free: usize,
}

#[derive(Debug)]
pub struct Registry {
  blocks: Vec<Block>,
  total_size: usize,
}

impl Registry {
  pub fn new(total_size: usize) -> Self {
    Self {
      blocks: vec![Block::new(0, total_size, true)],
      total_size,
    }
  }

  pub fn blocks(&self) -> &[Block] {
    &self.blocks
  }

  /// Index of the first free block that can hold `size` bytes.
  pub fn find_fit(
    &self,
    size: usize,
  ) -> Option<usize> {
    self
      .blocks
      .iter()
      .position(|block| block.available && block.size >= size)
  }

  /// Marks the block at `index` as used for `size` bytes, splitting off the
  /// remainder as a new free block.
  ///
  /// Fails with [`Error::MetadataExhausted`] if the chain cannot grow to
  /// hold the remainder. Room is reserved before anything is inserted or
  /// resized, so the chain is left untouched when this returns an error.
  pub fn place(
    &mut self,
    index: usize,
    size: usize,
  ) -> Result<Addr> {
    let block = self.blocks[index];
    debug_assert!(block.available && block.size >= size && size > 0);

    if block.size > size {
      self
        .blocks
        .try_reserve(1)
        .map_err(|_| Error::MetadataExhausted)?;

      let remainder = Block::new(block.offset + size, block.size - size, true);
      self.blocks.insert(index + 1, remainder);
      self.blocks[index].size = size;
    }

    self.blocks[index].available = false;
    debug_assert!(self.is_partition());

    Ok(block.addr())
  }

  /// Position of the block starting exactly at `addr`.
  pub fn index_of(
    &self,
    addr: Addr,
  ) -> Option<usize> {
    self
      .blocks
      .binary_search_by_key(&addr.offset(), |block| block.offset)
      .ok()
  }

  pub fn lookup(
    &self,
    addr: Addr,
  ) -> Option<&Block> {
    self.index_of(addr).map(|index| &self.blocks[index])
  }

  /// Frees the block starting at `addr` and merges it with free neighbours.
  pub fn release(
    &mut self,
    addr: Addr,
  ) -> Result<Release> {
    let Some(mut index) = self.index_of(addr) else {
      tracing::warn!(%addr, "tried to free untracked memory");
      return Err(Error::UntrackedPointer(addr));
    };

    if self.blocks[index].available {
      tracing::debug!(%addr, "block already free");
      return Ok(Release::AlreadyFree);
    }

    self.blocks[index].available = true;

    while index + 1 < self.blocks.len() && self.blocks[index + 1].available {
      let next = self.blocks.remove(index + 1);
      self.blocks[index].size += next.size;
      tracing::trace!(%addr, absorbed = %next.addr(), "coalesced forward");
    }

    if index > 0 && self.blocks[index - 1].available {
      let current = self.blocks.remove(index);
      index -= 1;
      self.blocks[index].size += current.size;
      tracing::trace!(into = %self.blocks[index].addr(), %addr, "coalesced backward");
    }

    debug_assert!(self.is_partition());

    Ok(Release::Freed)
  }

  /// Whether the chain covers `[0, total_size)` exactly, in order, without
  /// empty blocks.
  pub fn is_partition(&self) -> bool {
    let mut expected = 0;

    for block in &self.blocks {
      if block.size == 0 || block.offset != expected {
        return false;
      }
      expected = block.end();
    }

    expected == self.total_size
  }

  pub fn usage(&self) -> Usage {
    self.blocks.iter().fold(
      Usage {
        total: self.total_size,
        ..Usage::default()
      },
      |mut usage, block| {
        usage.blocks += 1;
        if block.available {
          usage.free += block.size;
          usage.largest_free = usage.largest_free.max(block.size);
        } else {
          usage.used += block.size;
        }
        usage
      },
    )
  }
}
