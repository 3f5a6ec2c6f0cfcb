//! Error type shared by the pool, the registry, the manager and the list.

use thiserror::Error;

use crate::block::Addr;

/// Everything that can go wrong while talking to a [`crate::MemoryManager`].
///
/// None of these leave the block chain in a modified state: an operation
/// either succeeds completely or reports one of the variants below.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// No free block is large enough for the request.
  #[error("pool exhausted: no free block of {requested} bytes")]
  Exhausted {
    /// Bytes asked for.
    requested: usize,
  },

  /// Splitting a block needed a new descriptor and none could be stored.
  #[error("block metadata exhausted while splitting")]
  MetadataExhausted,

  /// The address does not start any block the registry knows about.
  #[error("untracked pointer {0}")]
  UntrackedPointer(Addr),

  /// A caller-supplied argument was missing or out of range.
  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),

  /// A list node used as a position was not found walking from the head.
  #[error("target node {0} not found in list")]
  NodeNotFound(Addr),

  /// The host could not provide the pool buffer.
  #[error("failed to reserve a pool of {size} bytes")]
  Reservation {
    /// Bytes asked of the host allocator.
    size: usize,
  },

  /// The manager has no pool; call `init` first.
  #[error("memory manager is not initialized")]
  Uninitialized,

  /// `init` was called on a manager that already owns a pool.
  #[error("memory manager is already initialized")]
  AlreadyInitialized,
}

/// Result of every fallible pool and list operation.
pub type Result<T> = std::result::Result<T, Error>;
