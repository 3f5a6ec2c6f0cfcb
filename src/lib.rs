//! # poolalloc - A Fixed-Size Pool Allocator
//!
//! This crate reserves **one** contiguous buffer up front and serves
//! malloc/free/realloc-style requests out of it, tracking every region with
//! a chain of block descriptors. A singly linked list built purely on top of
//! the pool shows the allocator in use.
//!
//! ## Overview
//!
//! ```text
//!   Pool after alloc(16), alloc(32), alloc(16), free(0x0010):
//!
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                            POOL (N bytes)                        │
//!   │                                                                  │
//!   │   ┌────────┬────────────────┬────────┬─────────────────────────┐ │
//!   │   │ 16 used│    32 free     │ 16 used│         free            │ │
//!   │   └────────┴────────────────┴────────┴─────────────────────────┘ │
//!   │   ▲        ▲                                                     │
//!   │   │        └── next alloc(≤ 32) lands here (first fit)           │
//!   │   0x0000                                                         │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **First fit**: requests take the first free block that is large
//!   enough, scanning from offset 0.
//! - **Splitting**: the unused tail of that block becomes a new free block.
//! - **Coalescing**: a freed block merges with free neighbours on both
//!   sides, so the chain never holds two adjacent free blocks.
//!
//! ## Crate Structure
//!
//! ```text
//!   poolalloc
//!   ├── align      - Word alignment helpers (align!, align_up)
//!   ├── block      - Addr and Block descriptor
//!   ├── error      - Error and Result
//!   ├── pool       - The reserved byte buffer
//!   ├── registry   - Ordered block chain: first fit, split, coalesce
//!   ├── manager    - MemoryManager: init/alloc/free/resize/deinit
//!   └── list       - LinkedList with nodes stored in the pool
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use poolalloc::{MemoryManager, LinkedList};
//!
//! let mut manager = MemoryManager::with_capacity(4096).unwrap();
//!
//! let addr = manager.alloc(64).unwrap();
//! manager.bytes_mut(addr).unwrap()[0] = 0xAB;
//! manager.free(addr).unwrap();
//!
//! let mut list = LinkedList::new(&mut manager);
//! for value in [3, 7, 2] {
//!     list.insert(value).unwrap();
//! }
//! assert_eq!(list.to_string(), "[3, 7, 2]");
//!
//! list.cleanup().unwrap();
//! assert!(!manager.is_initialized());
//! ```
//!
//! ## Addresses
//!
//! Addresses are pool-relative offsets ([`Addr`]), not raw pointers. Reads
//! and writes go through [`MemoryManager::bytes`] and
//! [`MemoryManager::bytes_mut`], which only accept the start of a block that
//! is currently in use.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: the manager is neither `Send` nor `Sync`
//! - **Fixed capacity**: the pool never grows after `init`
//! - **No alignment guarantees** beyond the byte offsets callers request
//! - **Unix-style host**: the pool comes from `libc::calloc`

pub mod align;
mod block;
mod error;
pub mod list;
mod manager;
mod pool;
mod registry;

pub use block::{Addr, Block};
pub use error::{Error, Result};
pub use list::{LinkedList, NodeRef};
pub use manager::MemoryManager;
pub use registry::{Release, Usage};
