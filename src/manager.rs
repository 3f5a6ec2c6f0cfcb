use std::fmt;

use crate::{
  block::{Addr, Block},
  error::{Error, Result},
  pool::Pool,
  registry::{Registry, Release, Usage},
};

/// A live pool together with the chain that describes it.
struct Arena {
  pool: Pool,
  registry: Registry,
}

/// malloc/free/realloc over one fixed-size pool.
///
/// A manager starts out empty; [`MemoryManager::init`] reserves the pool and
/// [`MemoryManager::deinit`] gives it back. Every other operation reports
/// [`Error::Uninitialized`] in between.
///
/// ```rust
/// use poolalloc::MemoryManager;
///
/// let mut manager = MemoryManager::with_capacity(64).unwrap();
///
/// let addr = manager.alloc(8).unwrap();
/// manager.bytes_mut(addr).unwrap().copy_from_slice(b"poolside");
///
/// let addr = manager.resize(Some(addr), 16).unwrap();
/// assert_eq!(&manager.bytes(addr).unwrap()[..8], b"poolside");
///
/// manager.free(addr).unwrap();
/// manager.deinit();
/// ```
pub struct MemoryManager {
  arena: Option<Arena>,
}

impl MemoryManager {
  pub const fn new() -> Self {
    Self { arena: None }
  }

  pub fn with_capacity(size: usize) -> Result<Self> {
    let mut manager = Self::new();
    manager.init(size)?;
    Ok(manager)
  }

  /// Reserves a pool of `size` bytes, tracked as one free block.
  pub fn init(
    &mut self,
    size: usize,
  ) -> Result<()> {
    if self.arena.is_some() {
      return Err(Error::AlreadyInitialized);
    }

    let pool = Pool::reserve(size)?;
    self.arena = Some(Arena {
      pool,
      registry: Registry::new(size),
    });

    tracing::debug!(size, "memory pool initialized");
    Ok(())
  }

  /// Releases the pool and every block descriptor at once.
  ///
  /// Addresses handed out before this call are invalid afterwards.
  pub fn deinit(&mut self) {
    if let Some(arena) = self.arena.take() {
      tracing::debug!(size = arena.pool.len(), "memory pool released");
    }
  }

  pub fn is_initialized(&self) -> bool {
    self.arena.is_some()
  }

  pub fn total_size(&self) -> Result<usize> {
    Ok(self.arena()?.pool.len())
  }

  /// Carves `size` bytes out of the first free block large enough.
  pub fn alloc(
    &mut self,
    size: usize,
  ) -> Result<Addr> {
    if size == 0 {
      return Err(Error::InvalidArgument("allocation size must be non-zero"));
    }

    let registry = &mut self.arena_mut()?.registry;

    let Some(index) = registry.find_fit(size) else {
      tracing::debug!(requested = size, "no free block fits");
      return Err(Error::Exhausted { requested: size });
    };

    let addr = registry.place(index, size)?;
    tracing::debug!(%addr, size, "allocated");

    Ok(addr)
  }

  /// Returns the block starting at `addr` to the pool.
  ///
  /// Freeing a block that is already free is accepted and changes nothing;
  /// the outcome tells the two cases apart.
  pub fn free(
    &mut self,
    addr: Addr,
  ) -> Result<Release> {
    let release = self.arena_mut()?.registry.release(addr)?;

    if release == Release::Freed {
      tracing::debug!(%addr, "freed");
    }

    Ok(release)
  }

  /// Grows the block at `addr` to at least `size` bytes.
  ///
  /// `None` behaves like [`MemoryManager::alloc`]. A block that is already
  /// large enough is returned as is, it is never shrunk. Otherwise the
  /// contents move to a new block and the old one is freed; if no new block
  /// can be found the old one stays intact. An address that is not the
  /// start of an in-use block, including one already freed, is reported as
  /// [`Error::UntrackedPointer`].
  pub fn resize(
    &mut self,
    addr: Option<Addr>,
    size: usize,
  ) -> Result<Addr> {
    let Some(addr) = addr else {
      return self.alloc(size);
    };

    let old = match used_block(&self.arena()?.registry, addr) {
      Ok(old) => old,
      Err(err) => {
        tracing::warn!(%addr, "resize failed: memory not tracked");
        return Err(err);
      }
    };

    if old.size >= size {
      tracing::debug!(%addr, size, "resized in place");
      return Ok(addr);
    }

    let new_addr = self.alloc(size)?;

    let arena = self.arena_mut()?;
    arena.pool.copy(old.offset, new_addr.offset(), old.size);
    arena.registry.release(addr)?;

    tracing::debug!(from = %addr, to = %new_addr, size, "relocated");
    Ok(new_addr)
  }

  /// Contents of the in-use block starting at `addr`.
  pub fn bytes(
    &self,
    addr: Addr,
  ) -> Result<&[u8]> {
    let arena = self.arena()?;
    let block = used_block(&arena.registry, addr)?;

    Ok(&arena.pool.as_slice()[block.offset..block.end()])
  }

  pub fn bytes_mut(
    &mut self,
    addr: Addr,
  ) -> Result<&mut [u8]> {
    let arena = self.arena_mut()?;
    let block = used_block(&arena.registry, addr)?;

    Ok(&mut arena.pool.as_mut_slice()[block.offset..block.end()])
  }

  /// Descriptor of the block starting at `addr`, free or not.
  pub fn block(
    &self,
    addr: Addr,
  ) -> Result<Block> {
    self
      .arena()?
      .registry
      .lookup(addr)
      .copied()
      .ok_or(Error::UntrackedPointer(addr))
  }

  pub fn blocks(&self) -> Result<&[Block]> {
    Ok(self.arena()?.registry.blocks())
  }

  pub fn usage(&self) -> Result<Usage> {
    Ok(self.arena()?.registry.usage())
  }

  fn arena(&self) -> Result<&Arena> {
    self.arena.as_ref().ok_or(Error::Uninitialized)
  }

  fn arena_mut(&mut self) -> Result<&mut Arena> {
    self.arena.as_mut().ok_or(Error::Uninitialized)
  }
}

impl Default for MemoryManager {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for MemoryManager {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    let Some(arena) = &self.arena else {
      return write!(f, "<uninitialized>");
    };

    write!(f, "[")?;
    for (i, block) in arena.registry.blocks().iter().enumerate() {
      if i > 0 {
        write!(f, ", ")?;
      }
      write!(f, "{block}")?;
    }
    write!(f, "]")
  }
}

fn used_block(
  registry: &Registry,
  addr: Addr,
) -> Result<Block> {
  match registry.lookup(addr) {
    Some(block) if !block.available => Ok(*block),
    _ => Err(Error::UntrackedPointer(addr)),
  }
}
