use std::{ptr::NonNull, slice};

use libc::{c_void, calloc, free};

use crate::error::{Error, Result};

/// The one contiguous byte region every block is carved from.
///
/// The buffer comes straight from the host C allocator and is zeroed on
/// reservation, so every byte is initialised before anyone can read it.
pub struct Pool {
  buffer: NonNull<u8>,
  total_size: usize,
}

impl Pool {
  /// Reserves `total_size` zeroed bytes from the host.
  pub fn reserve(total_size: usize) -> Result<Self> {
    if total_size == 0 {
      return Err(Error::InvalidArgument("pool size must be non-zero"));
    }

    let raw = unsafe { calloc(total_size, 1) } as *mut u8;

    match NonNull::new(raw) {
      Some(buffer) => Ok(Self { buffer, total_size }),
      None => {
        tracing::error!(size = total_size, "failed to reserve memory pool");
        Err(Error::Reservation { size: total_size })
      }
    }
  }

  pub fn len(&self) -> usize {
    self.total_size
  }

  pub fn as_slice(&self) -> &[u8] {
    // SAFETY: `buffer` points at `total_size` initialised bytes owned by us
    // until `drop`.
    unsafe { slice::from_raw_parts(self.buffer.as_ptr(), self.total_size) }
  }

  pub fn as_mut_slice(&mut self) -> &mut [u8] {
    // SAFETY: as above, and `&mut self` guarantees exclusive access.
    unsafe { slice::from_raw_parts_mut(self.buffer.as_ptr(), self.total_size) }
  }

  /// Copies `len` bytes from `src` to `dst`. The ranges may overlap.
  pub fn copy(
    &mut self,
    src: usize,
    dst: usize,
    len: usize,
  ) {
    self.as_mut_slice().copy_within(src..src + len, dst);
  }
}

impl Drop for Pool {
  fn drop(&mut self) {
    unsafe { free(self.buffer.as_ptr() as *mut c_void) };
  }
}
