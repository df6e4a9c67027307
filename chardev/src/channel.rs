//! Fixed-capacity byte store behind a device node.
//!
//! The channel owns the storage and the valid extent; cursors belong to
//! sessions and are passed in by the caller. Every method expects the
//! device lock to be held.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::{ActivationError, DevError};
use crate::uaccess::{UserSink, UserSource};

/// Zero-initialised storage plus the number of bytes written into it.
///
/// Incoming bytes are copied into a staging area first and only committed
/// once the whole copy succeeded, so a faulting caller leaves storage
/// untouched.
pub struct BufferedChannel {
    storage: Box<[u8]>,
    staging: Box<[u8]>,
    extent: usize,
}

fn zeroed(capacity: usize) -> Result<Box<[u8]>, ActivationError> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(capacity)
        .map_err(|_| ActivationError::OutOfMemory)?;
    bytes.resize(capacity, 0);
    Ok(bytes.into_boxed_slice())
}

impl BufferedChannel {
    /// Allocate a channel of `capacity` bytes.
    pub fn new(capacity: usize) -> Result<Self, ActivationError> {
        if capacity == 0 {
            return Err(ActivationError::InvalidConfig);
        }

        Ok(Self {
            storage: zeroed(capacity)?,
            staging: zeroed(capacity)?,
            extent: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Bytes written since the last reset.
    pub fn extent(&self) -> usize {
        self.extent
    }

    /// The valid bytes, `[0, extent)`.
    pub fn contents(&self) -> &[u8] {
        &self.storage[..self.extent]
    }

    /// Copy up to `buf.len()` valid bytes starting at `*pos` and advance it.
    ///
    /// Returns 0 at or past the extent.
    pub fn read_at<S: UserSink + ?Sized>(
        &self,
        pos: &mut usize,
        buf: &mut S,
    ) -> Result<usize, DevError> {
        if *pos >= self.extent {
            return Ok(0);
        }

        let count = buf.len().min(self.extent - *pos);
        buf.copy_to_user(&self.storage[*pos..*pos + count])?;

        *pos += count;
        Ok(count)
    }

    /// Copy `src` into storage at `*pos`, clipped to capacity, and advance it.
    ///
    /// Fails with [`DevError::OutOfSpace`] only when `*pos` is already at
    /// capacity; a clipped write returns the shorter count.
    pub fn write_at<S: UserSource + ?Sized>(
        &mut self,
        pos: &mut usize,
        src: &S,
    ) -> Result<usize, DevError> {
        let capacity = self.capacity();
        if *pos >= capacity {
            return Err(DevError::OutOfSpace);
        }

        let count = src.len().min(capacity - *pos);
        self.stage_exact(src, count)?;
        self.storage[*pos..*pos + count].copy_from_slice(&self.staging[..count]);

        *pos += count;
        self.extent = self.extent.max(*pos);
        Ok(count)
    }

    /// Replace the whole content with `src`, clipped to capacity.
    ///
    /// Returns the stored length, which becomes the new extent.
    pub fn replace<S: UserSource + ?Sized>(&mut self, src: &S) -> Result<usize, DevError> {
        let count = self.stage(src)?.len();
        Ok(self.commit_staged(count))
    }

    /// Copy `src`, clipped to capacity, into the staging area only.
    ///
    /// Storage and extent are untouched until
    /// [`commit_staged`](Self::commit_staged), so the caller can inspect the
    /// bytes and still back out.
    pub fn stage<S: UserSource + ?Sized>(&mut self, src: &S) -> Result<&[u8], DevError> {
        let count = src.len().min(self.capacity());
        self.stage_exact(src, count)?;
        Ok(&self.staging[..count])
    }

    /// Make the first `count` staged bytes the whole content.
    ///
    /// Returns the stored length.
    pub fn commit_staged(&mut self, count: usize) -> usize {
        let count = count.min(self.capacity());
        self.storage[..count].copy_from_slice(&self.staging[..count]);
        self.extent = count;
        count
    }

    /// Forget the stored bytes. Storage is kept.
    pub fn reset(&mut self) {
        self.extent = 0;
    }

    fn stage_exact<S: UserSource + ?Sized>(
        &mut self,
        src: &S,
        count: usize,
    ) -> Result<(), DevError> {
        src.copy_from_user(&mut self.staging[..count])?;
        Ok(())
    }
}

impl core::fmt::Debug for BufferedChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BufferedChannel")
            .field("capacity", &self.capacity())
            .field("extent", &self.extent)
            .finish()
    }
}
