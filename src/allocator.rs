//! Storage allocation for `StrideBuf`.
//!
//! Every byte block a buffer owns is obtained from, resized by and handed back to
//! an [`Allocator`]. Failures are reported as values so that a buffer can keep its
//! previous contents when growth is refused.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::error::{Result, StrideBufError};

/// Source of the byte blocks backing a `StrideBuf`.
///
/// Blocks are zero-filled on allocation and on growth.
pub trait Allocator {
    /// Allocates a zero-filled block of exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `StrideBufError::AllocationFailure` if the memory cannot be obtained.
    fn allocate(&self, len: usize) -> Result<Box<[u8]>>;

    /// Resizes `block` to `new_len` bytes, preserving the common prefix.
    ///
    /// `*block` is replaced only on success; on failure it still holds the
    /// original, untouched allocation.
    ///
    /// # Errors
    ///
    /// Returns `StrideBufError::AllocationFailure` if the memory cannot be obtained.
    fn reallocate(&self, block: &mut Box<[u8]>, new_len: usize) -> Result<()> {
        let mut fresh = self.allocate(new_len)?;
        let keep = block.len().min(new_len);
        fresh[..keep].copy_from_slice(&block[..keep]);
        let old = core::mem::replace(block, fresh);
        self.release(old);
        Ok(())
    }

    /// Gives a block back to the allocator.
    fn release(&self, block: Box<[u8]>) {
        drop(block);
    }
}

impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate(&self, len: usize) -> Result<Box<[u8]>> {
        (**self).allocate(len)
    }

    fn reallocate(&self, block: &mut Box<[u8]>, new_len: usize) -> Result<()> {
        (**self).reallocate(block, new_len)
    }

    fn release(&self, block: Box<[u8]>) {
        (**self).release(block);
    }
}

/// The global heap, with out-of-memory reported instead of aborting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessAllocator;

impl Allocator for ProcessAllocator {
    fn allocate(&self, len: usize) -> Result<Box<[u8]>> {
        let mut bytes = Vec::new();
        if bytes.try_reserve_exact(len).is_err() {
            return Err(StrideBufError::allocation(len));
        }
        bytes.resize(len, 0);
        Ok(bytes.into_boxed_slice())
    }

    fn reallocate(&self, block: &mut Box<[u8]>, new_len: usize) -> Result<()> {
        let mut bytes = core::mem::take(block).into_vec();
        if new_len > bytes.len() {
            if bytes.try_reserve_exact(new_len - bytes.len()).is_err() {
                // capacity == len here, so this does not reallocate
                *block = bytes.into_boxed_slice();
                return Err(StrideBufError::allocation(new_len));
            }
            bytes.resize(new_len, 0);
        } else {
            bytes.truncate(new_len);
        }
        *block = bytes.into_boxed_slice();
        Ok(())
    }
}

/// A byte budget layered over [`ProcessAllocator`].
///
/// Requests that would push the number of outstanding bytes over `limit` fail with
/// `AllocationFailure`. Not thread-safe; share it between buffers by reference.
#[derive(Debug)]
pub struct LimitedAllocator {
    limit: usize,
    in_use: Cell<usize>,
}

impl LimitedAllocator {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            in_use: Cell::new(0),
        }
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes currently handed out and not yet released.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.in_use.get()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.limit - self.in_use.get()
    }

    fn withdraw(&self, amount: usize, requested_bytes: usize) -> Result<()> {
        if amount > self.remaining() {
            log::debug!(
                "budget refused {amount} bytes ({} of {} in use)",
                self.in_use.get(),
                self.limit
            );
            return Err(StrideBufError::allocation(requested_bytes));
        }
        self.in_use.set(self.in_use.get() + amount);
        Ok(())
    }

    fn deposit(&self, amount: usize) {
        self.in_use.set(self.in_use.get().saturating_sub(amount));
    }
}

impl Allocator for LimitedAllocator {
    fn allocate(&self, len: usize) -> Result<Box<[u8]>> {
        self.withdraw(len, len)?;
        ProcessAllocator.allocate(len).inspect_err(|_| self.deposit(len))
    }

    fn reallocate(&self, block: &mut Box<[u8]>, new_len: usize) -> Result<()> {
        let old_len = block.len();
        if new_len > old_len {
            let extra = new_len - old_len;
            self.withdraw(extra, new_len)?;
            ProcessAllocator
                .reallocate(block, new_len)
                .inspect_err(|_| self.deposit(extra))
        } else {
            ProcessAllocator.reallocate(block, new_len)?;
            self.deposit(old_len - new_len);
            Ok(())
        }
    }

    fn release(&self, block: Box<[u8]>) {
        self.deposit(block.len());
    }
}
