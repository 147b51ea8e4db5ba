use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::ops::Range;

use crate::allocator::{Allocator, ProcessAllocator};
use crate::error::{Result, StrideBufError};
use crate::iter::{BufSource, Element, StrideIter};

/// Capacity of the first allocation made by a growing buffer that has none yet.
pub const DEFAULT_CAPACITY: usize = 10;

/// A growable buffer of fixed-stride, type-erased elements.
///
/// The first `len` slots hold caller-written elements. Slots in `[len, capacity)`
/// are allocated (and zero-filled when first obtained) but carry no meaning.
pub struct StrideBuf<A: Allocator = ProcessAllocator> {
    storage: Box<[u8]>,
    len: usize,
    capacity: usize,
    stride: usize,
    alloc: A,
}

impl StrideBuf {
    /// Creates an empty buffer for elements of `stride` bytes. Does not allocate.
    #[must_use]
    pub fn new(stride: usize) -> Self {
        Self::new_in(stride, ProcessAllocator)
    }

    /// Creates an empty buffer with room for `capacity` elements.
    ///
    /// # Errors
    ///
    /// Returns `StrideBufError::AllocationFailure` if the storage cannot be allocated.
    pub fn with_capacity(stride: usize, capacity: usize) -> Result<Self> {
        Self::with_capacity_in(stride, capacity, ProcessAllocator)
    }

    /// Creates a buffer holding a copy of `values`, with `stride == size_of::<T>()`.
    ///
    /// # Errors
    ///
    /// Returns `StrideBufError::AllocationFailure` if the storage cannot be allocated.
    pub fn from_values<T: bytemuck::NoUninit>(values: &[T]) -> Result<Self> {
        let mut buf = Self::with_capacity(core::mem::size_of::<T>(), values.len())?;
        buf.append_raw(values.len(), bytemuck::cast_slice(values))?;
        Ok(buf)
    }
}

impl<A: Allocator> StrideBuf<A> {
    /// Creates an empty buffer that will draw its storage from `alloc`.
    pub fn new_in(stride: usize, alloc: A) -> Self {
        Self {
            storage: Box::default(),
            len: 0,
            capacity: 0,
            stride,
            alloc,
        }
    }

    /// Creates an empty buffer with room for `capacity` elements, allocated from `alloc`.
    ///
    /// # Errors
    ///
    /// Returns `StrideBufError::AllocationFailure` if the storage cannot be allocated.
    pub fn with_capacity_in(stride: usize, capacity: usize, alloc: A) -> Result<Self> {
        let mut buf = Self::new_in(stride, alloc);
        if capacity > 0 {
            buf.grow(capacity)?;
        }
        Ok(buf)
    }

    /// Releases the storage and the buffer. Equivalent to dropping it.
    pub fn destroy(self) {
        drop(self);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Byte width of one element.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[must_use]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// The valid elements, back to back.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[..self.len * self.stride]
    }

    #[must_use]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let end = self.len * self.stride;
        &mut self.storage[..end]
    }

    #[must_use]
    pub fn has_index(&self, index: usize) -> bool {
        index < self.len
    }

    fn slot(&self, index: usize) -> Range<usize> {
        let start = index * self.stride;
        start..start + self.stride
    }

    fn byte_size(&self, count: usize) -> Result<usize> {
        count
            .checked_mul(self.stride)
            .ok_or(StrideBufError::allocation(usize::MAX))
    }

    fn check_stride(&self, value: &[u8]) -> Result<()> {
        if value.len() == self.stride {
            Ok(())
        } else {
            Err(StrideBufError::StrideMismatch {
                expected: self.stride,
                actual: value.len(),
            })
        }
    }

    /// Gets the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> &[u8] {
        assert!(
            index < self.len,
            "Index {} out of bounds for buffer of length {}",
            index,
            self.len
        );
        &self.storage[self.slot(index)]
    }

    /// Gets the element at `index`, or `None` if the index is out of bounds.
    #[must_use]
    pub fn get_checked(&self, index: usize) -> Option<&[u8]> {
        if index >= self.len {
            return None;
        }
        self.storage.get(self.slot(index))
    }

    pub fn get_checked_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        if index >= self.len {
            return None;
        }
        let range = self.slot(index);
        self.storage.get_mut(range)
    }

    #[must_use]
    pub fn first(&self) -> Option<&[u8]> {
        self.get_checked(0)
    }

    #[must_use]
    pub fn last(&self) -> Option<&[u8]> {
        self.len.checked_sub(1).and_then(|i| self.get_checked(i))
    }

    /// Any allocated slot, including those in `[len, capacity)`.
    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        if index >= self.capacity {
            return None;
        }
        let range = self.slot(index);
        self.storage.get_mut(range)
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity);
        self.len = len;
    }

    /// Overwrites the element at `index` with `value`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds or `value` is not `stride` bytes long.
    pub fn set(&mut self, index: usize, value: &[u8]) {
        assert!(
            index < self.len,
            "Index {} out of bounds for buffer of length {}",
            index,
            self.len
        );
        assert_eq!(value.len(), self.stride, "Value width must equal the stride");
        let range = self.slot(index);
        self.storage[range].copy_from_slice(value);
    }

    /// Overwrites the element at `index` with `value`.
    ///
    /// # Errors
    ///
    /// - `StrideBufError::IndexOutOfBounds` if `index >= len`
    /// - `StrideBufError::StrideMismatch` if `value` is not `stride` bytes long
    pub fn set_checked(&mut self, index: usize, value: &[u8]) -> Result<()> {
        self.check_stride(value)?;
        let length = self.len;
        let slot = self
            .get_checked_mut(index)
            .ok_or(StrideBufError::IndexOutOfBounds { index, length })?;
        slot.copy_from_slice(value);
        Ok(())
    }

    /// Inserts `value` at `index`, shifting the elements after it one slot right.
    ///
    /// Grows the storage if the buffer is full. On failure nothing is modified.
    ///
    /// # Errors
    ///
    /// - `StrideBufError::IndexOutOfBounds` if `index > len`
    /// - `StrideBufError::StrideMismatch` if `value` is not `stride` bytes long
    /// - `StrideBufError::AllocationFailure` if growing the storage fails
    pub fn insert(&mut self, index: usize, value: &[u8]) -> Result<()> {
        self.check_stride(value)?;
        if index > self.len {
            return Err(StrideBufError::IndexOutOfBounds {
                index,
                length: self.len,
            });
        }
        self.grow_if_necessary()?;

        let stride = self.stride;
        self.storage
            .copy_within(index * stride..self.len * stride, (index + 1) * stride);
        let range = self.slot(index);
        self.storage[range].copy_from_slice(value);
        self.len += 1;
        Ok(())
    }

    /// Appends `value` after the last element.
    ///
    /// # Errors
    ///
    /// See [`StrideBuf::insert`].
    pub fn push(&mut self, value: &[u8]) -> Result<()> {
        self.insert(self.len, value)
    }

    /// Appends a produced element, writing a zipped element as its flattened record.
    ///
    /// # Errors
    ///
    /// - `StrideBufError::StrideMismatch` if the element width differs from `stride`
    /// - `StrideBufError::AllocationFailure` if growing the storage fails
    pub fn push_element(&mut self, element: &Element<'_>) -> Result<()> {
        if element.byte_len() != self.stride {
            return Err(StrideBufError::StrideMismatch {
                expected: self.stride,
                actual: element.byte_len(),
            });
        }
        self.grow_if_necessary()?;
        let index = self.len;
        let length = self.capacity;
        let slot = self
            .slot_mut(index)
            .ok_or(StrideBufError::IndexOutOfBounds { index, length })?;
        element.copy_to(slot)?;
        self.len += 1;
        Ok(())
    }

    /// Inserts `value` before the first element.
    ///
    /// # Errors
    ///
    /// See [`StrideBuf::insert`].
    pub fn push_first(&mut self, value: &[u8]) -> Result<()> {
        self.insert(0, value)
    }

    /// Removes the last element, copying it into `out` if given.
    ///
    /// Returns the new length, or `None` if the buffer was already empty.
    ///
    /// # Panics
    ///
    /// Panics if `out` is given and is not `stride` bytes long.
    pub fn pop(&mut self, out: Option<&mut [u8]>) -> Option<usize> {
        let last = self.len.checked_sub(1)?;
        self.pop_at(last, out)
    }

    /// Removes the element at `index`, copying it into `out` if given, and shifts the
    /// elements after it one slot left.
    ///
    /// Returns the new length, or `None` if there is no element at `index` (in
    /// particular when the buffer is empty). Nothing is modified in that case.
    ///
    /// # Panics
    ///
    /// Panics if `out` is given and is not `stride` bytes long.
    pub fn pop_at(&mut self, index: usize, out: Option<&mut [u8]>) -> Option<usize> {
        if index >= self.len {
            return None;
        }
        let range = self.slot(index);
        if let Some(out) = out {
            out.copy_from_slice(&self.storage[range.clone()]);
        }
        self.storage
            .copy_within(range.end..self.len * self.stride, range.start);
        self.len -= 1;
        Some(self.len)
    }

    /// Removes the first element. See [`StrideBuf::pop_at`].
    pub fn pop_first(&mut self, out: Option<&mut [u8]>) -> Option<usize> {
        self.pop_at(0, out)
    }

    /// Reallocates the storage to hold exactly `new_capacity` elements.
    ///
    /// No comparison with the current capacity is made. Shrinking below `len`
    /// drops the trailing elements. On failure the previous storage and contents
    /// are left intact.
    ///
    /// # Errors
    ///
    /// Returns `StrideBufError::AllocationFailure` if the storage cannot be reallocated.
    pub fn grow(&mut self, new_capacity: usize) -> Result<()> {
        let new_bytes = self.byte_size(new_capacity)?;
        if let Err(e) = self.alloc.reallocate(&mut self.storage, new_bytes) {
            log::debug!(
                "failed to grow stride {} buffer from {} to {} elements",
                self.stride,
                self.capacity,
                new_capacity
            );
            return Err(e);
        }
        log::trace!(
            "stride {} buffer capacity {} -> {}",
            self.stride,
            self.capacity,
            new_capacity
        );
        self.capacity = new_capacity;
        self.len = self.len.min(new_capacity);
        Ok(())
    }

    /// Grows the storage to `new_capacity` unless it already holds that many elements.
    ///
    /// # Errors
    ///
    /// Returns `StrideBufError::AllocationFailure` if the storage cannot be reallocated.
    pub fn reserve_at_least(&mut self, new_capacity: usize) -> Result<()> {
        if self.capacity >= new_capacity {
            return Ok(());
        }
        self.grow(new_capacity)
    }

    pub(crate) fn grow_if_necessary(&mut self) -> Result<()> {
        if self.len < self.capacity {
            return Ok(());
        }
        let new_capacity = if self.capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            self.capacity
                .checked_mul(2)
                .ok_or(StrideBufError::allocation(usize::MAX))?
        };
        self.grow(new_capacity)
    }

    /// Drops all elements, keeping the storage.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Drops all elements and releases the storage.
    pub fn reset_removing_capacity(&mut self) {
        self.len = 0;
        self.capacity = 0;
        let storage = core::mem::take(&mut self.storage);
        log::trace!("stride {} buffer released {} bytes", self.stride, storage.len());
        self.alloc.release(storage);
    }

    /// Exchanges the elements at `a` and `b`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn swap(&mut self, a: usize, b: usize) {
        assert!(
            a < self.len && b < self.len,
            "Swap indices ({}, {}) out of bounds for buffer of length {}",
            a,
            b,
            self.len
        );
        swap_slots(&mut self.storage, self.stride, a, b);
    }

    /// Orders the elements in place by running the caller's `algorithm` with `compare`.
    ///
    /// The buffer supplies no sorting routine of its own; `algorithm` receives a
    /// [`SortView`] of the valid elements.
    pub fn sort_by<C, S>(&mut self, mut compare: C, algorithm: S) -> &mut Self
    where
        C: FnMut(&[u8], &[u8]) -> Ordering,
        S: FnOnce(&mut SortView<'_>, &mut dyn FnMut(&[u8], &[u8]) -> Ordering),
    {
        let stride = self.stride;
        let len = self.len;
        let mut view = SortView {
            bytes: &mut self.storage[..len * stride],
            stride,
            len,
        };
        algorithm(&mut view, &mut compare);
        self
    }

    /// Reverses the order of the elements in place.
    pub fn reverse(&mut self) -> &mut Self {
        let len = self.len;
        for i in 0..len / 2 {
            swap_slots(&mut self.storage, self.stride, i, len - i - 1);
        }
        self
    }

    /// Appends the elements in `bytes`, which must be a whole number of strides.
    ///
    /// # Errors
    ///
    /// - `StrideBufError::StrideMismatch` if `bytes.len()` is not a multiple of `stride`
    /// - `StrideBufError::AllocationFailure` if growing the storage fails
    pub fn extend_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.stride == 0 || bytes.len() % self.stride != 0 {
            if bytes.is_empty() {
                return Ok(());
            }
            return Err(StrideBufError::StrideMismatch {
                expected: self.stride,
                actual: bytes.len(),
            });
        }
        self.append_raw(bytes.len() / self.stride, bytes)
    }

    /// Appends `count` elements laid out back to back in `bytes`.
    pub(crate) fn append_raw(&mut self, count: usize, bytes: &[u8]) -> Result<()> {
        let n_bytes = self.byte_size(count)?;
        if bytes.len() != n_bytes {
            return Err(StrideBufError::StrideMismatch {
                expected: n_bytes,
                actual: bytes.len(),
            });
        }
        let new_len = self
            .len
            .checked_add(count)
            .ok_or(StrideBufError::allocation(usize::MAX))?;
        self.reserve_at_least(new_len)?;
        let start = self.len * self.stride;
        self.storage[start..start + n_bytes].copy_from_slice(bytes);
        self.len = new_len;
        Ok(())
    }

    /// Returns an iterator over the elements.
    ///
    /// The iterator is contiguous, enumerated and knows its size.
    #[must_use]
    pub fn iter(&self) -> StrideIter<'_> {
        StrideIter::new(BufSource::new(self))
    }

    /// Copies the buffer, drawing new storage from a clone of the allocator.
    ///
    /// # Errors
    ///
    /// Returns `StrideBufError::AllocationFailure` if the storage cannot be allocated.
    pub fn try_clone(&self) -> Result<Self>
    where
        A: Clone,
    {
        let mut copy = Self::with_capacity_in(self.stride, self.capacity, self.alloc.clone())?;
        copy.append_raw(self.len, self.as_bytes())?;
        Ok(copy)
    }
}

impl<A: Allocator> StrideBuf<A> {
    /// Appends a typed value by copying its bytes.
    ///
    /// # Errors
    ///
    /// See [`StrideBuf::insert`].
    pub fn push_value<T: bytemuck::NoUninit>(&mut self, value: T) -> Result<()> {
        self.push(bytemuck::bytes_of(&value))
    }

    /// Inserts a typed value at `index`.
    ///
    /// # Errors
    ///
    /// See [`StrideBuf::insert`].
    pub fn insert_value<T: bytemuck::NoUninit>(&mut self, index: usize, value: T) -> Result<()> {
        self.insert(index, bytemuck::bytes_of(&value))
    }

    /// Overwrites the element at `index` with a typed value.
    ///
    /// # Errors
    ///
    /// See [`StrideBuf::set_checked`].
    pub fn set_value<T: bytemuck::NoUninit>(&mut self, index: usize, value: T) -> Result<()> {
        self.set_checked(index, bytemuck::bytes_of(&value))
    }

    /// Reads the element at `index` as a `T`.
    ///
    /// Returns `None` if the index is out of bounds or `T` is not `stride` bytes wide.
    #[must_use]
    pub fn get_value<T: bytemuck::AnyBitPattern>(&self, index: usize) -> Option<T> {
        let bytes = self.get_checked(index)?;
        bytemuck::try_pod_read_unaligned(bytes).ok()
    }

    /// Removes the last element and returns it as a `T`.
    ///
    /// Returns `None` (and leaves the buffer unchanged) if the buffer is empty or `T`
    /// is not `stride` bytes wide.
    pub fn pop_value<T: bytemuck::AnyBitPattern>(&mut self) -> Option<T> {
        let value = self.get_value(self.len.checked_sub(1)?)?;
        self.pop(None)?;
        Some(value)
    }

    /// Copies every element out as a `T`.
    ///
    /// # Errors
    ///
    /// Returns `StrideBufError::StrideMismatch` if `T` is not `stride` bytes wide.
    pub fn to_values<T: bytemuck::AnyBitPattern>(&self) -> Result<Vec<T>> {
        let width = core::mem::size_of::<T>();
        if width != self.stride {
            return Err(StrideBufError::StrideMismatch {
                expected: self.stride,
                actual: width,
            });
        }
        Ok((0..self.len)
            .map(|i| bytemuck::pod_read_unaligned(&self.storage[self.slot(i)]))
            .collect())
    }
}

impl<A: Allocator> Drop for StrideBuf<A> {
    fn drop(&mut self) {
        let storage = core::mem::take(&mut self.storage);
        self.alloc.release(storage);
    }
}

impl<A: Allocator> fmt::Debug for StrideBuf<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrideBuf")
            .field("stride", &self.stride)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("bytes", &self.as_bytes())
            .finish()
    }
}

impl<A: Allocator, B: Allocator> PartialEq<StrideBuf<B>> for StrideBuf<A> {
    fn eq(&self, other: &StrideBuf<B>) -> bool {
        self.stride == other.stride && self.len == other.len && self.as_bytes() == other.as_bytes()
    }
}

fn swap_slots(bytes: &mut [u8], stride: usize, a: usize, b: usize) {
    if a == b || stride == 0 {
        return;
    }
    let (lo, hi) = (a.min(b), a.max(b));
    let (head, tail) = bytes.split_at_mut(hi * stride);
    head[lo * stride..(lo + 1) * stride].swap_with_slice(&mut tail[..stride]);
}

/// Mutable, stride-aware view over the elements of a buffer, handed to a sort algorithm.
pub struct SortView<'a> {
    bytes: &'a mut [u8],
    stride: usize,
    len: usize,
}

impl SortView<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> &[u8] {
        assert!(index < self.len, "Index {} out of bounds for view of length {}", index, self.len);
        &self.bytes[index * self.stride..(index + 1) * self.stride]
    }

    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn swap(&mut self, a: usize, b: usize) {
        assert!(a < self.len && b < self.len, "Swap indices out of bounds");
        swap_slots(self.bytes, self.stride, a, b);
    }

    /// The viewed elements, back to back.
    #[must_use]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.bytes
    }
}
