//! Terminal and transform operations. Each consumes the iterator; dropping it at
//! the end runs its teardown.

use core::cmp::Ordering;

use crate::allocator::Allocator;
use crate::buffer::{StrideBuf, DEFAULT_CAPACITY};
use crate::error::{Result, StrideBufError};
use crate::iter::{Caps, Element, StrideIter};

fn check_stride(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(StrideBufError::StrideMismatch { expected, actual })
    }
}

impl<'a> StrideIter<'a> {
    /// Appends every remaining element to `target`.
    ///
    /// An enumerated, contiguous iterator of known size is copied in one block,
    /// starting after the elements it has already produced; anything else is pulled
    /// element by element, growing `target` as needed.
    ///
    /// # Errors
    ///
    /// - `StrideBufError::StrideMismatch` if the strides of the iterator and `target` differ
    /// - `StrideBufError::AllocationFailure` if `target` cannot grow
    pub fn collect_into<A: Allocator>(mut self, target: &mut StrideBuf<A>) -> Result<()> {
        check_stride(target.stride(), self.stride())?;

        if let Some(remaining) = self.remaining_known() {
            let wanted = target
                .len()
                .checked_add(remaining)
                .ok_or(StrideBufError::allocation(usize::MAX))?;
            target.reserve_at_least(wanted)?;
        }

        if self
            .caps()
            .contains(Caps::CONTIGUOUS | Caps::KNOWN_SIZE | Caps::ENUMERATED)
        {
            if let Some((count, bytes)) = self.remaining_block() {
                return target.append_raw(count, bytes);
            }
        }

        while let Some(element) = self.produce() {
            target.push_element(&element)?;
        }
        Ok(())
    }

    /// Elements already produced, as far as an enumerated iterator can tell.
    fn consumed(&self) -> usize {
        self.current_index().map_or(0, |index| index.saturating_add(1))
    }

    /// Known size minus what an enumerated iterator has already produced.
    fn remaining_known(&self) -> Option<usize> {
        Some(self.known_size()?.saturating_sub(self.consumed()))
    }

    /// The backing bytes of the elements not yet produced.
    fn remaining_block(&self) -> Option<(usize, &'a [u8])> {
        let known = self.known_size()?;
        let consumed = self.consumed().min(known);
        let stride = self.stride();
        let bytes = self
            .contiguous()?
            .get(consumed.checked_mul(stride)?..known.checked_mul(stride)?)?;
        Some((known - consumed, bytes))
    }

    /// Collects into a new buffer, presized when the size is known.
    ///
    /// # Errors
    ///
    /// Returns `StrideBufError::AllocationFailure` if the buffer cannot be allocated.
    pub fn collect_create(self) -> Result<StrideBuf> {
        let capacity = self.remaining_known().unwrap_or(0);
        let mut target = StrideBuf::with_capacity(self.stride(), capacity)?;
        self.collect_into(&mut target)?;
        Ok(target)
    }

    /// Replaces the contents of `target` with `transform` applied to every remaining
    /// element.
    ///
    /// `transform(element, slot)` writes the derived value into the slot of the same
    /// index; the slot is `target.stride()` bytes wide. The iterator is enumerated first
    /// if needed, and indices count from the first element this call produces, so a
    /// partly consumed iterator maps only what is left. With a known size `target` is
    /// sized once; otherwise it starts at [`DEFAULT_CAPACITY`] and doubles whenever the
    /// index reaches its capacity. Afterwards `len` is the number of elements mapped.
    ///
    /// # Errors
    ///
    /// Returns `StrideBufError::AllocationFailure` if `target` cannot grow.
    pub fn map_into<A, F>(self, target: &mut StrideBuf<A>, mut transform: F) -> Result<()>
    where
        A: Allocator,
        F: FnMut(&Element<'a>, &mut [u8]),
    {
        let mut iter = self.enumerated();
        let base = iter.consumed();
        let initial = iter.remaining_known().unwrap_or(DEFAULT_CAPACITY);

        target.reset();
        target.reserve_at_least(initial)?;
        let mut mapped = 0;
        while let Some(element) = iter.produce() {
            let index = iter
                .current_index()
                .ok_or(StrideBufError::NotEnumerated)?
                .saturating_sub(base);
            while index >= target.capacity() {
                let next = match target.capacity() {
                    0 => DEFAULT_CAPACITY,
                    capacity => capacity
                        .checked_mul(2)
                        .ok_or(StrideBufError::allocation(usize::MAX))?,
                };
                target.grow(next)?;
            }
            let length = target.capacity();
            let slot = target
                .slot_mut(index)
                .ok_or(StrideBufError::IndexOutOfBounds { index, length })?;
            transform(&element, slot);
            mapped = index + 1;
        }
        target.set_len(mapped);
        Ok(())
    }

    /// Maps into a new buffer whose elements are `out_stride` bytes wide.
    ///
    /// # Errors
    ///
    /// See [`StrideIter::map_into`].
    pub fn map_create<F>(self, out_stride: usize, transform: F) -> Result<StrideBuf>
    where
        F: FnMut(&Element<'a>, &mut [u8]),
    {
        let mut target = StrideBuf::new(out_stride);
        self.map_into(&mut target, transform)?;
        Ok(target)
    }

    /// Folds every element into `acc` in place.
    ///
    /// Nothing is returned: once the iterator is exhausted the result is whatever
    /// `combine` left in `acc`.
    pub fn reduce_into<T, F>(mut self, acc: &mut T, mut combine: F)
    where
        T: ?Sized,
        F: FnMut(&Element<'a>, &mut T),
    {
        while let Some(element) = self.produce() {
            combine(&element, acc);
        }
    }

    /// Returns `false` on the first element failing `predicate`, `true` if none does.
    pub fn all_satisfy<P>(mut self, mut predicate: P) -> bool
    where
        P: FnMut(&Element<'a>) -> bool,
    {
        while let Some(element) = self.produce() {
            if !predicate(&element) {
                return false;
            }
        }
        true
    }

    /// Appends every element satisfying `predicate` to `target`, in encounter order.
    ///
    /// # Errors
    ///
    /// - `StrideBufError::StrideMismatch` if the strides of the iterator and `target` differ
    /// - `StrideBufError::AllocationFailure` if `target` cannot grow
    pub fn find_all_into<A, P>(mut self, target: &mut StrideBuf<A>, mut predicate: P) -> Result<()>
    where
        A: Allocator,
        P: FnMut(&Element<'a>) -> bool,
    {
        check_stride(target.stride(), self.stride())?;
        while let Some(element) = self.produce() {
            if predicate(&element) {
                target.push_element(&element)?;
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// See [`StrideIter::find_all_into`].
    pub fn find_all_create<P>(self, predicate: P) -> Result<StrideBuf>
    where
        P: FnMut(&Element<'a>) -> bool,
    {
        let mut target = StrideBuf::new(self.stride());
        self.find_all_into(&mut target, predicate)?;
        Ok(target)
    }

    /// Appends the index of every element satisfying `predicate` to `target`, whose
    /// elements must be `usize`.
    ///
    /// # Errors
    ///
    /// - `StrideBufError::StrideMismatch` if `target` does not hold `usize` elements
    /// - `StrideBufError::AllocationFailure` if `target` cannot grow
    pub fn find_all_indices_into<A, P>(
        self,
        target: &mut StrideBuf<A>,
        mut predicate: P,
    ) -> Result<()>
    where
        A: Allocator,
        P: FnMut(&Element<'a>) -> bool,
    {
        check_stride(target.stride(), core::mem::size_of::<usize>())?;
        let mut iter = self.enumerated();
        while let Some(element) = iter.produce() {
            if predicate(&element) {
                let index = iter.current_index().ok_or(StrideBufError::NotEnumerated)?;
                target.push_value(index)?;
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// See [`StrideIter::find_all_indices_into`].
    pub fn find_all_indices_create<P>(self, predicate: P) -> Result<StrideBuf>
    where
        P: FnMut(&Element<'a>) -> bool,
    {
        let mut target = StrideBuf::new(core::mem::size_of::<usize>());
        self.find_all_indices_into(&mut target, predicate)?;
        Ok(target)
    }

    /// The first element satisfying `predicate`.
    pub fn find_first<P>(mut self, mut predicate: P) -> Option<Element<'a>>
    where
        P: FnMut(&Element<'a>) -> bool,
    {
        while let Some(element) = self.produce() {
            if predicate(&element) {
                return Some(element);
            }
        }
        None
    }

    /// The index of the first element satisfying `predicate`.
    pub fn index_of_first<P>(self, mut predicate: P) -> Option<usize>
    where
        P: FnMut(&Element<'a>) -> bool,
    {
        let mut iter = self.enumerated();
        while let Some(element) = iter.produce() {
            if predicate(&element) {
                return iter.current_index();
            }
        }
        None
    }

    /// The greatest element according to `compare`.
    ///
    /// `compare(a, b)` orders `a` relative to `b`, as `Ord::cmp` does. The running
    /// maximum is replaced only by an element comparing `Greater`, so the earliest of
    /// equal maxima wins. `None` for an empty sequence.
    pub fn max_element<C>(self, compare: C) -> Option<Element<'a>>
    where
        C: FnMut(&Element<'a>, &Element<'a>) -> Ordering,
    {
        self.extreme(Ordering::Greater, compare)
    }

    /// The least element according to `compare`.
    ///
    /// Same convention as [`StrideIter::max_element`]; replaced only by an element
    /// comparing `Less`.
    pub fn min_element<C>(self, compare: C) -> Option<Element<'a>>
    where
        C: FnMut(&Element<'a>, &Element<'a>) -> Ordering,
    {
        self.extreme(Ordering::Less, compare)
    }

    fn extreme<C>(mut self, replace_on: Ordering, mut compare: C) -> Option<Element<'a>>
    where
        C: FnMut(&Element<'a>, &Element<'a>) -> Ordering,
    {
        let mut current = self.produce()?;
        while let Some(candidate) = self.produce() {
            if compare(&candidate, &current) == replace_on {
                current = candidate;
            }
        }
        Some(current)
    }
}
