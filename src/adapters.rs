use alloc::boxed::Box;

use crate::iter::{Caps, Element, Source, StrideIter, Zipped};

/// Adds a running index to an iterator that lacks one.
///
/// The inner iterator is not pulled again once it has ended, so the index stops at
/// the element count.
struct Enumerate<'a> {
    inner: StrideIter<'a>,
    calls: usize,
    ended: bool,
}

impl<'a> Source<'a> for Enumerate<'a> {
    fn produce(&mut self) -> Option<Element<'a>> {
        if self.ended {
            return None;
        }
        self.calls = self.calls.saturating_add(1);
        let element = self.inner.produce();
        self.ended = element.is_none();
        element
    }

    fn stride(&self) -> usize {
        self.inner.stride()
    }

    fn caps(&self) -> Caps {
        self.inner.caps() | Caps::ENUMERATED
    }

    fn known_size(&self) -> Option<usize> {
        self.inner.known_size()
    }

    fn contiguous(&self) -> Option<&'a [u8]> {
        self.inner.contiguous()
    }

    fn current_index(&self) -> Option<usize> {
        self.calls.checked_sub(1)
    }
}

/// Pulls one element from each side per step until both sides have ended.
///
/// Each side is latched once it ends and is never pulled again, so a source that
/// would resume after signalling the end cannot desynchronise the pairs.
struct Zip<'a> {
    left: StrideIter<'a>,
    right: StrideIter<'a>,
    left_done: bool,
    right_done: bool,
}

fn pull<'a>(iter: &mut StrideIter<'a>, done: &mut bool) -> Option<Element<'a>> {
    if *done {
        return None;
    }
    let element = iter.produce();
    *done = element.is_none();
    element
}

impl<'a> Source<'a> for Zip<'a> {
    fn produce(&mut self) -> Option<Element<'a>> {
        let left = pull(&mut self.left, &mut self.left_done);
        let right = pull(&mut self.right, &mut self.right_done);
        if left.is_none() && right.is_none() {
            return None;
        }
        Some(Element::Zipped(Box::new(Zipped::new(
            left,
            right,
            self.left.stride(),
            self.right.stride(),
        ))))
    }

    fn stride(&self) -> usize {
        self.left.stride() + self.right.stride()
    }

    fn caps(&self) -> Caps {
        if self.known_size().is_some() {
            Caps::KNOWN_SIZE
        } else {
            Caps::empty()
        }
    }

    fn known_size(&self) -> Option<usize> {
        Some(self.left.known_size()?.max(self.right.known_size()?))
    }
}

impl<'a> StrideIter<'a> {
    /// Gives the iterator a running index, readable through [`StrideIter::current_index`].
    ///
    /// An iterator that is already enumerated is returned unchanged. The returned
    /// iterator owns `self`.
    #[must_use]
    pub fn enumerated(self) -> StrideIter<'a> {
        if self.is_enumerated() {
            return self;
        }
        StrideIter::new(Enumerate {
            inner: self,
            calls: 0,
            ended: false,
        })
    }

    /// Pairs this iterator with `other`, producing [`Element::Zipped`] values until
    /// both have ended. The returned iterator owns both.
    ///
    /// Its stride is the sum of the two strides: a zipped element written into a buffer
    /// is the left bytes followed by the right bytes.
    #[must_use]
    pub fn zipped(self, other: StrideIter<'a>) -> StrideIter<'a> {
        StrideIter::new(Zip {
            left: self,
            right: other,
            left_done: false,
            right_done: false,
        })
    }
}
