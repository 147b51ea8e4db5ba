use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

use crate::allocator::Allocator;
use crate::buffer::StrideBuf;
use crate::error::{Result, StrideBufError};

bitflags! {
    /// Preconditions an iterator guarantees, letting consumers pick a fast path.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Caps: u8 {
        /// `contiguous()` returns the backing bytes of the whole sequence.
        const CONTIGUOUS = 0b0001;
        /// `known_size()` returns the total element count, captured at construction.
        const KNOWN_SIZE = 0b0010;
        /// `current_index()` returns the index of the most recently produced element.
        const ENUMERATED = 0b0100;
    }
}

/// One produced element.
///
/// Buffer-backed sources lend their bytes; generator sources hand out owned copies.
/// A zipped element is a record made of both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element<'a> {
    Bytes(Cow<'a, [u8]>),
    Zipped(Box<Zipped<'a>>),
}

/// The paired value produced by a zipped iterator.
///
/// A side is `None` once its source has ended while the other side still produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zipped<'a> {
    pub left: Option<Element<'a>>,
    pub right: Option<Element<'a>>,
    left_stride: usize,
    right_stride: usize,
}

impl<'a> Zipped<'a> {
    pub(crate) fn new(
        left: Option<Element<'a>>,
        right: Option<Element<'a>>,
        left_stride: usize,
        right_stride: usize,
    ) -> Self {
        Self {
            left,
            right,
            left_stride,
            right_stride,
        }
    }
}

impl<'a> Element<'a> {
    #[must_use]
    pub fn borrowed(bytes: &'a [u8]) -> Self {
        Element::Bytes(Cow::Borrowed(bytes))
    }

    #[must_use]
    pub fn owned(bytes: Vec<u8>) -> Self {
        Element::Bytes(Cow::Owned(bytes))
    }

    /// An owned element holding the bytes of `value`.
    #[must_use]
    pub fn from_value<T: bytemuck::NoUninit>(value: T) -> Self {
        Element::owned(bytemuck::bytes_of(&value).to_vec())
    }

    /// The element bytes, or `None` for a zipped element.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Element::Bytes(bytes) => Some(&**bytes),
            Element::Zipped(_) => None,
        }
    }

    /// Reads the element as a `T`.
    ///
    /// Returns `None` for a zipped element or if `T` has a different width.
    #[must_use]
    pub fn read<T: bytemuck::AnyBitPattern>(&self) -> Option<T> {
        bytemuck::try_pod_read_unaligned(self.as_bytes()?).ok()
    }

    #[must_use]
    pub fn as_zipped(&self) -> Option<&Zipped<'a>> {
        match self {
            Element::Zipped(pair) => Some(&**pair),
            Element::Bytes(_) => None,
        }
    }

    #[must_use]
    pub fn left(&self) -> Option<&Element<'a>> {
        self.as_zipped()?.left.as_ref()
    }

    #[must_use]
    pub fn right(&self) -> Option<&Element<'a>> {
        self.as_zipped()?.right.as_ref()
    }

    /// Width of the element when written into a buffer.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        match self {
            Element::Bytes(bytes) => bytes.len(),
            Element::Zipped(pair) => pair.left_stride + pair.right_stride,
        }
    }

    /// Writes the element into `dst`.
    ///
    /// A zipped element is written as its left side followed by its right side; a
    /// side that has ended is written as zeros.
    ///
    /// # Errors
    ///
    /// Returns `StrideBufError::StrideMismatch` if `dst` is not `byte_len()` bytes long.
    pub fn copy_to(&self, dst: &mut [u8]) -> Result<()> {
        if dst.len() != self.byte_len() {
            return Err(StrideBufError::StrideMismatch {
                expected: dst.len(),
                actual: self.byte_len(),
            });
        }
        match self {
            Element::Bytes(bytes) => dst.copy_from_slice(bytes),
            Element::Zipped(pair) => {
                let (left, right) = dst.split_at_mut(pair.left_stride);
                for (side, part) in [(&pair.left, left), (&pair.right, right)] {
                    match side {
                        Some(element) => element.copy_to(part)?,
                        None => part.fill(0),
                    }
                }
            }
        }
        Ok(())
    }

    /// Detaches the element from whatever it borrows.
    #[must_use]
    pub fn into_owned(self) -> Element<'static> {
        match self {
            Element::Bytes(bytes) => Element::Bytes(Cow::Owned(bytes.into_owned())),
            Element::Zipped(pair) => {
                let Zipped {
                    left,
                    right,
                    left_stride,
                    right_stride,
                } = *pair;
                Element::Zipped(Box::new(Zipped {
                    left: left.map(Element::into_owned),
                    right: right.map(Element::into_owned),
                    left_stride,
                    right_stride,
                }))
            }
        }
    }
}

/// A pull-based sequence of fixed-stride elements.
///
/// `produce` returns `None` at the end. Built-in sources keep returning `None` once
/// they have ended; hand-written sources should do the same.
///
/// The optional accessors are only consulted when `caps()` advertises the matching
/// flag.
pub trait Source<'a> {
    fn produce(&mut self) -> Option<Element<'a>>;

    /// Byte width of every produced element.
    fn stride(&self) -> usize;

    fn caps(&self) -> Caps {
        Caps::empty()
    }

    fn known_size(&self) -> Option<usize> {
        None
    }

    fn contiguous(&self) -> Option<&'a [u8]> {
        None
    }

    fn current_index(&self) -> Option<usize> {
        None
    }
}

/// Type-erased, single-pass iterator over fixed-stride elements.
///
/// Owns its source. An optional teardown callback runs exactly once, when the
/// iterator is destroyed or dropped; adapters drop (and so tear down) the iterators
/// they wrap.
pub struct StrideIter<'a> {
    source: Box<dyn Source<'a> + 'a>,
    teardown: Option<Box<dyn FnOnce() + 'a>>,
}

impl<'a> StrideIter<'a> {
    pub fn new<S: Source<'a> + 'a>(source: S) -> Self {
        Self {
            source: Box::new(source),
            teardown: None,
        }
    }

    /// A generator iterator: each call of `f` produces the next element.
    pub fn from_fn<F>(stride: usize, f: F) -> Self
    where
        F: FnMut() -> Option<Element<'a>> + 'a,
    {
        Self::new(FnSource { stride, f })
    }

    /// An iterator over typed values, each produced as an owned element.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: bytemuck::NoUninit,
        I::IntoIter: 'a,
    {
        let mut values = values.into_iter();
        Self::from_fn(core::mem::size_of::<I::Item>(), move || {
            values.next().map(Element::from_value)
        })
    }

    /// Attaches a callback to run when the iterator is destroyed.
    ///
    /// A previously attached callback still runs, after this one.
    #[must_use]
    pub fn with_teardown<F: FnOnce() + 'a>(mut self, f: F) -> Self {
        let teardown: Box<dyn FnOnce() + 'a> = match self.teardown.take() {
            Some(previous) => Box::new(move || {
                f();
                previous();
            }),
            None => Box::new(f),
        };
        self.teardown = Some(teardown);
        self
    }

    /// Advances the iterator.
    pub fn produce(&mut self) -> Option<Element<'a>> {
        self.source.produce()
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.source.stride()
    }

    #[must_use]
    pub fn caps(&self) -> Caps {
        self.source.caps()
    }

    #[must_use]
    pub fn is_enumerated(&self) -> bool {
        self.caps().contains(Caps::ENUMERATED)
    }

    /// Total element count captured when the iterator was built.
    #[must_use]
    pub fn known_size(&self) -> Option<usize> {
        if self.caps().contains(Caps::KNOWN_SIZE) {
            self.source.known_size()
        } else {
            None
        }
    }

    /// The backing bytes of the whole sequence.
    #[must_use]
    pub fn contiguous(&self) -> Option<&'a [u8]> {
        if self.caps().contains(Caps::CONTIGUOUS) {
            self.source.contiguous()
        } else {
            None
        }
    }

    /// Index of the most recently produced element.
    ///
    /// `None` before the first `produce` or if the iterator is not enumerated. After
    /// the end it equals the number of elements produced.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        if self.is_enumerated() {
            self.source.current_index()
        } else {
            None
        }
    }

    /// Produces the next element paired with its index.
    ///
    /// Returns `None` without advancing if the iterator is not enumerated; wrap it with
    /// [`StrideIter::enumerated`] first.
    pub fn next_enumerated(&mut self) -> Option<(usize, Element<'a>)> {
        if !self.is_enumerated() {
            return None;
        }
        let element = self.produce()?;
        Some((self.current_index()?, element))
    }

    /// Runs the teardown callback and releases the iterator.
    pub fn destroy(self) {
        drop(self);
    }
}

impl Drop for StrideIter<'_> {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl<'a> Iterator for StrideIter<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.produce()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.known_size())
    }
}

impl fmt::Debug for StrideIter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrideIter")
            .field("stride", &self.stride())
            .field("caps", &self.caps())
            .field("known_size", &self.known_size())
            .field("current_index", &self.current_index())
            .finish_non_exhaustive()
    }
}

/// Iterator source lending the elements of a `StrideBuf`.
pub(crate) struct BufSource<'a, A: Allocator> {
    buf: &'a StrideBuf<A>,
    known_size: usize,
    calls: usize,
}

impl<'a, A: Allocator> BufSource<'a, A> {
    pub(crate) fn new(buf: &'a StrideBuf<A>) -> Self {
        Self {
            buf,
            known_size: buf.len(),
            calls: 0,
        }
    }
}

impl<'a, A: Allocator> Source<'a> for BufSource<'a, A> {
    fn produce(&mut self) -> Option<Element<'a>> {
        if self.calls > self.known_size {
            return None;
        }
        let index = self.calls;
        self.calls += 1;
        self.buf.get_checked(index).map(Element::borrowed)
    }

    fn stride(&self) -> usize {
        self.buf.stride()
    }

    fn caps(&self) -> Caps {
        Caps::CONTIGUOUS | Caps::KNOWN_SIZE | Caps::ENUMERATED
    }

    fn known_size(&self) -> Option<usize> {
        Some(self.known_size)
    }

    fn contiguous(&self) -> Option<&'a [u8]> {
        Some(self.buf.as_bytes())
    }

    fn current_index(&self) -> Option<usize> {
        self.calls.checked_sub(1)
    }
}

struct FnSource<F> {
    stride: usize,
    f: F,
}

impl<'a, F> Source<'a> for FnSource<F>
where
    F: FnMut() -> Option<Element<'a>>,
{
    fn produce(&mut self) -> Option<Element<'a>> {
        (self.f)()
    }

    fn stride(&self) -> usize {
        self.stride
    }
}
