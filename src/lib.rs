#![no_std]

//! `StrideBuf`: a growable buffer of type-erased, fixed-stride elements, and
//! `StrideIter`: a lazy, composable iteration protocol over such elements.
//!
//! A `StrideBuf` stores every element as `stride` raw bytes laid out back to back.
//! It knows nothing about the element type; typed helpers built on `bytemuck`
//! cover the common case of plain-old-data values.
//!
//! ## Time Complexity
//! - `push()`: amortized O(1), capacity starts at [`DEFAULT_CAPACITY`] and doubles
//! - `insert()`, `pop_at()`, `push_first()`, `pop_first()`: O(n) shift
//! - `get()`, `set()`, `swap()`, `pop()`: O(1)
//! - `reverse()`: O(n)
//!
//! ## `no_std` Compatibility
//!
//! The crate needs `alloc` but not `std`. All storage is obtained through an
//! [`Allocator`]; allocation failure is reported as
//! [`StrideBufError::AllocationFailure`] and leaves the buffer unchanged.
//!
//! Enable the optional `std` feature to get `std::error::Error` on the error type:
//! ```toml
//! [dependencies]
//! stridebuf = { version = "0.1", features = ["std"] }
//! ```
//!
//! # Buffer Interface
//!
//! ```
//! # use stridebuf::StrideBuf;
//! let mut buf = StrideBuf::new(4);
//!
//! buf.push_value(10i32).unwrap();
//! buf.push_value(20i32).unwrap();
//! buf.push_first(&15i32.to_ne_bytes()).unwrap();
//!
//! assert_eq!(buf.to_values::<i32>().unwrap(), [15, 10, 20]);
//!
//! let mut out = [0u8; 4];
//! assert_eq!(buf.pop(Some(&mut out)), Some(2));
//! assert_eq!(i32::from_ne_bytes(out), 20);
//!
//! buf.reverse();
//! assert_eq!(buf.to_values::<i32>().unwrap(), [10, 15]);
//! ```
//!
//! # Iteration
//!
//! Iterators come from a buffer (`StrideBuf::iter`) or from a generator
//! (`StrideIter::from_fn`, `StrideIter::from_values`). Adapters wrap and own
//! other iterators; terminal operations consume them.
//!
//! ```
//! # use stridebuf::{StrideBuf, StrideIter};
//! let buf = StrideBuf::from_values(&[0i32, 1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
//!
//! // map into a new buffer
//! let plus_one = buf
//!     .iter()
//!     .map_create(4, |e, slot| {
//!         let v: i32 = e.read().unwrap();
//!         slot.copy_from_slice(&(v + 1).to_ne_bytes());
//!     })
//!     .unwrap();
//! assert_eq!(plus_one.to_values::<i32>().unwrap(), [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
//!
//! // reduce into an accumulator
//! let mut sum = 0i32;
//! buf.iter().reduce_into(&mut sum, |e, acc| *acc += e.read::<i32>().unwrap());
//! assert_eq!(sum, 45);
//!
//! // zip two sources, pairing elements until both have ended
//! let letters = StrideIter::from_values(*b"abc");
//! let mut pairs = buf.iter().zipped(letters);
//! let first = pairs.produce().unwrap();
//! assert_eq!(first.left().unwrap().read::<i32>(), Some(0));
//! assert_eq!(first.right().unwrap().read::<u8>(), Some(b'a'));
//! ```
//!
//! # Teardown
//!
//! An iterator can carry a callback that runs exactly once when it is dropped.
//! Adapters own what they wrap, so dropping the outermost iterator tears down the
//! whole chain.
//!
//! ```
//! # use core::cell::Cell;
//! # use stridebuf::StrideIter;
//! let torn_down = Cell::new(0);
//! let source = StrideIter::from_values([1u8, 2, 3]).with_teardown(|| torn_down.set(torn_down.get() + 1));
//! assert_eq!(source.enumerated().collect_create().unwrap().len(), 3);
//! assert_eq!(torn_down.get(), 1);
//! ```

extern crate alloc;

mod adapters;
mod allocator;
mod buffer;
mod error;
mod iter;
mod ops;

// Re-export public types and traits
pub use allocator::{Allocator, LimitedAllocator, ProcessAllocator};
pub use buffer::{SortView, StrideBuf, DEFAULT_CAPACITY};
pub use error::{Result, StrideBufError};
pub use iter::{Caps, Element, Source, StrideIter, Zipped};
