use thiserror::Error;

pub type Result<T> = core::result::Result<T, StrideBufError>;

/// Error types for `StrideBuf` and `StrideIter` operations
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum StrideBufError {
    /// Storage could not be obtained from the allocator
    #[error("Allocation failure: could not obtain {requested_bytes} bytes")]
    AllocationFailure {
        /// Number of bytes requested (`usize::MAX` if the size computation overflowed)
        requested_bytes: usize,
    },
    /// Index is beyond the current buffer length
    #[error("Index out of bounds: index {index} is beyond buffer length {length}")]
    IndexOutOfBounds {
        /// Index that was accessed
        index: usize,
        /// Current length of the buffer
        length: usize,
    },
    /// Element width does not match the stride of the buffer or iterator
    #[error("Stride mismatch: expected {expected} bytes per element, got {actual}")]
    StrideMismatch {
        /// Stride of the receiving side
        expected: usize,
        /// Width of the offered element
        actual: usize,
    },
    /// The operation needs a running index, but the iterator does not carry one
    #[error("Iterator is not enumerated")]
    NotEnumerated,
}

impl StrideBufError {
    pub(crate) fn allocation(requested_bytes: usize) -> Self {
        StrideBufError::AllocationFailure { requested_bytes }
    }
}
