use thiserror::Error;

/// Errors reported by the checked operations of [`DynamicArray`](crate::DynamicArray).
///
/// Every error is returned before the array is touched, so a failed call
/// leaves the container exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArrayError {
    #[error("index {index} is out of range for length {len}")]
    OutOfRange { index: usize, len: usize },

    /// Null or foreign cursor, or a cursor requested from a detached array.
    #[error("invalid cursor")]
    InvalidCursor,

    #[error("capacity overflow")]
    CapacityOverflow,

    #[error("allocation of {capacity} elements failed")]
    AllocFailed { capacity: usize },
}

pub type Result<T, E = ArrayError> = std::result::Result<T, E>;
