//! Factory error types.
//!
//! The ownership core itself has no runtime error channel; these errors
//! are only produced by the fallible `try_*` constructors on
//! [`Factory`](crate::factory::Factory).

use std::error::Error;
use std::fmt;

/// Errors that can occur while allocating storage for a new owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnerError {
    /// The byte size of the requested array does not fit in `isize`.
    CapacityOverflow {
        /// Number of elements requested.
        len: usize,
        /// Size of one element in bytes.
        elem_size: usize,
    },
    /// The request is larger than the factory's configured allocation limit.
    LimitExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
}

impl fmt::Display for OwnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityOverflow { len, elem_size } => {
                write!(
                    f,
                    "capacity overflow: {len} elements of {elem_size} bytes exceed isize::MAX"
                )
            }
            Self::LimitExceeded { requested, limit } => {
                write!(
                    f,
                    "allocation limit exceeded: requested {requested} bytes, limit {limit} bytes"
                )
            }
        }
    }
}

impl Error for OwnerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_sizes() {
        let err = OwnerError::LimitExceeded {
            requested: 4096,
            limit: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("4096"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn capacity_overflow_display() {
        let err = OwnerError::CapacityOverflow {
            len: usize::MAX,
            elem_size: 8,
        };
        assert!(err.to_string().starts_with("capacity overflow"));
    }
}
