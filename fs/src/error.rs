//! Error types for file-store operations.

use core::fmt;

/// Result type alias for file-store operations.
pub type FsResult<T> = Result<T, FsError>;

/// Why a file-store mutation failed.
///
/// Lookups return `Option`; these variants cover the write paths, where
/// the caller needs to tell a missing file from a file with no backing
/// region when choosing a status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// No catalogue entry with the requested identifier.
    NotFound,
    /// The entry exists but has no backing data region.
    Unbacked,
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::NotFound => write!(f, "file not found"),
            FsError::Unbacked => write!(f, "file has no backing region"),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::ToString;

    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(FsError::NotFound.to_string(), "file not found");
        assert_eq!(FsError::Unbacked.to_string(), "file has no backing region");
    }
}
