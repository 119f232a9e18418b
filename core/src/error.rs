//! Failure taxonomy of the explorer.
//!
//! None of these cross the public API as a hard failure: the explorer logs
//! them and answers with a sentinel (`false`, zero, an empty name).

/// Why an explorer operation produced a sentinel instead of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExploreError {
    /// The storage medium did not come up.
    InitializationFailure,
    /// No open working directory to scan or resolve against.
    DirectoryUnavailable,
    /// The requested path could not become the working directory.
    RootUnavailable,
    /// An indexed entry could not be re-opened by its position.
    EntryOpenFailure,
    /// Logical index outside `[0, count)`.
    OutOfRangeIndex,
    /// Window buffer shorter than `rows * row_width`.
    WindowTooSmall,
}

impl core::fmt::Display for ExploreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InitializationFailure => write!(f, "storage initialization failed"),
            Self::DirectoryUnavailable => write!(f, "current directory not open"),
            Self::RootUnavailable => write!(f, "failed to load directory"),
            Self::EntryOpenFailure => write!(f, "directory entry could not be reopened"),
            Self::OutOfRangeIndex => write!(f, "logical index out of range"),
            Self::WindowTooSmall => write!(f, "window buffer too small"),
        }
    }
}

pub type Result<T> = core::result::Result<T, ExploreError>;
