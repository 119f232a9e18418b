//! Capability interface of the storage driver.
//!
//! The explorer never talks to a filesystem directly. It sees a driver that
//! can be started, can change its working directory and hands out that
//! working directory as a [`DirectoryHandle`]. Entries opened from the
//! handle are short-lived values; dropping one (or calling
//! [`EntryHandle::close`]) closes it.
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │      SdExplore (index + resolver)      │
//! └───────────────────┬────────────────────┘
//!                     │ StorageDriver / DirectoryHandle
//!                     ▼
//! ┌────────────────────────────────────────┐
//! │   driver (FAT32 over BlockIo, fake)    │
//! └────────────────────────────────────────┘
//! ```

use crate::config::BusConfig;

/// Driver-internal locator of a directory entry.
///
/// Stable for as long as the directory is not rewritten; reopening by
/// position never requires a rescan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DirPosition(pub u16);

impl DirPosition {
    pub const fn index(self) -> u16 {
        self.0
    }
}

/// Access mode for opened entries. Only reads are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    #[default]
    ReadOnly,
}

/// One open directory entry.
pub trait EntryHandle {
    /// Regular file (not a directory, not a volume label).
    fn is_file(&self) -> bool;

    fn is_hidden(&self) -> bool;

    /// Write the entry name into `buf` as NUL-terminated UTF-8.
    ///
    /// At most `buf.len() - 1` bytes are written, cut on a character
    /// boundary. Returns the name length without the terminator.
    fn name(&self, buf: &mut [u8]) -> usize;

    /// Position of this entry inside its parent directory.
    fn dir_index(&self) -> DirPosition;

    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// An open, navigable directory.
pub trait DirectoryHandle {
    type Entry: EntryHandle;

    fn is_open(&self) -> bool;

    /// Restart sequential traversal at the first entry.
    fn rewind(&mut self);

    /// Open the next file or subdirectory after the cursor.
    fn open_next(&mut self, mode: OpenMode) -> Option<Self::Entry>;

    /// Reopen the entry stored at `position`.
    fn open_at(&mut self, position: DirPosition, mode: OpenMode) -> Option<Self::Entry>;
}

/// The storage driver the explorer is built on.
pub trait StorageDriver {
    type Error: core::fmt::Display + core::fmt::Debug;
    type Dir: DirectoryHandle;

    /// Bring up the medium.
    fn begin(&mut self, bus: &BusConfig) -> Result<(), Self::Error>;

    /// Change the working directory. On failure the previous one stays.
    fn chdir(&mut self, path: &str) -> Result<(), Self::Error>;

    /// The current working directory.
    fn working_dir(&mut self) -> &mut Self::Dir;

    /// Human-readable listing of the working directory.
    fn list(&mut self, out: &mut dyn core::fmt::Write) -> Result<(), Self::Error>;
}

impl<D: StorageDriver + ?Sized> StorageDriver for &mut D {
    type Error = D::Error;
    type Dir = D::Dir;

    fn begin(&mut self, bus: &BusConfig) -> Result<(), Self::Error> {
        (**self).begin(bus)
    }

    fn chdir(&mut self, path: &str) -> Result<(), Self::Error> {
        (**self).chdir(path)
    }

    fn working_dir(&mut self) -> &mut Self::Dir {
        (**self).working_dir()
    }

    fn list(&mut self, out: &mut dyn core::fmt::Write) -> Result<(), Self::Error> {
        (**self).list(out)
    }
}
