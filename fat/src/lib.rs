//! Read-only FAT32 storage driver for `sdexplore-core`.
//!
//! Works on any [`gpt_disk_io::BlockIo`] device with 512-byte sectors: an
//! SD card behind an SPI block driver, a partition of a larger disk, or a
//! RAM image in tests.
//!
//! ```text
//!   SdExplore ──▶ FatVolume (StorageDriver) ──▶ FatDir (DirectoryHandle)
//!                                                   │
//!                               Fat32Context + SectorCache ──▶ BlockIo
//! ```
//!
//! Entry positions are slot indices of the 8.3 record inside the
//! directory, so long names are found again by walking the LFN slots that
//! precede it.

#![cfg_attr(not(test), no_std)]

pub mod context;
pub mod directory;
pub mod error;
pub mod filename;
pub mod types;
pub mod volume;

#[cfg(test)]
mod testing;

pub use context::{Fat32Context, SECTOR_SIZE};
pub use directory::{FatDir, FatEntry};
pub use error::FatError;
pub use filename::LongName;
pub use volume::FatVolume;
