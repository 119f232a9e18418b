//! Bounded-memory directory indexer for removable storage.
//!
//! Scans one directory, keeps the *positions* of the entries whose names end
//! with a filter suffix and resolves names again on demand. Built for menu
//! UIs that page through long file lists with a few hundred bytes of RAM:
//! the index costs two bytes per file, and no name is held longer than the
//! caller's own buffer.
//!
//! ```text
//!   DirectoryHandle ──scan──▶ PositionIndex ──resolve──▶ caller buffers
//!         ▲                                     │
//!         └──────────── open_at(position) ──────┘
//! ```
//!
//! The filesystem itself sits behind [`StorageDriver`] and
//! [`DirectoryHandle`]; `sdexplore-fat` provides a FAT32 implementation.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod driver;
pub mod error;
pub mod explorer;
pub mod filter;
pub mod index;
pub mod logger;
pub mod name;
pub mod resolve;
pub mod scan;


pub use config::{BusConfig, ExplorerConfig, DEFAULT_MAX_FILES, DEFAULT_MAX_NAME_LEN};
pub use driver::{DirPosition, DirectoryHandle, EntryHandle, OpenMode, StorageDriver};
pub use error::ExploreError;
pub use explorer::SdExplore;
pub use filter::matches_suffix;
pub use index::PositionIndex;
pub use logger::RingLogger;
pub use resolve::window_row;
