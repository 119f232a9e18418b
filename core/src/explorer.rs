//! `SdExplore`: the driver, the index and the limits in one place.

use log::{debug, warn};

use crate::config::{BusConfig, ExplorerConfig, DEFAULT_ROOT};
use crate::driver::{DirPosition, DirectoryHandle, StorageDriver};
use crate::error::{ExploreError, Result};
use crate::index::PositionIndex;
use crate::resolve::{clear_window, resolve_name, resolve_window};
use crate::scan::scan_directory;

/// Scans one directory for files ending in a given suffix and hands their
/// names back by logical index, one at a time or as a window of rows.
///
/// Only directory positions are kept; names are read back from the medium
/// on every request.
pub struct SdExplore<D: StorageDriver> {
    driver: D,
    config: ExplorerConfig,
    index: PositionIndex,
    /// Set once a root has been selected successfully.
    root_selected: bool,
}

impl<D: StorageDriver> SdExplore<D> {
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, ExplorerConfig::default())
    }

    pub fn with_config(driver: D, config: ExplorerConfig) -> Self {
        Self {
            driver,
            index: PositionIndex::new(config.max_files),
            config,
            root_selected: false,
        }
    }

    /// Start the storage medium. Nothing else may be used after `false`.
    pub fn initialize(&mut self, bus: BusConfig) -> bool {
        debug!(
            "Initializing filesystem (cs {}, {} MHz)",
            bus.chip_select, bus.max_clock_mhz
        );
        match self.driver.begin(&bus) {
            Ok(()) => {
                debug!("Filesystem OK");
                true
            }
            Err(e) => {
                warn!("{}: {}", ExploreError::InitializationFailure, e);
                false
            }
        }
    }

    /// Make `path` (or `/`) the working directory for scans and lookups.
    ///
    /// On failure the previously selected directory stays in effect. The
    /// index is not touched; rescan after switching directories.
    pub fn set_root(&mut self, path: Option<&str>) -> bool {
        let path = match path {
            Some(p) if !p.is_empty() => p,
            _ => DEFAULT_ROOT,
        };
        match self.driver.chdir(path) {
            Ok(()) => {
                self.root_selected = true;
                debug!("Loaded directory {}", path);
                true
            }
            Err(e) => {
                warn!("{} {}: {}", ExploreError::RootUnavailable, path, e);
                false
            }
        }
    }

    /// Index the files of the working directory ending with `filter`.
    ///
    /// Returns how many were indexed, never more than `max_files`. Without
    /// an open working directory the index is emptied and 0 returned.
    pub fn scan(&mut self, filter: &str) -> usize {
        let max_name_len = self.config.max_name_len;
        let result = match open_dir(&mut self.driver, self.root_selected) {
            Ok(dir) => scan_directory(dir, filter.as_bytes(), &mut self.index, max_name_len),
            Err(e) => {
                self.index.clear();
                Err(e)
            }
        };
        match result {
            Ok(count) => count,
            Err(e) => {
                warn!("scan: {}", e);
                0
            }
        }
    }

    /// Write the name of logical entry `logical` into `out`.
    ///
    /// At most [`row_width`](Self::row_width) bytes of `out` are used, so
    /// the name matches the one the scan filtered and the window shows.
    /// `None` when `logical` is not below [`loaded_files`](Self::loaded_files);
    /// `out` is left as it was. `Some(0)` with an empty name when the entry
    /// could not be reopened.
    pub fn resolve_name(&mut self, logical: usize, out: &mut [u8]) -> Option<usize> {
        if logical >= self.index.len() {
            return None;
        }
        let limit = out.len().min(self.config.max_name_len);
        let result = match open_dir(&mut self.driver, self.root_selected) {
            Ok(dir) => resolve_name(dir, &self.index, logical, &mut out[..limit]),
            Err(e) => Err(e),
        };
        match result {
            Ok(len) => Some(len),
            Err(ExploreError::OutOfRangeIndex) => None,
            Err(e) => {
                debug!("resolve {}: {}", logical, e);
                crate::name::clear_name(out);
                Some(0)
            }
        }
    }

    /// Fill `rows` with the names around `center`, `radius` on each side.
    ///
    /// Rows are [`row_width`](Self::row_width) bytes each. Returns the
    /// number of rows written: `2 * radius + 1`, or 0 when nothing is
    /// indexed or `rows` is too short to hold them all. If the working
    /// directory has been closed since the scan, every row is empty.
    pub fn resolve_window(&mut self, center: usize, radius: usize, rows: &mut [u8]) -> usize {
        if self.index.is_empty() {
            return 0;
        }
        let row_width = self.config.max_name_len;
        let result = match open_dir(&mut self.driver, self.root_selected) {
            Ok(dir) => resolve_window(dir, &self.index, center, radius, rows, row_width),
            Err(e) => {
                debug!("window {}: {}", center, e);
                clear_window(radius, rows, row_width)
            }
        };
        match result {
            Ok(written) => written,
            Err(e) => {
                warn!("window {} radius {}: {}", center, radius, e);
                0
            }
        }
    }

    /// Raw listing of the working directory, straight from the driver.
    pub fn list_root_directory(
        &mut self,
        out: &mut dyn core::fmt::Write,
    ) -> core::result::Result<(), D::Error> {
        self.driver.list(out)
    }

    /// Files found by the last scan.
    pub fn loaded_files(&self) -> usize {
        self.index.len()
    }

    /// Directory positions found by the last scan, in scan order.
    pub fn positions(&self) -> &[DirPosition] {
        self.index.as_slice()
    }

    pub fn max_files(&self) -> usize {
        self.config.max_files
    }

    /// Width of one window row and size of a full name buffer.
    pub fn row_width(&self) -> usize {
        self.config.max_name_len
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }
}

/// The working directory, if a root was selected and it is open.
fn open_dir<D: StorageDriver>(driver: &mut D, root_selected: bool) -> Result<&mut D::Dir> {
    if !root_selected {
        return Err(ExploreError::DirectoryUnavailable);
    }
    let dir = driver.working_dir();
    if dir.is_open() {
        Ok(dir)
    } else {
        Err(ExploreError::DirectoryUnavailable)
    }
}
