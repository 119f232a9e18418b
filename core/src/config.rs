//! Compile-time defaults and per-instance configuration.
//!
//! The constants below are the defaults; every explorer can override the
//! file and name limits at construction through [`ExplorerConfig`].

/// How many matching files a scan indexes before it stops.
pub const DEFAULT_MAX_FILES: usize = 50;

/// Row width used for names, including the NUL terminator.
pub const DEFAULT_MAX_NAME_LEN: usize = 50;

/// Upper bound for any configured name length (stack scratch during scans).
pub const MAX_NAME_SCRATCH: usize = 256;

/// Bus clock ceiling handed to the driver when none is given.
pub const DEFAULT_MAX_CLOCK_MHZ: u8 = 10;

/// Path selected when `set_root` is called without one.
pub const DEFAULT_ROOT: &str = "/";

/// Limits of one explorer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplorerConfig {
    /// Capacity of the position index.
    pub max_files: usize,
    /// Name buffer size in bytes, terminator included.
    pub max_name_len: usize,
}

impl ExplorerConfig {
    pub const fn new(max_files: usize, max_name_len: usize) -> Self {
        Self {
            max_files,
            max_name_len: clamp_name_len(max_name_len),
        }
    }

    pub const fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub const fn with_max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = clamp_name_len(max_name_len);
        self
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILES, DEFAULT_MAX_NAME_LEN)
    }
}

const fn clamp_name_len(len: usize) -> usize {
    if len == 0 {
        1
    } else if len > MAX_NAME_SCRATCH {
        MAX_NAME_SCRATCH
    } else {
        len
    }
}

/// Storage bus parameters passed to the driver's `begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Chip-select line of the card.
    pub chip_select: u8,
    /// Bus clock ceiling in MHz.
    pub max_clock_mhz: u8,
}

impl BusConfig {
    pub const fn new(chip_select: u8) -> Self {
        Self {
            chip_select,
            max_clock_mhz: DEFAULT_MAX_CLOCK_MHZ,
        }
    }

    pub const fn with_max_clock_mhz(mut self, mhz: u8) -> Self {
        self.max_clock_mhz = mhz;
        self
    }
}
