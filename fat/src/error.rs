//! FAT driver errors.

/// Everything that can go wrong between the block device and a directory
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatError {
    /// The block device reported a failure
    IoError,
    /// Only 512-byte sectors are supported
    UnsupportedSectorSize(u64),
    /// Boot sector signature or BPB fields are invalid
    InvalidBootSector,
    /// The volume is FAT12/FAT16 (fixed root directory)
    NotFat32,
    /// `begin` has not mounted the volume yet
    NotMounted,
    /// Path component does not exist
    NotFound,
    /// Path component exists but is a file
    NotADirectory,
    /// A cluster chain points outside the data area
    CorruptChain(u32),
    /// The listing sink refused output
    Output,
}

impl core::fmt::Display for FatError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IoError => write!(f, "Block device I/O error"),
            Self::UnsupportedSectorSize(size) => write!(f, "Unsupported sector size {}", size),
            Self::InvalidBootSector => write!(f, "Invalid FAT boot sector"),
            Self::NotFat32 => write!(f, "Volume is not FAT32"),
            Self::NotMounted => write!(f, "Volume not mounted"),
            Self::NotFound => write!(f, "No such file or directory"),
            Self::NotADirectory => write!(f, "Not a directory"),
            Self::CorruptChain(cluster) => write!(f, "Corrupt cluster chain at {:#x}", cluster),
            Self::Output => write!(f, "Listing output failed"),
        }
    }
}

impl From<core::fmt::Error> for FatError {
    fn from(_: core::fmt::Error) -> Self {
        Self::Output
    }
}
