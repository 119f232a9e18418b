//! [`StorageDriver`] over a FAT32 volume on any [`BlockIo`] device.

use gpt_disk_io::BlockIo;
use log::debug;
use sdexplore_core::{BusConfig, StorageDriver};

use crate::directory::FatDir;
use crate::error::FatError;

/// A FAT32 volume with one working directory.
///
/// The block device must already be usable; `begin` only mounts the
/// filesystem. Bus settings are for the device's owner and are logged,
/// not applied.
pub struct FatVolume<B: BlockIo> {
    dir: FatDir<B>,
    partition_start: u64,
}

impl<B: BlockIo> FatVolume<B> {
    /// Volume starting at LBA 0 (superfloppy layout, no partition table).
    pub fn new(block_io: B) -> Self {
        Self::with_partition_start(block_io, 0)
    }

    pub fn with_partition_start(block_io: B, partition_start: u64) -> Self {
        Self {
            dir: FatDir::new(block_io),
            partition_start,
        }
    }

    pub fn partition_start(&self) -> u64 {
        self.partition_start
    }

    pub fn is_mounted(&self) -> bool {
        self.dir.context().is_some()
    }

    pub fn into_block_io(self) -> B {
        self.dir.into_block_io()
    }

    fn walk(&mut self, path: &str) -> Result<(), FatError> {
        let ctx = *self.dir.context().ok_or(FatError::NotMounted)?;
        if path.starts_with('/') {
            self.dir.enter(ctx.root_cluster);
        }

        for component in path.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    let parent = self.dir.parent_cluster()?;
                    self.dir.enter(parent);
                }
                name => {
                    let entry = self.dir.find(name)?.ok_or(FatError::NotFound)?;
                    if !entry.is_dir() {
                        return Err(FatError::NotADirectory);
                    }
                    self.dir.enter(entry.first_cluster());
                }
            }
        }
        Ok(())
    }
}

impl<B: BlockIo> StorageDriver for FatVolume<B> {
    type Error = FatError;
    type Dir = FatDir<B>;

    fn begin(&mut self, bus: &BusConfig) -> Result<(), FatError> {
        debug!(
            "Mounting FAT32 at LBA {} (cs {}, {} MHz)",
            self.partition_start, bus.chip_select, bus.max_clock_mhz
        );
        self.dir.mount(self.partition_start)
    }

    /// Absolute paths start at the root, others at the working directory.
    /// Components match long or 8.3 names, ignoring ASCII case.
    fn chdir(&mut self, path: &str) -> Result<(), FatError> {
        let previous = self.dir.cluster();
        let result = self.walk(path);
        if result.is_err() && self.is_mounted() {
            self.dir.enter(previous);
        }
        result
    }

    fn working_dir(&mut self) -> &mut FatDir<B> {
        &mut self.dir
    }

    fn list(&mut self, out: &mut dyn core::fmt::Write) -> Result<(), FatError> {
        if !self.is_mounted() {
            return Err(FatError::NotMounted);
        }
        self.dir.list(out)
    }
}
