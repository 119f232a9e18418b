//! Volume geometry from the FAT32 boot sector, plus a one-sector cache.

use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;
use log::{debug, trace};

use crate::error::FatError;

pub const SECTOR_SIZE: usize = 512;

/// FAT entries at or above this value terminate a chain.
pub const END_OF_CHAIN: u32 = 0x0FFF_FFF8;
/// FAT32 uses the low 28 bits of each entry.
pub const CLUSTER_MASK: u32 = 0x0FFF_FFFF;

/// Geometry needed to walk directories. Sector numbers are relative to the
/// start of the partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fat32Context {
    pub partition_start: u64,
    pub sectors_per_cluster: u32,
    pub reserved_sectors: u32,
    pub num_fats: u32,
    pub fat_size: u32,
    pub root_cluster: u32,
    pub data_start: u32,
    /// Number of data clusters; valid cluster numbers are `2..cluster_count + 2`.
    pub cluster_count: u32,
}

impl Fat32Context {
    /// Parse and validate a boot sector.
    pub fn from_boot_sector(
        sector: &[u8; SECTOR_SIZE],
        partition_start: u64,
    ) -> Result<Self, FatError> {
        if sector[510] != 0x55 || sector[511] != 0xAA {
            return Err(FatError::InvalidBootSector);
        }

        let bytes_per_sector = u16::from_le_bytes([sector[11], sector[12]]);
        if bytes_per_sector as usize != SECTOR_SIZE {
            return Err(FatError::UnsupportedSectorSize(bytes_per_sector as u64));
        }

        let sectors_per_cluster = sector[13] as u32;
        if sectors_per_cluster == 0 || !sectors_per_cluster.is_power_of_two() {
            return Err(FatError::InvalidBootSector);
        }

        let reserved_sectors = u16::from_le_bytes([sector[14], sector[15]]) as u32;
        let num_fats = sector[16] as u32;
        let root_entries = u16::from_le_bytes([sector[17], sector[18]]);
        let total_sectors_16 = u16::from_le_bytes([sector[19], sector[20]]) as u32;
        let fat_size_16 = u16::from_le_bytes([sector[22], sector[23]]);
        let total_sectors_32 =
            u32::from_le_bytes([sector[32], sector[33], sector[34], sector[35]]);
        let fat_size = u32::from_le_bytes([sector[36], sector[37], sector[38], sector[39]]);
        let root_cluster = u32::from_le_bytes([sector[44], sector[45], sector[46], sector[47]]);

        // FAT12/16 keep a fixed root directory and a 16-bit FAT size
        if root_entries != 0 || fat_size_16 != 0 {
            return Err(FatError::NotFat32);
        }
        if reserved_sectors == 0 || num_fats == 0 || fat_size == 0 || root_cluster < 2 {
            return Err(FatError::InvalidBootSector);
        }

        let total_sectors = if total_sectors_16 != 0 {
            total_sectors_16
        } else {
            total_sectors_32
        };
        let data_start = num_fats
            .checked_mul(fat_size)
            .and_then(|fats| fats.checked_add(reserved_sectors))
            .ok_or(FatError::InvalidBootSector)?;
        let data_sectors = total_sectors
            .checked_sub(data_start)
            .ok_or(FatError::InvalidBootSector)?;
        let cluster_count = data_sectors / sectors_per_cluster;

        let ctx = Self {
            partition_start,
            sectors_per_cluster,
            reserved_sectors,
            num_fats,
            fat_size,
            root_cluster,
            data_start,
            cluster_count,
        };
        if !ctx.is_valid_cluster(root_cluster) {
            return Err(FatError::InvalidBootSector);
        }
        Ok(ctx)
    }

    /// Read the boot sector at `partition_start` and parse it.
    pub fn read<B: BlockIo>(block_io: &mut B, partition_start: u64) -> Result<Self, FatError> {
        let block_size = block_io.block_size().to_u64();
        if block_size != SECTOR_SIZE as u64 {
            return Err(FatError::UnsupportedSectorSize(block_size));
        }

        let mut sector = [0u8; SECTOR_SIZE];
        block_io
            .read_blocks(Lba(partition_start), &mut sector)
            .map_err(|_| FatError::IoError)?;
        let ctx = Self::from_boot_sector(&sector, partition_start)?;
        debug!(
            "FAT32: {} clusters of {} sectors, root cluster {}",
            ctx.cluster_count, ctx.sectors_per_cluster, ctx.root_cluster
        );
        Ok(ctx)
    }

    pub fn is_valid_cluster(&self, cluster: u32) -> bool {
        cluster >= 2 && cluster - 2 < self.cluster_count
    }

    /// First sector of `cluster`, relative to the partition.
    pub fn cluster_to_sector(&self, cluster: u32) -> u32 {
        self.data_start + (cluster - 2) * self.sectors_per_cluster
    }

    /// Absolute LBA of sector `offset` within `cluster`.
    pub fn cluster_lba(&self, cluster: u32, offset: u32) -> u64 {
        self.partition_start + self.cluster_to_sector(cluster) as u64 + offset as u64
    }

    pub fn entries_per_cluster(&self) -> u32 {
        self.sectors_per_cluster * (SECTOR_SIZE / crate::types::DIR_ENTRY_SIZE) as u32
    }

    /// Successor of `cluster` in the first FAT, `None` at end of chain.
    pub fn read_fat_entry<B: BlockIo>(
        &self,
        block_io: &mut B,
        cache: &mut SectorCache,
        cluster: u32,
    ) -> Result<Option<u32>, FatError> {
        if !self.is_valid_cluster(cluster) {
            return Err(FatError::CorruptChain(cluster));
        }
        let fat_offset = cluster as u64 * 4;
        let lba = self.partition_start
            + self.reserved_sectors as u64
            + fat_offset / SECTOR_SIZE as u64;
        let at = (fat_offset % SECTOR_SIZE as u64) as usize;

        let data = cache.load(block_io, lba)?;
        let next = u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
            & CLUSTER_MASK;
        trace!("FAT[{}] = {:#x}", cluster, next);

        if next >= END_OF_CHAIN {
            Ok(None)
        } else if self.is_valid_cluster(next) {
            Ok(Some(next))
        } else {
            Err(FatError::CorruptChain(cluster))
        }
    }
}

/// Last sector read from the device.
///
/// Directory walks touch the same sector for sixteen entries in a row and
/// the same FAT sector for long stretches of a chain.
pub struct SectorCache {
    lba: Option<u64>,
    data: [u8; SECTOR_SIZE],
}

impl Default for SectorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SectorCache {
    pub const fn new() -> Self {
        Self {
            lba: None,
            data: [0; SECTOR_SIZE],
        }
    }

    pub fn invalidate(&mut self) {
        self.lba = None;
    }

    pub fn load<B: BlockIo>(
        &mut self,
        block_io: &mut B,
        lba: u64,
    ) -> Result<&[u8; SECTOR_SIZE], FatError> {
        if self.lba != Some(lba) {
            self.lba = None;
            block_io
                .read_blocks(Lba(lba), &mut self.data)
                .map_err(|_| FatError::IoError)?;
            self.lba = Some(lba);
        }
        Ok(&self.data)
    }
}
