//! In-memory block device and a small FAT32 image builder for tests.

use std::vec;
use std::vec::Vec;

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};

use crate::context::SECTOR_SIZE;
use crate::types::{
    short_name_checksum, LfnSlot, ATTR_ARCHIVE, ATTR_DIRECTORY, ATTR_HIDDEN, ATTR_VOLUME_ID,
    DIR_ENTRY_SIZE, LFN_CHARS_PER_SLOT, LFN_LAST_FLAG, NAME_DELETED, NT_LOWER_BASE,
    NT_LOWER_EXT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamDiskError {
    OutOfRange,
    Unaligned,
    Failed,
}

impl core::fmt::Display for RamDiskError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "LBA out of range"),
            Self::Unaligned => write!(f, "Buffer not a multiple of the sector size"),
            Self::Failed => write!(f, "Injected failure"),
        }
    }
}

/// Sector-addressed RAM disk with read accounting.
pub struct RamDisk {
    data: Vec<u8>,
    reads: usize,
    failing: bool,
}

impl RamDisk {
    pub fn new(sectors: usize) -> Self {
        Self {
            data: vec![0; sectors * SECTOR_SIZE],
            reads: 0,
            failing: false,
        }
    }

    pub fn sector_mut(&mut self, lba: u64) -> &mut [u8] {
        let start = lba as usize * SECTOR_SIZE;
        &mut self.data[start..start + SECTOR_SIZE]
    }

    /// Number of `read_blocks` calls so far.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Make every following read fail.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    fn range(&self, lba: Lba, len: usize) -> Result<core::ops::Range<usize>, RamDiskError> {
        if len % SECTOR_SIZE != 0 {
            return Err(RamDiskError::Unaligned);
        }
        let start = lba.0 as usize * SECTOR_SIZE;
        if start + len > self.data.len() {
            return Err(RamDiskError::OutOfRange);
        }
        Ok(start..start + len)
    }
}

impl BlockIo for RamDisk {
    type Error = RamDiskError;

    fn block_size(&self) -> BlockSize {
        BlockSize::BS_512
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok((self.data.len() / SECTOR_SIZE) as u64)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        self.reads += 1;
        if self.failing {
            return Err(RamDiskError::Failed);
        }
        let range = self.range(start_lba, dst.len())?;
        dst.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
        let range = self.range(start_lba, src.len())?;
        self.data[range].copy_from_slice(src);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

const TOTAL_SECTORS: u32 = 160;
const RESERVED_SECTORS: u32 = 32;
const FAT_SIZE: u32 = 1;
const NUM_FATS: u32 = 2;
const ROOT_CLUSTER: u32 = 2;
const DATA_START: u32 = RESERVED_SECTORS + NUM_FATS * FAT_SIZE;

/// FAT32 boot sector for the test geometry.
pub fn boot_sector(total_sectors: u32, spc: u8) -> [u8; SECTOR_SIZE] {
    let mut bs = [0u8; SECTOR_SIZE];

    bs[0] = 0xEB;
    bs[1] = 0x58;
    bs[2] = 0x90;
    bs[3..11].copy_from_slice(b"SDEXPLOR");

    bs[11..13].copy_from_slice(&512u16.to_le_bytes()); // Bytes per sector
    bs[13] = spc;
    bs[14..16].copy_from_slice(&(RESERVED_SECTORS as u16).to_le_bytes());
    bs[16] = NUM_FATS as u8;
    bs[21] = 0xF8; // Media type
    bs[24..26].copy_from_slice(&63u16.to_le_bytes()); // Sectors per track
    bs[26..28].copy_from_slice(&255u16.to_le_bytes()); // Number of heads
    bs[32..36].copy_from_slice(&total_sectors.to_le_bytes());

    bs[36..40].copy_from_slice(&FAT_SIZE.to_le_bytes());
    bs[44..48].copy_from_slice(&ROOT_CLUSTER.to_le_bytes());
    bs[48..50].copy_from_slice(&1u16.to_le_bytes()); // FSInfo sector
    bs[50..52].copy_from_slice(&6u16.to_le_bytes()); // Backup boot sector

    bs[64] = 0x80;
    bs[66] = 0x29;
    bs[67..71].copy_from_slice(&0x1234_5678u32.to_le_bytes());
    bs[71..82].copy_from_slice(b"NO NAME    ");
    bs[82..90].copy_from_slice(b"FAT32   ");

    bs[510] = 0x55;
    bs[511] = 0xAA;
    bs
}

/// Handle to a directory inside an [`ImageBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirId(usize);

pub const ROOT: DirId = DirId(0);

struct DirImage {
    clusters: Vec<u32>,
    used: u32,
}

/// Writes a FAT32 volume entry by entry, growing directories across
/// clusters as they fill.
pub struct ImageBuilder {
    disk: RamDisk,
    partition_start: u64,
    spc: u32,
    next_free: u32,
    next_alias: u32,
    dirs: Vec<DirImage>,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self::with_geometry(0, 1)
    }

    pub fn with_geometry(partition_start: u64, spc: u8) -> Self {
        let mut disk = RamDisk::new(partition_start as usize + TOTAL_SECTORS as usize);
        disk.sector_mut(partition_start)
            .copy_from_slice(&boot_sector(TOTAL_SECTORS, spc));

        let mut builder = Self {
            disk,
            partition_start,
            spc: spc as u32,
            next_free: ROOT_CLUSTER + 1,
            next_alias: 1,
            dirs: vec![DirImage {
                clusters: vec![ROOT_CLUSTER],
                used: 0,
            }],
        };
        builder.set_fat(0, 0x0FFF_FFF8);
        builder.set_fat(1, 0x0FFF_FFFF);
        builder.set_fat(ROOT_CLUSTER, 0x0FFF_FFFF);
        builder
    }

    /// Add a regular file. Returns the slot of its short entry.
    pub fn file(&mut self, dir: DirId, name: &str) -> u16 {
        self.named(dir, name, ATTR_ARCHIVE, 0)
    }

    pub fn hidden_file(&mut self, dir: DirId, name: &str) -> u16 {
        self.named(dir, name, ATTR_ARCHIVE | ATTR_HIDDEN, 0)
    }

    pub fn subdir(&mut self, parent: DirId, name: &str) -> DirId {
        let cluster = self.allocate();
        self.named(parent, name, ATTR_DIRECTORY, cluster);

        let id = DirId(self.dirs.len());
        self.dirs.push(DirImage {
            clusters: vec![cluster],
            used: 0,
        });
        let parent_cluster = if parent == ROOT {
            0
        } else {
            self.dirs[parent.0].clusters[0]
        };
        self.raw(id, short_entry(b".          ", ATTR_DIRECTORY, 0, cluster));
        self.raw(id, short_entry(b"..         ", ATTR_DIRECTORY, 0, parent_cluster));
        id
    }

    pub fn volume_label(&mut self, dir: DirId, label: &[u8; 11]) -> u16 {
        self.raw(dir, short_entry(label, ATTR_VOLUME_ID, 0, 0))
    }

    /// Mark the entry at `slot` deleted.
    pub fn delete(&mut self, dir: DirId, slot: u16) {
        let (lba, at) = self.slot_location(dir, slot as u32);
        self.disk.sector_mut(lba)[at] = NAME_DELETED;
    }

    /// Append a prebuilt 32-byte record.
    pub fn raw(&mut self, dir: DirId, record: [u8; DIR_ENTRY_SIZE]) -> u16 {
        let slot = self.dirs[dir.0].used;
        let per_cluster = self.spc * (SECTOR_SIZE / DIR_ENTRY_SIZE) as u32;
        while self.dirs[dir.0].clusters.len() as u32 <= slot / per_cluster {
            let next = self.allocate();
            let last = *self.dirs[dir.0].clusters.last().unwrap();
            self.set_fat(last, next);
            self.dirs[dir.0].clusters.push(next);
        }
        self.dirs[dir.0].used += 1;

        let (lba, at) = self.slot_location(dir, slot);
        self.disk.sector_mut(lba)[at..at + DIR_ENTRY_SIZE].copy_from_slice(&record);
        slot as u16
    }

    pub fn into_disk(self) -> RamDisk {
        self.disk
    }

    fn named(&mut self, dir: DirId, name: &str, attr: u8, cluster: u32) -> u16 {
        if let Some((short, nt)) = short_form(name) {
            return self.raw(dir, short_entry(&short, attr, nt, cluster));
        }
        let alias = self.alias(name);
        let checksum = short_name_checksum(&alias);
        for slot in lfn_slots(name, checksum) {
            self.raw(dir, slot.encode());
        }
        self.raw(dir, short_entry(&alias, attr, 0, cluster))
    }

    /// `BASE~N.EXT` alias for a long name.
    fn alias(&mut self, name: &str) -> [u8; 11] {
        let (base, ext) = split_ext(name);
        let tag = std::format!("~{}", self.next_alias);
        self.next_alias += 1;

        let mut alias = [b' '; 11];
        let stem: Vec<u8> = base
            .bytes()
            .filter(u8::is_ascii_alphanumeric)
            .map(|b| b.to_ascii_uppercase())
            .take(8 - tag.len())
            .collect();
        alias[..stem.len()].copy_from_slice(&stem);
        alias[stem.len()..stem.len() + tag.len()].copy_from_slice(tag.as_bytes());
        for (dst, b) in alias[8..]
            .iter_mut()
            .zip(ext.bytes().filter(u8::is_ascii_alphanumeric))
        {
            *dst = b.to_ascii_uppercase();
        }
        alias
    }

    fn allocate(&mut self) -> u32 {
        let cluster = self.next_free;
        self.next_free += 1;
        self.set_fat(cluster, 0x0FFF_FFFF);
        cluster
    }

    fn set_fat(&mut self, cluster: u32, value: u32) {
        let at = cluster as usize * 4;
        for fat in 0..NUM_FATS {
            let lba = self.partition_start + (RESERVED_SECTORS + fat * FAT_SIZE) as u64;
            self.disk.sector_mut(lba)[at..at + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    fn slot_location(&self, dir: DirId, slot: u32) -> (u64, usize) {
        let per_sector = (SECTOR_SIZE / DIR_ENTRY_SIZE) as u32;
        let per_cluster = self.spc * per_sector;
        let cluster = self.dirs[dir.0].clusters[(slot / per_cluster) as usize];
        let within = slot % per_cluster;
        let lba = self.partition_start
            + (DATA_START + (cluster - 2) * self.spc + within / per_sector) as u64;
        (lba, (within % per_sector) as usize * DIR_ENTRY_SIZE)
    }
}

pub fn short_entry(name: &[u8; 11], attr: u8, nt: u8, cluster: u32) -> [u8; DIR_ENTRY_SIZE] {
    let mut raw = [0u8; DIR_ENTRY_SIZE];
    raw[0..11].copy_from_slice(name);
    raw[11] = attr;
    raw[12] = nt;
    raw[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    raw[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
    raw
}

/// LFN slots for `name` in on-disk order.
pub fn lfn_slots(name: &str, checksum: u8) -> Vec<LfnSlot> {
    let mut units: Vec<u16> = name.encode_utf16().collect();
    if units.len() % LFN_CHARS_PER_SLOT != 0 {
        units.push(0);
    }
    while units.len() % LFN_CHARS_PER_SLOT != 0 {
        units.push(0xFFFF);
    }
    let count = units.len() / LFN_CHARS_PER_SLOT;
    (1..=count)
        .rev()
        .map(|ord| {
            let mut chunk = [0u16; LFN_CHARS_PER_SLOT];
            chunk.copy_from_slice(&units[(ord - 1) * LFN_CHARS_PER_SLOT..ord * LFN_CHARS_PER_SLOT]);
            let flag = if ord == count { LFN_LAST_FLAG } else { 0 };
            LfnSlot {
                sequence: ord as u8 | flag,
                checksum,
                units: chunk,
            }
        })
        .collect()
}

fn split_ext(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (base, ext),
        _ => (name, ""),
    }
}

/// 8.3 form of `name` with NT case flags, if it has one.
fn short_form(name: &str) -> Option<([u8; 11], u8)> {
    let (base, ext) = split_ext(name);
    let valid = |part: &str| {
        part.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    };
    if base.is_empty() || base.len() > 8 || ext.len() > 3 || !valid(base) || !valid(ext) {
        return None;
    }

    let mut nt = 0;
    for (part, flag) in [(base, NT_LOWER_BASE), (ext, NT_LOWER_EXT)] {
        let upper = part.bytes().any(|b| b.is_ascii_uppercase());
        let lower = part.bytes().any(|b| b.is_ascii_lowercase());
        match (upper, lower) {
            (true, true) => return None,
            (false, true) => nt |= flag,
            _ => {}
        }
    }

    let mut short = [b' '; 11];
    for (dst, b) in short[..8].iter_mut().zip(base.bytes()) {
        *dst = b.to_ascii_uppercase();
    }
    for (dst, b) in short[8..].iter_mut().zip(ext.bytes()) {
        *dst = b.to_ascii_uppercase();
    }
    Some((short, nt))
}

