//! FAT32 directory traversal.
//!
//! A [`FatDir`] owns the block device and stands on one directory at a
//! time. Entries are addressed by their slot: the index of the 32-byte
//! short entry from the start of the directory, counted across the whole
//! cluster chain. Slots only change when the directory is rewritten.

use core::fmt::Write;

use gpt_disk_io::BlockIo;
use log::warn;
use sdexplore_core::{DirPosition, DirectoryHandle, EntryHandle, OpenMode};

use crate::context::{Fat32Context, SectorCache, SECTOR_SIZE};
use crate::error::FatError;
use crate::filename::{long_name_from_reversed, LfnAccumulator, LongName, MAX_LFN_SLOTS};
use crate::types::{DirEntry, LfnSlot, DIR_ENTRY_SIZE};

const ENTRIES_PER_SECTOR: u32 = (SECTOR_SIZE / DIR_ENTRY_SIZE) as u32;

/// FAT caps a directory at 65536 entries, so every slot fits a `u16`.
const MAX_SLOTS: u32 = u16::MAX as u32 + 1;

/// An entry of the current directory, with its long name already
/// assembled.
#[derive(Debug, Clone, Copy)]
pub struct FatEntry {
    position: DirPosition,
    entry: DirEntry,
    name: LongName,
}

impl FatEntry {
    pub fn is_dir(&self) -> bool {
        self.entry.is_directory()
    }

    /// First data cluster; 0 for empty files and for `..` pointing at root.
    pub fn first_cluster(&self) -> u32 {
        self.entry.first_cluster()
    }

    pub fn file_size(&self) -> u32 {
        self.entry.file_size
    }

    pub fn long_name(&self) -> &LongName {
        &self.name
    }

    /// Path component lookup: the long name or the 8.3 alias, ignoring
    /// ASCII case.
    pub fn matches(&self, component: &str) -> bool {
        self.name.eq_ignore_ascii_case(component)
            || LongName::from_short(&self.entry).eq_ignore_ascii_case(component)
    }
}

impl EntryHandle for FatEntry {
    fn is_file(&self) -> bool {
        !self.entry.is_directory()
    }

    fn is_hidden(&self) -> bool {
        self.entry.is_hidden()
    }

    fn name(&self, buf: &mut [u8]) -> usize {
        self.name.write_utf8(buf)
    }

    fn dir_index(&self) -> DirPosition {
        self.position
    }
}

pub struct FatDir<B: BlockIo> {
    block_io: B,
    ctx: Option<Fat32Context>,
    cache: SectorCache,
    first_cluster: u32,
    /// Next slot `next_entry` looks at.
    cursor: u32,
    /// Last resolved link of the chain: (index in chain, cluster).
    chain: (u32, u32),
    lfn: LfnAccumulator,
}

impl<B: BlockIo> FatDir<B> {
    pub fn new(block_io: B) -> Self {
        Self {
            block_io,
            ctx: None,
            cache: SectorCache::new(),
            first_cluster: 0,
            cursor: 0,
            chain: (0, 0),
            lfn: LfnAccumulator::new(),
        }
    }

    /// Read the boot sector at `partition_start` and stand on the root.
    pub fn mount(&mut self, partition_start: u64) -> Result<(), FatError> {
        self.ctx = None;
        self.cache.invalidate();
        let ctx = Fat32Context::read(&mut self.block_io, partition_start)?;
        self.ctx = Some(ctx);
        self.enter(ctx.root_cluster);
        Ok(())
    }

    pub fn context(&self) -> Option<&Fat32Context> {
        self.ctx.as_ref()
    }

    /// First cluster of the current directory.
    pub fn cluster(&self) -> u32 {
        self.first_cluster
    }

    pub fn is_root(&self) -> bool {
        self.ctx.is_some_and(|ctx| ctx.root_cluster == self.first_cluster)
    }

    /// Switch to the directory starting at `cluster`; 0 means the root.
    pub fn enter(&mut self, cluster: u32) {
        let cluster = match (cluster, self.ctx) {
            (0, Some(ctx)) => ctx.root_cluster,
            _ => cluster,
        };
        self.first_cluster = cluster;
        self.chain = (0, cluster);
        self.reset_cursor();
    }

    /// Forget cached sectors. Needed after the medium was written behind
    /// this handle.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
        self.chain = (0, self.first_cluster);
    }

    pub fn block_io(&mut self) -> &mut B {
        &mut self.block_io
    }

    pub fn into_block_io(self) -> B {
        self.block_io
    }

    fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.lfn.reset();
    }

    /// Cluster holding link `index` of the current chain, `None` past its end.
    fn cluster_at(&mut self, ctx: &Fat32Context, index: u32) -> Result<Option<u32>, FatError> {
        if index < self.chain.0 {
            self.chain = (0, self.first_cluster);
        }
        while self.chain.0 < index {
            match ctx.read_fat_entry(&mut self.block_io, &mut self.cache, self.chain.1)? {
                Some(next) => self.chain = (self.chain.0 + 1, next),
                None => return Ok(None),
            }
        }
        if !ctx.is_valid_cluster(self.chain.1) {
            return Err(FatError::CorruptChain(self.chain.1));
        }
        Ok(Some(self.chain.1))
    }

    /// Raw record at `slot`, `None` once the chain runs out.
    fn read_slot(&mut self, slot: u32) -> Result<Option<[u8; DIR_ENTRY_SIZE]>, FatError> {
        let ctx = self.ctx.ok_or(FatError::NotMounted)?;
        let per_cluster = ctx.entries_per_cluster();
        let Some(cluster) = self.cluster_at(&ctx, slot / per_cluster)? else {
            return Ok(None);
        };

        let within = slot % per_cluster;
        let lba = ctx.cluster_lba(cluster, within / ENTRIES_PER_SECTOR);
        let at = (within % ENTRIES_PER_SECTOR) as usize * DIR_ENTRY_SIZE;

        let data = self.cache.load(&mut self.block_io, lba)?;
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        raw.copy_from_slice(&data[at..at + DIR_ENTRY_SIZE]);
        Ok(Some(raw))
    }

    /// Next file or subdirectory after the cursor. Deleted slots, volume
    /// labels and the dot entries are passed over.
    pub fn next_entry(&mut self) -> Result<Option<FatEntry>, FatError> {
        while self.cursor < MAX_SLOTS {
            let slot = self.cursor;
            let Some(raw) = self.read_slot(slot)? else {
                return Ok(None);
            };
            let entry = DirEntry::parse(&raw);
            if entry.is_end() {
                return Ok(None);
            }
            self.cursor += 1;

            if entry.is_deleted() {
                self.lfn.reset();
                continue;
            }
            if entry.is_long_name() {
                self.lfn.push(&LfnSlot::parse(&raw));
                continue;
            }

            let long = self.lfn.finish(entry.checksum());
            if entry.is_volume_label() || entry.is_dot() {
                continue;
            }
            return Ok(Some(FatEntry {
                position: DirPosition(slot as u16),
                entry,
                name: long.unwrap_or_else(|| LongName::from_short(&entry)),
            }));
        }
        Ok(None)
    }

    /// Entry whose short record sits at `position`. Does not move the cursor.
    pub fn entry_at(&mut self, position: DirPosition) -> Result<Option<FatEntry>, FatError> {
        let slot = position.index() as u32;
        let Some(raw) = self.read_slot(slot)? else {
            return Ok(None);
        };
        let entry = DirEntry::parse(&raw);
        if entry.is_free() || entry.is_long_name() || entry.is_volume_label() || entry.is_dot() {
            return Ok(None);
        }

        let name = match self.long_name_before(slot, entry.checksum())? {
            Some(long) => long,
            None => LongName::from_short(&entry),
        };
        Ok(Some(FatEntry {
            position,
            entry,
            name,
        }))
    }

    /// Long name stored in the LFN slots right before `slot`.
    fn long_name_before(&mut self, slot: u32, checksum: u8) -> Result<Option<LongName>, FatError> {
        let mut slots = [LfnSlot::default(); MAX_LFN_SLOTS as usize];
        let mut count = 0;
        let mut at = slot;
        while at > 0 && count < slots.len() {
            at -= 1;
            let Some(raw) = self.read_slot(at)? else {
                break;
            };
            let prior = DirEntry::parse(&raw);
            if prior.is_free() || !prior.is_long_name() {
                break;
            }
            let lfn = LfnSlot::parse(&raw);
            slots[count] = lfn;
            count += 1;
            if lfn.is_last() {
                break;
            }
        }
        Ok(long_name_from_reversed(checksum, slots[..count].iter().copied()))
    }

    /// First cluster of the parent, read from the `..` entry. The root is
    /// its own parent.
    pub fn parent_cluster(&mut self) -> Result<u32, FatError> {
        let ctx = self.ctx.ok_or(FatError::NotMounted)?;
        if self.first_cluster == ctx.root_cluster {
            return Ok(ctx.root_cluster);
        }
        let dotdot = self
            .read_slot(1)?
            .map(|raw| DirEntry::parse(&raw))
            .filter(|entry| entry.name.starts_with(b"..") && entry.is_directory())
            .ok_or(FatError::NotFound)?;
        match dotdot.first_cluster() {
            0 => Ok(ctx.root_cluster),
            cluster => Ok(cluster),
        }
    }

    /// Look up `component` in the current directory. Leaves the cursor
    /// rewound.
    pub fn find(&mut self, component: &str) -> Result<Option<FatEntry>, FatError> {
        self.reset_cursor();
        let found = loop {
            match self.next_entry() {
                Ok(Some(entry)) if entry.matches(component) => break Ok(Some(entry)),
                Ok(Some(_)) => {}
                Ok(None) => break Ok(None),
                Err(e) => break Err(e),
            }
        };
        self.reset_cursor();
        found
    }

    /// One line per visible entry, directories suffixed with `/`.
    pub fn list(&mut self, out: &mut dyn Write) -> Result<(), FatError> {
        self.reset_cursor();
        let result = self.list_entries(out);
        self.reset_cursor();
        result
    }

    fn list_entries(&mut self, out: &mut dyn Write) -> Result<(), FatError> {
        while let Some(entry) = self.next_entry()? {
            if entry.is_hidden() {
                continue;
            }
            for c in entry.name.chars() {
                out.write_char(c)?;
            }
            if entry.is_dir() {
                out.write_char('/')?;
            }
            out.write_str("\r\n")?;
        }
        Ok(())
    }
}

impl<B: BlockIo> DirectoryHandle for FatDir<B> {
    type Entry = FatEntry;

    fn is_open(&self) -> bool {
        self.ctx.is_some()
    }

    fn rewind(&mut self) {
        self.reset_cursor();
    }

    fn open_next(&mut self, _mode: OpenMode) -> Option<FatEntry> {
        self.next_entry().unwrap_or_else(|e| {
            warn!("Directory read at slot {}: {}", self.cursor, e);
            None
        })
    }

    fn open_at(&mut self, position: DirPosition, _mode: OpenMode) -> Option<FatEntry> {
        self.entry_at(position).unwrap_or_else(|e| {
            warn!("Open slot {}: {}", position.index(), e);
            None
        })
    }
}
