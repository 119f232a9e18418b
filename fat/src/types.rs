//! On-disk directory records.

pub const DIR_ENTRY_SIZE: usize = 32;

pub const ATTR_READ_ONLY: u8 = 0x01;
pub const ATTR_HIDDEN: u8 = 0x02;
pub const ATTR_SYSTEM: u8 = 0x04;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
pub const ATTR_LONG_NAME: u8 = ATTR_READ_ONLY | ATTR_HIDDEN | ATTR_SYSTEM | ATTR_VOLUME_ID;

/// First name byte of a deleted entry.
pub const NAME_DELETED: u8 = 0xE5;
/// First name byte of the slot after the last entry.
pub const NAME_END: u8 = 0x00;
/// Stands in for a real 0xE5 first character.
pub const NAME_KANJI_E5: u8 = 0x05;

/// NT reserved byte: base name stored upper, display lower.
pub const NT_LOWER_BASE: u8 = 0x08;
/// NT reserved byte: extension stored upper, display lower.
pub const NT_LOWER_EXT: u8 = 0x10;

/// Long name characters carried by one LFN slot.
pub const LFN_CHARS_PER_SLOT: usize = 13;
/// Ordinal bit marking the physically first (logically last) LFN slot.
pub const LFN_LAST_FLAG: u8 = 0x40;

/// 8.3 directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub name: [u8; 11],
    pub attr: u8,
    pub nt_flags: u8,
    pub first_cluster_hi: u16,
    pub first_cluster_lo: u16,
    pub file_size: u32,
}

impl DirEntry {
    pub fn parse(raw: &[u8; DIR_ENTRY_SIZE]) -> Self {
        let mut name = [0u8; 11];
        name.copy_from_slice(&raw[0..11]);
        Self {
            name,
            attr: raw[11],
            nt_flags: raw[12],
            first_cluster_hi: u16::from_le_bytes([raw[20], raw[21]]),
            first_cluster_lo: u16::from_le_bytes([raw[26], raw[27]]),
            file_size: u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        }
    }

    /// Slot is the end-of-directory marker.
    pub fn is_end(&self) -> bool {
        self.name[0] == NAME_END
    }

    pub fn is_deleted(&self) -> bool {
        self.name[0] == NAME_DELETED
    }

    pub fn is_free(&self) -> bool {
        self.is_end() || self.is_deleted()
    }

    pub fn is_long_name(&self) -> bool {
        self.attr & 0x3F == ATTR_LONG_NAME
    }

    pub fn is_volume_label(&self) -> bool {
        !self.is_long_name() && self.attr & ATTR_VOLUME_ID != 0
    }

    /// `.` or `..`
    pub fn is_dot(&self) -> bool {
        self.name[0] == b'.'
    }

    pub fn is_directory(&self) -> bool {
        self.attr & ATTR_DIRECTORY != 0
    }

    pub fn is_hidden(&self) -> bool {
        self.attr & ATTR_HIDDEN != 0
    }

    pub fn first_cluster(&self) -> u32 {
        ((self.first_cluster_hi as u32) << 16) | self.first_cluster_lo as u32
    }

    pub fn checksum(&self) -> u8 {
        short_name_checksum(&self.name)
    }
}

/// Checksum binding LFN slots to their short entry.
pub fn short_name_checksum(name: &[u8; 11]) -> u8 {
    name.iter()
        .fold(0u8, |sum, &c| (sum >> 1).wrapping_add(sum << 7).wrapping_add(c))
}

/// One long-file-name slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LfnSlot {
    pub sequence: u8,
    pub checksum: u8,
    pub units: [u16; LFN_CHARS_PER_SLOT],
}

impl LfnSlot {
    /// Byte offsets of the 13 UCS-2 characters inside the slot.
    const UNIT_OFFSETS: [usize; LFN_CHARS_PER_SLOT] =
        [1, 3, 5, 7, 9, 14, 16, 18, 20, 22, 24, 28, 30];

    pub fn parse(raw: &[u8; DIR_ENTRY_SIZE]) -> Self {
        let mut units = [0u16; LFN_CHARS_PER_SLOT];
        for (unit, &off) in units.iter_mut().zip(Self::UNIT_OFFSETS.iter()) {
            *unit = u16::from_le_bytes([raw[off], raw[off + 1]]);
        }
        Self {
            sequence: raw[0],
            checksum: raw[13],
            units,
        }
    }

    pub fn ordinal(&self) -> u8 {
        self.sequence & 0x1F
    }

    pub fn is_last(&self) -> bool {
        self.sequence & LFN_LAST_FLAG != 0
    }

    #[cfg(test)]
    pub fn encode(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        raw[0] = self.sequence;
        raw[11] = ATTR_LONG_NAME;
        raw[13] = self.checksum;
        for (unit, &off) in self.units.iter().zip(Self::UNIT_OFFSETS.iter()) {
            raw[off..off + 2].copy_from_slice(&unit.to_le_bytes());
        }
        raw
    }
}
