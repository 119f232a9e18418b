//! Entry names: 8.3 short names and UCS-2 long names.
//!
//! Names are kept as UCS-2 code units, exactly as stored, and only turned
//! into UTF-8 when copied out into a caller buffer.

use crate::types::{
    DirEntry, LfnSlot, LFN_CHARS_PER_SLOT, NAME_KANJI_E5, NT_LOWER_BASE, NT_LOWER_EXT,
};

/// Longest long name FAT allows, in UCS-2 units.
pub const MAX_LFN_UNITS: usize = 255;

/// Most LFN slots a single name can use.
pub const MAX_LFN_SLOTS: u8 = 20;

#[derive(Clone, Copy)]
pub struct LongName {
    units: [u16; MAX_LFN_UNITS],
    len: u8,
}

impl Default for LongName {
    fn default() -> Self {
        Self::new()
    }
}

impl LongName {
    pub const fn new() -> Self {
        Self {
            units: [0; MAX_LFN_UNITS],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn units(&self) -> &[u16] {
        &self.units[..self.len()]
    }

    /// Display form of an 8.3 entry: `BASE.EXT`, lower-cased where the NT
    /// flags ask for it, extension dot only if there is an extension.
    pub fn from_short(entry: &DirEntry) -> Self {
        let mut name = Self::new();
        let lower_base = entry.nt_flags & NT_LOWER_BASE != 0;
        let lower_ext = entry.nt_flags & NT_LOWER_EXT != 0;

        let base = trim_spaces(&entry.name[..8]);
        let ext = trim_spaces(&entry.name[8..]);

        for (i, &b) in base.iter().enumerate() {
            let b = if i == 0 && b == NAME_KANJI_E5 { 0xE5 } else { b };
            name.push(short_char(b, lower_base));
        }
        if !ext.is_empty() {
            name.push(b'.' as u16);
            for &b in ext {
                name.push(short_char(b, lower_ext));
            }
        }
        name
    }

    fn push(&mut self, unit: u16) {
        if self.len() < MAX_LFN_UNITS {
            self.units[self.len()] = unit;
            self.len += 1;
        }
    }

    /// Characters, with unpaired surrogates replaced by U+FFFD.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        char::decode_utf16(self.units().iter().copied())
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Copy as NUL-terminated UTF-8 into `buf`, stopping before any
    /// character that would not fit. Returns the bytes written.
    pub fn write_utf8(&self, buf: &mut [u8]) -> usize {
        let Some(room) = buf.len().checked_sub(1) else {
            return 0;
        };
        let mut used = 0;
        for c in self.chars() {
            let width = c.len_utf8();
            if used + width > room {
                break;
            }
            c.encode_utf8(&mut buf[used..used + width]);
            used += width;
        }
        buf[used] = 0;
        used
    }

    /// Case-insensitive (ASCII only) comparison with a path component.
    pub fn eq_ignore_ascii_case(&self, other: &str) -> bool {
        let mut mine = self.chars();
        let mut theirs = other.chars();
        loop {
            match (mine.next(), theirs.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.eq_ignore_ascii_case(&b) => {}
                _ => return false,
            }
        }
    }

    fn place(&mut self, ordinal: u8, units: &[u16; LFN_CHARS_PER_SLOT]) {
        let start = (ordinal as usize - 1) * LFN_CHARS_PER_SLOT;
        for (i, &unit) in units.iter().enumerate() {
            if let Some(slot) = self.units.get_mut(start + i) {
                *slot = unit;
            }
        }
    }

    /// Fix the length once every slot up to `slots` has been placed: the
    /// name ends at the first 0x0000 unit or after the last slot.
    fn seal(&mut self, slots: u8) {
        let span = (slots as usize * LFN_CHARS_PER_SLOT).min(MAX_LFN_UNITS);
        let len = self.units[..span]
            .iter()
            .position(|&u| u == 0)
            .unwrap_or(span);
        self.len = len as u8;
    }
}

impl core::fmt::Debug for LongName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use core::fmt::Write;
        f.write_char('"')?;
        for c in self.chars() {
            f.write_char(c)?;
        }
        f.write_char('"')
    }
}

fn trim_spaces(field: &[u8]) -> &[u8] {
    let end = field.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    &field[..end]
}

fn short_char(b: u8, lower: bool) -> u16 {
    match b {
        0x80..=0xFF => b'?' as u16,
        _ if lower => b.to_ascii_lowercase() as u16,
        _ => b as u16,
    }
}

/// Collects LFN slots met in directory order (highest ordinal first) until
/// the short entry they belong to shows up.
#[derive(Debug, Default)]
pub struct LfnAccumulator {
    name: LongName,
    checksum: u8,
    /// Slot count announced by the first slot; 0 when idle.
    total: u8,
    /// Ordinal expected next; 0 once complete.
    awaiting: u8,
}

impl LfnAccumulator {
    pub const fn new() -> Self {
        Self {
            name: LongName::new(),
            checksum: 0,
            total: 0,
            awaiting: 0,
        }
    }

    pub fn reset(&mut self) {
        self.total = 0;
        self.awaiting = 0;
    }

    pub fn push(&mut self, slot: &LfnSlot) {
        let ordinal = slot.ordinal();
        if slot.is_last() {
            if ordinal == 0 || ordinal > MAX_LFN_SLOTS {
                self.reset();
                return;
            }
            self.checksum = slot.checksum;
            self.total = ordinal;
            self.awaiting = ordinal;
        } else if self.awaiting == 0 || ordinal != self.awaiting || slot.checksum != self.checksum
        {
            self.reset();
            return;
        }

        self.name.place(ordinal, &slot.units);
        self.awaiting -= 1;
    }

    /// Long name for the short entry with `checksum`, if a complete and
    /// matching sequence preceded it. Resets the accumulator either way.
    pub fn finish(&mut self, checksum: u8) -> Option<LongName> {
        let complete = self.total > 0 && self.awaiting == 0 && self.checksum == checksum;
        let total = self.total;
        self.reset();
        if !complete {
            return None;
        }
        self.name.seal(total);
        Some(self.name)
    }
}

/// Rebuild a long name from slots read backwards from the short entry:
/// `slots` yields ordinal 1 first. `None` as soon as the chain breaks.
pub fn long_name_from_reversed<I>(checksum: u8, slots: I) -> Option<LongName>
where
    I: IntoIterator<Item = LfnSlot>,
{
    let mut name = LongName::new();
    let mut expected = 1u8;
    for slot in slots {
        if slot.ordinal() != expected || slot.checksum != checksum {
            return None;
        }
        name.place(expected, &slot.units);
        if slot.is_last() {
            name.seal(expected);
            return Some(name);
        }
        if expected == MAX_LFN_SLOTS {
            return None;
        }
        expected += 1;
    }
    None
}
