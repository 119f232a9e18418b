//! Fixed-capacity index of directory positions.
//!
//! Allocated once at construction and never reallocated. A scan clears it
//! and appends positions in directory order until it is full; only the
//! first `len()` slots are ever read back.

use alloc::boxed::Box;
use alloc::vec;

use crate::driver::DirPosition;

pub struct PositionIndex {
    /// Backing storage, `capacity` slots.
    slots: Box<[DirPosition]>,
    /// Number of valid slots.
    len: usize,
}

impl PositionIndex {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![DirPosition::default(); capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Forget every position and zero the slots.
    pub fn clear(&mut self) {
        self.slots.fill(DirPosition::default());
        self.len = 0;
    }

    /// Append a position. Returns `false` when the index is full.
    pub fn push(&mut self, position: DirPosition) -> bool {
        if self.is_full() {
            return false;
        }
        self.slots[self.len] = position;
        self.len += 1;
        true
    }

    /// Position stored for `logical`, if it is within `[0, len)`.
    pub fn get(&self, logical: usize) -> Option<DirPosition> {
        self.as_slice().get(logical).copied()
    }

    pub fn as_slice(&self) -> &[DirPosition] {
        &self.slots[..self.len]
    }
}

impl core::fmt::Debug for PositionIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PositionIndex")
            .field("capacity", &self.capacity())
            .field("positions", &self.as_slice())
            .finish()
    }
}
