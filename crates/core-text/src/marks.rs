//! Mark table: positions in a buffer that track edits around them instead of going stale.
//!
//! Two reference kinds, mirroring `original_source/state_types.hpp`:
//!
//! - [`MarkId`] ("strong") must be explicitly released with [`MarkTable::release`]. Using
//!   one after release, or one minted by a different table generation, is a logic error.
//! - [`WeakMarkId`] is version-stamped and degrades gracefully: [`MarkTable::get_weak`]
//!   returns `None` once the underlying slot has been released and reused, rather than
//!   panicking. Weak ids exist so the undo log can refer to marks without keeping them
//!   alive forever (see `core-state`'s undo engine, which stores `mark_adjustments` as
//!   `(WeakMarkId, usize)` pairs).
//!
//! Avoiding cyclic ownership (buffer -> mark -> buffer) is the entire reason this is a
//! flat table indexed by integer handles rather than, say, `Rc<Cell<usize>>`.

use crate::error::RuntimeCheckFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkId {
    index: usize,
    version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeakMarkId {
    index: usize,
    version: u64,
}

struct Slot {
    offset: usize,
    version: u64,
    occupied: bool,
}

/// Owns the mark offsets for one buffer.
#[derive(Default)]
pub struct MarkTable {
    slots: Vec<Slot>,
    free: Vec<usize>,
    next_version: u64,
}

impl MarkTable {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            next_version: 1,
        }
    }

    /// Mints a new strong mark at `offset`. Must be matched with [`release`](Self::release).
    pub fn issue(&mut self, offset: usize) -> MarkId {
        let version = self.next_version;
        self.next_version += 1;
        if let Some(index) = self.free.pop() {
            self.slots[index] = Slot {
                offset,
                version,
                occupied: true,
            };
            MarkId { index, version }
        } else {
            let index = self.slots.len();
            self.slots.push(Slot {
                offset,
                version,
                occupied: true,
            });
            MarkId { index, version }
        }
    }

    /// Releases a strong mark, freeing its slot for reuse. Any weak id referring to the
    /// same slot will subsequently report stale via [`get_weak`](Self::get_weak), since the
    /// slot's version changes on reuse.
    pub fn release(&mut self, id: MarkId) -> anyhow::Result<()> {
        let slot = self.slot(id.index)?;
        crate::logic_checkg!(slot.occupied && slot.version == id.version);
        slot.occupied = false;
        self.free.push(id.index);
        Ok(())
    }

    pub fn downgrade(&self, id: MarkId) -> WeakMarkId {
        WeakMarkId {
            index: id.index,
            version: id.version,
        }
    }

    pub fn get(&self, id: MarkId) -> anyhow::Result<usize> {
        let slot = self.slot_ref(id.index)?;
        crate::logic_checkg!(slot.occupied && slot.version == id.version);
        Ok(slot.offset)
    }

    /// `None` if the slot has since been released (and possibly reused by another mark).
    pub fn get_weak(&self, id: WeakMarkId) -> Option<usize> {
        let slot = self.slots.get(id.index)?;
        if slot.occupied && slot.version == id.version {
            Some(slot.offset)
        } else {
            None
        }
    }

    pub fn set(&mut self, id: MarkId, offset: usize) -> anyhow::Result<()> {
        let slot = self.slot(id.index)?;
        crate::logic_checkg!(slot.occupied && slot.version == id.version);
        slot.offset = offset;
        Ok(())
    }

    /// Adjusts every occupied mark whose offset is strictly greater than `at` by `delta`
    /// (insertion), or per `shrink` (deletion). See [`adjust_for_insert`] and
    /// [`adjust_for_delete_range`] for the two callers; kept here so both can share the
    /// "walk all slots" loop.
    fn for_each_occupied_offset_mut(&mut self, mut f: impl FnMut(&mut usize)) {
        for slot in &mut self.slots {
            if slot.occupied {
                f(&mut slot.offset);
            }
        }
    }

    /// Shifts marks for an insertion of `count` bytes at `at`. A mark exactly at `at`
    /// does not move -- only marks strictly after it do. Grounded on
    /// `original_source/buffer.cpp::insert_chars`'s
    /// `*buf->mark += (*buf->mark > og_cursor ? count : 0)`.
    pub fn adjust_for_insert(&mut self, at: usize, count: usize) {
        self.for_each_occupied_offset_mut(|offset| {
            if *offset > at {
                *offset += count;
            }
        });
    }

    /// Shifts marks for a deletion of `[range_beg, range_end)`. Marks inside the deleted
    /// range collapse to `range_beg`; marks after it shift left by the deleted length.
    /// Grounded on `original_source/buffer.cpp::update_offset_for_delete_range`.
    pub fn adjust_for_delete_range(&mut self, range_beg: usize, range_end: usize) {
        let len = range_end - range_beg;
        self.for_each_occupied_offset_mut(|offset| {
            if *offset > range_end {
                *offset -= len;
            } else if *offset > range_beg {
                *offset = range_beg;
            }
        });
    }

    fn slot(&mut self, index: usize) -> anyhow::Result<&mut Slot> {
        self.slots
            .get_mut(index)
            .ok_or_else(|| anyhow::Error::new(RuntimeCheckFailure("mark index out of range".to_string())))
    }

    fn slot_ref(&self, index: usize) -> anyhow::Result<&Slot> {
        self.slots
            .get(index)
            .ok_or_else(|| anyhow::Error::new(RuntimeCheckFailure("mark index out of range".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_get_set_roundtrip() {
        let mut table = MarkTable::new();
        let id = table.issue(5);
        assert_eq!(table.get(id).unwrap(), 5);
        table.set(id, 9).unwrap();
        assert_eq!(table.get(id).unwrap(), 9);
    }

    #[test]
    fn released_strong_mark_is_rejected() {
        let mut table = MarkTable::new();
        let id = table.issue(5);
        table.release(id).unwrap();
        assert!(table.get(id).is_err());
    }

    #[test]
    fn weak_mark_goes_stale_after_release_and_reuse() {
        let mut table = MarkTable::new();
        let id = table.issue(5);
        let weak = table.downgrade(id);
        assert_eq!(table.get_weak(weak), Some(5));
        table.release(id).unwrap();
        assert_eq!(table.get_weak(weak), None);
        let _reused = table.issue(7);
        assert_eq!(table.get_weak(weak), None);
    }

    #[test]
    fn insert_strictly_after_mark_shifts_it_insert_at_mark_does_not() {
        let mut table = MarkTable::new();
        let at_five = table.issue(5);
        let at_ten = table.issue(10);
        table.adjust_for_insert(5, 3);
        assert_eq!(table.get(at_five).unwrap(), 5, "mark at insertion point does not move");
        assert_eq!(table.get(at_ten).unwrap(), 13, "mark after insertion point shifts");
    }

    #[test]
    fn delete_range_collapses_interior_marks_and_shifts_trailing_ones() {
        let mut table = MarkTable::new();
        let inside = table.issue(7);
        let after = table.issue(20);
        let before = table.issue(2);
        table.adjust_for_delete_range(5, 15);
        assert_eq!(table.get(before).unwrap(), 2);
        assert_eq!(table.get(inside).unwrap(), 5);
        assert_eq!(table.get(after).unwrap(), 10);
    }
}
