//! The split-sequence text buffer: a gap-buffer-shaped pair of byte vectors with
//! incrementally maintained [`RegionStats`], a mark table, and the cursor/virtual-column
//! bookkeeping that movement (up/down) depends on.
//!
//! Grounded on `original_source/state.hpp` (buffer fields) and `original_source/buffer.cpp`
//! (`insert_chars`, `delete_left`, `delete_right`, `move_right_by`, `move_left_by`,
//! `update_offset_for_delete_range`).

use std::path::PathBuf;

use crate::marks::{MarkId, MarkTable, WeakMarkId};
use crate::region_stats::{self, RegionStats};

/// Process-unique, never-reused buffer handle. Minted by `core-state::State`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowSize {
    pub rows: u32,
    pub cols: u32,
}

/// Which side of an edit's position the edit's effect lies on. An insertion "on the left"
/// is the ordinary case (cursor ends up after the inserted text); `Side::Right` is used
/// when replaying a mountain-branch insert without moving the cursor across it (see
/// `core-state`'s undo engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct InsertResult {
    pub inserted_text: Vec<u8>,
    pub new_cursor: usize,
    pub side: Side,
}

#[derive(Debug, Clone)]
pub struct DeleteResult {
    pub deleted_text: Vec<u8>,
    pub new_cursor: usize,
    pub side: Side,
    /// Marks that fell inside the deleted range, recorded so undo can restore their exact
    /// relative position on re-insertion. Pair is (mark, offset into `deleted_text`).
    pub squeezed_marks: Vec<(WeakMarkId, usize)>,
    pub error_message: Option<&'static str>,
}

pub struct Buffer {
    id: BufferId,
    pub name_str: String,
    pub name_number: u64,
    pub married_file: Option<PathBuf>,

    bef: Vec<u8>,
    aft: Vec<u8>,
    bef_stats: RegionStats,
    aft_stats: RegionStats,

    marks: MarkTable,
    mark: Option<MarkId>,

    /// Column the cursor "wants" to stay at while moving through shorter lines via
    /// up/down. Cleared whenever the cursor moves other than via up/down.
    pub virtual_column: Option<usize>,
    pub window: WindowSize,
    pub first_visible_offset: usize,
}

impl Buffer {
    pub fn new(id: BufferId) -> Self {
        Self::from_data(id, Vec::new())
    }

    pub fn from_data(id: BufferId, data: Vec<u8>) -> Self {
        let aft_stats = region_stats::compute_stats(&data);
        Buffer {
            id,
            name_str: String::new(),
            name_number: 0,
            married_file: None,
            bef: Vec::new(),
            aft: data,
            bef_stats: RegionStats::default(),
            aft_stats,
            marks: MarkTable::new(),
            mark: None,
            virtual_column: None,
            window: WindowSize::default(),
            first_visible_offset: 0,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Reassigns this buffer's id. Used only by `core-state::State` when adopting a
    /// buffer constructed before its final id was minted.
    pub fn set_id(&mut self, id: BufferId) {
        self.id = id;
    }

    pub fn cursor(&self) -> usize {
        self.bef.len()
    }

    pub fn size(&self) -> usize {
        self.bef.len() + self.aft.len()
    }

    pub fn get(&self, i: usize) -> u8 {
        if i < self.bef.len() {
            self.bef[i]
        } else {
            self.aft[i - self.bef.len()]
        }
    }

    pub fn copy_substr(&self, beg: usize, end: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(end - beg);
        for i in beg..end {
            out.push(self.get(i));
        }
        out
    }

    pub fn copy_to_string(&self) -> String {
        let bytes = self.copy_substr(0, self.size());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn set_window(&mut self, window: WindowSize) {
        self.window = window;
    }

    pub fn set_mark(&mut self) {
        if let Some(existing) = self.mark.take() {
            let _ = self.marks.release(existing);
        }
        self.mark = Some(self.marks.issue(self.cursor()));
    }

    pub fn clear_mark(&mut self) {
        if let Some(existing) = self.mark.take() {
            let _ = self.marks.release(existing);
        }
    }

    pub fn mark_offset(&self) -> anyhow::Result<Option<usize>> {
        match self.mark {
            None => Ok(None),
            Some(id) => Ok(Some(self.marks.get(id)?)),
        }
    }

    pub fn has_mark(&self) -> bool {
        self.mark.is_some()
    }

    /// Distance in bytes from `pos` back to (and not including) the preceding `\n`, or to
    /// the start of the buffer if there is none.
    pub fn distance_to_beginning_of_line(&self, pos: usize) -> usize {
        let mut i = pos;
        while i > 0 && self.get(i - 1) != b'\n' {
            i -= 1;
        }
        pos - i
    }

    pub fn distance_to_eol(&self, pos: usize) -> usize {
        let mut i = pos;
        while i < self.size() && self.get(i) != b'\n' {
            i += 1;
        }
        i - pos
    }

    pub fn cursor_distance_to_beginning_of_line(&self) -> usize {
        self.distance_to_beginning_of_line(self.cursor())
    }

    /// On-screen column of `pos`, recomputed by rendering from the start of its line.
    /// Grounded on `original_source/term_ui.cpp::pos_current_column`.
    pub fn pos_current_column(&self, pos: usize) -> usize {
        let mut line_col = 0usize;
        let start = pos - self.distance_to_beginning_of_line(pos);
        for i in start..pos {
            let ch = self.get(i);
            crate::byte::render(ch, &mut line_col);
        }
        line_col
    }

    pub fn current_column(&self) -> usize {
        self.pos_current_column(self.cursor())
    }

    pub fn ensure_virtual_column_initialized(&mut self) {
        if self.virtual_column.is_none() {
            self.virtual_column = Some(self.current_column());
        }
    }

    /// Inserts `chs` at the cursor, leaving the cursor after the inserted text.
    /// Grounded on `original_source/buffer.cpp::insert_chars`.
    pub fn insert_chars(&mut self, chs: &[u8]) -> InsertResult {
        let og_cursor = self.cursor();
        let count = chs.len();
        self.bef.extend_from_slice(chs);
        self.bef_stats = region_stats::append(&self.bef_stats, &region_stats::compute_stats(chs));
        self.marks.adjust_for_insert(og_cursor, count);
        self.virtual_column = Some(self.current_column());
        if self.first_visible_offset > og_cursor {
            self.first_visible_offset += count;
        }
        InsertResult {
            inserted_text: chs.to_vec(),
            new_cursor: self.cursor(),
            side: Side::Left,
        }
    }

    /// Inserts `chs` just before the cursor's current logical position, but on the
    /// "right" side of the gap, leaving the cursor *before* the inserted text. Used when
    /// replaying a `Side::Right` undo/redo item.
    pub fn insert_chars_right(&mut self, chs: &[u8]) -> InsertResult {
        let og_cursor = self.cursor();
        let count = chs.len();
        let mut new_aft = chs.to_vec();
        new_aft.extend_from_slice(&self.aft);
        self.aft = new_aft;
        self.aft_stats = region_stats::append(&region_stats::compute_stats(chs), &self.aft_stats);
        self.marks.adjust_for_insert(og_cursor, count);
        self.virtual_column = Some(self.current_column());
        if self.first_visible_offset > og_cursor {
            self.first_visible_offset += count;
        }
        InsertResult {
            inserted_text: chs.to_vec(),
            new_cursor: self.cursor(),
            side: Side::Right,
        }
    }

    fn squeeze_marks_in_range(&mut self, range_beg: usize, range_end: usize) -> Vec<(WeakMarkId, usize)> {
        let mut squeezed = Vec::new();
        if let Some(mark_id) = self.mark {
            if let Ok(offset) = self.marks.get(mark_id) {
                if offset > range_beg && offset <= range_end {
                    squeezed.push((self.marks.downgrade(mark_id), offset - range_beg));
                }
            }
        }
        squeezed
    }

    /// Deletes `count` bytes immediately before the cursor (backspace direction).
    /// Grounded on `original_source/buffer.cpp::delete_left`.
    pub fn delete_left(&mut self, count: usize) -> DeleteResult {
        let og_cursor = self.bef.len();
        let count = count.min(og_cursor);
        let new_cursor = og_cursor - count;

        let deleted_text = self.bef[new_cursor..og_cursor].to_vec();
        let squeezed = self.squeeze_marks_in_range(new_cursor, og_cursor);
        self.marks.adjust_for_delete_range(new_cursor, og_cursor);
        self.bef_stats =
            region_stats::subtract_right(&self.bef_stats, &self.bef, new_cursor, og_cursor);
        self.bef.truncate(new_cursor);

        if self.first_visible_offset > og_cursor {
            self.first_visible_offset -= count;
        } else if self.first_visible_offset > new_cursor {
            self.first_visible_offset = new_cursor;
        }
        self.virtual_column = Some(self.current_column());

        let error_message = if count == 0 { Some("Beginning of buffer") } else { None };
        DeleteResult {
            deleted_text,
            new_cursor,
            side: Side::Left,
            squeezed_marks: squeezed,
            error_message,
        }
    }

    /// Deletes `count` bytes immediately after the cursor (forward-delete direction).
    /// Grounded on `original_source/buffer.cpp::delete_right`.
    pub fn delete_right(&mut self, count: usize) -> DeleteResult {
        let cursor = self.cursor();
        let count = count.min(self.aft.len());

        let deleted_text = self.aft[..count].to_vec();
        let squeezed = self.squeeze_marks_in_range(cursor, cursor + count);
        self.marks.adjust_for_delete_range(cursor, cursor + count);
        let remaining = self.aft.len() - count;
        self.aft_stats =
            region_stats::subtract_left(&self.aft_stats, &region_stats::compute_stats(&self.aft[..count]), &self.aft[count..], remaining);
        self.aft.drain(..count);

        if self.first_visible_offset > cursor + count {
            self.first_visible_offset -= count;
        } else if self.first_visible_offset > cursor {
            self.first_visible_offset = cursor;
        }
        self.virtual_column = Some(self.current_column());

        let error_message = if count == 0 { Some("End of buffer") } else { None };
        DeleteResult {
            deleted_text,
            new_cursor: cursor,
            side: Side::Right,
            squeezed_marks: squeezed,
            error_message,
        }
    }

    /// Moves the cursor forward by `count` bytes (shifting bytes from `aft` to `bef`).
    pub fn move_right_by(&mut self, count: usize) {
        let count = count.min(self.aft.len());
        let moved: Vec<u8> = self.aft.drain(..count).collect();
        self.aft_stats = region_stats::subtract_left(
            &self.aft_stats,
            &region_stats::compute_stats(&moved),
            &self.aft,
            self.aft.len(),
        );
        self.bef_stats = region_stats::append(&self.bef_stats, &region_stats::compute_stats(&moved));
        self.bef.extend_from_slice(&moved);
        self.virtual_column = Some(self.current_column());
    }

    /// Moves the cursor backward by `count` bytes (shifting bytes from `bef` to `aft`).
    pub fn move_left_by(&mut self, count: usize) {
        let count = count.min(self.bef.len());
        let split_at = self.bef.len() - count;
        let moved: Vec<u8> = self.bef.split_off(split_at);
        self.bef_stats =
            region_stats::subtract_right(&self.bef_stats, &{ let mut v = self.bef.clone(); v.extend_from_slice(&moved); v }, split_at, split_at + count);
        self.aft_stats = region_stats::append(&region_stats::compute_stats(&moved), &self.aft_stats);
        let mut new_aft = moved;
        new_aft.extend_from_slice(&self.aft);
        self.aft = new_aft;
        self.virtual_column = Some(self.current_column());
    }

    pub fn set_cursor(&mut self, pos: usize) {
        let cursor = self.cursor();
        if pos > cursor {
            self.move_right_by(pos - cursor);
        } else if pos < cursor {
            self.move_left_by(cursor - pos);
        }
    }

    pub fn mark_table(&self) -> &MarkTable {
        &self.marks
    }

    pub fn mark_table_mut(&mut self) -> &mut MarkTable {
        &mut self.marks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(data: &str) -> Buffer {
        Buffer::from_data(BufferId(0), data.as_bytes().to_vec())
    }

    #[test]
    fn insert_and_delete_roundtrip() {
        let mut b = buf("hello world");
        b.set_cursor(5);
        let ins = b.insert_chars(b", cruel".as_bytes().to_vec().as_slice());
        assert_eq!(ins.new_cursor, 12);
        assert_eq!(b.copy_to_string(), "hello, cruel world");

        let del = b.delete_left(7);
        assert_eq!(del.deleted_text, b", cruel".to_vec());
        assert_eq!(b.copy_to_string(), "hello world");
    }

    #[test]
    fn mark_strictly_after_insertion_point_shifts_mark_at_point_does_not() {
        let mut b = buf("hello world");
        b.set_cursor(5);
        b.set_mark();
        assert_eq!(b.mark_offset().unwrap(), Some(5));
        b.insert_chars(b"XXX");
        // cursor was at 5 (== mark), insertion happens exactly at the mark's offset, so
        // the mark does not move.
        assert_eq!(b.mark_offset().unwrap(), Some(5));
    }

    #[test]
    fn mark_after_cursor_shifts_on_insert() {
        let mut b = buf("hello world");
        b.set_cursor(8);
        b.set_mark();
        b.set_cursor(2);
        b.insert_chars(b"XX");
        assert_eq!(b.mark_offset().unwrap(), Some(10));
    }

    #[test]
    fn delete_right_caps_at_buffer_end_and_reports_error() {
        let mut b = buf("ab");
        b.set_cursor(2);
        let d = b.delete_right(5);
        assert_eq!(d.deleted_text, Vec::<u8>::new());
        assert_eq!(d.error_message, Some("End of buffer"));
    }

    #[test]
    fn cursor_distance_to_beginning_of_line() {
        let mut b = buf("abc\ndef");
        b.set_cursor(6);
        assert_eq!(b.cursor_distance_to_beginning_of_line(), 2);
    }

    #[test]
    fn move_left_and_right_preserve_content() {
        let mut b = buf("hello world");
        b.set_cursor(11);
        b.move_left_by(5);
        assert_eq!(b.cursor(), 6);
        b.move_right_by(3);
        assert_eq!(b.cursor(), 9);
        assert_eq!(b.copy_to_string(), "hello world");
    }
}
