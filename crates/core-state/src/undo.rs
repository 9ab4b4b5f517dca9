//! Undo engine: a two-stack (`past`/`future`) history of atomic edits, with insert/delete
//! coalescence and "mountain" branches recording displaced redo history instead of
//! discarding it on a fresh edit.
//!
//! Grounded bit-for-bit on `original_source/undo.hpp` and `original_source/undo.cpp`.

use core_text::buffer::{Buffer, Side};
use core_text::marks::WeakMarkId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UndoNodeNumber(pub u64);

#[derive(Debug, Clone, Default)]
pub struct AtomicUndoItem {
    /// Cursor position *before* this item is applied.
    pub beg: usize,
    pub text_inserted: Vec<u8>,
    pub text_deleted: Vec<u8>,
    pub side: SideOrNone,
    /// Marks squeezed by the edit this item reverses; `.1` is an offset into whichever of
    /// `text_inserted`/`text_deleted` is non-empty.
    // TODO: squeezed marks are recorded here (see `atomic_undo`'s use of
    // `DeleteResult::squeezed_marks`) but a later insert of `text_inserted` doesn't yet
    // pop them back out to beg + offset; they land at `beg` instead, same as any
    // non-squeezed mark exactly at the insertion point.
    pub mark_adjustments: Vec<(WeakMarkId, usize)>,
    pub before_node: UndoNodeNumber,
    pub after_node: UndoNodeNumber,
}

/// `Side` plus a default, since `AtomicUndoItem::default()` needs one and `core_text::Side`
/// has no meaningful default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideOrNone {
    Left,
    Right,
}
impl Default for SideOrNone {
    fn default() -> Self {
        SideOrNone::Left
    }
}
impl From<Side> for SideOrNone {
    fn from(s: Side) -> Self {
        match s {
            Side::Left => SideOrNone::Left,
            Side::Right => SideOrNone::Right,
        }
    }
}
impl From<SideOrNone> for Side {
    fn from(s: SideOrNone) -> Self {
        match s {
            SideOrNone::Left => Side::Left,
            SideOrNone::Right => Side::Right,
        }
    }
}

#[derive(Debug, Clone)]
pub enum UndoItem {
    Atomic(AtomicUndoItem),
    /// A displaced redo branch: a chain of atomic items, most-recent last, kept so a
    /// later undo can descend back into it instead of losing it outright.
    Mountain(Vec<AtomicUndoItem>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharCoalescence {
    None,
    InsertChar,
    DeleteLeft,
    DeleteRight,
}

#[derive(Debug)]
pub struct UndoHistory {
    pub past: Vec<UndoItem>,
    pub future: Vec<AtomicUndoItem>,
    pub current_node: UndoNodeNumber,
    next_node_number: u64,
    pub coalescence: CharCoalescence,
}

impl Default for CharCoalescence {
    fn default() -> Self {
        CharCoalescence::None
    }
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoHistory {
    pub fn new() -> Self {
        UndoHistory {
            past: Vec::new(),
            future: Vec::new(),
            current_node: UndoNodeNumber(1),
            next_node_number: 2,
            coalescence: CharCoalescence::None,
        }
    }

    pub fn unused_node_number(&self) -> UndoNodeNumber {
        UndoNodeNumber(self.next_node_number)
    }

    fn move_future_to_mountain(&mut self) {
        if !self.future.is_empty() {
            self.past.push(UndoItem::Mountain(std::mem::take(&mut self.future)));
        }
    }

    /// Starts a new branch in the undo tree without recording any edit -- used for
    /// actions that should break coalescence and fork history without themselves being
    /// undoable (navigation, cancel).
    pub fn add_nop_edit(&mut self) {
        self.coalescence = CharCoalescence::None;
        self.move_future_to_mountain();
    }

    /// Breaks coalescence without forking history.
    pub fn add_coalescence_break(&mut self) {
        self.coalescence = CharCoalescence::None;
    }

    fn item_has_effect(item: &AtomicUndoItem) -> bool {
        !(item.text_inserted.is_empty() && item.text_deleted.is_empty())
    }

    pub fn add_edit(&mut self, item: AtomicUndoItem) {
        self.coalescence = CharCoalescence::None;
        self.move_future_to_mountain();

        if Self::item_has_effect(&item) {
            self.current_node = item.before_node;
            self.next_node_number += 1;
            self.past.push(UndoItem::Atomic(item));
        }
    }

    /// Grounded on `original_source/undo.cpp::add_coalescent_edit`'s three-armed switch.
    pub fn add_coalescent_edit(&mut self, mut item: AtomicUndoItem, coalescence: CharCoalescence) {
        self.move_future_to_mountain();

        if self.coalescence == coalescence && !self.past.is_empty() {
            if let Some(UndoItem::Atomic(back)) = self.past.last_mut() {
                debug_assert_eq!(back.before_node, self.current_node);

                match coalescence {
                    CharCoalescence::None => {}
                    CharCoalescence::InsertChar => {
                        debug_assert!(matches!(back.side, SideOrNone::Left) && matches!(item.side, SideOrNone::Left));
                        debug_assert!(back.text_inserted.is_empty() && item.text_inserted.is_empty());
                        back.text_deleted.extend_from_slice(&item.text_deleted);
                        back.beg = item.beg;
                        return;
                    }
                    CharCoalescence::DeleteLeft => {
                        debug_assert!(matches!(back.side, SideOrNone::Left) && matches!(item.side, SideOrNone::Left));
                        debug_assert!(back.text_deleted.is_empty() && item.text_deleted.is_empty());
                        let num_deleted = item.text_inserted.len();
                        for (_, off) in back.mark_adjustments.iter_mut() {
                            *off += num_deleted;
                        }
                        back.mark_adjustments.append(&mut item.mark_adjustments);
                        item.text_inserted.extend_from_slice(&back.text_inserted);
                        back.text_inserted = item.text_inserted;
                        back.beg = item.beg;
                        return;
                    }
                    CharCoalescence::DeleteRight => {
                        debug_assert!(matches!(back.side, SideOrNone::Right) && matches!(item.side, SideOrNone::Right));
                        debug_assert!(back.text_deleted.is_empty() && item.text_deleted.is_empty());
                        back.text_inserted.extend_from_slice(&item.text_inserted);
                        back.mark_adjustments.append(&mut item.mark_adjustments);
                        return;
                    }
                }
            }
        }

        self.coalescence = coalescence;
        self.current_node = item.before_node;
        self.next_node_number += 1;
        self.past.push(UndoItem::Atomic(item));
    }
}

/// Applies the reverse of `item` to `buf`, returning the item that reverses *that*
/// (i.e. the original edit), for pushing onto the opposite stack.
///
/// Grounded on `original_source/undo.cpp::atomic_undo`.
fn atomic_undo(history_current_node: UndoNodeNumber, buf: &mut Buffer, item: AtomicUndoItem) -> AtomicUndoItem {
    debug_assert_eq!(item.before_node, history_current_node);

    buf.set_cursor(item.beg);

    let mut reverse_text_inserted = Vec::new();
    let mut mark_adjustments = Vec::new();
    if !item.text_deleted.is_empty() {
        let d_res = match Side::from(item.side) {
            Side::Left => buf.delete_left(item.text_deleted.len()),
            Side::Right => buf.delete_right(item.text_deleted.len()),
        };
        debug_assert_eq!(d_res.deleted_text, item.text_deleted);
        reverse_text_inserted = d_res.deleted_text;
        mark_adjustments = d_res.squeezed_marks;
    }

    let mut reverse_text_deleted = Vec::new();
    if !item.text_inserted.is_empty() {
        let i_res = match Side::from(item.side) {
            Side::Left => buf.insert_chars(&item.text_inserted),
            Side::Right => buf.insert_chars_right(&item.text_inserted),
        };
        reverse_text_deleted = i_res.inserted_text;
    }

    AtomicUndoItem {
        beg: buf.cursor(),
        text_inserted: reverse_text_inserted,
        text_deleted: reverse_text_deleted,
        side: item.side,
        mark_adjustments,
        before_node: item.after_node,
        after_node: item.before_node,
    }
}

pub enum UndoOutcome {
    NothingToUndo,
    Undone,
}

/// Grounded on `original_source/undo.cpp::perform_undo`.
pub fn perform_undo(history: &mut UndoHistory, buf: &mut Buffer) -> UndoOutcome {
    let Some(item) = history.past.pop() else {
        return UndoOutcome::NothingToUndo;
    };
    match item {
        UndoItem::Atomic(atomic) => {
            let before = atomic.before_node;
            let reverse = atomic_undo(before, buf, atomic);
            history.current_node = reverse.after_node;
            history.future.push(reverse);
        }
        UndoItem::Mountain(mut chain) => {
            let it = chain.pop().expect("mountain branch is never empty");
            let before = it.before_node;
            let reverse = atomic_undo(before, buf, it);
            history.current_node = reverse.after_node;
            history.future.push(reverse.clone());
            history.past.push(UndoItem::Atomic(reverse));
            if !chain.is_empty() {
                history.past.push(UndoItem::Mountain(chain));
            }
        }
    }
    UndoOutcome::Undone
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::buffer::BufferId;

    fn make_edit(buf: &mut Buffer, history: &mut UndoHistory, text: &[u8]) {
        let before = history.unused_node_number();
        let res = buf.insert_chars(text);
        let item = AtomicUndoItem {
            beg: res.new_cursor,
            text_inserted: Vec::new(),
            text_deleted: res.inserted_text,
            side: SideOrNone::Left,
            mark_adjustments: Vec::new(),
            before_node: before,
            after_node: history.current_node,
        };
        history.add_edit(item);
    }

    #[test]
    fn undo_reverses_an_insert() {
        let mut buf = Buffer::new(BufferId(0));
        let mut history = UndoHistory::new();
        make_edit(&mut buf, &mut history, b"hello");
        assert_eq!(buf.copy_to_string(), "hello");

        perform_undo(&mut history, &mut buf);
        assert_eq!(buf.copy_to_string(), "");
    }

    #[test]
    fn redo_after_undo_restores_the_insert() {
        let mut buf = Buffer::new(BufferId(0));
        let mut history = UndoHistory::new();
        make_edit(&mut buf, &mut history, b"hello");
        perform_undo(&mut history, &mut buf);

        // Redo is undoing the future stack's top item, applied the same way.
        let reverse = history.future.pop().unwrap();
        let before = reverse.before_node;
        let redone = atomic_undo(before, &mut buf, reverse);
        history.past.push(UndoItem::Atomic(redone));
        assert_eq!(buf.copy_to_string(), "hello");
    }

    #[test]
    fn fresh_edit_after_undo_moves_future_to_mountain_branch() {
        let mut buf = Buffer::new(BufferId(0));
        let mut history = UndoHistory::new();
        make_edit(&mut buf, &mut history, b"a");
        make_edit(&mut buf, &mut history, b"b");
        perform_undo(&mut history, &mut buf); // undoes "b", future now has 1 item
        assert_eq!(history.future.len(), 1);

        make_edit(&mut buf, &mut history, b"c"); // should bury the future as a mountain
        assert!(history.future.is_empty());
        assert!(matches!(history.past.iter().rev().nth(1), Some(UndoItem::Mountain(_))));
    }

    #[test]
    fn nothing_to_undo_reports_as_such() {
        let mut buf = Buffer::new(BufferId(0));
        let mut history = UndoHistory::new();
        assert!(matches!(perform_undo(&mut history, &mut buf), UndoOutcome::NothingToUndo));
    }
}
