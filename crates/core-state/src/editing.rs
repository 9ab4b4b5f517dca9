//! The "note_*" discipline: every editing command funnels its undo-history and
//! kill-ring bookkeeping through one of these functions, which return
//! [`UndoKillringHandled`] -- a `#[must_use]` marker proving the caller discharged both.
//!
//! Grounded on `original_source/editing.hpp`/`editing.cpp`. The concrete C++ bodies of
//! `record_yank`/`do_yank` were not present in the retrieved sources (see
//! `crate::killring`); the functions here that touch the kill-ring are grounded on
//! `state.hpp`'s `clip_board` fields and spec prose rather than a line-for-line port.

use core_render::{recenter_cursor_if_offscreen, ScratchFrame};
use core_text::buffer::{Buffer, DeleteResult, InsertResult};
use core_text::motion;

use crate::killring::{ClipBoard, YankSide};
use crate::undo::{AtomicUndoItem, CharCoalescence, UndoHistory};

/// Proof that a command's undo-history and kill-ring bookkeeping has been discharged.
/// Every `note_*`/action function returns one of these; the type carries no data, it
/// exists so `#[must_use]` makes it awkward to silently skip the bookkeeping.
#[must_use]
pub struct UndoKillringHandled(());

impl UndoKillringHandled {
    pub(crate) fn new() -> Self {
        UndoKillringHandled(())
    }
}

/// Borrows of everything a single editing command needs: the buffer it acts on, that
/// buffer's undo history, the shared kill-ring, a scratch frame for recenter checks, and
/// a slot for a user-visible error message.
pub struct EditingContext<'a> {
    pub buf: &'a mut Buffer,
    pub history: &'a mut UndoHistory,
    pub clipboard: &'a mut ClipBoard,
    pub scratch: &'a mut ScratchFrame,
    pub error_message: &'a mut Option<String>,
}

impl<'a> EditingContext<'a> {
    fn recenter(&mut self) {
        recenter_cursor_if_offscreen(self.scratch, self.buf);
    }
}

fn finish_item(history: &UndoHistory, mut item: AtomicUndoItem) -> AtomicUndoItem {
    item.before_node = history.unused_node_number();
    item.after_node = history.current_node;
    item
}

/// The item that, if applied by `atomic_undo`, reverses `res` (an insertion): it deletes
/// what was just inserted.
fn item_for_insert(res: &InsertResult) -> AtomicUndoItem {
    AtomicUndoItem {
        beg: res.new_cursor,
        text_inserted: Vec::new(),
        text_deleted: res.inserted_text.clone(),
        side: res.side.into(),
        mark_adjustments: Vec::new(),
        before_node: Default::default(),
        after_node: Default::default(),
    }
}

/// The item that reverses `res` (a deletion): it reinserts what was just deleted.
fn item_for_delete(res: &DeleteResult) -> AtomicUndoItem {
    AtomicUndoItem {
        beg: res.new_cursor,
        text_inserted: res.deleted_text.clone(),
        text_deleted: Vec::new(),
        side: res.side.into(),
        mark_adjustments: res.squeezed_marks.clone(),
        before_node: Default::default(),
        after_node: Default::default(),
    }
}

/// Records an ordinary (non-coalescing, non-kill) edit: resets the yank-pop state, pushes
/// a fresh undo entry, and recenters the viewport.
pub fn note_action(ctx: &mut EditingContext, item: AtomicUndoItem) -> UndoKillringHandled {
    ctx.clipboard.no_yank();
    let item = finish_item(ctx.history, item);
    ctx.history.add_edit(item);
    ctx.recenter();
    UndoKillringHandled::new()
}

/// Records an edit that may coalesce with the previous one of the same `kind` (typed
/// characters, repeated Backspace/Delete).
pub fn note_coalescent_action(
    ctx: &mut EditingContext,
    item: AtomicUndoItem,
    kind: CharCoalescence,
) -> UndoKillringHandled {
    ctx.clipboard.no_yank();
    let item = finish_item(ctx.history, item);
    ctx.history.add_coalescent_edit(item, kind);
    ctx.recenter();
    UndoKillringHandled::new()
}

/// A kill command's edit: the kill-ring has already been updated by the caller via
/// `record_yank` (which must *not* be preceded by `no_yank`, or the append-on-repeat
/// chain would break), so this only handles the undo side.
fn note_killring_edit(ctx: &mut EditingContext, item: AtomicUndoItem) -> UndoKillringHandled {
    let item = finish_item(ctx.history, item);
    ctx.history.add_edit(item);
    ctx.recenter();
    UndoKillringHandled::new()
}

/// An action that updates the kill-ring but neither the buffer nor undo history
/// (`copy_region`, or a `kill_region` with an empty region).
fn note_noundo_killring_action(ctx: &mut EditingContext) -> UndoKillringHandled {
    ctx.recenter();
    UndoKillringHandled::new()
}

/// Cancel / prompt-close: discards no buffer edit but still forks history so a later
/// undo can't cross the cancellation boundary.
pub fn note_backout_action(ctx: &mut EditingContext) -> UndoKillringHandled {
    ctx.clipboard.no_yank();
    ctx.history.add_nop_edit();
    ctx.recenter();
    UndoKillringHandled::new()
}

/// A cancellation with no associated buffer at all (e.g. `C-g` while no prompt is open
/// and no region is active).
pub fn note_bufless_backout_action(clipboard: &mut ClipBoard) -> UndoKillringHandled {
    clipboard.no_yank();
    UndoKillringHandled::new()
}

/// Cursor movement: breaks coalescence (so the next edit starts a fresh undo entry) but
/// doesn't fork a mountain branch, since nothing was edited.
pub fn note_navigation_action(ctx: &mut EditingContext) -> UndoKillringHandled {
    ctx.clipboard.no_yank();
    ctx.history.add_coalescence_break();
    ctx.recenter();
    UndoKillringHandled::new()
}

/// An action that changed nothing undoable (a failed edit, an error message).
pub fn note_nop_action(ctx: &mut EditingContext) -> UndoKillringHandled {
    ctx.clipboard.no_yank();
    UndoKillringHandled::new()
}

/// Inserts `bytes` at the cursor as one undoable, non-coalescing edit (paste, file
/// insertion). Single-character typing should use [`type_char`] instead so consecutive
/// keystrokes merge into one undo entry.
pub fn insert_text(ctx: &mut EditingContext, bytes: &[u8]) -> UndoKillringHandled {
    let res = ctx.buf.insert_chars(bytes);
    let item = item_for_insert(&res);
    note_action(ctx, item)
}

/// Types one character as a coalescing edit: consecutive `type_char` calls merge into a
/// single undo entry (spec §8 scenario 5's coalescence property).
pub fn type_char(ctx: &mut EditingContext, ch: u8) -> UndoKillringHandled {
    let res = ctx.buf.insert_chars(&[ch]);
    let item = item_for_insert(&res);
    note_coalescent_action(ctx, item, CharCoalescence::InsertChar)
}

/// Backspace: deletes one byte to the left as a coalescing edit. Grounded on spec §8
/// scenario 2.
pub fn delete_char_backward(ctx: &mut EditingContext) -> UndoKillringHandled {
    let res = ctx.buf.delete_left(1);
    if let Some(msg) = res.error_message {
        *ctx.error_message = Some(msg.to_string());
    }
    let item = item_for_delete(&res);
    note_coalescent_action(ctx, item, CharCoalescence::DeleteLeft)
}

/// Forward-delete (`Delete` key): deletes one byte to the right as a coalescing edit.
pub fn delete_char_forward(ctx: &mut EditingContext) -> UndoKillringHandled {
    let res = ctx.buf.delete_right(1);
    if let Some(msg) = res.error_message {
        *ctx.error_message = Some(msg.to_string());
    }
    let item = item_for_delete(&res);
    note_coalescent_action(ctx, item, CharCoalescence::DeleteRight)
}

/// Grounded on `original_source/editing.cpp::delete_backward_word`.
pub fn delete_backward_word(ctx: &mut EditingContext) -> UndoKillringHandled {
    let n = motion::backward_word_distance(ctx.buf);
    let res = ctx.buf.delete_left(n);
    if let Some(msg) = res.error_message {
        *ctx.error_message = Some(msg.to_string());
    }
    let item = item_for_delete(&res);
    note_action(ctx, item)
}

/// Grounded on `original_source/editing.cpp::delete_forward_word`.
pub fn delete_forward_word(ctx: &mut EditingContext) -> UndoKillringHandled {
    let n = motion::forward_word_distance(ctx.buf);
    let res = ctx.buf.delete_right(n);
    if let Some(msg) = res.error_message {
        *ctx.error_message = Some(msg.to_string());
    }
    let item = item_for_delete(&res);
    note_action(ctx, item)
}

/// `C-k`. Kills to end of line; at end of line, kills the line break itself. Grounded on
/// `original_source/editing.cpp::kill_line` and spec scenario 3 (appends into the same
/// clip across repeated calls).
pub fn kill_line(ctx: &mut EditingContext) -> UndoKillringHandled {
    let mut n = ctx.buf.distance_to_eol(ctx.buf.cursor());
    if n == 0 {
        n = 1;
    }
    let res = ctx.buf.delete_right(n);
    ctx.clipboard.record_yank(res.deleted_text.clone(), YankSide::Right);
    let item = item_for_delete(&res);
    note_killring_edit(ctx, item)
}

/// `C-w`. Kills the region between cursor and mark. Grounded on
/// `original_source/editing.cpp::kill_region`.
pub fn kill_region(ctx: &mut EditingContext) -> UndoKillringHandled {
    let mark = match ctx.buf.mark_offset() {
        Ok(Some(m)) => m,
        _ => {
            *ctx.error_message = Some("Mark not set".to_string());
            return note_nop_action(ctx);
        }
    };
    let cursor = ctx.buf.cursor();
    if mark == cursor {
        // Still record an (empty) kill so a later kill doesn't spuriously append to an
        // older, unrelated clip.
        ctx.clipboard.record_yank(Vec::new(), YankSide::None);
        return note_noundo_killring_action(ctx);
    }

    let len = mark.abs_diff(cursor);
    let res = if cursor < mark {
        ctx.buf.delete_right(len)
    } else {
        ctx.buf.delete_left(len)
    };
    let side = if cursor < mark { YankSide::Right } else { YankSide::Left };
    ctx.clipboard.record_yank(res.deleted_text.clone(), side);
    let item = item_for_delete(&res);
    note_killring_edit(ctx, item)
}

/// `M-w`. Copies the region between cursor and mark without deleting it. Grounded on
/// `original_source/editing.cpp::copy_region`.
pub fn copy_region(ctx: &mut EditingContext) -> UndoKillringHandled {
    let mark = match ctx.buf.mark_offset() {
        Ok(Some(m)) => m,
        _ => {
            *ctx.error_message = Some("Mark not set".to_string());
            return note_nop_action(ctx);
        }
    };
    let cursor = ctx.buf.cursor();
    let (beg, end) = (mark.min(cursor), mark.max(cursor));
    let text = ctx.buf.copy_substr(beg, end);
    ctx.clipboard.record_yank(text, YankSide::None);
    note_noundo_killring_action(ctx)
}

/// `C-y`. Grounded on `original_source/editing.cpp::yank_from_clipboard`; the underlying
/// `clip_board::do_yank` body was not retrievable (see module doc comment), so this reads
/// spec §4.H directly.
pub fn yank_from_clipboard(ctx: &mut EditingContext) -> UndoKillringHandled {
    let Some(text) = ctx.clipboard.do_yank().map(<[u8]>::to_vec) else {
        *ctx.error_message = Some("Kill ring is empty".to_string());
        return note_nop_action(ctx);
    };
    let res = ctx.buf.insert_chars(&text);
    let item = item_for_insert(&res);
    note_killring_edit(ctx, item)
}

/// `M-y`, issued immediately after `C-y`/another `M-y`: replaces the just-yanked text with
/// the next-older kill-ring entry. Grounded on
/// `original_source/editing.cpp::alt_yank_from_clipboard` and spec scenario 4.
pub fn alt_yank_from_clipboard(ctx: &mut EditingContext) -> UndoKillringHandled {
    let Some(yanked_len) = ctx.clipboard.just_yanked() else {
        *ctx.error_message = Some("Previous command was not a yank".to_string());
        return note_nop_action(ctx);
    };
    let del = ctx.buf.delete_left(yanked_len);
    ctx.clipboard.step_paste_number();
    let text = ctx
        .clipboard
        .do_yank()
        .expect("kill ring non-empty: a prior yank already read from it")
        .to_vec();
    let ins = ctx.buf.insert_chars(&text);

    let mut item = item_for_delete(&del);
    item.text_deleted = ins.inserted_text;
    item.beg = ins.new_cursor;
    note_killring_edit(ctx, item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::buffer::{BufferId, WindowSize};

    fn context<'a>(
        buf: &'a mut Buffer,
        history: &'a mut UndoHistory,
        clipboard: &'a mut ClipBoard,
        scratch: &'a mut ScratchFrame,
        error_message: &'a mut Option<String>,
    ) -> EditingContext<'a> {
        buf.set_window(WindowSize { rows: 24, cols: 80 });
        EditingContext {
            buf,
            history,
            clipboard,
            scratch,
            error_message,
        }
    }

    #[test]
    fn kill_line_then_kill_line_appends_into_one_clip() {
        let mut buf = Buffer::from_data(BufferId(0), b"foo\nbar".to_vec());
        let mut history = UndoHistory::new();
        let mut clipboard = ClipBoard::new();
        let mut scratch = ScratchFrame::new();
        let mut error_message = None;
        let mut ctx = context(&mut buf, &mut history, &mut clipboard, &mut scratch, &mut error_message);

        kill_line(&mut ctx);
        assert_eq!(ctx.buf.copy_to_string(), "\nbar");
        kill_line(&mut ctx);
        assert_eq!(ctx.buf.copy_to_string(), "bar");
        assert_eq!(ctx.clipboard.do_yank(), Some(b"foo\n".as_slice()));
    }

    #[test]
    fn yank_then_yank_pop_replaces_with_older_clip() {
        let mut buf = Buffer::new(BufferId(0));
        let mut history = UndoHistory::new();
        let mut clipboard = ClipBoard::new();
        clipboard.record_yank(b"one".to_vec(), YankSide::Right);
        clipboard.no_yank();
        clipboard.record_yank(b"two".to_vec(), YankSide::Right);
        let mut scratch = ScratchFrame::new();
        let mut error_message = None;
        let mut ctx = context(&mut buf, &mut history, &mut clipboard, &mut scratch, &mut error_message);

        yank_from_clipboard(&mut ctx);
        assert_eq!(ctx.buf.copy_to_string(), "two");
        alt_yank_from_clipboard(&mut ctx);
        assert_eq!(ctx.buf.copy_to_string(), "one");
    }

    #[test]
    fn alt_yank_without_prior_yank_is_a_user_visible_error() {
        let mut buf = Buffer::new(BufferId(0));
        let mut history = UndoHistory::new();
        let mut clipboard = ClipBoard::new();
        let mut scratch = ScratchFrame::new();
        let mut error_message = None;
        let mut ctx = context(&mut buf, &mut history, &mut clipboard, &mut scratch, &mut error_message);

        alt_yank_from_clipboard(&mut ctx);
        assert_eq!(error_message.as_deref(), Some("Previous command was not a yank"));
    }

    #[test]
    fn kill_region_without_mark_is_a_user_visible_error() {
        let mut buf = Buffer::from_data(BufferId(0), b"hello".to_vec());
        let mut history = UndoHistory::new();
        let mut clipboard = ClipBoard::new();
        let mut scratch = ScratchFrame::new();
        let mut error_message = None;
        let mut ctx = context(&mut buf, &mut history, &mut clipboard, &mut scratch, &mut error_message);

        kill_region(&mut ctx);
        assert_eq!(error_message.as_deref(), Some("Mark not set"));
    }

    #[test]
    fn kill_region_then_undo_restores_text() {
        let mut buf = Buffer::from_data(BufferId(0), b"hello world".to_vec());
        buf.set_cursor(0);
        buf.set_mark();
        buf.set_cursor(5);
        let mut history = UndoHistory::new();
        let mut clipboard = ClipBoard::new();
        let mut scratch = ScratchFrame::new();
        let mut error_message = None;
        let mut ctx = context(&mut buf, &mut history, &mut clipboard, &mut scratch, &mut error_message);

        kill_region(&mut ctx);
        assert_eq!(ctx.buf.copy_to_string(), " world");

        crate::undo::perform_undo(&mut history, &mut buf);
        assert_eq!(buf.copy_to_string(), "hello world");
    }
}
