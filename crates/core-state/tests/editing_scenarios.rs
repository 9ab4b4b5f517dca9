//! Integration tests for the literal scenarios in spec section 8, exercising
//! `core-state`'s undo engine, kill-ring, and editing primitives together.

use core_render::ScratchFrame;
use core_state::editing::{self, EditingContext};
use core_state::killring::{ClipBoard, YankSide};
use core_state::undo::{perform_undo, UndoHistory};
use core_text::buffer::{Buffer, BufferId, WindowSize};

fn new_buffer(cols: u32) -> Buffer {
    let mut b = Buffer::new(BufferId(0));
    b.set_window(WindowSize { rows: 24, cols });
    b
}

#[test]
fn scenario_1_tab_expansion_and_current_column() {
    let mut buf = new_buffer(80);
    buf.insert_chars(b"hello\tworld");
    assert_eq!(buf.current_column(), 13); // "hello" (5) + tab to col 8 (3 spaces) + "world" (5)
}

#[test]
fn scenario_2_coalesced_backspaces_undo_in_one_step() {
    let mut buf = new_buffer(80);
    let mut history = UndoHistory::new();
    let mut clipboard = ClipBoard::new();
    let mut scratch = ScratchFrame::new();
    let mut error_message = None;

    buf.insert_chars(b"abcdef");
    buf.move_left_by(3); // cursor at 3, before "def"

    {
        let mut ctx = EditingContext {
            buf: &mut buf,
            history: &mut history,
            clipboard: &mut clipboard,
            scratch: &mut scratch,
            error_message: &mut error_message,
        };
        editing::delete_char_backward(&mut ctx);
        editing::delete_char_backward(&mut ctx);
    }

    assert_eq!(buf.copy_to_string(), "adef");
    assert_eq!(buf.cursor(), 1);
    assert_eq!(history.past.len(), 1);

    perform_undo(&mut history, &mut buf);
    assert_eq!(buf.copy_to_string(), "abcdef");
    assert_eq!(buf.cursor(), 3);
}

#[test]
fn scenario_3_repeated_kill_line_appends_then_yanks_combined_clip() {
    let mut buf = new_buffer(80);
    let mut history = UndoHistory::new();
    let mut clipboard = ClipBoard::new();
    let mut scratch = ScratchFrame::new();
    let mut error_message = None;

    buf.insert_chars(b"foo\nbar");
    buf.set_cursor(0);

    let mut ctx = EditingContext {
        buf: &mut buf,
        history: &mut history,
        clipboard: &mut clipboard,
        scratch: &mut scratch,
        error_message: &mut error_message,
    };
    editing::kill_line(&mut ctx);
    editing::kill_line(&mut ctx);
    assert_eq!(ctx.buf.copy_to_string(), "bar");
    editing::yank_from_clipboard(&mut ctx);
    assert_eq!(ctx.buf.copy_to_string(), "foo\nbar");
}

#[test]
fn scenario_4_yank_then_yank_pop() {
    let mut buf = new_buffer(80);
    let mut history = UndoHistory::new();
    let mut clipboard = ClipBoard::new();
    clipboard.record_yank(b"one".to_vec(), YankSide::Right);
    clipboard.no_yank();
    clipboard.record_yank(b"two".to_vec(), YankSide::Right);
    let mut scratch = ScratchFrame::new();
    let mut error_message = None;
    let mut ctx = EditingContext {
        buf: &mut buf,
        history: &mut history,
        clipboard: &mut clipboard,
        scratch: &mut scratch,
        error_message: &mut error_message,
    };

    editing::yank_from_clipboard(&mut ctx);
    assert_eq!(ctx.buf.copy_to_string(), "two");
    editing::alt_yank_from_clipboard(&mut ctx);
    assert_eq!(ctx.buf.copy_to_string(), "one");
}

#[test]
fn scenario_5_insert_undo_then_redo_leaves_one_past_entry() {
    let mut buf = new_buffer(80);
    let mut history = UndoHistory::new();
    let mut clipboard = ClipBoard::new();
    let mut scratch = ScratchFrame::new();
    let mut error_message = None;
    let mut ctx = EditingContext {
        buf: &mut buf,
        history: &mut history,
        clipboard: &mut clipboard,
        scratch: &mut scratch,
        error_message: &mut error_message,
    };

    editing::insert_text(&mut ctx, b"a");
    assert_eq!(ctx.buf.copy_to_string(), "a");

    perform_undo(ctx.history, ctx.buf);
    assert_eq!(ctx.buf.copy_to_string(), "");
    assert_eq!(ctx.history.past.len(), 0);
    assert_eq!(ctx.history.future.len(), 1);
}

#[test]
fn scenario_6_bad_confirm_text_reprompts() {
    use core_state::prompt::{enter_handle_status_prompt, Prompt, PromptKind, PromptOutcome};
    let p = Prompt::with_text(
        PromptKind::ExitWithoutSave {
            modified_buffer_names: vec![],
        },
        BufferId(0),
        "Exit?",
        "maybe",
    );
    let (outcome, _) = enter_handle_status_prompt(&p);
    assert!(matches!(outcome, PromptOutcome::Reprompt(_)));
}
