//! The modal status-prompt state machine: file open/save, buffer close, buffer switch,
//! and confirm-exit all go through a single mini-buffer plus a tagged continuation,
//! rather than a captured closure (SPEC_FULL's design decision -- see `DESIGN.md` --
//! since a tagged enum reads more idiomatically in Rust than `Box<dyn FnOnce>` here, while
//! preserving the original's "continuation closes over captured state" behavior).
//!
//! Grounded on `original_source/editing.cpp`'s `*_prompt`/`*_action` pairs.

use core_text::buffer::{Buffer, BufferId, WindowSize};

use crate::editing::UndoKillringHandled;

/// What happens when the user presses Enter in the mini-buffer.
#[derive(Debug, Clone)]
pub enum PromptKind {
    FileOpen,
    FileSave,
    /// Confirms closing the buffer at `target`; `target` names it for the message, the
    /// actual removal happens by buffer id.
    BufferClose { target: BufferId },
    /// Confirms exiting the program; carries the names of buffers with unsaved changes
    /// so the prompt message can list them (mirrors the original's captured-state
    /// continuation).
    ExitWithoutSave { modified_buffer_names: Vec<String> },
    BufferSwitch,
}

/// A modal prompt: at most one of these is active in `State` at a time. While active,
/// keypresses are routed to `mini_buf` rather than the host buffer.
pub struct Prompt {
    pub kind: PromptKind,
    pub mini_buf: Buffer,
    pub message: String,
}

impl Prompt {
    pub fn new(kind: PromptKind, mini_buf_id: BufferId, message: impl Into<String>) -> Self {
        let mut mini_buf = Buffer::new(mini_buf_id);
        mini_buf.set_window(WindowSize { rows: 1, cols: 80 });
        Prompt {
            kind,
            mini_buf,
            message: message.into(),
        }
    }

    pub fn with_text(kind: PromptKind, mini_buf_id: BufferId, message: impl Into<String>, text: &str) -> Self {
        let mut p = Self::new(kind, mini_buf_id, message);
        p.mini_buf.insert_chars(text.as_bytes());
        p
    }
}

/// What the prompt continuation wants the caller (`State`) to do after Enter is pressed.
/// `enter_handle_status_prompt` in `original_source/editing.cpp` acts directly on `state`;
/// here the side effects that reach outside a single buffer (opening a new buffer,
/// closing one, exiting the loop) are reported back as data instead, since `core-state`'s
/// `prompt` module has no access to the buffer list or the event loop.
pub enum PromptOutcome {
    /// Re-prompt: a fresh prompt of the same kind, showing a new message (e.g. "Please
    /// type yes or no"). Only the yes/no confirmation prompts do this in the original.
    Reprompt(String),
    /// The prompt is done; no further action needed from the caller.
    Closed,
    /// The prompt is done, but the input was invalid; show `message` as a status error
    /// instead of reopening the prompt. Mirrors `note_error_message` called without a
    /// reassigned `state->status_prompt` in `original_source/editing.cpp`.
    ClosedWithError(String),
    /// Open `path` as a new buffer and switch the window to it.
    OpenFile { path: std::path::PathBuf },
    /// Write `contents` to `path`, then mark the host buffer as saved against it.
    SaveFile { path: std::path::PathBuf, contents: Vec<u8> },
    /// Remove the buffer named `target` from the buffer list.
    CloseBuffer { target: BufferId },
    /// Stop the event loop.
    ExitProgram,
    /// Make the window point at the buffer named `name_str`.
    SwitchToBuffer { name_str: String },
}

fn confirm_yes_no(text: &str) -> Option<bool> {
    match text.trim() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

/// Handles Enter in the mini-buffer. Grounded on
/// `original_source/editing.cpp::enter_handle_status_prompt` and the `*_prompt`
/// functions it dispatches to.
pub fn enter_handle_status_prompt(prompt: &Prompt) -> (PromptOutcome, UndoKillringHandled) {
    let text = prompt.mini_buf.copy_to_string();
    let outcome = match &prompt.kind {
        PromptKind::FileOpen => {
            if text.is_empty() {
                PromptOutcome::ClosedWithError("No filename given".to_string())
            } else {
                PromptOutcome::OpenFile { path: text.into() }
            }
        }
        PromptKind::FileSave => {
            if text.is_empty() {
                PromptOutcome::ClosedWithError("No filename given".to_string())
            } else {
                PromptOutcome::SaveFile {
                    path: text.into(),
                    contents: Vec::new(), // filled in by the caller, which has the host buffer
                }
            }
        }
        PromptKind::BufferClose { target } => match confirm_yes_no(&text) {
            Some(true) => PromptOutcome::CloseBuffer { target: *target },
            Some(false) => PromptOutcome::Closed,
            None => PromptOutcome::Reprompt("Please type yes or no".to_string()),
        },
        PromptKind::ExitWithoutSave { .. } => match confirm_yes_no(&text) {
            Some(true) => PromptOutcome::ExitProgram,
            Some(false) => PromptOutcome::Closed,
            None => PromptOutcome::Reprompt("Please type yes or no".to_string()),
        },
        PromptKind::BufferSwitch => {
            if text.is_empty() {
                PromptOutcome::ClosedWithError("No buffer name given".to_string())
            } else {
                PromptOutcome::SwitchToBuffer { name_str: text }
            }
        }
    };
    // The prompt's own bookkeeping (kill-ring/undo) is trivial: a prompt action neither
    // edits the host buffer nor records a kill. The caller is responsible for folding the
    // *consequence* (e.g. `CloseBuffer`) into the host state's own undo/kill-ring.
    (outcome, UndoKillringHandled::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_open_text_closes_with_error() {
        let p = Prompt::new(PromptKind::FileOpen, BufferId(1), "Open file:");
        let (outcome, _) = enter_handle_status_prompt(&p);
        assert!(matches!(outcome, PromptOutcome::ClosedWithError(msg) if msg == "No filename given"));
    }

    #[test]
    fn empty_buffer_switch_text_closes_with_error() {
        let p = Prompt::new(PromptKind::BufferSwitch, BufferId(1), "Switch to buffer:");
        let (outcome, _) = enter_handle_status_prompt(&p);
        assert!(matches!(outcome, PromptOutcome::ClosedWithError(msg) if msg == "No buffer name given"));
    }

    #[test]
    fn file_open_with_text_yields_path() {
        let p = Prompt::with_text(PromptKind::FileOpen, BufferId(1), "Open file:", "foo.txt");
        let (outcome, _) = enter_handle_status_prompt(&p);
        assert!(matches!(outcome, PromptOutcome::OpenFile { path } if path == std::path::Path::new("foo.txt")));
    }

    #[test]
    fn confirm_exit_yes_exits() {
        let p = Prompt::with_text(
            PromptKind::ExitWithoutSave {
                modified_buffer_names: vec!["scratch".to_string()],
            },
            BufferId(1),
            "Modified buffers exist; exit anyway?",
            "yes",
        );
        let (outcome, _) = enter_handle_status_prompt(&p);
        assert!(matches!(outcome, PromptOutcome::ExitProgram));
    }

    #[test]
    fn confirm_exit_garbage_reprompts() {
        let p = Prompt::with_text(
            PromptKind::ExitWithoutSave {
                modified_buffer_names: vec![],
            },
            BufferId(1),
            "Exit anyway?",
            "maybe",
        );
        let (outcome, _) = enter_handle_status_prompt(&p);
        assert!(matches!(outcome, PromptOutcome::Reprompt(msg) if msg == "Please type yes or no"));
    }

    #[test]
    fn buffer_switch_with_name_yields_switch_outcome() {
        let p = Prompt::with_text(PromptKind::BufferSwitch, BufferId(1), "Switch to buffer:", "notes");
        let (outcome, _) = enter_handle_status_prompt(&p);
        assert!(matches!(outcome, PromptOutcome::SwitchToBuffer { name_str } if name_str == "notes"));
    }
}
