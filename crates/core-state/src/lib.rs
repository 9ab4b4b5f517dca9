//! Editor state above the text buffer: undo history, kill-ring, editing primitives, the
//! status-prompt state machine, and the top-level `State` that owns the buffer list.
//!
//! Grounded on `original_source/state.hpp`, `undo.cpp`, and `editing.cpp`.

pub mod editing;
pub mod killring;
pub mod prompt;
pub mod state;
pub mod undo;

pub use editing::{EditingContext, UndoKillringHandled};
pub use killring::{ClipBoard, YankSide};
pub use prompt::{Prompt, PromptKind, PromptOutcome};
pub use state::{BufferSlot, State};
pub use undo::{AtomicUndoItem, CharCoalescence, UndoHistory, UndoItem, UndoNodeNumber, UndoOutcome};
