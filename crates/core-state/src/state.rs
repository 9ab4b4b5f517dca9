//! Top-level editor state: the buffer list, the active window, the shared kill-ring, and
//! (at most one) status prompt. Grounded on `original_source/state.hpp`'s `state` struct
//! and the buffer-list bookkeeping in `original_source/editing.cpp` (`apply_number_to_buf`,
//! `rotate_to_buffer`, `scratch_buffer`, `open_file_into_detached_buffer`).

use std::io::Write as _;
use std::path::Path;

use core_render::ScratchFrame;
use core_text::buffer::{Buffer, BufferId, WindowSize};

use crate::editing::{EditingContext, UndoKillringHandled};
use crate::killring::ClipBoard;
use crate::prompt::{Prompt, PromptKind};
use crate::undo::{UndoHistory, UndoNodeNumber};

/// Everything a buffer needs besides its text: its own undo history, plus the window
/// geometry/scroll state that already lives on `core_text::Buffer` itself.
///
/// `non_modified_undo_node` is the original's `buf->non_modified_undo_node` -- the undo
/// node number at the buffer's last save, so a buffer edited back to exactly its saved
/// state reads as unmodified again. It lives here rather than on `core_text::Buffer`
/// itself since `core-text` has no business knowing about undo node numbers, which are a
/// `core-state`-level concept.
pub struct BufferSlot {
    pub buf: Buffer,
    pub history: UndoHistory,
    pub non_modified_undo_node: UndoNodeNumber,
}

impl BufferSlot {
    fn new(buf: Buffer) -> Self {
        let history = UndoHistory::new();
        let non_modified_undo_node = history.current_node;
        BufferSlot {
            buf,
            history,
            non_modified_undo_node,
        }
    }

    /// Whether this buffer has unsaved edits, per `original_source/editing.cpp`'s
    /// comparison of `undo_info.current_node` against `non_modified_undo_node`.
    pub fn modified_flag(&self) -> bool {
        self.history.current_node != self.non_modified_undo_node
    }
}

pub struct State {
    buffers: Vec<BufferSlot>,
    window_ptr: usize,
    next_buffer_id: u64,
    pub clipboard: ClipBoard,
    pub prompt: Option<Prompt>,
    pub error_message: Option<String>,
    scratch: ScratchFrame,
}

impl State {
    /// A fresh editor state with a single empty `*scratch*` buffer, matching the
    /// invariant that `buffers` is never empty.
    pub fn new() -> Self {
        let mut state = State {
            buffers: Vec::new(),
            window_ptr: 0,
            next_buffer_id: 0,
            clipboard: ClipBoard::new(),
            prompt: None,
            error_message: None,
            scratch: ScratchFrame::new(),
        };
        state.push_scratch_buffer();
        state
    }

    fn mint_buffer_id(&mut self) -> BufferId {
        let id = BufferId(self.next_buffer_id);
        self.next_buffer_id += 1;
        id
    }

    pub fn buffers(&self) -> &[BufferSlot] {
        &self.buffers
    }

    pub fn window_ptr(&self) -> usize {
        self.window_ptr
    }

    pub fn current_slot(&self) -> &BufferSlot {
        &self.buffers[self.window_ptr]
    }

    pub fn current_slot_mut(&mut self) -> &mut BufferSlot {
        &mut self.buffers[self.window_ptr]
    }

    pub fn current_buffer(&self) -> &Buffer {
        &self.buffers[self.window_ptr].buf
    }

    pub fn current_buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffers[self.window_ptr].buf
    }

    /// Borrows everything `core_state::editing`'s functions need for the current window.
    pub fn editing_context(&mut self) -> EditingContext<'_> {
        let slot = &mut self.buffers[self.window_ptr];
        EditingContext {
            buf: &mut slot.buf,
            history: &mut slot.history,
            clipboard: &mut self.clipboard,
            scratch: &mut self.scratch,
            error_message: &mut self.error_message,
        }
    }

    /// Assigns the least `n >= 0` not already used by another buffer sharing `name_str`.
    /// Grounded on `original_source/editing.cpp::apply_number_to_buf`.
    pub fn apply_number_to_buf(&mut self, id: BufferId) {
        let name = self
            .buffers
            .iter()
            .find(|s| s.buf.id() == id)
            .map(|s| s.buf.name_str.clone())
            .unwrap_or_default();
        let mut used: Vec<u64> = self
            .buffers
            .iter()
            .filter(|s| s.buf.id() != id && s.buf.name_str == name)
            .map(|s| s.buf.name_number)
            .collect();
        used.sort_unstable();
        let mut n = 0u64;
        for used_n in used {
            if used_n == n {
                n += 1;
            } else if used_n > n {
                break;
            }
        }
        if let Some(slot) = self.buffers.iter_mut().find(|s| s.buf.id() == id) {
            slot.buf.name_number = n;
        }
    }

    fn insert_buffer_at(&mut self, index: usize, mut buf: Buffer, name_str: &str) -> BufferId {
        let id = self.mint_buffer_id();
        buf.set_id(id);
        buf.name_str = name_str.to_string();
        self.buffers.insert(index.min(self.buffers.len()), BufferSlot::new(buf));
        self.apply_number_to_buf(id);
        id
    }

    /// `*scratch*`, recreated whenever the buffer list would otherwise become empty.
    /// Grounded on `original_source/editing.cpp::scratch_buffer`.
    pub fn push_scratch_buffer(&mut self) {
        let id = self.mint_buffer_id();
        let mut buf = Buffer::new(id);
        buf.name_str = "*scratch*".to_string();
        buf.set_window(WindowSize { rows: 24, cols: 80 });
        self.buffers.push(BufferSlot::new(buf));
        self.apply_number_to_buf(id);
    }

    /// Reads `path` into a new buffer inserted right after the current window, without
    /// switching the window to it. Grounded on
    /// `original_source/editing.cpp::open_file_into_detached_buffer`.
    pub fn open_file_into_detached_buffer(&mut self, path: &Path) -> std::io::Result<BufferId> {
        let data = std::fs::read(path)?;
        let id = self.mint_buffer_id();
        let mut buf = Buffer::from_data(id, data);
        buf.name_str = buf_name_from_file_path(path);
        buf.married_file = Some(path.to_path_buf());
        buf.set_window(WindowSize { rows: 24, cols: 80 });
        let insert_at = (self.window_ptr + 1).min(self.buffers.len());
        self.buffers.insert(insert_at, BufferSlot::new(buf));
        self.apply_number_to_buf(id);
        Ok(id)
    }

    /// Opens `path` and switches the window to the new buffer (the `file_open_prompt`
    /// continuation's effect).
    pub fn open_file_and_switch(&mut self, path: &Path) -> std::io::Result<()> {
        let id = self.open_file_into_detached_buffer(path)?;
        self.rotate_to_buffer(id);
        Ok(())
    }

    /// Reads `path` as a new buffer appended to the list, or -- if it doesn't exist yet --
    /// creates an empty buffer married to it, so saving later creates the file. Used for
    /// files named on the command line. Other I/O errors (permissions, etc.) propagate.
    pub fn open_or_create_buffer(&mut self, path: &Path) -> std::io::Result<BufferId> {
        match std::fs::read(path) {
            Ok(data) => {
                let id = self.mint_buffer_id();
                let mut buf = Buffer::from_data(id, data);
                buf.name_str = buf_name_from_file_path(path);
                buf.married_file = Some(path.to_path_buf());
                buf.set_window(WindowSize { rows: 24, cols: 80 });
                self.buffers.push(BufferSlot::new(buf));
                self.apply_number_to_buf(id);
                Ok(id)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let mut buf = Buffer::new(BufferId(0));
                buf.married_file = Some(path.to_path_buf());
                buf.set_window(WindowSize { rows: 24, cols: 80 });
                let name = buf_name_from_file_path(path);
                let insert_at = self.buffers.len();
                Ok(self.insert_buffer_at(insert_at, buf, &name))
            }
            Err(err) => Err(err),
        }
    }

    /// Mints a fresh id for a prompt's mini-buffer and opens it. The mini-buffer never
    /// joins `buffers`, but it still needs an id distinct from any real buffer's.
    pub fn open_prompt(&mut self, kind: PromptKind, message: impl Into<String>) {
        let id = self.mint_buffer_id();
        self.prompt = Some(Prompt::new(kind, id, message));
    }

    /// Writes the current buffer to `path` atomically (temp file + rename), marks it
    /// unmodified, and renames it from the file's basename. Grounded on
    /// `original_source/editing.cpp::save_file_action`/`save_as_file_action`.
    pub fn save_current_buffer_to(&mut self, path: &Path) -> std::io::Result<()> {
        let contents = self.current_buffer().copy_to_string().into_bytes();
        write_atomically(path, &contents)?;

        let id = self.current_buffer().id();
        let slot = self.current_slot_mut();
        slot.buf.married_file = Some(path.to_path_buf());
        slot.buf.name_str = buf_name_from_file_path(path);
        slot.non_modified_undo_node = slot.history.current_node;
        self.apply_number_to_buf(id);
        Ok(())
    }

    /// Buffers with unsaved edits, for the confirm-exit prompt message.
    pub fn modified_buffers(&self) -> Vec<String> {
        self.buffers
            .iter()
            .filter(|s| s.modified_flag())
            .map(|s| display_name(&s.buf))
            .collect()
    }

    /// Makes the window point at the buffer with the given id. Grounded on
    /// `original_source/editing.cpp::rotate_to_buffer`.
    pub fn rotate_to_buffer(&mut self, id: BufferId) {
        if let Some(pos) = self.buffers.iter().position(|s| s.buf.id() == id) {
            self.window_ptr = pos;
        }
    }

    pub fn rotate_to_named_buffer(&mut self, name_str: &str) -> Result<(), &'static str> {
        match self.buffers.iter().position(|s| s.buf.name_str == name_str) {
            Some(pos) => {
                self.window_ptr = pos;
                Ok(())
            }
            None => Err("No buffer with that name"),
        }
    }

    pub fn rotate_buf_left(&mut self) {
        if self.window_ptr == 0 {
            self.window_ptr = self.buffers.len() - 1;
        } else {
            self.window_ptr -= 1;
        }
    }

    pub fn rotate_buf_right(&mut self) {
        self.window_ptr = (self.window_ptr + 1) % self.buffers.len();
    }

    /// Removes the buffer at `window_ptr`; if that empties the list, recreates
    /// `*scratch*`. Grounded on the close half of
    /// `original_source/editing.cpp::buffer_close_prompt`'s continuation.
    pub fn close_buffer(&mut self, id: BufferId) {
        if let Some(pos) = self.buffers.iter().position(|s| s.buf.id() == id) {
            self.buffers.remove(pos);
            if self.window_ptr >= self.buffers.len() {
                self.window_ptr = 0;
            }
        }
        if self.buffers.is_empty() {
            self.push_scratch_buffer();
        }
    }

    pub fn cancel_action(&mut self) -> UndoKillringHandled {
        self.prompt = None;
        let mut ctx = self.editing_context();
        crate::editing::note_backout_action(&mut ctx)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Grounded on `original_source/editing.cpp::buf_name_from_file_path` (basename only, no
/// extension stripping -- matches the original's display convention).
pub fn buf_name_from_file_path(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn display_name(buf: &Buffer) -> String {
    if buf.name_number == 0 {
        buf.name_str.clone()
    } else {
        format!("{}<{}>", buf.name_str, buf.name_number)
    }
}

/// Write-temp-then-rename, so a crash mid-save never leaves a half-written file in
/// `path`'s place. Grounded on spec §6 "Save uses write-temp + rename for atomicity."
fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
