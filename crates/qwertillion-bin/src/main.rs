//! Qwertillion entrypoint: CLI parsing, logging setup, and the cooperative event loop
//! that drives `core-text`/`core-render`/`core-input`/`core-state` against a real
//! terminal. The loop and key-to-action bindings here are glue, not the tested core (spec
//! §1 keeps the dispatch table and event loop out of scope) -- everything they call into
//! is unit- and integration-tested in its owning crate.
//!
//! Logging setup grounded on the teacher's `configure_logging`/`install_panic_hook`.

use std::io::{stdout, Write};
use std::path::PathBuf;
use std::sync::Once;

use anyhow::Result;
use crossterm::event::{Event as CEvent, KeyEventKind};
use crossterm::{cursor::MoveTo, queue, style::Print};
use tracing_appender::non_blocking::WorkerGuard;

use core_input::{KeyValue, Keypress, ModMask, SpecialKey};
use core_render::{render_into_frame, CellFlags, Frame, RenderCoord, TerminalCoord};
use core_state::editing;
use core_state::prompt::{enter_handle_status_prompt, Prompt, PromptKind, PromptOutcome};
use core_state::undo::perform_undo;
use core_state::State;
use core_terminal::CrosstermBackend;
use core_text::buffer::WindowSize;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const USAGE: &str = "\
Usage: qwertillion [--help | --version | FILES... [-- FILES...]]

Opens FILES for editing, creating them if they don't exist. A literal `--`
treats every argument after it as a filename, even one starting with `-`.
";

enum CliAction {
    Help,
    Version,
    Open(Vec<PathBuf>),
}

/// Grounded on `original_source/main.cpp`'s argument-parsing contract: `--help`/
/// `--version` are only recognized as the first argument; anything else starting with
/// `-` before a literal `--` is an unrecognized option.
fn parse_command_line(args: &[String]) -> Result<CliAction, String> {
    if let Some(first) = args.first() {
        if first == "--help" {
            return Ok(CliAction::Help);
        }
        if first == "--version" {
            return Ok(CliAction::Version);
        }
    }

    let mut files = Vec::new();
    let mut literal = false;
    for arg in args {
        if !literal && arg == "--" {
            literal = true;
            continue;
        }
        if !literal && arg.starts_with('-') {
            return Err(format!("unrecognized option '{arg}'"));
        }
        files.push(PathBuf::from(arg));
    }
    Ok(CliAction::Open(files))
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = std::path::Path::new(".");
    let file_appender = tracing_appender::rolling::never(log_dir, "qwertillion.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None, // a subscriber is already installed (e.g. under a test harness)
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let action = match parse_command_line(&args) {
        Ok(action) => action,
        Err(msg) => {
            eprintln!("qwertillion: {msg}");
            std::process::exit(2);
        }
    };

    match action {
        CliAction::Help => {
            print!("{USAGE}");
            std::process::exit(0);
        }
        CliAction::Version => {
            println!("Qwertillion {VERSION}");
            std::process::exit(0);
        }
        CliAction::Open(files) => {
            let _log_guard = configure_logging();
            install_panic_hook();
            match run_program(files) {
                Ok(()) => std::process::exit(0),
                Err(err) => {
                    tracing::error!(target: "runtime", %err, "uncaught error");
                    std::process::exit(1);
                }
            }
        }
    }
}

fn run_program(files: Vec<PathBuf>) -> Result<()> {
    let mut state = State::new();
    let mut first_opened = None;
    for path in &files {
        match state.open_or_create_buffer(path) {
            Ok(id) => {
                first_opened.get_or_insert(id);
            }
            Err(err) => {
                tracing::warn!(target: "io", path = %path.display(), %err, "failed to open file");
            }
        }
    }
    if let Some(id) = first_opened {
        state.rotate_to_buffer(id);
    }

    let mut backend = CrosstermBackend::new();
    let _guard = backend.enter_guard()?;

    let mut frame = Frame::new(frame_window()?);

    loop {
        render_and_flush(&mut state, &mut frame)?;

        let event = crossterm::event::read()?;
        let CEvent::Key(key_event) = event else {
            continue;
        };
        if key_event.kind == KeyEventKind::Release {
            continue;
        }
        let Some(keypress) = core_input::map_key_event(key_event) else {
            continue;
        };

        let should_quit = if state.prompt.is_some() {
            handle_prompt_key(&mut state, keypress)
        } else {
            handle_key(&mut state, keypress)
        };
        if should_quit {
            break;
        }
    }

    Ok(())
}

fn frame_window() -> Result<WindowSize> {
    let (cols, rows) = crossterm::terminal::size()?;
    Ok(WindowSize { rows: rows as u32, cols: cols as u32 })
}

/// Renders the current buffer plus a one-line status/prompt area, per spec §3's "single
/// window plus a single-row status/prompt area", then writes the frame to the terminal.
fn render_and_flush(state: &mut State, frame: &mut Frame) -> Result<()> {
    let window = frame_window()?;
    frame.reinit(window);

    let buf_window = WindowSize {
        rows: window.rows.saturating_sub(1),
        cols: window.cols,
    };
    let status_row = window.rows.saturating_sub(1);

    if let Some(prompt) = &mut state.prompt {
        prompt.mini_buf.set_window(WindowSize { rows: 1, cols: window.cols });
        let cursor = prompt.mini_buf.cursor();
        let mut coords = [RenderCoord::new(cursor)];
        render_into_frame(frame, TerminalCoord::default(), buf_window, &prompt.mini_buf, &mut coords);
        if let Some(pos) = coords[0].rendered_pos {
            frame.cursor = Some(TerminalCoord { row: pos.row, col: pos.col });
        }
        let message = prompt.message.clone();
        write_status_row(frame, status_row, window.cols, &message);
    } else {
        state.current_buffer_mut().set_window(buf_window);
        let cursor = state.current_buffer().cursor();
        let mut coords = [RenderCoord::new(cursor)];
        render_into_frame(frame, TerminalCoord::default(), buf_window, state.current_buffer(), &mut coords);
        if let Some(pos) = coords[0].rendered_pos {
            frame.cursor = Some(TerminalCoord { row: pos.row, col: pos.col });
        }
        let status = state
            .error_message
            .clone()
            .unwrap_or_else(|| state.current_buffer().name_str.clone());
        write_status_row(frame, status_row, window.cols, &status);
    }

    flush_to_terminal(frame)
}

fn write_status_row(frame: &mut Frame, row: u32, cols: u32, text: &str) {
    let start = row as usize * frame.window.cols as usize;
    let bytes = text.as_bytes();
    for col in 0..cols as usize {
        let cell = &mut frame.data[start + col];
        cell.value = bytes.get(col).copied().unwrap_or(b' ');
        cell.flags = CellFlags::empty();
    }
}

fn flush_to_terminal(frame: &Frame) -> Result<()> {
    let mut out = stdout();
    queue!(out, crossterm::terminal::Clear(crossterm::terminal::ClearType::All))?;
    for row in 0..frame.window.rows {
        queue!(out, MoveTo(0, row as u16))?;
        let start = row as usize * frame.window.cols as usize;
        let end = start + frame.window.cols as usize;
        let line: String = frame.data[start..end].iter().map(|c| c.value as char).collect();
        queue!(out, Print(line))?;
    }
    if let Some(cursor) = frame.cursor {
        queue!(out, MoveTo(cursor.col as u16, cursor.row as u16))?;
    }
    out.flush()?;
    Ok(())
}

/// Ordinary-mode key dispatch. This is a small, illustrative Emacs-ish binding set, not a
/// faithful port of the original's full keymap (spec §1 scopes dispatch tables out).
/// Returns `true` if the event loop should stop.
fn handle_key(state: &mut State, kp: Keypress) -> bool {
    use KeyValue::*;

    match (kp.value, kp.modmask) {
        (Char('q'), m) if m == ModMask::CTRL => return true,
        (Char('s'), m) if m == ModMask::CTRL => start_save_prompt(state),
        (Char('x'), m) if m == ModMask::CTRL => start_close_prompt(state),
        (Char(' '), m) if m == ModMask::CTRL => {
            state.current_buffer_mut().set_mark();
            let mut ctx = state.editing_context();
            let _ = editing::note_navigation_action(&mut ctx);
        }
        (Char('k'), m) if m == ModMask::CTRL => {
            let mut ctx = state.editing_context();
            let _ = editing::kill_line(&mut ctx);
        }
        (Char('w'), m) if m == ModMask::CTRL => {
            let mut ctx = state.editing_context();
            let _ = editing::kill_region(&mut ctx);
        }
        (Char('w'), m) if m == ModMask::META => {
            let mut ctx = state.editing_context();
            let _ = editing::copy_region(&mut ctx);
        }
        (Char('y'), m) if m == ModMask::CTRL => {
            let mut ctx = state.editing_context();
            let _ = editing::yank_from_clipboard(&mut ctx);
        }
        (Char('y'), m) if m == ModMask::META => {
            let mut ctx = state.editing_context();
            let _ = editing::alt_yank_from_clipboard(&mut ctx);
        }
        (Char('/'), m) if m == ModMask::CTRL => {
            let slot = state.current_slot_mut();
            perform_undo(&mut slot.history, &mut slot.buf);
        }
        (Char('a'), m) if m == ModMask::CTRL => navigate(state, core_text::motion::move_home),
        (Char('e'), m) if m == ModMask::CTRL => navigate(state, core_text::motion::move_end),
        (Char('f'), m) if m == ModMask::CTRL => navigate(state, |b| b.move_right_by(1)),
        (Char('b'), m) if m == ModMask::CTRL => navigate(state, |b| b.move_left_by(1)),
        (Char('p'), m) if m == ModMask::CTRL => navigate(state, core_text::motion::move_up),
        (Char('n'), m) if m == ModMask::CTRL => navigate(state, core_text::motion::move_down),
        (Special(SpecialKey::Left), _) => navigate(state, |b| b.move_left_by(1)),
        (Special(SpecialKey::Right), _) => navigate(state, |b| b.move_right_by(1)),
        (Special(SpecialKey::Up), _) => navigate(state, core_text::motion::move_up),
        (Special(SpecialKey::Down), _) => navigate(state, core_text::motion::move_down),
        (Special(SpecialKey::Home), _) => navigate(state, core_text::motion::move_home),
        (Special(SpecialKey::End), _) => navigate(state, core_text::motion::move_end),
        (Special(SpecialKey::Backspace), _) => {
            let mut ctx = state.editing_context();
            let _ = editing::delete_char_backward(&mut ctx);
        }
        (Special(SpecialKey::Delete), _) => {
            let mut ctx = state.editing_context();
            let _ = editing::delete_char_forward(&mut ctx);
        }
        (Special(SpecialKey::Enter), _) => {
            let mut ctx = state.editing_context();
            let _ = editing::type_char(&mut ctx, b'\n');
        }
        (Special(SpecialKey::Tab), _) => {
            let mut ctx = state.editing_context();
            let _ = editing::type_char(&mut ctx, b'\t');
        }
        (Char(ch), m) if m.is_empty() || m == ModMask::SHIFT => {
            if ch.is_ascii() {
                let mut ctx = state.editing_context();
                let _ = editing::type_char(&mut ctx, ch as u8);
            }
        }
        _ => {}
    }
    false
}

fn navigate(state: &mut State, f: impl FnOnce(&mut core_text::buffer::Buffer)) {
    f(state.current_buffer_mut());
    let mut ctx = state.editing_context();
    let _ = editing::note_navigation_action(&mut ctx);
}

fn start_save_prompt(state: &mut State) {
    if let Some(path) = state.current_buffer().married_file.clone() {
        if let Err(err) = state.save_current_buffer_to(&path) {
            state.error_message = Some(err.to_string());
        }
        return;
    }
    state.open_prompt(PromptKind::FileSave, "Save as:");
}

fn start_close_prompt(state: &mut State) {
    let target = state.current_buffer().id();
    state.open_prompt(PromptKind::BufferClose { target }, "Close buffer? (yes/no)");
}

/// Keys while a status prompt is active: edits go to the mini-buffer; Enter dispatches
/// the prompt's continuation; `C-g` cancels. Returns `true` to quit the program (never
/// happens from a prompt in this minimal loop, but kept for symmetry with `handle_key`).
fn handle_prompt_key(state: &mut State, kp: Keypress) -> bool {
    match (kp.value, kp.modmask) {
        (KeyValue::Char('g'), m) if m == ModMask::CTRL => {
            state.prompt = None;
            let _ = state.cancel_action();
        }
        (KeyValue::Special(SpecialKey::Backspace), _) => {
            if let Some(prompt) = &mut state.prompt {
                prompt.mini_buf.delete_left(1);
            }
        }
        (KeyValue::Special(SpecialKey::Enter), _) => {
            if let Some(prompt) = &state.prompt {
                let (outcome, _handled) = enter_handle_status_prompt(prompt);
                apply_prompt_outcome(state, outcome);
            }
        }
        (KeyValue::Char(ch), _) if ch.is_ascii() => {
            if let Some(prompt) = &mut state.prompt {
                prompt.mini_buf.insert_chars(&[ch as u8]);
            }
        }
        _ => {}
    }
    false
}

fn apply_prompt_outcome(state: &mut State, outcome: PromptOutcome) {
    match outcome {
        PromptOutcome::Reprompt(message) => {
            // The original reopens a fresh prompt of the same kind rather than leaving
            // the invalid text sitting in the mini-buffer.
            if let Some(prompt) = &state.prompt {
                let id = prompt.mini_buf.id();
                let kind = prompt.kind.clone();
                state.prompt = Some(Prompt::new(kind, id, message));
            }
        }
        PromptOutcome::Closed => {
            state.prompt = None;
        }
        PromptOutcome::ClosedWithError(message) => {
            state.prompt = None;
            state.error_message = Some(message);
        }
        PromptOutcome::OpenFile { path } => {
            state.prompt = None;
            match state.open_or_create_buffer(&path) {
                Ok(id) => state.rotate_to_buffer(id),
                Err(err) => state.error_message = Some(err.to_string()),
            }
        }
        PromptOutcome::SaveFile { path, .. } => {
            state.prompt = None;
            if let Err(err) = state.save_current_buffer_to(&path) {
                state.error_message = Some(err.to_string());
            }
        }
        PromptOutcome::CloseBuffer { target } => {
            state.prompt = None;
            state.close_buffer(target);
        }
        PromptOutcome::ExitProgram => {
            state.prompt = None;
            std::process::exit(0);
        }
        PromptOutcome::SwitchToBuffer { name_str } => {
            state.prompt = None;
            if state.rotate_to_named_buffer(&name_str).is_err() {
                state.error_message = Some(format!("No buffer named '{name_str}'"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_args_opens_with_no_files() {
        let action = parse_command_line(&[]).unwrap();
        assert!(matches!(action, CliAction::Open(files) if files.is_empty()));
    }

    #[test]
    fn help_must_be_first_argument() {
        assert!(matches!(parse_command_line(&["--help".to_string()]).unwrap(), CliAction::Help));
    }

    #[test]
    fn version_must_be_first_argument() {
        assert!(matches!(parse_command_line(&["--version".to_string()]).unwrap(), CliAction::Version));
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(parse_command_line(&["--bogus".to_string()]).is_err());
    }

    #[test]
    fn double_dash_treats_rest_as_literal_filenames() {
        let action = parse_command_line(&["--".to_string(), "-weird-name".to_string()]).unwrap();
        match action {
            CliAction::Open(files) => assert_eq!(files, vec![PathBuf::from("-weird-name")]),
            _ => panic!("expected Open"),
        }
    }

    #[test]
    fn plain_filenames_are_collected() {
        let action = parse_command_line(&["a.txt".to_string(), "b.txt".to_string()]).unwrap();
        match action {
            CliAction::Open(files) => assert_eq!(files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]),
            _ => panic!("expected Open"),
        }
    }
}
