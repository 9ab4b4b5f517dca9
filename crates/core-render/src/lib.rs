//! Terminal grid rendering and scroll control.
//!
//! A [`Frame`] is a flat grid of [`Cell`]s representing one rendered terminal screen.
//! [`render_into_frame`] renders a buffer's visible region into a sub-rectangle of a
//! frame, soft-wrapping long lines and expanding tabs/control characters via
//! `core-text::byte::render`. Probe positions ([`RenderCoord`]) are resolved in the same
//! single pass, rather than via a separate simulation -- this is what lets
//! [`cursor_is_offscreen`] answer its question by rendering into a scratch frame and
//! checking whether the cursor's probe got a position.
//!
//! Grounded on `original_source/term_ui.hpp` and `original_source/term_ui.cpp`.

use bitflags::bitflags;
use core_text::buffer::{Buffer, WindowSize};
use core_text::byte::render as render_byte;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CellFlags: u8 {
        const BOLD = 1 << 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub value: u8,
    pub flags: CellFlags,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            value: b' ',
            flags: CellFlags::empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalCoord {
    pub row: u32,
    pub col: u32,
}

/// A full terminal screen. `data.len() == window.rows * window.cols`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub window: WindowSize,
    pub cursor: Option<TerminalCoord>,
    pub data: Vec<Cell>,
}

impl Frame {
    pub fn new(window: WindowSize) -> Self {
        let area = window.rows as usize * window.cols as usize;
        Frame {
            window,
            cursor: None,
            data: vec![Cell::default(); area],
        }
    }

    pub fn reinit(&mut self, window: WindowSize) {
        let area = window.rows as usize * window.cols as usize;
        self.window = window;
        self.cursor = None;
        self.data.clear();
        self.data.resize(area, Cell::default());
    }

    fn row_slice_mut(&mut self, row: u32, topleft_col: u32, cols: u32) -> &mut [Cell] {
        let start = row as usize * self.window.cols as usize + topleft_col as usize;
        &mut self.data[start..start + cols as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCoord {
    pub row: u32,
    pub col: u32,
}

/// A query position: resolved in-place by [`render_into_frame`]. `rendered_pos` is `None`
/// on input (or after rendering, if `buf_pos` fell outside the rendered window).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderCoord {
    pub buf_pos: usize,
    pub rendered_pos: Option<WindowCoord>,
}

impl RenderCoord {
    pub fn new(buf_pos: usize) -> Self {
        RenderCoord {
            buf_pos,
            rendered_pos: None,
        }
    }
}

pub fn too_small_to_render(window: &WindowSize) -> bool {
    window.cols < 2 || window.rows == 0
}

/// Renders `buf`'s visible region (starting at `buf.first_visible_offset`) into
/// `frame`'s sub-rectangle at `window_topleft` of size `window`. `render_coords` must be
/// sorted by `buf_pos`; each gets its `rendered_pos` filled in (or left `None` if it never
/// appears on a rendered row).
///
/// Grounded on `original_source/term_ui.cpp::render_into_frame`.
pub fn render_into_frame(
    frame: &mut Frame,
    window_topleft: TerminalCoord,
    window: WindowSize,
    buf: &Buffer,
    render_coords: &mut [RenderCoord],
) {
    assert!(window_topleft.row + window.rows <= frame.window.rows);
    assert!(window_topleft.col + window.cols <= frame.window.cols);

    let first_visible_offset = buf.first_visible_offset;
    let mut i = first_visible_offset - buf.distance_to_beginning_of_line(first_visible_offset);

    let mut render_row = vec![Cell::default(); window.cols as usize];
    let mut render_coords_begin = 0usize;
    let mut render_coords_end = 0usize;
    let mut line_col = 0usize;
    let mut col = 0usize;
    let mut row = 0u32;

    fn target_of(render_coords: &[RenderCoord], end: usize) -> usize {
        render_coords.get(end).map(|c| c.buf_pos).unwrap_or(usize::MAX)
    }

    macro_rules! copy_row_if_visible {
        () => {{
            col = 0;
            if i > first_visible_offset {
                if row < window.rows {
                    frame
                        .row_slice_mut(window_topleft.row + row, window_topleft.col, window.cols)
                        .copy_from_slice(&render_row);
                    while render_coords_begin < render_coords_end {
                        // Only the row is unknown at match time; preserve the column the
                        // probe was matched at.
                        if let Some(pos) = &mut render_coords[render_coords_begin].rendered_pos {
                            pos.row = row;
                        }
                        render_coords_begin += 1;
                    }
                }
                row += 1;
            }
            while render_coords_begin < render_coords_end {
                render_coords[render_coords_begin].rendered_pos = None;
                render_coords_begin += 1;
            }
        }};
    }

    let mut render_coord_target = target_of(render_coords, render_coords_end);
    while row < window.rows && i < buf.size() {
        while i == render_coord_target {
            render_coords[render_coords_end].rendered_pos = Some(WindowCoord { row: u32::MAX, col: col as u32 });
            render_coords_end += 1;
            render_coord_target = target_of(render_coords, render_coords_end);
        }

        let ch = buf.get(i);
        match render_byte(ch, &mut line_col) {
            Some(rendering) => {
                let bytes = rendering.as_bytes();
                for &b in &bytes[..bytes.len() - 1] {
                    render_row[col] = Cell { value: b, flags: CellFlags::empty() };
                    col += 1;
                    if col == window.cols as usize {
                        copy_row_if_visible!();
                    }
                }
                render_row[col] = Cell {
                    value: bytes[bytes.len() - 1],
                    flags: CellFlags::empty(),
                };
                col += 1;
                i += 1;
                if col == window.cols as usize {
                    copy_row_if_visible!();
                }
            }
            None => {
                while col < window.cols as usize {
                    render_row[col] = Cell::default();
                    col += 1;
                }
                i += 1;
                copy_row_if_visible!();
            }
        }
    }

    while i == render_coord_target {
        render_coords[render_coords_end].rendered_pos = Some(WindowCoord { row: u32::MAX, col: col as u32 });
        render_coords_end += 1;
        render_coord_target = target_of(render_coords, render_coords_end);
    }

    while row < window.rows {
        while col < window.cols as usize {
            render_row[col] = Cell::default();
            col += 1;
        }
        frame
            .row_slice_mut(window_topleft.row + row, window_topleft.col, window.cols)
            .copy_from_slice(&render_row);
        while render_coords_begin < render_coords_end {
            if let Some(pos) = &mut render_coords[render_coords_begin].rendered_pos {
                pos.row = row;
            }
            render_coords_begin += 1;
        }
        row += 1;
        col = 0;
    }
    while render_coords_begin < render_coords_end {
        render_coords[render_coords_begin].rendered_pos = None;
        render_coords_begin += 1;
    }
}

/// Scratch frame reused across offscreen checks to avoid reallocating a full grid per
/// keystroke.
pub struct ScratchFrame(Frame);

impl ScratchFrame {
    pub fn new() -> Self {
        ScratchFrame(Frame::new(WindowSize { rows: 0, cols: 0 }))
    }
}

impl Default for ScratchFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// Grounded on `original_source/term_ui.cpp::cursor_is_offscreen`.
pub fn cursor_is_offscreen(scratch: &mut ScratchFrame, buf: &Buffer, cursor: usize) -> bool {
    let window = buf.window;
    if too_small_to_render(&window) {
        return false;
    }
    if cursor < buf.first_visible_offset {
        return true;
    }

    scratch.0.reinit(window);
    let mut coords = [RenderCoord::new(cursor)];
    render_into_frame(&mut scratch.0, TerminalCoord::default(), window, buf, &mut coords);
    coords[0].rendered_pos.is_none()
}

/// Scrolls `buf` so that `buf_pos` renders close to visual row `rowno`.
/// Grounded on `original_source/term_ui.cpp::scroll_to_row`.
pub fn scroll_to_row(buf: &mut Buffer, rowno: u32, buf_pos: usize) {
    let window_cols = (buf.window.cols as usize).max(1);

    let mut rows_stepbacked: usize = 0;
    let mut pos = buf_pos;
    loop {
        let col = buf.pos_current_column(pos);
        let row_in_line = col / window_cols;
        rows_stepbacked += row_in_line;
        pos -= buf.distance_to_beginning_of_line(pos);
        if rows_stepbacked == rowno as usize || pos == 0 {
            buf.first_visible_offset = pos;
            return;
        } else if rows_stepbacked < rowno as usize {
            pos -= 1;
            rows_stepbacked += 1;
        } else {
            break;
        }
    }

    // Stepped back too far; walk forward from `pos` (a line start) re-rendering until
    // we've accounted for the excess rows.
    let mut i = pos;
    let mut line_col = 0usize;
    let mut col = 0usize;
    loop {
        if i == buf_pos {
            buf.first_visible_offset = pos;
            return;
        }
        let ch = buf.get(i);
        let advance = match render_byte(ch, &mut line_col) {
            None => 0,
            Some(r) => r.count,
        };
        col += advance;
        while col >= window_cols {
            rows_stepbacked -= 1;
            col -= window_cols;
            if rows_stepbacked == rowno as usize {
                buf.first_visible_offset = i + usize::from(col == 0);
                return;
            }
        }
        i += 1;
    }
}

/// Grounded on `original_source/term_ui.cpp::scroll_to_mid`.
pub fn scroll_to_mid(buf: &mut Buffer, buf_pos: usize) {
    let rowno = buf.window.rows / 2;
    scroll_to_row(buf, rowno, buf_pos);
}

pub fn recenter_cursor_if_offscreen(scratch: &mut ScratchFrame, buf: &mut Buffer) {
    let cursor = buf.cursor();
    if cursor_is_offscreen(scratch, buf, cursor) {
        scroll_to_mid(buf, cursor);
    }
}
