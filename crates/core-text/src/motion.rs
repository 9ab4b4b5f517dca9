//! Word and line movement.
//!
//! `move_up`/`move_down` only update the buffer's cursor and `virtual_column`; they do
//! *not* recenter the viewport if the cursor ends up offscreen -- that's `core-render`'s
//! `recenter_cursor_if_offscreen`, and callers (`core-state`'s editing primitives) are
//! expected to call it after every motion that can scroll. Grounded on
//! `original_source/movement.cpp`.

use crate::buffer::Buffer;
use crate::byte::{is_solid, render};

pub fn forward_word_distance(buf: &Buffer) -> usize {
    let cursor = buf.cursor();
    let mut i = cursor;
    let mut reached_solid = false;
    while i < buf.size() {
        let ch = buf.get(i);
        if is_solid(ch) {
            reached_solid = true;
        } else if reached_solid {
            break;
        }
        i += 1;
    }
    i - cursor
}

pub fn backward_word_distance(buf: &Buffer) -> usize {
    let cursor = buf.cursor();
    let mut count = 0usize;
    let mut reached_solid = false;
    while count < cursor {
        let ch = buf.get(cursor - (count + 1));
        if is_solid(ch) {
            reached_solid = true;
        } else if reached_solid {
            break;
        }
        count += 1;
    }
    count
}

pub fn move_forward_word(buf: &mut Buffer) {
    let d = forward_word_distance(buf);
    buf.move_right_by(d);
}

pub fn move_backward_word(buf: &mut Buffer) {
    let d = backward_word_distance(buf);
    buf.move_left_by(d);
}

const SENTINEL: usize = usize::MAX;

/// Moves the cursor up one visual row, tracking `virtual_column` across shorter lines.
/// Grounded on `original_source/movement.cpp::move_up`.
pub fn move_up(buf: &mut Buffer) {
    let window_cols = (buf.window.cols as usize).max(1);
    buf.ensure_virtual_column_initialized();
    let preserved_column = buf.virtual_column;
    let target_column = preserved_column.unwrap() % window_cols;

    let cursor = buf.cursor();
    let bol1 = cursor - buf.cursor_distance_to_beginning_of_line();
    let bol = if bol1 == 0 {
        0
    } else {
        (bol1 - 1) - buf.distance_to_beginning_of_line(bol1 - 1)
    };

    let mut col = 0usize;
    let mut line_col = 0usize;
    let mut prev_row_cursor_proposal = SENTINEL;
    let mut current_row_cursor_proposal = bol;

    let mut i = bol;
    while i < cursor {
        let ch = buf.get(i);
        match render(ch, &mut line_col) {
            None => {
                prev_row_cursor_proposal = current_row_cursor_proposal;
                col = 0;
                current_row_cursor_proposal = i + 1;
            }
            Some(rendering) => {
                col += rendering.count;
                if col >= window_cols {
                    col -= window_cols;
                    prev_row_cursor_proposal = current_row_cursor_proposal;
                    if col >= window_cols {
                        prev_row_cursor_proposal = i;
                        while col >= window_cols {
                            col -= window_cols;
                        }
                    }
                    current_row_cursor_proposal = i + 1;
                } else if col <= target_column {
                    current_row_cursor_proposal = i + 1;
                }
            }
        }
        i += 1;
    }

    if prev_row_cursor_proposal == SENTINEL {
        // Already on the top row.
        return;
    }
    buf.set_cursor(prev_row_cursor_proposal);
    buf.virtual_column = preserved_column;
}

/// Grounded on `original_source/movement.cpp::move_down`.
pub fn move_down(buf: &mut Buffer) {
    let window_cols = (buf.window.cols as usize).max(1);
    buf.ensure_virtual_column_initialized();
    let preserved_column = buf.virtual_column;
    let target_column = preserved_column.unwrap() % window_cols;

    let mut line_col = buf.current_column();
    let mut col = line_col % window_cols;

    let mut candidate_index = SENTINEL;
    let mut i = buf.cursor();
    let size = buf.size();
    while i < size {
        let ch = buf.get(i);
        match render(ch, &mut line_col) {
            None => {
                if candidate_index != SENTINEL {
                    break;
                }
                col = 0;
                candidate_index = i + 1;
            }
            Some(rendering) => {
                col += rendering.count;
                if col >= window_cols {
                    if candidate_index != SENTINEL {
                        break;
                    }
                    while col >= window_cols {
                        col -= window_cols;
                    }
                    candidate_index = i + 1;
                } else if candidate_index != SENTINEL && col <= target_column {
                    candidate_index = i + 1;
                }
            }
        }
        i += 1;
    }

    if candidate_index == SENTINEL {
        candidate_index = buf.size();
    }
    buf.set_cursor(candidate_index);
    buf.virtual_column = preserved_column;
}

pub fn move_home(buf: &mut Buffer) {
    let distance = buf.cursor_distance_to_beginning_of_line();
    buf.move_left_by(distance);
}

pub fn move_end(buf: &mut Buffer) {
    let cursor = buf.cursor();
    let distance = buf.distance_to_eol(cursor);
    buf.move_right_by(distance);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferId;

    fn buf(data: &str, cols: u32) -> Buffer {
        let mut b = Buffer::from_data(BufferId(0), data.as_bytes().to_vec());
        b.set_window(crate::buffer::WindowSize { rows: 24, cols });
        b
    }

    #[test]
    fn forward_word_distance_skips_to_end_of_next_word() {
        let mut b = buf("  hello world", 80);
        b.set_cursor(0);
        assert_eq!(forward_word_distance(&b), 7); // "  hello"
    }

    #[test]
    fn backward_word_distance_skips_to_start_of_word() {
        let mut b = buf("hello world", 80);
        b.set_cursor(11);
        assert_eq!(backward_word_distance(&b), 5); // "world"
    }

    #[test]
    fn move_home_and_end_bracket_the_line() {
        let mut b = buf("abc\ndefgh\nij", 80);
        b.set_cursor(7);
        move_home(&mut b);
        assert_eq!(b.cursor(), 4);
        move_end(&mut b);
        assert_eq!(b.cursor(), 9);
    }

    #[test]
    fn move_down_then_up_returns_to_original_column() {
        let mut b = buf("abcdef\nxy\nuvwxyz", 80);
        b.set_cursor(4); // column 4 on line "abcdef"
        move_down(&mut b); // shorter line "xy" -> clamps to end of line
        assert_eq!(b.cursor(), 9); // end of "xy" line (7+2)
        move_up(&mut b);
        assert_eq!(b.cursor(), 4);
    }

    #[test]
    fn move_up_on_top_row_is_noop() {
        let mut b = buf("abc", 80);
        b.set_cursor(1);
        move_up(&mut b);
        assert_eq!(b.cursor(), 1);
    }
}
