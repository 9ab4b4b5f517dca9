//! The byte-level character model.
//!
//! The buffer is explicitly a sequence of raw bytes, not Unicode scalar values or grapheme
//! clusters -- see the crate's Non-goals. Every byte is rendered independently: printable
//! bytes verbatim, `\t` as a run of spaces to the next tab stop, control bytes (`< 0x20`
//! or `0x7f`) as a two-column `^X` escape, and `\n` as a line break rather than a glyph.

/// Fixed tab stop width. Not configurable -- see Non-goals.
pub const TAB_WIDTH: u8 = 8;
pub const TAB_MOD_MASK: usize = (TAB_WIDTH - 1) as usize;

/// XOR mask used to print control bytes as `^X`, e.g. Ctrl-A (0x01) renders as `^A`
/// (0x01 ^ 0x40 = 0x41 = 'A').
pub const CTRL_XOR_MASK: u8 = 64;

/// The rendered form of one buffer byte, produced by [`render`].
///
/// `buf[..count]` holds the glyph(s) to draw; `count` is always 1 or more. A `\n` byte
/// does not produce a glyph at all -- callers must check for it (via [`render`] returning
/// `None`) before consulting this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharRendering {
    pub buf: [u8; 8],
    pub count: usize,
}

impl CharRendering {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.count]
    }
}

/// Renders one buffer byte, advancing `*line_col` (the current on-screen column within
/// the logical line) by the glyph width. Returns `None` for `\n`, in which case
/// `*line_col` is reset to 0 -- the caller is responsible for moving to a new row.
///
/// Grounded on `original_source/term_ui.cpp::compute_char_rendering`.
pub fn render(ch: u8, line_col: &mut usize) -> Option<CharRendering> {
    if ch == b'\n' {
        *line_col = 0;
        return None;
    }

    let rendering = if ch == b'\t' {
        let next_line_col = (*line_col | TAB_MOD_MASK) + 1;
        let count = next_line_col - *line_col;
        let mut buf = [b' '; 8];
        let _ = &mut buf;
        CharRendering { buf, count }
    } else if ch < 32 || ch == 127 {
        let mut buf = [0u8; 8];
        buf[0] = b'^';
        buf[1] = ch ^ CTRL_XOR_MASK;
        CharRendering { buf, count: 2 }
    } else {
        let mut buf = [0u8; 8];
        buf[0] = ch;
        CharRendering { buf, count: 1 }
    };
    *line_col += rendering.count;
    Some(rendering)
}

/// Characters that make up a "word" for the purposes of forward/backward word motion.
/// Matches the original's deliberately narrow ASCII-only definition (see
/// `original_source/movement.cpp::is_solid`) -- Unicode word segmentation is a Non-goal.
pub fn is_solid(ch: u8) -> bool {
    ch.is_ascii_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_printable_byte_verbatim() {
        let mut col = 0;
        let r = render(b'x', &mut col).unwrap();
        assert_eq!(r.as_bytes(), b"x");
        assert_eq!(col, 1);
    }

    #[test]
    fn renders_newline_as_none_and_resets_column() {
        let mut col = 5;
        assert!(render(b'\n', &mut col).is_none());
        assert_eq!(col, 0);
    }

    #[test]
    fn renders_control_byte_as_caret_escape() {
        let mut col = 0;
        let r = render(1, &mut col).unwrap(); // Ctrl-A
        assert_eq!(r.as_bytes(), b"^A");
        assert_eq!(col, 2);
    }

    #[test]
    fn renders_del_as_caret_escape() {
        let mut col = 0;
        let r = render(127, &mut col).unwrap();
        assert_eq!(r.as_bytes(), b"^?");
    }

    #[test]
    fn tab_advances_to_next_stop() {
        let mut col = 3;
        let r = render(b'\t', &mut col).unwrap();
        assert_eq!(r.count, 5);
        assert_eq!(col, 8);
    }

    #[test]
    fn tab_at_stop_advances_full_width() {
        let mut col = 8;
        let r = render(b'\t', &mut col).unwrap();
        assert_eq!(r.count, 8);
        assert_eq!(col, 16);
    }

    #[test]
    fn is_solid_is_ascii_alnum_only() {
        assert!(is_solid(b'a'));
        assert!(is_solid(b'Z'));
        assert!(is_solid(b'0'));
        assert!(!is_solid(b'_'));
        assert!(!is_solid(b' '));
        assert!(!is_solid(0xC3)); // UTF-8 lead byte of a non-ASCII char, not solid
    }
}
