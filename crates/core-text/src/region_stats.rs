//! Region statistics: a monoid over byte slices letting the buffer recompute line/column
//! bookkeeping incrementally instead of rescanning from the start of the buffer on every
//! edit.
//!
//! Grounded bit-for-bit on `original_source/region_stats.cpp`.

use crate::byte::{render, TAB_MOD_MASK, TAB_WIDTH};

/// Stats for a contiguous run of bytes. The zero value is the stats of the empty string,
/// which makes `RegionStats::default()` the monoid identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionStats {
    pub newline_count: usize,
    /// On-screen column width of the text after the last newline in the region (or of the
    /// whole region if it has no newline).
    pub last_line_size: usize,
    /// If `newline_count == 0` and the region's line contains a tab, the rendered width
    /// (1..=TAB_WIDTH) of the *first* tab in the region. Otherwise 0.
    pub first_tab_size: usize,
}

fn find_after_last(data: &[u8], ch: u8) -> usize {
    match data.iter().rposition(|&b| b == ch) {
        Some(i) => i + 1,
        None => 0,
    }
}

/// Computes `(last_line_size, first_tab_size)` for a byte slice known to contain no
/// newline.
fn compute_line_stats(data: &[u8]) -> (usize, usize) {
    let mut line_col = 0usize;
    let mut first_tab_size = 0usize;
    for &ch in data {
        let rendering = render(ch, &mut line_col);
        debug_assert!(rendering.is_some(), "compute_line_stats saw a newline");
        if ch == b'\t' && first_tab_size == 0 {
            first_tab_size = rendering.unwrap().count;
        }
    }
    (line_col, first_tab_size)
}

/// Stats of a byte slice computed from scratch.
pub fn compute_stats(data: &[u8]) -> RegionStats {
    let beginning_of_line = find_after_last(data, b'\n');
    let newline_count = data[..beginning_of_line].iter().filter(|&&b| b == b'\n').count();
    let (last_line_size, first_tab_size) = compute_line_stats(&data[beginning_of_line..]);
    RegionStats {
        newline_count,
        last_line_size,
        first_tab_size,
    }
}

/// Combines stats for adjacent regions `left` then `right` into the stats of their
/// concatenation, without rescanning either region's bytes.
pub fn append(left: &RegionStats, right: &RegionStats) -> RegionStats {
    let newline_count = left.newline_count + right.newline_count;
    let mut last_line_size = right.last_line_size;
    let mut first_tab_size = 0usize;

    if right.newline_count == 0 {
        last_line_size += left.last_line_size;
        if right.first_tab_size != 0 {
            debug_assert!(right.first_tab_size <= TAB_WIDTH as usize);
            // E.g. 8 - 7 = 1, 8 - 6 = 2, 8 - 8 = 0.
            let tab_offset = TAB_WIDTH as usize - right.first_tab_size;
            let adjusted_tab_offset = (left.last_line_size + tab_offset) & TAB_MOD_MASK;
            let adjusted_tab_size = TAB_WIDTH as usize - adjusted_tab_offset;

            last_line_size += adjusted_tab_size - right.first_tab_size;
            first_tab_size = if left.first_tab_size != 0 {
                left.first_tab_size
            } else if newline_count == 0 {
                adjusted_tab_size
            } else {
                0
            };
        } else {
            first_tab_size = left.first_tab_size;
        }
    }

    RegionStats {
        newline_count,
        last_line_size,
        first_tab_size,
    }
}

/// Stats after deleting the suffix `data[new_count..count]`, where `data[..count]` had
/// stats `stats` and `data[..new_count]` is what remains.
pub fn subtract_right(stats: &RegionStats, data: &[u8], new_count: usize, count: usize) -> RegionStats {
    debug_assert!(new_count <= count);
    let removed = &data[new_count..count];
    let removed_newlines = removed.iter().filter(|&&b| b == b'\n').count();
    let saw_tab = removed.contains(&b'\t');

    if removed_newlines == 0 && !saw_tab {
        // No tab or newline in the removed suffix, so we can walk it and subtract its
        // rendered width directly instead of rescanning the remaining line.
        let mut line_col = 0usize;
        for &ch in removed {
            render(ch, &mut line_col);
        }
        return RegionStats {
            newline_count: stats.newline_count,
            last_line_size: stats.last_line_size - line_col,
            first_tab_size: stats.first_tab_size,
        };
    }

    let beginning_of_line = find_after_last(&data[..new_count], b'\n');
    let (last_line_size, first_tab_size) = compute_line_stats(&data[beginning_of_line..new_count]);
    RegionStats {
        newline_count: stats.newline_count - removed_newlines,
        last_line_size,
        first_tab_size,
    }
}

/// Stats after deleting a prefix, where `stats` were the stats before deletion,
/// `removed_stats` were the stats of the deleted prefix, and `data[..new_count]` is the
/// remaining (post-deletion) region.
pub fn subtract_left(stats: &RegionStats, removed_stats: &RegionStats, data: &[u8], new_count: usize) -> RegionStats {
    debug_assert!(removed_stats.newline_count <= stats.newline_count);
    let new_newlines = stats.newline_count - removed_stats.newline_count;
    if new_newlines == 0 {
        let (last_line_size, first_tab_size) = compute_line_stats(&data[..new_count]);
        RegionStats {
            newline_count: new_newlines,
            last_line_size,
            first_tab_size,
        }
    } else {
        RegionStats {
            newline_count: new_newlines,
            last_line_size: stats.last_line_size,
            first_tab_size: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_region_is_identity() {
        assert_eq!(compute_stats(b""), RegionStats::default());
    }

    #[test]
    fn append_matches_compute_from_scratch() {
        let cases: &[(&[u8], &[u8])] = &[
            (b"hello ", b"world\n"),
            (b"a\tb", b"c\td"),
            (b"no newline", b""),
            (b"", b"x\ty"),
            (b"line1\nline2", b"\tend"),
            (b"\t\t", b"\t"),
        ];
        for (l, r) in cases {
            let left = compute_stats(l);
            let right = compute_stats(r);
            let combined: Vec<u8> = l.iter().chain(r.iter()).copied().collect();
            assert_eq!(append(&left, &right), compute_stats(&combined), "left={l:?} right={r:?}");
        }
    }

    #[test]
    fn subtract_right_matches_compute_from_scratch() {
        let data = b"abc\tdef\nghi\tjkl";
        let stats = compute_stats(data);
        for new_count in 0..=data.len() {
            let expected = compute_stats(&data[..new_count]);
            assert_eq!(subtract_right(&stats, data, new_count, data.len()), expected, "new_count={new_count}");
        }
    }

    #[test]
    fn subtract_left_matches_compute_from_scratch() {
        let data = b"abc\tdef\nghi\tjkl";
        let stats = compute_stats(data);
        for beg in 0..=data.len() {
            let removed = compute_stats(&data[..beg]);
            let remaining = &data[beg..];
            let expected = compute_stats(remaining);
            assert_eq!(
                subtract_left(&stats, &removed, remaining, remaining.len()),
                expected,
                "beg={beg}"
            );
        }
    }
}
