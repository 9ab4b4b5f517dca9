//! Emacs-style kill-ring: contiguous kills append to the same entry, and `C-y`/`M-y`
//! (yank/yank-pop) rotate through past entries after a yank.
//!
//! Grounded on `original_source/state.hpp`'s `clip_board` and the kill/yank call
//! discipline in `original_source/editing.cpp`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YankSide {
    Left,
    Right,
    /// Used by `copy_region`, which doesn't delete anything, so there's no directional
    /// adjacency to append against.
    None,
}

#[derive(Debug, Default)]
pub struct ClipBoard {
    clips: Vec<Vec<u8>>,
    /// Did the just-finished action record a kill? If so, the *next* contiguous kill
    /// appends to the same entry instead of starting a new one (so `C-k C-k C-k` yields
    /// one killring entry, not three).
    just_recorded: bool,
    /// How many times `M-y` has cycled in the current yank-pop run.
    paste_number: usize,
    /// Set to the byte length of the text last inserted by a yank; consulted by `M-y` to
    /// know how much to delete before re-inserting the next ring entry.
    just_yanked: Option<usize>,
}

impl ClipBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a kill. `side == None` (used by `copy_region`, which has no deletion
    /// direction) always starts a new clip. `Left`/`Right` append to the last clip when
    /// the previous action was itself a contiguous kill.
    pub fn record_yank(&mut self, text: Vec<u8>, side: YankSide) {
        if self.just_recorded && side != YankSide::None {
            if let Some(last) = self.clips.last_mut() {
                match side {
                    YankSide::Left => {
                        let mut combined = text;
                        combined.extend_from_slice(last);
                        *last = combined;
                    }
                    YankSide::Right => last.extend_from_slice(&text),
                    YankSide::None => unreachable!(),
                }
                self.just_recorded = true;
                self.just_yanked = None;
                self.paste_number = 0;
                return;
            }
        }
        self.clips.push(text);
        self.just_recorded = true;
        self.just_yanked = None;
        self.paste_number = 0;
    }

    /// Returns the most recent killring entry, honoring `paste_number` so repeated `M-y`
    /// cycles backward through older entries.
    pub fn do_yank(&mut self) -> Option<&[u8]> {
        if self.clips.is_empty() {
            return None;
        }
        let index = self.clips.len() - 1 - (self.paste_number % self.clips.len());
        let text = &self.clips[index];
        self.just_yanked = Some(text.len());
        self.just_recorded = false;
        Some(text)
    }

    pub fn step_paste_number(&mut self) {
        self.paste_number += 1;
    }

    pub fn just_yanked(&self) -> Option<usize> {
        self.just_yanked
    }

    pub fn paste_number(&self) -> usize {
        self.paste_number
    }

    /// Called by every action that is not itself a yank or yank-pop: resets the yank-pop
    /// state and breaks the kill-appending chain. Grounded on the `no_yank` call at the
    /// top of essentially every `note_*` function in `original_source/editing.cpp`.
    pub fn no_yank(&mut self) {
        self.just_recorded = false;
        self.paste_number = 0;
        self.just_yanked = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_kills_to_the_right_append_in_order() {
        let mut cb = ClipBoard::new();
        cb.record_yank(b"ab".to_vec(), YankSide::Right);
        cb.record_yank(b"cd".to_vec(), YankSide::Right);
        assert_eq!(cb.do_yank(), Some(b"abcd".as_slice()));
    }

    #[test]
    fn contiguous_kills_to_the_left_prepend_in_order() {
        let mut cb = ClipBoard::new();
        cb.record_yank(b"world".to_vec(), YankSide::Left);
        cb.record_yank(b"hello ".to_vec(), YankSide::Left);
        assert_eq!(cb.do_yank(), Some(b"hello world".as_slice()));
    }

    #[test]
    fn no_yank_breaks_the_append_chain() {
        let mut cb = ClipBoard::new();
        cb.record_yank(b"ab".to_vec(), YankSide::Right);
        cb.no_yank();
        cb.record_yank(b"cd".to_vec(), YankSide::Right);
        assert_eq!(cb.do_yank(), Some(b"cd".as_slice()));
    }

    #[test]
    fn yank_pop_cycles_to_older_entries() {
        let mut cb = ClipBoard::new();
        cb.record_yank(b"first".to_vec(), YankSide::Right);
        cb.no_yank();
        cb.record_yank(b"second".to_vec(), YankSide::Right);
        assert_eq!(cb.do_yank(), Some(b"second".as_slice()));
        cb.step_paste_number();
        assert_eq!(cb.do_yank(), Some(b"first".as_slice()));
    }

    #[test]
    fn none_side_always_starts_a_new_clip() {
        let mut cb = ClipBoard::new();
        cb.record_yank(b"ab".to_vec(), YankSide::Right);
        cb.record_yank(b"cd".to_vec(), YankSide::None);
        assert_eq!(cb.do_yank(), Some(b"cd".as_slice()));
        cb.step_paste_number();
        assert_eq!(cb.do_yank(), Some(b"ab".as_slice()));
    }

    #[test]
    fn empty_killring_yields_no_yank() {
        let mut cb = ClipBoard::new();
        assert_eq!(cb.do_yank(), None);
    }
}
