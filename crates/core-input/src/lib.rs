//! The `Keypress` contract: a terminal-backend-independent representation of one parsed
//! keystroke. Grounded bit-for-bit on `original_source/keyboard.hpp` -- the modifier bit
//! values in particular must match exactly, since they're part of the external interface
//! spelled out by the editor's keybinding contract.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModMask: u8 {
        const META  = 1;
        const SHIFT = 2;
        const CTRL  = 4;
        const SUPER = 8;
    }
}

/// Named non-character keys. Discriminant values are not load-bearing (unlike
/// `ModMask`'s), but are kept contiguous for readability, mirroring the original's
/// `special_key` enum order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    F(u8), // 1..=12
    Backspace,
    Tab,
    CapsLock,
    Enter,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Left,
    Right,
    Up,
    Down,
    PauseBreak,
    PrintScreen,
    ScrollLock,
}

/// One parsed keystroke: either an ordinary (possibly non-ASCII) character with
/// modifiers, or a named special key with modifiers.
///
/// `modmask` only ever carries `SHIFT` for special keys -- ordinary characters like 'A'
/// are represented as `Keypress::char('A', ModMask::empty())`, Ctrl+A as
/// `Keypress::char('a', ModMask::CTRL)`, per the original's comment on `keypress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValue {
    Char(char),
    Special(SpecialKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keypress {
    pub value: KeyValue,
    pub modmask: ModMask,
}

impl Keypress {
    pub fn char(ch: char, modmask: ModMask) -> Self {
        Keypress {
            value: KeyValue::Char(ch),
            modmask,
        }
    }

    pub fn special(key: SpecialKey, modmask: ModMask) -> Self {
        Keypress {
            value: KeyValue::Special(key),
            modmask,
        }
    }

    pub fn equals(&self, value: KeyValue, modmask: ModMask) -> bool {
        self.value == value && self.modmask == modmask
    }
}

/// Maps a `crossterm` key event to a [`Keypress`]. `crossterm` already separates
/// character keys from named keys and reports `KeyModifiers`, so this is a direct
/// field-by-field translation rather than the original's byte-stream escape-sequence
/// parser (`keypress_result::incomplete_parse` has no analogue here -- `crossterm`
/// resolves escape sequences for us).
pub fn map_key_event(ev: crossterm::event::KeyEvent) -> Option<Keypress> {
    use crossterm::event::{KeyCode, KeyModifiers};

    let mut modmask = ModMask::empty();
    if ev.modifiers.contains(KeyModifiers::ALT) {
        modmask |= ModMask::META;
    }
    if ev.modifiers.contains(KeyModifiers::SHIFT) {
        modmask |= ModMask::SHIFT;
    }
    if ev.modifiers.contains(KeyModifiers::CONTROL) {
        modmask |= ModMask::CTRL;
    }
    if ev.modifiers.contains(KeyModifiers::SUPER) {
        modmask |= ModMask::SUPER;
    }

    let value = match ev.code {
        KeyCode::Char(ch) => KeyValue::Char(ch),
        KeyCode::F(n) if (1..=12).contains(&n) => KeyValue::Special(SpecialKey::F(n)),
        KeyCode::Backspace => KeyValue::Special(SpecialKey::Backspace),
        KeyCode::Tab => KeyValue::Special(SpecialKey::Tab),
        KeyCode::CapsLock => KeyValue::Special(SpecialKey::CapsLock),
        KeyCode::Enter => KeyValue::Special(SpecialKey::Enter),
        KeyCode::Insert => KeyValue::Special(SpecialKey::Insert),
        KeyCode::Delete => KeyValue::Special(SpecialKey::Delete),
        KeyCode::Home => KeyValue::Special(SpecialKey::Home),
        KeyCode::End => KeyValue::Special(SpecialKey::End),
        KeyCode::PageUp => KeyValue::Special(SpecialKey::PageUp),
        KeyCode::PageDown => KeyValue::Special(SpecialKey::PageDown),
        KeyCode::Left => KeyValue::Special(SpecialKey::Left),
        KeyCode::Right => KeyValue::Special(SpecialKey::Right),
        KeyCode::Up => KeyValue::Special(SpecialKey::Up),
        KeyCode::Down => KeyValue::Special(SpecialKey::Down),
        KeyCode::PrintScreen => KeyValue::Special(SpecialKey::PrintScreen),
        KeyCode::ScrollLock => KeyValue::Special(SpecialKey::ScrollLock),
        KeyCode::Pause => KeyValue::Special(SpecialKey::PauseBreak),
        _ => return None,
    };

    Some(Keypress { value, modmask })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn ctrl_a_is_lowercase_char_with_ctrl_bit() {
        let kp = map_key_event(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL)).unwrap();
        assert!(kp.equals(KeyValue::Char('a'), ModMask::CTRL));
    }

    #[test]
    fn plain_char_has_no_modmask() {
        let kp = map_key_event(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE)).unwrap();
        assert!(kp.equals(KeyValue::Char('x'), ModMask::empty()));
    }

    #[test]
    fn arrow_keys_map_to_special() {
        let kp = map_key_event(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE)).unwrap();
        assert!(kp.equals(KeyValue::Special(SpecialKey::Left), ModMask::empty()));
    }

    #[test]
    fn modmask_bit_values_match_external_contract() {
        assert_eq!(ModMask::META.bits(), 1);
        assert_eq!(ModMask::SHIFT.bits(), 2);
        assert_eq!(ModMask::CTRL.bits(), 4);
        assert_eq!(ModMask::SUPER.bits(), 8);
    }
}
