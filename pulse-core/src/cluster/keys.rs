//! Byte encoding of broadcast keystrokes
//!
//! A cluster member's keystroke is re-sent to the other members as the
//! raw bytes a terminal would emit for that key. Keys with no byte
//! representation (bare modifiers, function keys) encode to `None` and
//! are not broadcast.

/// A keystroke captured on a cluster member, normalized for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastKey {
    /// The Enter/Return key.
    Enter,
    /// The Backspace key.
    Backspace,
    /// The Tab key.
    Tab,
    /// The Escape key.
    Escape,
    /// Cursor up.
    Up,
    /// Cursor down.
    Down,
    /// Cursor right.
    Right,
    /// Cursor left.
    Left,
    /// A letter pressed together with Ctrl, e.g. Ctrl+C.
    Ctrl(char),
    /// A printable character, sent as its UTF-8 bytes.
    Char(char),
}

impl BroadcastKey {
    /// Returns the bytes a terminal emits for this key, or `None` when
    /// the key has no byte form and must not be broadcast.
    #[must_use]
    pub fn encode(&self) -> Option<Vec<u8>> {
        match self {
            Self::Enter => Some(vec![b'\r']),
            Self::Backspace => Some(vec![0x08]),
            Self::Tab => Some(vec![b'\t']),
            Self::Escape => Some(vec![0x1b]),
            Self::Up => Some(b"\x1b[A".to_vec()),
            Self::Down => Some(b"\x1b[B".to_vec()),
            Self::Right => Some(b"\x1b[C".to_vec()),
            Self::Left => Some(b"\x1b[D".to_vec()),
            // Ctrl+letter maps onto the C0 control range (Ctrl+A = 0x01).
            Self::Ctrl(c) if c.is_ascii_alphabetic() => {
                Some(vec![c.to_ascii_uppercase() as u8 - b'@'])
            }
            Self::Ctrl(_) => None,
            Self::Char(c) => {
                let mut buf = [0u8; 4];
                Some(c.encode_utf8(&mut buf).as_bytes().to_vec())
            }
        }
    }
}
