//! `application/x-www-form-urlencoded` style escaping for query values.
//!
//! ASCII letters, digits, `-`, `_` and `.` pass through, a space becomes
//! `+`, and every other byte of the UTF-8 text becomes `%XX`.

use thiserror::Error;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
  /// A `%` is followed by fewer than two characters.
  #[error("truncated escape at byte {at}")]
  Truncated { at: usize },
  /// A `%` is followed by something other than two hex digits.
  #[error("invalid escape at byte {at}")]
  InvalidEscape { at: usize },
  /// The decoded bytes are not UTF-8.
  #[error("decoded text is not UTF-8")]
  InvalidUtf8,
}

pub fn encode(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for &b in text.as_bytes() {
    match b {
      b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
        out.push(b as char)
      }
      b' ' => out.push('+'),
      _ => {
        out.push('%');
        out.push(HEX[usize::from(b >> 4)] as char);
        out.push(HEX[usize::from(b & 0x0f)] as char);
      }
    }
  }
  out
}

/// Reverses [`encode`]. Hex digits may be either case.
pub fn decode(text: &str) -> Result<String, DecodeError> {
  let bytes = text.as_bytes();
  let mut out = Vec::with_capacity(bytes.len());
  let mut i = 0;

  while i < bytes.len() {
    match bytes[i] {
      b'%' => {
        let escape = bytes.get(i + 1..i + 3).ok_or(DecodeError::Truncated { at: i })?;
        let hi = hex_value(escape[0]).ok_or(DecodeError::InvalidEscape { at: i })?;
        let lo = hex_value(escape[1]).ok_or(DecodeError::InvalidEscape { at: i })?;
        out.push((hi << 4) | lo);
        i += 3;
      }
      b'+' => {
        out.push(b' ');
        i += 1;
      }
      b => {
        out.push(b);
        i += 1;
      }
    }
  }

  String::from_utf8(out).map_err(|_| DecodeError::InvalidUtf8)
}

fn hex_value(c: u8) -> Option<u8> {
  match c {
    b'0'..=b'9' => Some(c - b'0'),
    b'a'..=b'f' => Some(c - b'a' + 10),
    b'A'..=b'F' => Some(c - b'A' + 10),
    _ => None,
  }
}
