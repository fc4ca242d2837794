//! Column conversion between byte offsets and the server's position encoding.
//!
//! Positions inside the crate count columns in bytes. A server that did not
//! agree to `utf-8` counts them in UTF-16 code units (the protocol default)
//! or in code points, so columns are converted at the client boundary.

use crate::core::{Position, Range};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionEncoding {
    Utf8,
    #[default]
    Utf16,
    Utf32,
}

impl PositionEncoding {
    /// Encoding announced in an `initialize` result, UTF-16 when absent.
    pub fn from_initialize_result(result: &Value) -> Self {
        match result
            .pointer("/capabilities/positionEncoding")
            .and_then(Value::as_str)
        {
            Some("utf-8") => Self::Utf8,
            Some("utf-32") => Self::Utf32,
            _ => Self::Utf16,
        }
    }

    fn units(self, c: char) -> usize {
        match self {
            Self::Utf8 => c.len_utf8(),
            Self::Utf16 => c.len_utf16(),
            Self::Utf32 => 1,
        }
    }

    /// Byte column in `text` to a column in this encoding.
    pub fn encode(self, text: &str, position: Position) -> Position {
        if self == Self::Utf8 {
            return position;
        }
        let Some(line) = line_of(text, position.line) else {
            return position;
        };
        let byte = position.character as usize;
        let column: usize = line
            .char_indices()
            .take_while(|(i, _)| *i < byte)
            .map(|(_, c)| self.units(c))
            .sum();
        Position::new(position.line, column as u32)
    }

    /// Column in this encoding to a byte column in `text`. Columns inside a
    /// character snap to its start; columns past the end clamp to the line.
    pub fn decode(self, text: &str, position: Position) -> Position {
        if self == Self::Utf8 {
            return position;
        }
        let Some(line) = line_of(text, position.line) else {
            return position;
        };
        let target = position.character as usize;
        let mut units = 0;
        for (i, c) in line.char_indices() {
            let next = units + self.units(c);
            if next > target {
                return Position::new(position.line, i as u32);
            }
            units = next;
        }
        Position::new(position.line, line.len() as u32)
    }

    pub fn decode_range(self, text: &str, range: Range) -> Range {
        Range::new(self.decode(text, range.start), self.decode(text, range.end))
    }

    /// Name offered in the client capabilities.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16 => "utf-16",
            Self::Utf32 => "utf-32",
        }
    }
}

fn line_of(text: &str, line: u32) -> Option<&str> {
    text.split('\n')
        .nth(line as usize)
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
}
