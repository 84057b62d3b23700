//! Line ending helpers.
//!
//! The buffer stores lines without their terminators. The newline sequence used when the
//! document is serialized is picked by a [`NewLineMode`]; in [`NewLineMode::Auto`] it is
//! whichever sequence was detected in the first text inserted into a single-line document.

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which newline sequence to use when joining lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewLineMode {
    /// Use the detected newline, falling back to `"\n"`.
    #[default]
    Auto,
    /// Always `"\n"`.
    Unix,
    /// Always `"\r\n"`.
    Windows,
}

impl FromStr for NewLineMode {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "unix" => Ok(Self::Unix),
            "windows" => Ok(Self::Windows),
            other => Err(SessionError::InvalidNewLineMode(other.to_string())),
        }
    }
}

/// Detect the first line break in `text`.
///
/// Returns `"\r\n"`, `"\r"` or `"\n"`, defaulting to `"\n"` when the text has none.
pub fn detect_new_line(text: &str) -> &'static str {
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' if chars.peek() == Some(&'\n') => return "\r\n",
            '\r' => return "\r",
            '\n' => return "\n",
            _ => {}
        }
    }
    "\n"
}

/// Returns `true` if `text` is exactly one line break sequence.
pub fn is_new_line(text: &str) -> bool {
    matches!(text, "\r\n" | "\r" | "\n")
}
