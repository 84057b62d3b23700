//! Session configuration.
//!
//! [`SessionOptions`] is a plain serde-friendly bag of settings. Field names serialize in
//! camelCase and every field has a default, so partial JSON objects deserialize cleanly.

use crate::error::SessionError;
use crate::fold_mode::FoldStyle;
use crate::line_ending::NewLineMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default tab width in columns.
pub const DEFAULT_TAB_SIZE: usize = 4;

/// Default wrap limit used until a host calls `adjust_wrap_limit`.
pub const DEFAULT_WRAP_LIMIT: usize = 80;

/// How soft wrapping is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "WrapSettingRepr", into = "WrapSettingRepr")]
pub enum WrapSetting {
    /// No soft wrapping.
    #[default]
    Off,
    /// Wrap at whatever limit the host requests, unconstrained.
    Free,
    /// Wrap at the print margin passed to `adjust_wrap_limit`.
    PrintMargin,
    /// Wrap at a fixed column count.
    Columns(usize),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WrapSettingRepr {
    Flag(bool),
    Columns(usize),
    Name(String),
}

impl TryFrom<WrapSettingRepr> for WrapSetting {
    type Error = SessionError;

    fn try_from(repr: WrapSettingRepr) -> Result<Self, Self::Error> {
        match repr {
            WrapSettingRepr::Flag(false) | WrapSettingRepr::Columns(0) => Ok(Self::Off),
            WrapSettingRepr::Flag(true) => Ok(Self::Free),
            WrapSettingRepr::Columns(n) => Ok(Self::Columns(n)),
            WrapSettingRepr::Name(name) => name.parse(),
        }
    }
}

impl From<WrapSetting> for WrapSettingRepr {
    fn from(setting: WrapSetting) -> Self {
        match setting {
            WrapSetting::Columns(n) => Self::Columns(n),
            other => Self::Name(other.to_string()),
        }
    }
}

impl FromStr for WrapSetting {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "off" | "false" => Ok(Self::Off),
            "free" | "true" => Ok(Self::Free),
            "printMargin" => Ok(Self::PrintMargin),
            other => match other.parse::<usize>() {
                Ok(0) => Ok(Self::Off),
                Ok(n) => Ok(Self::Columns(n)),
                Err(_) => Err(SessionError::InvalidWrapSetting(other.to_string())),
            },
        }
    }
}

impl fmt::Display for WrapSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::Free => f.write_str("free"),
            Self::PrintMargin => f.write_str("printMargin"),
            Self::Columns(n) => write!(f, "{n}"),
        }
    }
}

/// Where soft wrapping prefers to break lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapMethod {
    /// Avoid breaking right after punctuation and search a short window back.
    Code,
    /// Break at the last whitespace within the wrap limit.
    Text,
    /// Pick based on the content; plain sessions wrap as text.
    #[default]
    Auto,
}

impl WrapMethod {
    /// Returns `true` if lines wrap with the code heuristics.
    pub fn wraps_as_code(self) -> bool {
        matches!(self, Self::Code)
    }
}

/// Serializable session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionOptions {
    /// Columns per tab stop.
    pub tab_size: usize,
    /// Indent with spaces instead of tab characters.
    pub use_soft_tabs: bool,
    /// Soft wrap configuration.
    pub wrap: WrapSetting,
    /// Soft wrap break heuristics.
    pub wrap_method: WrapMethod,
    /// Which fold widgets are reported.
    pub fold_style: FoldStyle,
    /// Newline sequence used when joining rows.
    pub new_line_mode: NewLineMode,
    /// Whether hosts should indent wrapped continuation rows.
    pub indented_soft_wrap: bool,
    /// Typing replaces the character after the cursor.
    pub overwrite: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            tab_size: DEFAULT_TAB_SIZE,
            use_soft_tabs: true,
            wrap: WrapSetting::Off,
            wrap_method: WrapMethod::Auto,
            fold_style: FoldStyle::MarkBegin,
            new_line_mode: NewLineMode::Auto,
            indented_soft_wrap: true,
            overwrite: false,
        }
    }
}
