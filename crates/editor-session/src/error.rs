//! Error types returned by fallible session and document operations.

use crate::range::Range;
use thiserror::Error;

/// Errors produced by `editor-session`.
///
/// Coordinate queries never fail (they clamp); empty edits are no-ops. Only fold
/// construction, out-of-range line removal, and invalid configuration values are errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("The range has to be at least 2 characters width")]
    /// A fold range covers fewer than two characters.
    FoldTooSmall,

    #[error("A fold can't intersect already existing fold: {range}")]
    /// A new fold partially overlaps an existing fold.
    FoldOverlap {
        /// The rejected fold range.
        range: Range,
    },

    #[error("A fold can't intersect already existing fold: {range}")]
    /// A sub-fold partially overlaps one of its siblings.
    SubFoldOverlap {
        /// The rejected sub-fold range.
        range: Range,
    },

    #[error("Trying to add fold to FoldLine that doesn't have a matching row: {range}")]
    /// A fold does not touch the rows of the fold line it is being added to.
    FoldLineDisconnected {
        /// The rejected fold range.
        range: Range,
    },

    #[error("removeLines: rows {first}..={last} are outside of the document (length {len})")]
    /// `remove_lines` was called with rows outside the document.
    RowOutOfBounds {
        /// First requested row.
        first: usize,
        /// Last requested row.
        last: usize,
        /// Document length in rows.
        len: usize,
    },

    #[error("invalid fold style '{style}', expected one of: {valid}")]
    /// Unknown fold style name.
    InvalidFoldStyle {
        /// The rejected value.
        style: String,
        /// Comma separated list of valid values.
        valid: String,
    },

    #[error("invalid new line mode '{0}', expected one of: auto, unix, windows")]
    /// Unknown new line mode name.
    InvalidNewLineMode(String),

    #[error("invalid wrap setting '{0}', expected off, free, printMargin or a column count")]
    /// Unknown wrap setting.
    InvalidWrapSetting(String),

    #[error("failed to compile regex '{pattern}': {message}")]
    /// A fold marker pattern is not a valid regex.
    RegexCompile {
        /// The regex pattern string.
        pattern: String,
        /// The compiler error message.
        message: String,
    },

    #[error("tab size must be greater than zero")]
    /// A tab size of zero was requested.
    InvalidTabSize,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SessionError>;
