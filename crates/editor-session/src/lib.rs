#![warn(missing_docs)]
//! Editor Session - headless editing session core
//!
//! # Overview
//!
//! `editor-session` keeps the state a code editor derives from a text document: folds,
//! soft-wrap data and the mapping between document positions and screen positions. It
//! does no rendering; the host asks for display lines and coordinates and draws them.
//!
//! # Core Features
//!
//! - **Line Buffer**: lines of text edited through invertible [`Delta`]s
//! - **Undo**: grouped delta history that also restores removed folds
//! - **Code Folding**: nested folds collapsed into [`FoldLine`]s, brace and indent fold widgets
//! - **Soft Wrapping**: per-row split data honoring tabs, wide characters and fold placeholders
//! - **Coordinate Mapping**: document/screen conversion accelerated by a [`RowCache`]
//! - **Change Notifications**: subscribers receive every [`SessionEvent`]
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  EditSession (events, options, undo)        │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Coordinate Mapping (+ Row Cache)           │  ← Screen <-> Document
//! ├─────────────────────────────────────────────┤
//! │  Soft Wrap (layout)                         │  ← Text Layout
//! ├─────────────────────────────────────────────┤
//! │  Folds & Fold Lines                         │  ← Visibility
//! ├─────────────────────────────────────────────┤
//! │  Document (lines + deltas)                  │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_session::{EditSession, Position, Range, WrapSetting};
//!
//! let mut session = EditSession::new("fn main() {\n    body();\n}\n");
//!
//! // Fold the body: rows 0..=2 become one screen row.
//! session.add_fold("...", Range::new(0, 11, 2, 0)).unwrap();
//! assert_eq!(session.display_line(0, None, None), "fn main() {...}");
//! assert_eq!(session.screen_length(), 2);
//!
//! // Positions inside the fold map to its start on screen.
//! let screen = session.document_to_screen_position(1, 4);
//! assert_eq!(screen, Position::new(0, 11));
//!
//! // Soft wrap at 8 columns.
//! session.set_wrap(WrapSetting::Columns(8));
//! assert!(session.row_split_data(0).is_some());
//! ```
//!
//! # Module Description
//!
//! - [`range`] - positions, ranges and their comparisons
//! - [`document`] - line buffer, delta application and anchors
//! - [`delta`] - the edit record every change is expressed as
//! - [`fold`] / [`fold_line`] - fold records and rows collapsed together
//! - [`fold_mode`] - fold widget providers (brace and indent)
//! - [`layout`] - screen widths and soft-wrap split computation
//! - [`row_cache`] - document/screen row checkpoints
//! - [`session`] - the [`EditSession`] tying everything together
//! - [`undo`] - undo/redo history
//! - [`decorations`] / [`line_widgets`] - row-attached host data

pub mod anchor;
pub mod bracket;
pub mod decorations;
pub mod delta;
pub mod document;
pub mod error;
pub mod fold;
pub mod fold_line;
pub mod fold_mode;
pub mod layout;
pub mod line_ending;
pub mod line_widgets;
pub mod options;
pub mod range;
pub mod row_cache;
pub mod session;
pub mod state;
mod text;
pub mod undo;

pub use anchor::Anchor;
pub use decorations::{Annotation, AnnotationKind, Decorations, Marker, MarkerId, MarkerKind};
pub use delta::{Delta, DeltaAction};
pub use document::{Document, ListenerId};
pub use error::{Result, SessionError};
pub use fold::Fold;
pub use fold_line::{FoldLine, FoldSide};
pub use fold_mode::{BraceFoldProvider, FoldProvider, FoldStyle, FoldWidget, IndentFoldProvider};
pub use line_ending::NewLineMode;
pub use line_widgets::{LineWidget, LineWidgets};
pub use options::{SessionOptions, WrapMethod, WrapSetting};
pub use range::{Position, Range, RangeRelation};
pub use row_cache::{RowCache, RowCacheEntry};
pub use session::{EditSession, FoldEdge, FoldWidgetToggle, ParentFoldRange, WrapLimitRange};
pub use state::{FoldAction, SessionCallback, SessionEvent, SubscriptionId};
pub use undo::{DeltaGroup, UndoManager};

pub use editor_session_lang::{BracketConfig, FoldMarkerConfig};
