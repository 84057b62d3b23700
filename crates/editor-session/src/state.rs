//! Session change notifications.
//!
//! Hosts register closures with [`EditSession::subscribe`](crate::EditSession::subscribe).
//! Every event is delivered synchronously, in registration order, before the call that
//! caused it returns. Callbacks receive the event only; they cannot reach back into the
//! session while it is being mutated.

use crate::delta::Delta;
use crate::fold::Fold;

/// Whether a fold was added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoldAction {
    /// The fold was created.
    Add,
    /// The fold was removed or expanded.
    Remove,
}

/// A change in session state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The document changed. Derived state has already been updated for `delta`.
    Change {
        /// The applied delta.
        delta: Delta,
    },
    /// A fold was added or removed.
    ChangeFold {
        /// What happened.
        action: FoldAction,
        /// The fold, in document coordinates.
        fold: Fold,
    },
    /// Soft wrapping was switched on or off, or its limit range changed.
    ChangeWrapMode,
    /// The effective wrap limit changed.
    ChangeWrapLimit,
    /// The tab size changed.
    ChangeTabSize,
    /// The overwrite flag changed.
    ChangeOverwrite,
    /// The vertical scroll offset changed.
    ChangeScrollTop {
        /// New offset.
        scroll_top: f64,
    },
    /// The horizontal scroll offset changed.
    ChangeScrollLeft {
        /// New offset.
        scroll_left: f64,
    },
    /// Breakpoints or gutter decorations changed.
    ChangeBreakpoint,
    /// Annotations changed.
    ChangeAnnotation,
    /// A marker drawn behind the text was added or removed.
    ChangeBackMarker,
    /// A marker drawn in front of the text was added or removed.
    ChangeFrontMarker,
    /// The fold style changed.
    ChangeFoldStyle,
    /// The new line mode changed.
    ChangeNewLineMode,
    /// A tokenizer re-tokenized rows `first..=last`.
    TokenizerUpdate {
        /// First re-tokenized row.
        first: usize,
        /// Last re-tokenized row.
        last: usize,
    },
}

/// Session event callback.
pub type SessionCallback = Box<dyn FnMut(&SessionEvent) + Send>;

/// Handle returned by [`EditSession::subscribe`](crate::EditSession::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Ordered list of subscribers.
#[derive(Default)]
pub(crate) struct Subscribers {
    callbacks: Vec<(SubscriptionId, SessionCallback)>,
    next_id: u64,
}

impl Subscribers {
    pub(crate) fn add(&mut self, callback: SessionCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(sid, _)| *sid != id);
        self.callbacks.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub(crate) fn emit(&mut self, event: &SessionEvent) {
        for (_, callback) in self.callbacks.iter_mut() {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscribers::default();
        let a = log.clone();
        let first = subs.add(Box::new(move |_| a.lock().unwrap().push("a")));
        let b = log.clone();
        subs.add(Box::new(move |_| b.lock().unwrap().push("b")));

        subs.emit(&SessionEvent::ChangeTabSize);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);

        assert!(subs.remove(first));
        assert!(!subs.remove(first));
        subs.emit(&SessionEvent::ChangeWrapMode);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "b"]);
        assert_eq!(subs.len(), 1);
    }
}
