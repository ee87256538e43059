// WHY: coalesce bursts of edits per document into one deferred format action
// Each document is Idle or Pending; a new batch replaces the Pending request wholesale

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::document::{ChangeEvent, DocumentId};

/// Quiet period after the last edit before formatting runs
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Inclusive line interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInterval {
    pub start: usize,
    pub end: usize,
}

impl LineInterval {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn union(self, other: LineInterval) -> LineInterval {
        LineInterval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Owned timer handle of a pending request; replaced, never mutated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTimer {
    deadline: Instant,
}

impl DebounceTimer {
    fn start(now: Instant, window: Duration) -> Self {
        Self { deadline: now + window }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// Accumulated state of a document with a format action waiting on its timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFormatRequest {
    pub timer: DebounceTimer,
    /// Union of the line spans of every bulk insertion since the document was last Idle
    pub paste_interval: Option<LineInterval>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DocumentState {
    #[default]
    Idle,
    Pending(PendingFormatRequest),
}

/// What a fired timer asks the engine to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTrigger {
    /// A bulk insertion touched these lines; format them explicitly
    Paste(LineInterval),
    /// Ordinary typing; format the paragraph under the cursor
    Incremental,
}

/// Per-document debounce registry
#[derive(Debug)]
pub struct ChangeEventAggregator {
    window: Duration,
    documents: HashMap<DocumentId, DocumentState>,
}

impl ChangeEventAggregator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            documents: HashMap::new(),
        }
    }

    /// Record a batch of change events for `document` observed at `now`
    ///
    /// Any pending timer is superseded by a fresh one; the paste interval of the
    /// superseded request carries over. Empty batches are ignored.
    pub fn observe(&mut self, document: &DocumentId, changes: &[ChangeEvent], now: Instant) {
        if changes.is_empty() {
            return;
        }

        let batch_interval = changes
            .iter()
            .filter(|change| change.inserts_line_break())
            .map(|change| {
                let (start, end) = change.affected_lines();
                LineInterval::new(start, end)
            })
            .reduce(LineInterval::union);

        let previous = self.documents.remove(document).unwrap_or_default();
        let carried = match previous {
            DocumentState::Pending(request) => request.paste_interval,
            DocumentState::Idle => None,
        };

        let paste_interval = match (carried, batch_interval) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        };

        let request = PendingFormatRequest {
            timer: DebounceTimer::start(now, self.window),
            paste_interval,
        };
        trace!(
            document = %document,
            changes = changes.len(),
            paste = ?paste_interval,
            "Debounce timer (re)started"
        );
        self.documents.insert(document.clone(), DocumentState::Pending(request));
    }

    /// Earliest pending deadline across all documents
    pub fn next_deadline(&self) -> Option<Instant> {
        self.documents
            .values()
            .filter_map(|state| match state {
                DocumentState::Pending(request) => Some(request.timer.deadline()),
                DocumentState::Idle => None,
            })
            .min()
    }

    /// Move every document whose timer is due back to Idle and return its trigger
    ///
    /// Results are ordered by deadline, then document id.
    pub fn take_due(&mut self, now: Instant) -> Vec<(DocumentId, FormatTrigger)> {
        let mut due: Vec<(Instant, DocumentId)> = self
            .documents
            .iter()
            .filter_map(|(id, state)| match state {
                DocumentState::Pending(request) if request.timer.is_due(now) => {
                    Some((request.timer.deadline(), id.clone()))
                }
                _ => None,
            })
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|(_, id)| {
                let state = self.documents.insert(id.clone(), DocumentState::Idle)?;
                let DocumentState::Pending(request) = state else {
                    return None;
                };
                let trigger = match request.paste_interval {
                    Some(interval) => FormatTrigger::Paste(interval),
                    None => FormatTrigger::Incremental,
                };
                debug!(document = %id, trigger = ?trigger, "Debounce timer fired");
                Some((id, trigger))
            })
            .collect()
    }

    pub fn state(&self, document: &DocumentId) -> DocumentState {
        self.documents.get(document).cloned().unwrap_or_default()
    }

    pub fn is_pending(&self, document: &DocumentId) -> bool {
        matches!(self.documents.get(document), Some(DocumentState::Pending(_)))
    }

    /// Destroy any pending request for a closed document
    pub fn close(&mut self, document: &DocumentId) {
        if let Some(DocumentState::Pending(_)) = self.documents.remove(document) {
            debug!(document = %document, "Dropped pending format request for closed document");
        }
    }
}

impl Default for ChangeEventAggregator {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}
