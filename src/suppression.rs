// WHY: the engine's own edits come back as change notifications and must not re-trigger it
// Suppression is tracked per document so one document's edit never mutes another's

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::document::DocumentId;

/// Grace window kept after an edit settles, to swallow its late change notification
pub const SUPPRESSION_GRACE: Duration = Duration::from_millis(100);

/// Identifies one programmatic edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suppression {
    /// Edit requested, host has not resolved it yet
    InFlight(EditToken),
    /// Edit resolved; notifications are discarded until `until`
    Grace { until: Instant },
}

/// Per-document mute switch around the engine's own edits
#[derive(Debug)]
pub struct SuppressionGate {
    grace: Duration,
    entries: HashMap<DocumentId, Suppression>,
    next_token: u64,
}

impl SuppressionGate {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            entries: HashMap::new(),
            next_token: 0,
        }
    }

    /// Whether change notifications for `document` must be discarded at `now`
    ///
    /// Expired grace windows are cleared as a side effect.
    pub fn is_suppressed(&mut self, document: &DocumentId, now: Instant) -> bool {
        match self.entries.get(document) {
            Some(Suppression::InFlight(_)) => true,
            Some(Suppression::Grace { until }) if now < *until => true,
            Some(Suppression::Grace { .. }) => {
                self.entries.remove(document);
                false
            }
            None => false,
        }
    }

    /// Whether an edit for `document` is requested but unresolved
    pub fn is_in_flight(&self, document: &DocumentId) -> bool {
        matches!(self.entries.get(document), Some(Suppression::InFlight(_)))
    }

    /// Start suppressing `document`; `None` while another edit to it is still in flight
    pub fn begin(&mut self, document: &DocumentId) -> Option<EditToken> {
        if self.is_in_flight(document) {
            return None;
        }
        self.next_token += 1;
        let token = EditToken(self.next_token);
        self.entries.insert(document.clone(), Suppression::InFlight(token));
        Some(token)
    }

    /// The edit behind `token` resolved (either way); start the grace window
    ///
    /// Stale tokens are ignored.
    pub fn settle(&mut self, document: &DocumentId, token: EditToken, now: Instant) {
        if self.entries.get(document) == Some(&Suppression::InFlight(token)) {
            let until = now + self.grace;
            self.entries.insert(document.clone(), Suppression::Grace { until });
            debug!(document = %document, grace_ms = self.grace.as_millis() as u64, "Edit settled, grace window started");
        }
    }

    /// Run `action` (the host's edit-apply) with `document` suppressed
    ///
    /// Returns `None` without polling `action` when an edit to the document is already
    /// in flight. The grace window starts when `action` completes or is dropped.
    pub async fn run_suppressed<F, T>(&mut self, document: &DocumentId, action: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let token = self.begin(document)?;
        let _in_flight = InFlightEdit {
            gate: self,
            document: document.clone(),
            token,
        };
        Some(action.await)
    }

    /// Drop all state for a closed document
    pub fn forget(&mut self, document: &DocumentId) {
        self.entries.remove(document);
    }
}

impl Default for SuppressionGate {
    fn default() -> Self {
        Self::new(SUPPRESSION_GRACE)
    }
}

/// Settles its token on drop, so the gate is released on every exit path
struct InFlightEdit<'g> {
    gate: &'g mut SuppressionGate,
    document: DocumentId,
    token: EditToken,
}

impl Drop for InFlightEdit<'_> {
    fn drop(&mut self) {
        self.gate.settle(&self.document, self.token, Instant::now());
    }
}
