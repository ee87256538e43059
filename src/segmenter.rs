// WHY: one paragraph in, one sentence per line out
// Normalization guarantees the detector never sees a raw line break

use tracing::trace;

use crate::sentence_detector::{normalize_paragraph_into, SentenceDetect};

/// Normalizes paragraph whitespace and re-lays it out one sentence per line
pub struct SentenceSegmenter {
    detector: Box<dyn SentenceDetect>,
}

impl SentenceSegmenter {
    pub fn new(detector: Box<dyn SentenceDetect>) -> Self {
        Self { detector }
    }

    /// Segment a raw paragraph, joining sentences with `line_break`
    ///
    /// Output has exactly one line per detected sentence and never contains a blank line.
    /// A paragraph with no sentences segments to the empty string.
    pub fn segment(&self, raw_paragraph: &str, line_break: &str) -> String {
        let mut normalized = String::new();
        normalize_paragraph_into(raw_paragraph, &mut normalized);
        if normalized.is_empty() {
            return String::new();
        }

        let sentences: Vec<String> = self
            .detector
            .detect(&normalized)
            .into_iter()
            .map(|sentence| sentence.trim().to_string())
            .filter(|sentence| !sentence.is_empty())
            .collect();

        trace!(sentences = sentences.len(), "Segmented paragraph");
        sentences.join(line_break).trim().to_string()
    }
}
