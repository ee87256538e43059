// WHY: Sentence boundary detection as a pluggable capability
// The formatter only sees `SentenceDetect`; the dialog detector is the built-in implementation

pub mod abbreviations;
pub mod dialog_detector;
pub mod normalization;

pub use abbreviations::AbbreviationChecker;
pub use dialog_detector::SentenceDetectorDialog;
pub use normalization::{normalize_paragraph, normalize_paragraph_into, sanitize};

/// Splits text into ordered sentences
///
/// Implementations must be total: any input yields a (possibly empty) list of
/// trimmed, non-empty sentences in reading order.
pub trait SentenceDetect {
    fn detect(&self, text: &str) -> Vec<String>;
}

/// Plain functions and closures work as detectors, which keeps test fixtures deterministic
impl<F> SentenceDetect for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn detect(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

/// How the detector treats its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorOptions {
    /// Treat every newline as a sentence boundary
    pub newline_boundaries: bool,
    /// Strip control and zero-width characters before detection
    pub sanitize: bool,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            // WHY: paragraphs arrive normalized to one logical line
            newline_boundaries: false,
            sanitize: true,
        }
    }
}

/// Byte range of a sentence within the detected text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
    pub start: usize,
    pub end: usize,
}

/// Borrowed variant - zero allocation detection result
#[derive(Debug, Clone)]
pub struct DetectedSentence<'a> {
    pub index: usize,
    pub raw_content: &'a str,
    pub span: ByteSpan,
}

impl<'a> DetectedSentence<'a> {
    /// Get raw content without normalization
    pub fn raw(&self) -> &'a str {
        self.raw_content
    }

    /// Normalize content with new allocation
    pub fn normalize(&self) -> String {
        normalize_paragraph(self.raw_content)
    }
}
