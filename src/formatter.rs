// WHY: one formatter for the manual, paste and automatic paths
// The paths differ only in how the range is resolved and in the idempotency policy

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::document::{Document, DocumentId, LineEnding, Range, TextBuffer};
use crate::host::Host;
use crate::idempotence::is_already_formatted;
use crate::paragraph::{enclosing_paragraphs, ParagraphSplitter};
use crate::segmenter::SentenceSegmenter;
use crate::sentence_detector::{SentenceDetect, SentenceDetectorDialog};
use crate::suppression::SuppressionGate;

/// Whether paragraphs that already look one-sentence-per-line are left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdempotencyPolicy {
    /// Manual and paste paths: always re-segment
    AlwaysResegment,
    /// Automatic path: keep paragraphs that are already formatted
    SkipIfAlreadyFormatted,
}

/// Which text a format request covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatTarget {
    /// Active editor: a non-empty selection widened to whole paragraphs, else the cursor's paragraph
    SelectionOrParagraph,
    /// The paragraph under the cursor, only if `document` is the active editor
    CursorParagraph { document: DocumentId },
    /// A caller-resolved range
    Explicit { document: DocumentId, range: Range },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    /// No focused editor (or not the requested document)
    NoActiveEditor,
    /// The target document is no longer open
    DocumentUnavailable,
    /// Formatting would not change the text; no edit was requested
    Unchanged,
    /// Another edit to the document has not resolved yet
    Busy,
    Applied { document: DocumentId, range: Range },
    /// The host refused the edit
    Failed,
}

struct ResolvedTarget {
    document_id: DocumentId,
    snapshot: Document,
    range: Range,
}

pub struct Formatter {
    segmenter: SentenceSegmenter,
    splitter: ParagraphSplitter,
}

impl Formatter {
    pub fn new(detector: Box<dyn SentenceDetect>) -> Result<Self> {
        Ok(Self {
            segmenter: SentenceSegmenter::new(detector),
            splitter: ParagraphSplitter::new()?,
        })
    }

    /// Formatter backed by the built-in dialog-aware detector
    pub fn with_default_detector() -> Result<Self> {
        Self::new(Box::new(SentenceDetectorDialog::new()?))
    }

    /// Pure transform: paragraphs split on blank-line runs, re-segmented, rejoined by one blank line
    ///
    /// Line breaks in the output follow the first line ending found in `text`.
    pub fn format_text(&self, text: &str, policy: IdempotencyPolicy) -> String {
        self.format_with_line_break(text, policy, LineEnding::detect(text))
    }

    /// Line-break runs at either edge of `text` are kept as they are, so a range that
    /// starts or ends on a blank line stays separated from its neighbours.
    fn format_with_line_break(&self, text: &str, policy: IdempotencyPolicy, line_ending: LineEnding) -> String {
        let (leading, body, trailing) = split_edge_breaks(text);
        if body.trim().is_empty() {
            return text.to_string();
        }
        let line_break = line_ending.as_str();

        let paragraphs: Vec<String> = self
            .splitter
            .split(body)
            .into_iter()
            .map(|paragraph| {
                if policy == IdempotencyPolicy::SkipIfAlreadyFormatted && is_already_formatted(paragraph) {
                    paragraph.trim().to_string()
                } else {
                    self.segmenter.segment(paragraph, line_break)
                }
            })
            .collect();

        format!("{leading}{}{trailing}", paragraphs.join(&line_break.repeat(2)))
    }

    /// Resolve `target`, transform it and apply the result through `gate`
    pub async fn format<H: Host>(
        &self,
        host: &mut H,
        gate: &mut SuppressionGate,
        target: FormatTarget,
        policy: IdempotencyPolicy,
    ) -> FormatOutcome {
        let ResolvedTarget {
            document_id,
            snapshot,
            range,
        } = match resolve_target(host, target) {
            Ok(resolved) => resolved,
            Err(outcome) => return outcome,
        };
        debug!(document = %document_id, ?range, ?policy, "Formatting range");

        let original = snapshot.text_in(&range);
        let formatted = self.format_with_line_break(&original, policy, snapshot.line_ending());
        if formatted == original {
            debug!(document = %document_id, "Text already formatted, no edit");
            return FormatOutcome::Unchanged;
        }

        match gate
            .run_suppressed(&document_id, host.apply_edit(&document_id, range, &formatted))
            .await
        {
            None => {
                debug!(document = %document_id, "Edit already in flight, skipping");
                FormatOutcome::Busy
            }
            Some(true) => {
                info!(
                    document = %document_id,
                    start_line = range.start.line,
                    end_line = range.end.line,
                    "Formatted text to one sentence per line"
                );
                FormatOutcome::Applied {
                    document: document_id,
                    range,
                }
            }
            Some(false) => {
                warn!(document = %document_id, "Host refused the edit");
                FormatOutcome::Failed
            }
        }
    }
}

/// Split `text` into its leading line-break run, the body, and its trailing line-break run
fn split_edge_breaks(text: &str) -> (&str, &str, &str) {
    let leading_ws = text.len() - text.trim_start().len();
    let body_start = text[..leading_ws].rfind('\n').map_or(0, |pos| pos + 1);

    let trailing_ws = text[body_start..].trim_end().len() + body_start;
    let body_end = text[trailing_ws..]
        .find(['\r', '\n'])
        .map_or(text.len(), |pos| trailing_ws + pos);

    (&text[..body_start], &text[body_start..body_end], &text[body_end..])
}

fn resolve_target<H: Host>(host: &H, target: FormatTarget) -> Result<ResolvedTarget, FormatOutcome> {
    match target {
        FormatTarget::Explicit { document, range } => {
            let snapshot = host.document(&document).ok_or(FormatOutcome::DocumentUnavailable)?;
            Ok(ResolvedTarget {
                document_id: document,
                snapshot,
                range,
            })
        }
        FormatTarget::SelectionOrParagraph => {
            let editor = host.active_editor().ok_or(FormatOutcome::NoActiveEditor)?;
            let snapshot = host.document(&editor.document).ok_or(FormatOutcome::DocumentUnavailable)?;
            let selection = editor.selection;
            let range = if selection.is_empty() {
                let line = selection.cursor_line();
                enclosing_paragraphs(&snapshot, line, line)
            } else {
                let selected = selection.range();
                enclosing_paragraphs(&snapshot, selected.start.line, selected.end.line)
            };
            Ok(ResolvedTarget {
                document_id: editor.document,
                snapshot,
                range,
            })
        }
        FormatTarget::CursorParagraph { document } => {
            let editor = host
                .active_editor()
                .filter(|editor| editor.document == document)
                .ok_or(FormatOutcome::NoActiveEditor)?;
            let snapshot = host.document(&document).ok_or(FormatOutcome::DocumentUnavailable)?;
            let line = editor.selection.cursor_line();
            let range = enclosing_paragraphs(&snapshot, line, line);
            Ok(ResolvedTarget {
                document_id: document,
                snapshot,
                range,
            })
        }
    }
}
