// WHY: Dialog-aware sentence detection with a state machine for coalescing quoted speech
// Quoted and bracketed text is kept whole; boundaries are only taken in narrative

use anyhow::Result;
use regex_automata::{meta::Regex, Input};
use std::collections::HashMap;
use tracing::debug;

use super::normalization::sanitize;
use super::{AbbreviationChecker, ByteSpan, DetectedSentence, DetectorOptions, SentenceDetect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogState {
    Narrative,
    DialogDoubleQuote,
    DialogSingleQuote,
    DialogSmartDoubleOpen,
    DialogSmartSingleOpen,
    DialogParentheticalRound,
    DialogParentheticalSquare,
    DialogParentheticalCurly,
}

impl DialogState {
    /// Dialog state entered by an opening character, if it is one
    fn opened_by(ch: char) -> Option<Self> {
        match ch {
            '"' => Some(DialogState::DialogDoubleQuote),
            '\'' => Some(DialogState::DialogSingleQuote),
            '\u{201C}' => Some(DialogState::DialogSmartDoubleOpen),
            '\u{2018}' => Some(DialogState::DialogSmartSingleOpen),
            '(' => Some(DialogState::DialogParentheticalRound),
            '[' => Some(DialogState::DialogParentheticalSquare),
            '{' => Some(DialogState::DialogParentheticalCurly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    NarrativeBoundary,
    DialogOpen,
    DialogEnd,
    DialogSoftEnd,
}

pub struct DialogStateMachine {
    patterns: HashMap<DialogState, Regex>,
    abbreviation_checker: AbbreviationChecker,
}

impl DialogStateMachine {
    pub fn new() -> Result<Self> {
        let mut patterns = HashMap::new();

        // Compositional pattern components
        let sentence_end_punct = r"[.!?]+";
        let trailing_closers = r"[\x22\x27\u{201D}\u{2019}\)\]\}]*";
        let separator = r"\s+";
        let sentence_start_chars = r"[\p{Lu}\x22\x27\u{201C}\u{2018}\(\[\{]";
        // WHY: a straight single quote only opens dialog at a word start, never inside "don't"
        let dialog_open_chars = r"[\x22\u{201C}\u{2018}\(\[\{]|(?:^|\s)\x27";

        let narrative_boundary = format!("{sentence_end_punct}{trailing_closers}{separator}{sentence_start_chars}");
        let narrative_pattern = format!("(?:{narrative_boundary})|(?:{dialog_open_chars})");
        patterns.insert(DialogState::Narrative, Regex::new(&narrative_pattern)?);

        // Dialog closing characters
        let closers = [
            (DialogState::DialogDoubleQuote, r"\x22"),
            (DialogState::DialogSingleQuote, r"\x27"),
            (DialogState::DialogSmartDoubleOpen, r"\u{201D}"),
            (DialogState::DialogSmartSingleOpen, r"\u{2019}"),
            (DialogState::DialogParentheticalRound, r"\)"),
            (DialogState::DialogParentheticalSquare, r"\]"),
            (DialogState::DialogParentheticalCurly, r"\}"),
        ];

        for (state, close) in closers {
            // HARD_END: sentence_end + close + separator + sentence_start (sentence boundary)
            // SOFT_END: just close (dialog ends, sentence continues)
            let hard_end = format!("{sentence_end_punct}{close}{separator}{sentence_start_chars}");
            let soft_end = close;
            patterns.insert(state, Regex::new(&format!("(?:{hard_end})|(?:{soft_end})"))?);
        }

        Ok(Self {
            patterns,
            abbreviation_checker: AbbreviationChecker::new(),
        })
    }

    /// Byte spans of the sentences in `text`, trimmed and non-empty
    pub fn detect_spans(&self, text: &str) -> Vec<ByteSpan> {
        let mut spans = Vec::new();
        let mut state = DialogState::Narrative;
        let mut sentence_start = 0;
        let mut position = 0;

        while position < text.len() {
            let Some(pattern) = self.patterns.get(&state) else {
                break;
            };
            let Some(mat) = pattern.find(Input::new(text).range(position..)) else {
                break;
            };
            let matched = &text[mat.start()..mat.end()];

            let (match_type, next_state) = self.classify_match(matched, state);
            match match_type {
                MatchType::NarrativeBoundary | MatchType::DialogEnd => {
                    let (sep_start, sep_end) = separator_offsets(matched);
                    let sentence_end = mat.start() + sep_start;
                    let next_start = mat.start() + sep_end;

                    // WHY: "Dr. Smith" style candidates are rejected before a boundary is recorded
                    let is_false_boundary = match_type == MatchType::NarrativeBoundary
                        && self
                            .abbreviation_checker
                            .ends_with_abbreviation(&text[sentence_start..sentence_end]);

                    if !is_false_boundary {
                        push_trimmed(&mut spans, text, sentence_start, sentence_end);
                        sentence_start = next_start;
                    }
                    (state, position) = enter_dialog_at(text, next_start);
                }
                MatchType::DialogOpen | MatchType::DialogSoftEnd => {
                    state = next_state;
                    position = mat.end();
                }
            }
        }

        push_trimmed(&mut spans, text, sentence_start, text.len());
        debug!("Dialog state machine detected {} sentences", spans.len());
        spans
    }

    fn classify_match(&self, matched: &str, current_state: DialogState) -> (MatchType, DialogState) {
        let starts_with_punct = matched.starts_with(['.', '!', '?']);

        match current_state {
            DialogState::Narrative if starts_with_punct => (MatchType::NarrativeBoundary, DialogState::Narrative),
            DialogState::Narrative => {
                // Opening match; the opener is its last char ("'" may carry leading whitespace)
                let next = matched
                    .chars()
                    .last()
                    .and_then(DialogState::opened_by)
                    .unwrap_or(DialogState::Narrative);
                (MatchType::DialogOpen, next)
            }
            // In dialog state: punctuation + close + separator + start is a HARD_END
            _ if starts_with_punct => (MatchType::DialogEnd, DialogState::Narrative),
            _ => (MatchType::DialogSoftEnd, DialogState::Narrative),
        }
    }
}

/// Offsets of the whitespace run inside a boundary match
fn separator_offsets(matched: &str) -> (usize, usize) {
    let Some(start) = matched.find(char::is_whitespace) else {
        return (matched.len(), matched.len());
    };
    let end = matched[start..]
        .find(|c: char| !c.is_whitespace())
        .map_or(matched.len(), |offset| start + offset);
    (start, end)
}

/// A new sentence that opens with a quote or bracket starts inside that dialog
fn enter_dialog_at(text: &str, at: usize) -> (DialogState, usize) {
    match text[at..].chars().next() {
        Some(ch) => match DialogState::opened_by(ch) {
            Some(state) => (state, at + ch.len_utf8()),
            None => (DialogState::Narrative, at),
        },
        None => (DialogState::Narrative, at),
    }
}

fn push_trimmed(spans: &mut Vec<ByteSpan>, text: &str, start: usize, end: usize) {
    if start >= end {
        return;
    }
    let raw = &text[start..end];
    let trimmed_start = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        let span_start = start + trimmed_start;
        spans.push(ByteSpan {
            start: span_start,
            end: span_start + trimmed.len(),
        });
    }
}

/// Main dialog detector; the crate's default sentence boundary capability
pub struct SentenceDetectorDialog {
    machine: DialogStateMachine,
    options: DetectorOptions,
}

impl SentenceDetectorDialog {
    /// Create detector with default options (single block, sanitized)
    pub fn new() -> Result<Self> {
        Self::with_options(DetectorOptions::default())
    }

    pub fn with_options(options: DetectorOptions) -> Result<Self> {
        let machine = DialogStateMachine::new()?;
        Ok(Self { machine, options })
    }

    pub fn options(&self) -> DetectorOptions {
        self.options
    }

    /// Detect sentences with borrowed API (no sanitizing, slices into `text`)
    pub fn detect_sentences_borrowed<'a>(&self, text: &'a str) -> Vec<DetectedSentence<'a>> {
        let spans = if self.options.newline_boundaries {
            let mut spans = Vec::new();
            let mut offset = 0;
            for line in text.split('\n') {
                spans.extend(self.machine.detect_spans(line).into_iter().map(|span| ByteSpan {
                    start: offset + span.start,
                    end: offset + span.end,
                }));
                offset += line.len() + 1;
            }
            spans
        } else {
            self.machine.detect_spans(text)
        };

        spans
            .into_iter()
            .enumerate()
            .map(|(index, span)| DetectedSentence {
                index,
                raw_content: &text[span.start..span.end],
                span,
            })
            .collect()
    }
}

impl SentenceDetect for SentenceDetectorDialog {
    fn detect(&self, text: &str) -> Vec<String> {
        let sanitized;
        let text = if self.options.sanitize {
            sanitized = sanitize(text);
            sanitized.as_str()
        } else {
            text
        };

        self.detect_sentences_borrowed(text)
            .into_iter()
            .map(|sentence| sentence.raw().to_string())
            .collect()
    }
}
