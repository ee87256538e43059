// WHY: host-side text model reduced to what the formatter needs
// Lines, positions and ranges; the host owns the real buffer, the engine reads snapshots

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a document (typically its URI)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 0-based line and 0-based character column (in chars, not bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// Contiguous span of a document, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Build a range, swapping the endpoints if they arrive reversed
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One reported edit: the replaced range (pre-edit coordinates) and the inserted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub range: Range,
    pub text: String,
}

impl ChangeEvent {
    pub fn new(range: Range, text: impl Into<String>) -> Self {
        Self { range, text: text.into() }
    }

    /// Whether the inserted text spans more than one line
    pub fn inserts_line_break(&self) -> bool {
        self.text.contains('\n')
    }

    /// Inclusive line span the inserted text occupies after the edit
    pub fn affected_lines(&self) -> (usize, usize) {
        let start = self.range.start.line;
        let breaks = self.text.matches('\n').count();
        (start, start + breaks)
    }

    /// Position just past the inserted text, in post-edit coordinates
    pub fn end_position(&self) -> Position {
        let (_, end_line) = self.affected_lines();
        let character = match self.text.rfind('\n') {
            Some(offset) => self.text[offset + 1..].chars().count(),
            None => self.range.start.character + self.text.chars().count(),
        };
        Position::new(end_line, character)
    }
}

/// Line terminator of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// First terminator found wins; text without any terminator is `Lf`
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(pos) if pos > 0 && text.as_bytes()[pos - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Read access the paragraph locator and formatter need from a buffer
pub trait TextBuffer {
    fn line_count(&self) -> usize;

    /// Text of a line without its terminator; out-of-range lines read as empty
    fn line(&self, index: usize) -> &str;

    fn text_in(&self, range: &Range) -> String;

    fn is_blank(&self, index: usize) -> bool {
        self.line(index).trim().is_empty()
    }

    /// Position just past the last character of `line`
    fn line_end(&self, line: usize) -> Position {
        Position::new(line, self.line(line).chars().count())
    }
}

/// In-memory line buffer; also the snapshot type hosts hand to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    line_ending: LineEnding,
}

impl Document {
    pub fn from_text(text: &str) -> Self {
        let line_ending = LineEnding::detect(text);
        let lines = split_lines(text);
        Self { lines, line_ending }
    }

    pub fn text(&self) -> String {
        self.lines.join(self.line_ending.as_str())
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn full_range(&self) -> Range {
        let last = self.lines.len().saturating_sub(1);
        Range::new(Position::new(0, 0), self.line_end(last))
    }

    /// Clamp a position onto existing text
    pub fn clamp(&self, position: Position) -> Position {
        let last = self.lines.len().saturating_sub(1);
        if position.line > last {
            return self.line_end(last);
        }
        let width = self.lines[position.line].chars().count();
        Position::new(position.line, position.character.min(width))
    }

    /// Replace `range` with `text`; returns the change event a host would report
    pub fn replace(&mut self, range: Range, text: &str) -> ChangeEvent {
        let start = self.clamp(range.start);
        let end = self.clamp(range.end);

        let head = &self.lines[start.line];
        let prefix = &head[..char_to_byte(head, start.character)];
        let tail = &self.lines[end.line];
        let suffix = &tail[char_to_byte(tail, end.character)..];

        let spliced = format!("{prefix}{text}{suffix}");
        let replacement = split_lines(&spliced);
        self.lines.splice(start.line..=end.line, replacement);

        ChangeEvent::new(Range::new(start, end), text)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::from_text("")
    }
}

impl TextBuffer for Document {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, index: usize) -> &str {
        self.lines.get(index).map_or("", String::as_str)
    }

    fn text_in(&self, range: &Range) -> String {
        let start = self.clamp(range.start);
        let end = self.clamp(range.end);

        if start.line == end.line {
            let line = &self.lines[start.line];
            return line[char_to_byte(line, start.character)..char_to_byte(line, end.character)].to_string();
        }

        let eol = self.line_ending.as_str();
        let first = &self.lines[start.line];
        let last = &self.lines[end.line];

        let mut text = String::new();
        text.push_str(&first[char_to_byte(first, start.character)..]);
        for line in &self.lines[start.line + 1..end.line] {
            text.push_str(eol);
            text.push_str(line);
        }
        text.push_str(eol);
        text.push_str(&last[..char_to_byte(last, end.character)]);
        text
    }
}

/// Split on `\n`, dropping a trailing `\r` from each line
fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Byte offset of the `character`-th char, saturating at the end of the line
fn char_to_byte(line: &str, character: usize) -> usize {
    line.char_indices()
        .nth(character)
        .map_or(line.len(), |(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_round_trips_line_endings() {
        let doc = Document::from_text("one\r\ntwo\r\n\r\nthree");
        assert_eq!(doc.line_ending(), LineEnding::CrLf);
        assert_eq!(doc.line_count(), 4);
        assert_eq!(doc.line(1), "two");
        assert_eq!(doc.text(), "one\r\ntwo\r\n\r\nthree");
    }

    #[test]
    fn test_empty_text_is_one_empty_line() {
        let doc = Document::from_text("");
        assert_eq!(doc.line_count(), 1);
        assert!(doc.is_blank(0));
        assert_eq!(doc.line(7), "");
    }

    #[test]
    fn test_text_in_spans_lines() {
        let doc = Document::from_text("alpha beta\ngamma\ndelta epsilon");
        let range = Range::new(Position::new(0, 6), Position::new(2, 5));
        assert_eq!(doc.text_in(&range), "beta\ngamma\ndelta");

        let single = Range::new(Position::new(1, 1), Position::new(1, 4));
        assert_eq!(doc.text_in(&single), "amm");
    }

    #[test]
    fn test_text_in_clamps_out_of_range_positions() {
        let doc = Document::from_text("short\nline");
        let range = Range::new(Position::new(0, 2), Position::new(9, 99));
        assert_eq!(doc.text_in(&range), "ort\nline");
    }

    #[test]
    fn test_replace_multiline_with_unicode() {
        let mut doc = Document::from_text("héllo wörld\nsecond\nthird");
        let range = Range::new(Position::new(0, 6), Position::new(1, 3));
        let change = doc.replace(range, "there\nnew ");
        assert_eq!(doc.text(), "héllo there\nnew ond\nthird");
        assert_eq!(change.affected_lines(), (0, 1));
        assert!(change.inserts_line_break());
        assert_eq!(change.end_position(), Position::new(1, 4));
    }

    #[test]
    fn test_end_position_single_line_insert() {
        let at = Position::new(2, 5);
        let change = ChangeEvent::new(Range::new(at, at), "wörd");
        assert_eq!(change.end_position(), Position::new(2, 9));
    }

    #[test]
    fn test_replace_whole_document() {
        let mut doc = Document::from_text("a\nb\nc");
        let full = doc.full_range();
        doc.replace(full, "x");
        assert_eq!(doc.text(), "x");
        assert_eq!(doc.line_count(), 1);
    }

    #[test]
    fn test_range_new_orders_endpoints() {
        let range = Range::new(Position::new(3, 1), Position::new(1, 4));
        assert_eq!(range.start, Position::new(1, 4));
        assert_eq!(range.end, Position::new(3, 1));
        assert!(!range.is_empty());
    }
}
