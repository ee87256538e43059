// WHY: paragraph boundaries in two shapes: by line index in a buffer, and by blank-line runs in text
// Locator functions never fail; the splitter owns its compiled pattern

use anyhow::Result;
use regex_automata::meta::Regex;

use crate::document::{Position, Range, TextBuffer};

/// First line of the non-blank run containing `line`
///
/// A blank anchor line is returned unchanged; out-of-range anchors are clamped to the last line.
pub fn find_paragraph_start<B: TextBuffer + ?Sized>(buffer: &B, line: usize) -> usize {
    let line = clamp_line(buffer, line);
    if buffer.is_blank(line) {
        return line;
    }

    let mut start = line;
    while start > 0 && !buffer.is_blank(start - 1) {
        start -= 1;
    }
    start
}

/// Last line of the non-blank run containing `line`
pub fn find_paragraph_end<B: TextBuffer + ?Sized>(buffer: &B, line: usize) -> usize {
    let line = clamp_line(buffer, line);
    if buffer.is_blank(line) {
        return line;
    }

    let last = buffer.line_count().saturating_sub(1);
    let mut end = line;
    while end < last && !buffer.is_blank(end + 1) {
        end += 1;
    }
    end
}

/// Range covering whole lines `start_line..=end_line`
pub fn whole_line_range<B: TextBuffer + ?Sized>(buffer: &B, start_line: usize, end_line: usize) -> Range {
    let start_line = clamp_line(buffer, start_line);
    let end_line = clamp_line(buffer, end_line).max(start_line);
    Range::new(Position::new(start_line, 0), buffer.line_end(end_line))
}

/// Expand the lines `start_line..=end_line` outward to full paragraphs
pub fn enclosing_paragraphs<B: TextBuffer + ?Sized>(buffer: &B, start_line: usize, end_line: usize) -> Range {
    let start = find_paragraph_start(buffer, start_line);
    let end = find_paragraph_end(buffer, end_line);
    whole_line_range(buffer, start, end)
}

/// Whole-line range for a paste covering `start_line..=end_line`
///
/// When the line right after the paste is blank, the range grows to swallow the next
/// paragraph, so pasted text that ends just before existing content is merged with it.
pub fn paste_range<B: TextBuffer + ?Sized>(buffer: &B, start_line: usize, end_line: usize) -> Range {
    let last = buffer.line_count().saturating_sub(1);
    let start = start_line.min(last);
    let mut end = end_line.min(last).max(start);

    if end < last && buffer.is_blank(end + 1) {
        if let Some(next) = (end + 2..=last).find(|&line| !buffer.is_blank(line)) {
            end = find_paragraph_end(buffer, next);
        }
    }
    whole_line_range(buffer, start, end)
}

fn clamp_line<B: TextBuffer + ?Sized>(buffer: &B, line: usize) -> usize {
    line.min(buffer.line_count().saturating_sub(1))
}

/// Splits text into raw paragraphs on runs of one or more blank lines
pub struct ParagraphSplitter {
    separator: Regex,
}

impl ParagraphSplitter {
    pub fn new() -> Result<Self> {
        // A line break, any whitespace (including further blank lines), then a line break.
        // Whitespace-only lines count as blank.
        let separator = Regex::new(r"\r?\n\s*\r?\n")?;
        Ok(Self { separator })
    }

    /// Raw paragraph texts in order; separators are dropped
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut paragraphs = Vec::new();
        let mut last = 0;
        for separator in self.separator.find_iter(text) {
            paragraphs.push(&text[last..separator.start()]);
            last = separator.end();
        }
        paragraphs.push(&text[last..]);
        paragraphs
    }
}
