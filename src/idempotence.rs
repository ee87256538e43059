// WHY: recognize paragraphs the user already laid out one sentence per line
// Conservative: it only answers true when every line looks like a finished sentence

const TERMINAL_PUNCTUATION: [char; 3] = ['.', '!', '?'];
const CLOSING_QUOTES: [char; 4] = ['"', '\'', '\u{201D}', '\u{2019}'];

/// True when the paragraph has at least two non-empty lines and each ends a sentence
///
/// A line ends a sentence when its last char is `.`, `!` or `?`, optionally followed by
/// a single closing quote.
pub fn is_already_formatted(raw_paragraph: &str) -> bool {
    let lines: Vec<&str> = raw_paragraph
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    // Single-line or empty paragraphs are always re-segmented
    if lines.len() < 2 {
        return false;
    }

    lines.iter().all(|line| ends_sentence(line))
}

fn ends_sentence(line: &str) -> bool {
    let mut tail = line.chars().rev();
    match tail.next() {
        Some(last) if TERMINAL_PUNCTUATION.contains(&last) => true,
        Some(last) if CLOSING_QUOTES.contains(&last) => {
            matches!(tail.next(), Some(prev) if TERMINAL_PUNCTUATION.contains(&prev))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_paragraph() {
        assert!(is_already_formatted("First line.\nSecond line!"));
        assert!(is_already_formatted("  Is it?  \r\n\"Yes.\"\nShe said \u{201C}no.\u{201D}"));
    }

    #[test]
    fn test_single_line_is_never_formatted() {
        assert!(!is_already_formatted("Only one sentence."));
        assert!(!is_already_formatted(""));
        assert!(!is_already_formatted("Only one.\n\n   \n"));
    }

    #[test]
    fn test_partially_split_paragraph() {
        assert!(!is_already_formatted("First line.\nsecond line wraps\nhere."));
        assert!(!is_already_formatted("Ends with colon:\nNext."));
    }

    #[test]
    fn test_only_one_closing_quote_allowed() {
        assert!(!is_already_formatted("Nested quote.'\"\nNext."));
        assert!(!is_already_formatted("Quote without stop\"\nNext."));
    }
}
