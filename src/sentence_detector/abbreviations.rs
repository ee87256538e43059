// WHY: Centralized abbreviation handling for sentence boundary detection
// A boundary candidate preceded by one of these is not a sentence end

use std::collections::HashSet;

/// Title abbreviations that precede proper nouns ("Dr. Smith", "Mr. Johnson")
pub const TITLE_ABBREVIATIONS: &[&str] = &[
    "Dr.", "Mr.", "Mrs.", "Ms.", "Prof.", "Sr.", "Jr.", "St.",
];

/// Latin and editorial abbreviations that rarely end a sentence
pub const COMMON_ABBREVIATIONS: &[&str] = &[
    "e.g.", "i.e.", "etc.", "vs.", "cf.", "approx.",
];

/// Efficient abbreviation lookup using HashSet for O(1) performance
#[derive(Debug)]
pub struct AbbreviationChecker {
    title_abbreviations: HashSet<&'static str>,
    common_abbreviations: HashSet<&'static str>,
}

impl AbbreviationChecker {
    pub fn new() -> Self {
        Self {
            title_abbreviations: TITLE_ABBREVIATIONS.iter().copied().collect(),
            common_abbreviations: COMMON_ABBREVIATIONS.iter().copied().collect(),
        }
    }

    /// Check if a word is a title abbreviation
    pub fn is_title_abbreviation(&self, word: &str) -> bool {
        self.title_abbreviations.contains(word)
    }

    /// Check if a word is any known abbreviation, initialisms included
    pub fn is_abbreviation(&self, word: &str) -> bool {
        self.is_title_abbreviation(word)
            || self.common_abbreviations.contains(word)
            || is_initialism(word)
    }

    /// Check if text ends with an abbreviation that should not split sentences
    /// WHY: only the last word decides; quotes around it are ignored
    pub fn ends_with_abbreviation(&self, text: &str) -> bool {
        match text.split_whitespace().last() {
            Some(last_word) => {
                let clean_word = last_word.trim_matches(|c: char| {
                    matches!(c, '"' | '\'' | '(' | '[' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}')
                });
                self.is_abbreviation(clean_word)
            }
            None => false,
        }
    }
}

impl Default for AbbreviationChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Single letters each followed by a period: "J.", "U.S.", "p.m."
fn is_initialism(word: &str) -> bool {
    let mut chars = word.chars();
    let mut letters = 0;
    loop {
        match (chars.next(), chars.next()) {
            (Some(letter), Some('.')) if letter.is_alphabetic() => letters += 1,
            (None, _) => return letters > 0,
            _ => return false,
        }
    }
}
