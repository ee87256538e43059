// WHY: standalone normalization so the segmenter and detector agree on one whitespace model
// Paragraph text goes in with hard line breaks, a single logical line comes out

/// Collapse every line break and whitespace run to one space and trim the ends
///
/// `\r\n` counts as a single break. The result never contains a line break.
pub fn normalize_paragraph(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    normalize_paragraph_into(text, &mut result);
    result
}

/// Normalize into a supplied buffer to avoid allocation
pub fn normalize_paragraph_into(text: &str, buffer: &mut String) {
    buffer.clear();
    buffer.reserve(text.len());

    let mut prev_was_space = true; // swallows leading whitespace

    for ch in text.chars() {
        if ch.is_whitespace() {
            // \r, \n and every other whitespace char collapse the same way
            if !prev_was_space {
                buffer.push(' ');
                prev_was_space = true;
            }
        } else {
            buffer.push(ch);
            prev_was_space = false;
        }
    }

    if buffer.ends_with(' ') {
        buffer.pop();
    }
}

/// Strip characters the detector should never see
///
/// Removes control characters other than whitespace, and zero-width characters.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|&ch| !is_stray(ch))
        .collect()
}

fn is_stray(ch: char) -> bool {
    matches!(ch, '\u{200B}'..='\u{200D}' | '\u{FEFF}') || (ch.is_control() && !ch.is_whitespace())
}
