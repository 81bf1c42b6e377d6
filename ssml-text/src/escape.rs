//! Escaping of characters reserved by SSML.

/// Characters that must be replaced by entities inside SSML text.
const RESERVED_CHARS: &[(char, &str)] = &[
    ('&', "&amp;"),
    ('"', "&quot;"),
    ('\'', "&apos;"),
    ('<', "&lt;"),
    ('>', "&gt;"),
];

/// Worst-case growth charged for each reserved character.
pub const ESCAPE_WEIGHT: usize = 6;

/// Replace reserved characters with their entity form.
///
/// Runs in a single pass, so the ampersands of inserted entities are never
/// escaped a second time.
pub fn escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.chars() {
        match RESERVED_CHARS.iter().find(|(ch, _)| *ch == c) {
            Some((_, entity)) => result.push_str(entity),
            None => result.push(c),
        }
    }

    result
}

/// Conservative escaping cost used for budget arithmetic.
pub fn estimate_cost(text: &str) -> usize {
    text.chars().filter(|c| is_reserved(*c)).count() * ESCAPE_WEIGHT
}

/// Cost over a slice of characters, as used by the chunker.
pub(crate) fn estimate_cost_chars(chars: &[char]) -> usize {
    chars.iter().filter(|c| is_reserved(**c)).count() * ESCAPE_WEIGHT
}

/// Byte length of the entity `text` ends with, if any.
pub(crate) fn trailing_entity_len(text: &str) -> Option<usize> {
    RESERVED_CHARS
        .iter()
        .map(|(_, entity)| *entity)
        .find(|entity| text.ends_with(*entity))
        .map(str::len)
}

fn is_reserved(c: char) -> bool {
    RESERVED_CHARS.iter().any(|(ch, _)| *ch == c)
}
