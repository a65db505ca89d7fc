use std::borrow::Cow;

/// Bold delimiter used by the generated reports
pub const BOLD: &str = "**";

/// Cross mark and warning triangle.
///
/// The triangle is usually followed by a variation selector (`⚠️`), which `contains` ignores.
pub const WARNING_GLYPHS: [char; 2] = ['❌', '⚠'];

pub fn contains_warning_glyph(text: &str) -> bool {
    text.contains(WARNING_GLYPHS)
}

/// Removes every bold delimiter, borrowing when there is nothing to remove
pub fn strip_bold(text: &str) -> Cow<'_, str> {
    if text.contains(BOLD) {
        Cow::Owned(text.replace(BOLD, ""))
    } else {
        Cow::Borrowed(text)
    }
}

/// Longest prefix holding at most `count` characters
pub fn leading_chars(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((ind, _)) => &text[..ind],
        None => text,
    }
}
