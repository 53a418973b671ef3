//! Text cleanup and quality checks for extracted content

/// Prefixes of placeholder strings produced when extraction did not really work
pub const FAILURE_MARKERS: &[&str] = &[
    "PDF Document:",
    "[PDF content unavailable",
    "Could not extract",
    "Error extracting",
    "This PDF appears to be image-based",
];

/// Marker appended to truncated previews
pub const ELLIPSIS: &str = "...";

/// Remove C0 controls (U+0000..=U+001F), DEL and C1 controls (U+007F..=U+009F)
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|c| !is_stripped_control(*c)).collect()
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}')
}

/// Whether extracted text is worth persisting
///
/// Rejects empty text, text of `min_chars` characters or fewer, and
/// anything starting with a known failure marker.
pub fn is_usable_extraction(text: &str, min_chars: usize) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.chars().count() <= min_chars {
        return false;
    }
    !FAILURE_MARKERS
        .iter()
        .any(|marker| trimmed.starts_with(marker))
}

/// Leading `max_chars` characters of `text`, with [`ELLIPSIS`] when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}
