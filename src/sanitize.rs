//! Plain-text field sanitization for editor-submitted values.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_PATTERN: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Reduces a submitted value to plain text: markup removed, control
/// characters removed, runs of whitespace collapsed to single spaces, ends
/// trimmed. Applied to every editor field before it reaches storage.
pub fn sanitize_text_field(input: &str) -> String {
    let without_tags = TAG_PATTERN.replace_all(input, "");
    let without_controls: String = without_tags.chars().filter(|c| !c.is_control()).collect();
    without_controls
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
