//! Caption sentence isolation.

use regex::Regex;
use std::sync::LazyLock;

/// Sentence terminator: a run of `.`, `!` or `?` followed by whitespace or end
/// of text. The whole run is cut, so an ellipsis leaves no stray dots.
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+(?:\s|$)").expect("valid sentence regex"));

/// Leading filler such as "In this image," or "in the photo:".
static LEADING_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^in (?:this|the) (?:image|photo|picture)[,:]?\s*").expect("valid filler regex")
});

/// Extract a single-sentence caption from raw model text.
///
/// Keeps the text up to the first sentence terminator, drops a leading
/// "in the image" style filler, trims, and truncates to `max_chars`
/// characters. Returns an empty string when nothing usable remains; callers
/// treat that as an extraction failure.
pub fn extract_caption(raw_text: &str, max_chars: usize) -> String {
    let text = raw_text.trim();
    let first = match SENTENCE_END.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    };
    let stripped = LEADING_FILLER.replace(first.trim_start(), "");
    stripped.trim().chars().take(max_chars).collect::<String>().trim_end().to_string()
}
