//! Tag tokenization, stop-word filtering and deduplication.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Words that never become tags: English function words, spatial
/// prepositions, and phrasing artifacts models tend to emit.
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "is", "are", "was",
    "were", "with", "of", "image", "photo", "picture", "shows", "there", "this", "that",
    "these", "those", "you", "it", "they", "we", "he", "she", "be", "have", "has", "had", "do",
    "does", "did", "what", "which", "where", "when", "who", "how", "why", "some", "any", "all",
    "many", "much", "more", "most", "few", "several", "such", "own", "in_the_image", "near",
    "by", "from", "into", "onto", "over", "under", "behind", "beside", "next", "its", "their",
];

static STOP_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// Quotes and brackets removed before tokenizing.
static NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"\[\](){}]"#).expect("valid noise regex"));

/// Alphabetic runs of 3 to 20 letters.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]{3,20}\b").expect("valid word regex"));

/// Bounds applied while collecting tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRules {
    /// Fewer surviving tags than this is a failure
    pub min_tags: usize,
    /// Collection stops once this many tags survived
    pub max_tags: usize,
    /// Tags longer than this (in characters) are dropped
    pub max_tag_length: usize,
}

impl Default for TagRules {
    fn default() -> Self {
        Self {
            min_tags: 7,
            max_tags: 10,
            max_tag_length: 25,
        }
    }
}

impl From<&crate::config::MetadataConfig> for TagRules {
    fn from(config: &crate::config::MetadataConfig) -> Self {
        Self {
            min_tags: config.min_tags,
            max_tags: config.max_tags,
            max_tag_length: config.max_tag_length,
        }
    }
}

/// Extract a keyword list from raw model text, topped up with caption words.
///
/// Tokens from `raw_text` come first, then tokens from `caption`, in
/// first-occurrence order. Returns `None` when fewer than `rules.min_tags`
/// tokens survive filtering; a short list is never a valid result.
pub fn extract_tags(raw_text: &str, caption: &str, rules: &TagRules) -> Option<Vec<String>> {
    let lowered = raw_text.to_lowercase();
    let clean_text = NOISE.replace_all(&lowered, "");
    let caption_lower = caption.to_lowercase();

    let mut candidates: Vec<&str> = Vec::new();
    let mut queued: HashSet<&str> = HashSet::new();
    for word in WORD
        .find_iter(&clean_text)
        .chain(WORD.find_iter(&caption_lower))
        .map(|m| m.as_str())
    {
        if queued.insert(word) {
            candidates.push(word);
        }
    }

    let mut tags: Vec<String> = Vec::with_capacity(rules.max_tags);
    let mut seen: HashSet<String> = HashSet::new();
    for candidate in candidates {
        let tag = candidate.trim().replace('_', " ");
        if STOP_SET.contains(tag.as_str())
            || tag.is_empty()
            || tag.chars().count() > rules.max_tag_length
            || seen.contains(&tag)
        {
            continue;
        }
        seen.insert(tag.clone());
        tags.push(tag);
        if tags.len() >= rules.max_tags {
            break;
        }
    }

    if tags.len() >= rules.min_tags {
        Some(tags)
    } else {
        tracing::debug!(
            "Only {} tag(s) survived filtering (need {})",
            tags.len(),
            rules.min_tags
        );
        None
    }
}
