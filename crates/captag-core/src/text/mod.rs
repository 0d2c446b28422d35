//! Deterministic extraction of a caption and a tag list from free-form model text.
//!
//! Both passes are pure functions over the input: no model calls, no
//! embeddings, so the same completion always yields the same metadata.

mod caption;
mod tags;

pub use caption::extract_caption;
pub use tags::{extract_tags, TagRules, STOP_WORDS};
