//! Batch captioning pipeline.
//!
//! - **discovery**: find candidate images in a folder
//! - **encode**: re-encode an image as a JPEG transport payload
//! - **processor**: rename, query, extract and embed, one file at a time

pub mod discovery;
pub mod encode;
pub mod processor;

pub use discovery::FileDiscovery;
pub use encode::PayloadEncoder;
pub use processor::CaptionPipeline;
