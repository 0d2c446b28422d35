//! captag core - batch image captioning library.
//!
//! captag asks a vision-capable model for a caption and a set of tags for
//! every image in a folder, then writes both into the image's own metadata
//! (EXIF for JPEG, text chunks for PNG).
//!
//! # Architecture
//!
//! ```text
//! Folder → Discover → Rename → Encode payload → Caption query → Tags query → Embed → Report
//! ```
//!
//! Files are processed strictly one after another. A failure on one file is
//! recorded in its [`CaptionResult`] and the run moves on.
//!
//! # Usage
//!
//! ```rust,ignore
//! use captag_core::{CaptionPipeline, Config, RunReport};
//!
//! #[tokio::main]
//! async fn main() -> captag_core::Result<()> {
//!     let config = Config::load()?;
//!     let pipeline = CaptionPipeline::from_config(config)?;
//!
//!     let summary = pipeline.run("./photos".as_ref(), |_| {}).await;
//!     println!("{}", RunReport::from_summary(&summary).render());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod llm;
pub mod metadata;
pub mod pipeline;
pub mod report;
pub mod sanitize;
pub mod text;
pub mod types;

pub use config::Config;
pub use error::{CaptagError, ConfigError, FailureKind, PipelineError, Result};
pub use llm::{ImagePayload, ModelPrompt, OpenAiTransport, RetryPolicy, VisionClient, VisionTransport};
pub use metadata::{EmbeddedMetadata, MetadataEmbedder};
pub use pipeline::{CaptionPipeline, FileDiscovery};
pub use report::RunReport;
pub use types::{CaptionResult, ContainerFormat, ImageFile, RunCounters, RunSummary};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
