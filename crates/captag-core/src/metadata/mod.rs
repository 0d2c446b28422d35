//! Caption and keyword embedding into container metadata.
//!
//! The writer is picked from the content-detected format:
//! - **png**: `Description` / `Keywords` text chunks, lossless re-encode
//! - **exif**: ImageDescription / XPKeywords EXIF tags in a re-encoded JPEG
//!
//! Both variants can read back what they wrote.

mod exif_tags;
mod png_text;

pub use exif_tags::ExifWriter;
pub use png_text::PngTextWriter;

use crate::config::MetadataConfig;
use crate::error::PipelineError;
use crate::types::ContainerFormat;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use std::path::Path;

/// PNG text chunk keyword holding the caption.
pub const DESCRIPTION_KEY: &str = "Description";

/// PNG text chunk keyword holding the tag string.
pub const KEYWORDS_KEY: &str = "Keywords";

/// Caption and keywords as stored in a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

impl EmbeddedMetadata {
    /// Individual tags from the `;`-separated keyword string.
    pub fn tags(&self) -> Vec<String> {
        self.keywords
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }

    /// True when both a caption and at least one keyword are present.
    pub fn is_complete(&self) -> bool {
        self.caption.as_deref().is_some_and(|c| !c.is_empty()) && !self.tags().is_empty()
    }
}

/// Join tags into the stored form: `tag1;tag2;...;tagN;`.
pub fn keyword_string(tags: &[String]) -> String {
    let mut joined = tags.join(";");
    joined.push(';');
    joined
}

/// Format-specific metadata writer.
#[derive(Debug, Clone)]
pub enum MetadataWriter {
    Png(PngTextWriter),
    Exif(ExifWriter),
}

impl MetadataWriter {
    /// Select the writer for a detected format. Anything other than PNG is
    /// converted to JPEG and gets EXIF.
    pub fn for_format(format: ImageFormat, config: &MetadataConfig) -> Self {
        match format {
            ImageFormat::Png => Self::Png(PngTextWriter),
            _ => Self::Exif(ExifWriter::new(config)),
        }
    }

    /// The container this writer produces.
    pub fn container(&self) -> ContainerFormat {
        match self {
            Self::Png(_) => ContainerFormat::Png,
            Self::Exif(_) => ContainerFormat::Jpeg,
        }
    }

    /// Re-encode `source` with the caption and keywords embedded.
    pub fn encode(&self, source: &[u8], caption: &str, keywords: &str) -> Result<Vec<u8>, String> {
        match self {
            Self::Png(writer) => writer.encode(source, caption, keywords),
            Self::Exif(writer) => writer.encode(source, caption, keywords),
        }
    }

    /// Read caption and keywords back from encoded bytes.
    pub fn read(&self, source: &[u8]) -> Option<EmbeddedMetadata> {
        match self {
            Self::Png(writer) => writer.read(source),
            Self::Exif(writer) => writer.read(source),
        }
    }
}

/// Writes captions and tags into image files in place.
#[derive(Debug, Clone)]
pub struct MetadataEmbedder {
    config: MetadataConfig,
}

impl MetadataEmbedder {
    pub fn new(config: MetadataConfig) -> Self {
        Self { config }
    }

    /// Embed `caption` and `tags` into the file at `path`.
    ///
    /// With `atomic_write` the new bytes land in a temp file next to the
    /// original which then replaces it; otherwise the file is overwritten
    /// directly and a failed write can leave it truncated.
    pub fn embed(&self, path: &Path, caption: &str, tags: &[String]) -> Result<(), PipelineError> {
        let embed_err = |message: String| PipelineError::Embed {
            path: path.to_path_buf(),
            message,
        };

        let source = std::fs::read(path).map_err(|e| embed_err(format!("Cannot read: {e}")))?;
        let format = detect_format(&source)
            .ok_or_else(|| embed_err("Cannot detect image format".to_string()))?;
        let writer = MetadataWriter::for_format(format, &self.config);
        let named = ContainerFormat::from_path(path);
        if writer.container() != named {
            tracing::debug!(
                "{} holds {} data under a {} name",
                path.display(),
                writer.container(),
                named
            );
        }
        let encoded = writer
            .encode(&source, caption, &keyword_string(tags))
            .map_err(embed_err)?;

        if self.config.atomic_write {
            write_atomically(path, &encoded)
        } else {
            std::fs::write(path, &encoded)
        }
        .map_err(|e| embed_err(format!("Cannot write: {e}")))?;

        tracing::info!(
            "Saved: {} | Tags: {}",
            path.file_name().unwrap_or_default().to_string_lossy(),
            tags.join(", ")
        );
        Ok(())
    }

    /// Read the caption and keywords currently stored in a file.
    ///
    /// Returns `None` for unreadable files and files carrying neither field.
    pub fn read(&self, path: &Path) -> Option<EmbeddedMetadata> {
        let source = std::fs::read(path).ok()?;
        let format = detect_format(&source)?;
        MetadataWriter::for_format(format, &self.config).read(&source)
    }
}

/// Detect the container format from the file content.
fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .format()
}

/// Write through a temp file in the target's directory, then rename over it.
fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let permissions = std::fs::metadata(path)?.permissions();

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.as_file().set_permissions(permissions)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
