//! Folder scan for candidate images.

use std::path::Path;
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::types::ImageFile;

/// Finds the images in a single folder that are worth captioning.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    config: ProcessingConfig,
}

impl FileDiscovery {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// List supported images directly inside `folder`.
    ///
    /// Subfolders are not descended into. Files smaller than
    /// `min_file_size_kb` are left out silently. Results are sorted by path.
    pub fn discover(&self, folder: &Path) -> Vec<ImageFile> {
        let min_size = self.min_size_bytes();
        let mut files = Vec::new();

        for entry in WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if !entry.file_type().is_file() || !self.is_supported(entry_path) {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if meta.len() < min_size {
                tracing::debug!(
                    "Skipping {} ({} bytes < {} bytes)",
                    entry_path.display(),
                    meta.len(),
                    min_size
                );
                continue;
            }
            files.push(ImageFile::new(entry_path.to_path_buf(), meta.len()));
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Check if a file has a supported extension. Configured formats may be
    /// written with or without the leading dot.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    fn min_size_bytes(&self) -> u64 {
        self.config.min_file_size_kb.saturating_mul(1024)
    }

    /// Total size of a list of discovered files.
    pub fn total_size(files: &[ImageFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
