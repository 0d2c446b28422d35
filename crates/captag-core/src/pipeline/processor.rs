//! Pipeline orchestration - drives each file from discovery to embedded
//! metadata.
//!
//! Files are processed one at a time. Every per-file failure is caught here
//! and recorded on the file's [`CaptionResult`]; nothing aborts the batch.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::PipelineError;
use crate::llm::{ImagePayload, ModelPrompt, OpenAiTransport, RetryPolicy, VisionClient};
use crate::metadata::MetadataEmbedder;
use crate::sanitize::sanitize;
use crate::text::{extract_caption, extract_tags, TagRules};
use crate::types::{CaptionResult, ImageFile, RunCounters, RunSummary};

use super::discovery::FileDiscovery;
use super::encode::PayloadEncoder;

/// What a single file's run ended with, short of a failure.
enum Outcome {
    Tagged { caption: String, tags: Vec<String> },
    AlreadyTagged,
}

/// Captions, tags and embeds every image in a folder.
pub struct CaptionPipeline {
    config: Config,
    client: VisionClient,
    caption_prompt: ModelPrompt,
    tags_prompt: ModelPrompt,
    tag_rules: TagRules,
    encoder: PayloadEncoder,
    embedder: MetadataEmbedder,
    discovery: FileDiscovery,
}

impl CaptionPipeline {
    /// Create a pipeline around an already-built client.
    pub fn new(config: Config, client: VisionClient) -> Self {
        Self {
            caption_prompt: ModelPrompt::caption(&config.prompt),
            tags_prompt: ModelPrompt::tags(&config.prompt),
            tag_rules: TagRules::from(&config.metadata),
            encoder: PayloadEncoder::new(config.processing.payload_quality),
            embedder: MetadataEmbedder::new(config.metadata.clone()),
            discovery: FileDiscovery::new(config.processing.clone()),
            client,
            config,
        }
    }

    /// Create a pipeline talking to the OpenAI-compatible endpoint in `[api]`.
    pub fn from_config(config: Config) -> Result<Self, PipelineError> {
        let transport = OpenAiTransport::new(&config.api)?;
        let client = VisionClient::new(
            Box::new(transport),
            config.api.model.clone(),
            RetryPolicy::from(&config.api),
            Duration::from_millis(config.api.timeout_ms),
        );
        Ok(Self::new(config, client))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discover the candidate images in a folder.
    pub fn discover(&self, folder: &Path) -> Vec<ImageFile> {
        self.discovery.discover(folder)
    }

    /// Scan `folder` and process everything found.
    ///
    /// `on_result` is called once per file as soon as its result is known.
    pub async fn run<F>(&self, folder: &Path, on_result: F) -> RunSummary
    where
        F: FnMut(&CaptionResult),
    {
        let files = self.discover(folder);
        self.run_files(folder, files, on_result).await
    }

    /// Process an already-discovered list of files.
    pub async fn run_files<F>(
        &self,
        folder: &Path,
        files: Vec<ImageFile>,
        mut on_result: F,
    ) -> RunSummary
    where
        F: FnMut(&CaptionResult),
    {
        let start = Instant::now();
        let batch_size = self.config.processing.batch_size.max(1);
        let batch_count = files.len().div_ceil(batch_size);
        tracing::info!(
            "Found {} image(s) in {:?} ({} batch(es) of up to {})",
            files.len(),
            folder,
            batch_count,
            batch_size
        );

        let mut counters = RunCounters::default();
        let mut results = Vec::with_capacity(files.len());

        for (index, batch) in files.chunks(batch_size).enumerate() {
            tracing::debug!(
                "Batch {}/{}: {} file(s)",
                index + 1,
                batch_count,
                batch.len()
            );
            for file in batch {
                let result = self.process_file(file.clone()).await;
                counters.record(&result);
                on_result(&result);
                results.push(result);
            }
        }

        let elapsed = start.elapsed();
        tracing::info!(
            "Run finished in {:?}: {} processed, {} skipped, {} failed",
            elapsed,
            counters.processed,
            counters.skipped,
            counters.failed
        );

        RunSummary {
            folder: folder.to_path_buf(),
            results,
            counters,
            elapsed,
        }
    }

    /// Run one file through the full pipeline.
    ///
    /// Never fails: errors come back inside the result.
    pub async fn process_file(&self, mut file: ImageFile) -> CaptionResult {
        let start = Instant::now();
        tracing::debug!("Processing: {:?} ({})", file.path, file.format);

        match self.try_process(&mut file).await {
            Ok(Outcome::Tagged { caption, tags }) => {
                tracing::debug!("Processed {:?} in {:?}", file.file_name(), start.elapsed());
                CaptionResult::success(&file, caption, tags)
            }
            Ok(Outcome::AlreadyTagged) => {
                tracing::info!("Skipping {} (already tagged)", file.file_name());
                CaptionResult::skipped(&file)
            }
            Err(e) => {
                tracing::error!("Failed {}: {}", file.file_name(), e);
                CaptionResult::failure(&file, &e)
            }
        }
    }

    async fn try_process(&self, file: &mut ImageFile) -> Result<Outcome, PipelineError> {
        self.rename_if_needed(file).await?;

        if !self.config.processing.force_overwrite && self.is_already_tagged(file).await {
            return Ok(Outcome::AlreadyTagged);
        }

        let payload = self.encoder.encode(&file.path).await?;

        let caption = self.query_caption(file, &payload).await?;
        tracing::debug!("Caption for {}: {}", file.file_name(), caption);

        let tags = self.query_tags(file, &payload, &caption).await?;
        tracing::debug!("Tags for {}: {}", file.file_name(), tags.join(", "));

        let embedder = self.embedder.clone();
        let path = file.path.clone();
        let (embed_caption, embed_tags) = (caption.clone(), tags.clone());
        tokio::task::spawn_blocking(move || embedder.embed(&path, &embed_caption, &embed_tags))
            .await
            .map_err(|e| PipelineError::Embed {
                path: file.path.clone(),
                message: format!("Task join error: {}", e),
            })??;

        Ok(Outcome::Tagged { caption, tags })
    }

    /// Rename the file to its sanitized name when that differs.
    async fn rename_if_needed(&self, file: &mut ImageFile) -> Result<(), PipelineError> {
        let (changed, clean_name) = sanitize(&file.file_name());
        if !changed {
            return Ok(());
        }

        let rename_err = |message: String| PipelineError::Rename {
            path: file.path.clone(),
            message,
        };

        if clean_name.is_empty() {
            return Err(rename_err("name is empty after sanitizing".to_string()));
        }
        let target = file
            .path
            .parent()
            .map(|dir| dir.join(&clean_name))
            .ok_or_else(|| rename_err("file has no parent folder".to_string()))?;
        if tokio::fs::try_exists(&target).await.unwrap_or(true) {
            return Err(rename_err(format!("{} already exists", clean_name)));
        }

        tokio::fs::rename(&file.path, &target)
            .await
            .map_err(|e| rename_err(e.to_string()))?;

        tracing::info!("Renamed: {} -> {}", file.original_name, clean_name);
        file.path = target;
        Ok(())
    }

    async fn is_already_tagged(&self, file: &ImageFile) -> bool {
        let embedder = self.embedder.clone();
        let path = file.path.clone();
        tokio::task::spawn_blocking(move || embedder.read(&path))
            .await
            .ok()
            .flatten()
            .is_some_and(|meta| meta.is_complete())
    }

    async fn query_caption(
        &self,
        file: &ImageFile,
        payload: &ImagePayload,
    ) -> Result<String, PipelineError> {
        let raw = self
            .client
            .query(payload, &self.caption_prompt)
            .await
            .ok_or_else(|| self.exhausted("caption"))?;

        let caption = extract_caption(&raw, self.config.metadata.max_caption_length);
        if caption.is_empty() {
            return Err(PipelineError::Extraction {
                path: file.path.clone(),
                message: "model returned no usable caption".to_string(),
            });
        }
        Ok(caption)
    }

    async fn query_tags(
        &self,
        file: &ImageFile,
        payload: &ImagePayload,
        caption: &str,
    ) -> Result<Vec<String>, PipelineError> {
        let raw = self
            .client
            .query(payload, &self.tags_prompt)
            .await
            .ok_or_else(|| self.exhausted("tags"))?;

        extract_tags(&raw, caption, &self.tag_rules).ok_or_else(|| PipelineError::Extraction {
            path: file.path.clone(),
            message: format!("fewer than {} usable tags", self.tag_rules.min_tags),
        })
    }

    fn exhausted(&self, what: &str) -> PipelineError {
        PipelineError::Transport {
            message: format!(
                "No {} response from {} after {} attempt(s)",
                what,
                self.client.model(),
                self.config.api.max_retries.max(1)
            ),
            status_code: None,
        }
    }
}
