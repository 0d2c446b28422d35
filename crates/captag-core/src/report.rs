//! Run report rendering.
//!
//! The plain-text form is what lands in the processed folder; the JSON form
//! carries every per-file result for scripting.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

use crate::types::{CaptionResult, RunCounters, RunSummary};

/// Aggregate counts plus per-file results of one run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunReport<'a> {
    pub counters: &'a RunCounters,
    pub results: &'a [CaptionResult],
}

impl<'a> RunReport<'a> {
    pub fn new(counters: &'a RunCounters, results: &'a [CaptionResult]) -> Self {
        Self { counters, results }
    }

    pub fn from_summary(summary: &'a RunSummary) -> Self {
        Self::new(&summary.counters, &summary.results)
    }

    /// Render the text report:
    ///
    /// ```text
    /// Processed: <n>
    /// Skipped: <n>
    /// Failed: <n>
    ///
    /// Failures:
    /// <name>: <error>
    /// ```
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("Processed: {}", self.counters.processed),
            format!("Skipped: {}", self.counters.skipped),
            format!("Failed: {}", self.counters.failed),
            String::new(),
            "Failures:".to_string(),
        ];
        lines.extend(self.results.iter().filter_map(|r| {
            r.error
                .as_ref()
                .map(|error| format!("{}: {}", r.file_name(), error))
        }));
        lines.join("\n")
    }

    /// Write the text report into `folder`, returning the file's path.
    pub fn write(&self, folder: &Path, report_name: &str) -> io::Result<PathBuf> {
        let path = folder.join(report_name);
        std::fs::write(&path, self.render())?;
        tracing::info!("Report saved: {:?}", path);
        Ok(path)
    }

    /// Serialize counts and results to JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::types::ImageFile;

    fn results() -> (RunCounters, Vec<CaptionResult>) {
        let ok = ImageFile::new(PathBuf::from("/p/ok.jpg"), 10);
        let bad = ImageFile::new(PathBuf::from("/p/bad.png"), 10);
        let results = vec![
            CaptionResult::success(&ok, "a cat".into(), vec!["cat".into()]),
            CaptionResult::failure(
                &bad,
                &PipelineError::Transport {
                    message: "HTTP 503".into(),
                    status_code: Some(503),
                },
            ),
        ];
        let mut counters = RunCounters::default();
        results.iter().for_each(|r| counters.record(r));
        (counters, results)
    }

    #[test]
    fn test_render_layout() {
        let (counters, results) = results();
        let text = RunReport::new(&counters, &results).render();
        assert_eq!(
            text,
            "Processed: 1\nSkipped: 0\nFailed: 1\n\nFailures:\nbad.png: [transport] HTTP 503"
        );
    }

    #[test]
    fn test_render_without_failures() {
        let counters = RunCounters::default();
        let text = RunReport::new(&counters, &[]).render();
        assert!(text.ends_with("Failures:"));
    }

    #[test]
    fn test_write_to_folder() {
        let dir = tempfile::tempdir().unwrap();
        let (counters, results) = results();
        let path = RunReport::new(&counters, &results)
            .write(dir.path(), "metadata_report.txt")
            .unwrap();
        assert_eq!(path, dir.path().join("metadata_report.txt"));
        assert!(std::fs::read_to_string(path).unwrap().starts_with("Processed: 1\n"));
    }

    #[test]
    fn test_json_carries_results() {
        let (counters, results) = results();
        let json = RunReport::new(&counters, &results).to_json(false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["counters"]["failed"], 1);
        assert_eq!(value["results"][1]["error"]["kind"], "transport");
        assert_eq!(value["results"][0]["tags"][0], "cat");
    }
}
