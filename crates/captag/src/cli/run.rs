//! The `captag run` command.

use captag_core::{CaptionPipeline, Config, FileDiscovery, ImageFile, RunReport};
use clap::{Args, ValueEnum};
use console::Style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use super::theme::{captag_theme, print_summary};

/// How the report is printed at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// The same text that is saved in the folder
    #[default]
    Text,
    /// Counts plus every per-file result as JSON
    Json,
}

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Folder of images (prompted for when omitted)
    pub folder: Option<PathBuf>,

    /// Chat completions endpoint, overrides `api.url`
    #[arg(long)]
    pub url: Option<String>,

    /// Model identifier, overrides `api.model`
    #[arg(long)]
    pub model: Option<String>,

    /// Ignore files smaller than this many KB, overrides `processing.min_file_size_kb`
    #[arg(long)]
    pub min_size_kb: Option<u64>,

    /// Skip files that already carry a caption and keywords
    #[arg(long)]
    pub no_overwrite: bool,

    /// Report format printed to stdout
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

/// Execute the run command.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args)?;

    let Some(folder) = resolve_folder(args.folder.clone())? else {
        eprintln!("Nothing selected.");
        return Ok(());
    };
    if !folder.is_dir() {
        anyhow::bail!("Not a folder: {}", folder.display());
    }

    tracing::info!("Starting folder: {}", folder.display());
    let pipeline = CaptionPipeline::from_config(config)?;
    let files = pipeline.discover(&folder);

    if files.is_empty() {
        let warn = Style::new().for_stderr().yellow();
        eprintln!(
            "  {}",
            warn.apply_to("No supported images above the minimum size found.")
        );
    } else {
        let dim = Style::new().for_stderr().dim();
        eprintln!("  {}", dim.apply_to(found_line(&files)));
    }

    let progress = create_progress_bar(files.len() as u64);
    let summary = pipeline
        .run_files(&folder, files, |result| {
            progress.set_message(result.file_name());
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    let report = RunReport::from_summary(&summary);
    let report_path = report.write(&folder, &pipeline.config().output.report_name)?;

    print_summary(&summary.counters, summary.elapsed);
    eprintln!("  Report saved to {}", report_path.display());
    eprintln!();

    match args.format {
        ReportFormat::Text => println!("{}", report.render()),
        ReportFormat::Json => println!("{}", report.to_json(true)?),
    }
    Ok(())
}

/// Fold command-line overrides into the loaded config and re-validate.
fn apply_overrides(config: &mut Config, args: &RunArgs) -> anyhow::Result<()> {
    if let Some(url) = &args.url {
        config.api.url = url.clone();
    }
    if let Some(model) = &args.model {
        config.api.model = model.clone();
    }
    if let Some(kb) = args.min_size_kb {
        config.processing.min_file_size_kb = kb;
    }
    if args.no_overwrite {
        config.processing.force_overwrite = false;
    }
    config.validate()?;
    Ok(())
}

/// Use the folder argument, or prompt for one.
///
/// Returns `None` when the prompt is interrupted or left empty.
fn resolve_folder(arg: Option<PathBuf>) -> anyhow::Result<Option<PathBuf>> {
    let raw = match arg {
        Some(path) => return Ok(Some(expand(&path.to_string_lossy()))),
        None => super::handle_interrupt(
            Input::<String>::with_theme(&captag_theme())
                .with_prompt("Folder of images")
                .allow_empty(true)
                .interact_text(),
        )?,
    };

    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|s| expand(&s)))
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// "Found 3 images (1.2 MB)" for the discovered batch.
fn found_line(files: &[ImageFile]) -> String {
    let noun = if files.len() == 1 { "image" } else { "images" };
    let mb = FileDiscovery::total_size(files) as f64 / (1024.0 * 1024.0);
    format!("Found {} {noun} ({mb:.1} MB)", files.len())
}

/// Create a progress bar for the run.
fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .expect("valid progress bar template")
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}
