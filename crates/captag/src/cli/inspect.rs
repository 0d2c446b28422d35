//! The `captag inspect` command: read back embedded metadata.

use captag_core::{Config, EmbeddedMetadata, MetadataEmbedder};
use clap::Args;
use console::Style;
use std::path::PathBuf;

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Image file to read
    pub file: PathBuf,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the inspect command.
pub fn execute(args: InspectArgs, config: &Config) -> anyhow::Result<()> {
    if !args.file.is_file() {
        anyhow::bail!("File not found: {}", args.file.display());
    }

    let embedder = MetadataEmbedder::new(config.metadata.clone());
    let meta = embedder.read(&args.file).unwrap_or_default();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        println!("{}", render(&meta));
        if !meta.is_complete() {
            let warn = Style::new().for_stderr().yellow();
            eprintln!("{}", warn.apply_to("No complete caption/keyword metadata found."));
        }
    }
    Ok(())
}

fn render(meta: &EmbeddedMetadata) -> String {
    let caption = meta.caption.as_deref().unwrap_or("-");
    let tags = meta.tags();
    let tags = if tags.is_empty() {
        "-".to_string()
    } else {
        tags.join(", ")
    };
    format!("Caption: {caption}\nTags:    {tags}")
}
