//! Batch processing command for multiple token files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use billx_core::{BillExtractor, DocumentResult, load_token_document};

use super::config::load_config;
use super::process::{OutputFormat, format_csv, format_json, format_text};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Wrap JSON output in the API response envelope
    #[arg(long)]
    envelope: bool,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of files processed concurrently
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileOutcome {
    path: PathBuf,
    result: Option<DocumentResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let extractor = Arc::new(BillExtractor::new(&config));
    let jobs = args.jobs.max(1);

    let mut outcomes = Vec::with_capacity(files.len());
    let mut pending = stream::iter(files.into_iter().map(|path| {
        let extractor = Arc::clone(&extractor);
        tokio::task::spawn_blocking(move || process_single_file(path, &extractor))
    }))
    .buffered(jobs);

    while let Some(joined) = pending.next().await {
        let outcome = joined?;
        progress.inc(1);

        if let Some(message) = &outcome.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", outcome.path.display(), message);
            } else {
                error!("Failed to process {}: {}", outcome.path.display(), message);
                progress.abandon();
                anyhow::bail!("Processing failed: {}", message);
            }
        }

        outcomes.push(outcome);
    }

    progress.finish_with_message("Complete");

    let successful: Vec<_> = outcomes.iter().filter(|o| o.result.is_some()).collect();
    let failed: Vec<_> = outcomes.iter().filter(|o| o.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for outcome in &successful {
            if let Some(result) = &outcome.result {
                let output_path = output_path_for(output_dir, &outcome.path, args.format);
                let content = match args.format {
                    OutputFormat::Json => format_json(result, args.envelope, false)?,
                    OutputFormat::Csv => format_csv(result)?,
                    OutputFormat::Text => format_text(result, None),
                };

                fs::write(&output_path, content)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    for outcome in &successful {
        if let Some(result) = &outcome.result {
            println!(
                "  {}: {} items, Rs.{:.2}",
                display_name(&outcome.path),
                result.total_item_count,
                result.reconciled_amount
            );
        }
    }

    println!();
    println!(
        "{} Processed {} files in {:?} (finished {})",
        style("✓").green(),
        outcomes.len(),
        start.elapsed(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            println!(
                "  - {}: {}",
                outcome.path.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(path: PathBuf, extractor: &BillExtractor) -> FileOutcome {
    let file_start = Instant::now();

    let (result, error) = match load_token_document(&path) {
        Ok(pages) => (Some(extractor.extract_document(&pages)), None),
        Err(e) => (None, Some(e.to_string())),
    };

    FileOutcome {
        path,
        result,
        error,
        processing_time_ms: file_start.elapsed().as_millis() as u64,
    }
}

fn output_path_for(output_dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bill");

    output_dir.join(format!("{}_output.{}", stem, format.extension()))
}

fn display_name(path: &Path) -> &str {
    path.file_name().and_then(|s| s.to_str()).unwrap_or("")
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "pages",
        "total_item_count",
        "reconciled_amount",
        "processing_time_ms",
        "error",
    ])?;

    for outcome in outcomes {
        let filename = display_name(&outcome.path);

        if let Some(result) = &outcome.result {
            wtr.write_record([
                filename,
                "success",
                &result.pagewise_line_items.len().to_string(),
                &result.total_item_count.to_string(),
                &format!("{:.2}", result.reconciled_amount),
                &outcome.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                &outcome.processing_time_ms.to_string(),
                outcome.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
