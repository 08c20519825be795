//! Process command - extract bill items from a single token file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info, warn};

use billx_core::extract::ExtractionTrace;
use billx_core::{
    BillExtractor, DocumentResult, ExtractionResponse, PageTokens, PageTotals, load_token_document,
};

use super::config::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Token file (JSON array of {page_no, tokens})
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Wrap JSON output in the API response envelope
    #[arg(long)]
    envelope: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Append keyword-tagged page totals to text output
    #[arg(long)]
    show_totals: bool,

    /// Report rejected rows and dropped duplicates on stderr
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one line item per record
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pages = load_token_document(&args.input)?;
    debug!("Loaded {} pages", pages.len());

    let extractor = BillExtractor::new(&config);

    let result = if args.trace {
        let (result, trace) = extractor.extract_document_traced(&pages);
        print_trace(&trace);
        result
    } else {
        extractor.extract_document(&pages)
    };

    let text_output = matches!(args.format, OutputFormat::Text);
    if args.show_totals && !text_output {
        warn!("--show-totals only applies to text output; ignoring it");
    }
    let totals = (args.show_totals && text_output).then(|| page_totals(&extractor, &pages));

    let output = match args.format {
        OutputFormat::Json => format_json(&result, args.envelope, args.pretty)?,
        OutputFormat::Csv => format_csv(&result)?,
        OutputFormat::Text => format_text(&result, totals.as_deref()),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Totals found on each page, keyed by page number.
pub fn page_totals(extractor: &BillExtractor, pages: &[PageTokens]) -> Vec<(String, PageTotals)> {
    pages
        .iter()
        .map(|page| (page.page_no.to_string(), extractor.extract_totals(&page.tokens)))
        .collect()
}

pub fn format_json(result: &DocumentResult, envelope: bool, pretty: bool) -> anyhow::Result<String> {
    let value = if envelope {
        serde_json::to_value(ExtractionResponse::success(result.clone()))?
    } else {
        serde_json::to_value(result)?
    };

    if pretty {
        Ok(serde_json::to_string_pretty(&value)?)
    } else {
        Ok(serde_json::to_string(&value)?)
    }
}

pub fn format_csv(result: &DocumentResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "page_no",
        "page_type",
        "item_name",
        "item_quantity",
        "item_rate",
        "item_amount",
    ])?;

    for page in &result.pagewise_line_items {
        for item in &page.bill_items {
            wtr.write_record([
                page.page_no.as_str(),
                page.page_type.as_str(),
                item.item_name.as_str(),
                &item.item_quantity.to_string(),
                &format!("{:.2}", item.item_rate),
                &format!("{:.2}", item.item_amount),
            ])?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn format_text(result: &DocumentResult, totals: Option<&[(String, PageTotals)]>) -> String {
    let mut output = String::new();

    for page in &result.pagewise_line_items {
        output.push_str(&format!("Page {} ({}):\n", page.page_no, page.page_type));
        output.push_str(&format!("  Items: {}\n", page.bill_items.len()));

        for (i, item) in page.bill_items.iter().enumerate() {
            output.push_str(&format!("    {}. {}\n", i + 1, item.item_name));
            output.push_str(&format!(
                "       Qty: {}, Rate: Rs.{:.2}, Amount: Rs.{:.2}\n",
                item.item_quantity, item.item_rate, item.item_amount
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!("Pages: {}\n", result.pagewise_line_items.len()));
    output.push_str(&format!("Total items: {}\n", result.total_item_count));
    output.push_str(&format!("Reconciled amount: Rs.{:.2}\n", result.reconciled_amount));

    if let Some(totals) = totals {
        output.push_str("\nPage totals (not used for reconciliation):\n");
        for (page_no, page_totals) in totals {
            output.push_str(&format!(
                "  Page {}: sub total {}, net amount {}, grand total {}\n",
                page_no,
                fmt_total(page_totals.sub_total),
                fmt_total(page_totals.net_amount),
                fmt_total(page_totals.grand_total),
            ));
        }
    }

    output
}

fn fmt_total(value: Option<f64>) -> String {
    value
        .map(|v| format!("Rs.{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn print_trace(trace: &ExtractionTrace) {
    for page in &trace.pages {
        eprintln!(
            "{} Page {}: {} rows, {} rejected, {} duplicates",
            style("ℹ").blue(),
            page.page_no,
            page.row_count,
            page.rejected_rows.len(),
            page.duplicates.len()
        );
        for rejected in &page.rejected_rows {
            eprintln!("  - {} [{}]", rejected.text, rejected.reason);
        }
        for item in &page.duplicates {
            eprintln!(
                "  = duplicate {} (Rs.{:.2})",
                item.item_name, item.item_amount
            );
        }
    }

    for item in &trace.document_duplicates {
        eprintln!(
            "{} Cross-page duplicate {} (Rs.{:.2})",
            style("ℹ").blue(),
            item.item_name,
            item.item_amount
        );
    }
}
