//! Headless batch mode.
//!
//! Usage:
//!   score-sheet-tally --api-key KEY photos/
//!   score-sheet-tally --top-n 10 --output grades.xlsx IMG_0001.jpg IMG_0002.jpg

use anyhow::{anyhow, bail, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::batch::{run_batch, BatchEvent, BatchOutcome, BatchSettings};
use crate::config::AppConfig;
use crate::extract::{collect_sheet_images, GeminiClient};
use crate::report::{write_report, ScoreSummary};

/// Score sheet tally - reads photographed score sheets and exports final grades
#[derive(Parser, Debug, Default)]
#[command(name = "score-sheet-tally")]
#[command(about = "Reads photographed score sheets with Gemini and exports final grades to Excel")]
pub struct Args {
    /// Sheet photos (JPEG/PNG) or folders of photos; opens the window when omitted
    pub inputs: Vec<PathBuf>,

    /// Gemini API key (overrides config.json)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Number of highest scores averaged per student
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Gemini model name
    #[arg(long)]
    pub model: Option<String>,

    /// Workbook path (defaults to the configured output folder)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Worksheet name
    #[arg(long)]
    pub sheet_name: Option<String>,
}

/// Applies command line overrides on top of the loaded config.
pub fn apply_overrides(args: &Args, config: &AppConfig) -> Result<AppConfig> {
    let mut merged = config.clone();

    if let Some(key) = &args.api_key {
        merged.api_key = Some(key.clone());
    }
    if let Some(top_n) = args.top_n {
        if top_n == 0 {
            bail!("--top-n must be at least 1");
        }
        merged.top_n = top_n;
    }
    if let Some(model) = &args.model {
        merged.model = model.clone();
    }
    if let Some(sheet_name) = &args.sheet_name {
        merged.sheet_name = sheet_name.clone();
    }
    if let Some(output) = &args.output {
        merged.output_dir = output.parent().map(|p| p.to_path_buf());
        if let Some(name) = output.file_name() {
            merged.output_file_name = name.to_string_lossy().to_string();
        }
    }

    Ok(merged)
}

/// Formats the result table printed after a batch.
pub fn format_outcome(outcome: &BatchOutcome) -> String {
    let mut out = String::new();

    for failure in &outcome.failures {
        out.push_str(&format!(
            "Error processing {}: {}\n",
            failure.file_name, failure.message
        ));
    }

    out.push_str("seat\tscore\tfile\tscores\n");
    for record in &outcome.records {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            record.seat_number, record.final_score, record.source, record.raw_scores
        ));
    }

    let summary = ScoreSummary::from_records(&outcome.records);
    out.push_str(&format!(
        "{} scored, {} failed | mean {:.2}, median {:.1}, min {}, max {}, std dev {:.2}\n",
        summary.count,
        outcome.failures.len(),
        summary.mean,
        summary.median,
        summary.min,
        summary.max,
        summary.std_dev
    ));

    out
}

/// Runs a batch from the command line and writes the report.
pub fn run(args: &Args, config: &AppConfig) -> Result<()> {
    let config = apply_overrides(args, config)?;

    let api_key = config
        .api_key()
        .ok_or_else(|| anyhow!("No API key: pass --api-key or set api_key in config.json"))?
        .to_string();

    let files = collect_sheet_images(&args.inputs)?;
    if files.is_empty() {
        bail!("No JPEG/PNG sheet photos found in the given inputs");
    }

    let client = GeminiClient::from_config(&config, &api_key)?;
    let settings = BatchSettings {
        top_n: config.top_n,
        max_image_dimension: config.max_image_dimension,
    };

    let outcome = run_batch(&files, &client, &settings, |event| {
        if let BatchEvent::Failed { failure, .. } = event {
            eprintln!("Error processing {}: {}", failure.file_name, failure.message);
        }
    });

    print!("{}", format_outcome(&outcome));

    if outcome.records.is_empty() {
        crate::log("No sheets were scored; nothing to export");
        return Ok(());
    }

    let (workbook_path, summary_path) =
        write_report(&outcome.records, &config.output_path(), &config.sheet_name)?;
    println!("Workbook: {}", workbook_path.display());
    println!("Summary: {}", summary_path.display());

    Ok(())
}
