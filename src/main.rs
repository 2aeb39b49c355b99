use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use judgment_harvest::error::ExtractionFailure;
use judgment_harvest::parser::citation::Citation;
use judgment_harvest::parser::record::JudgmentRecord;
use judgment_harvest::parser::DocumentParser;
use judgment_harvest::settings::Settings;
use judgment_harvest::util::now_taipei;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "judgment_harvest", about = "Judgment record extraction from saved detail pages")]
struct Cli {
    /// Settings file (TOML); JUDGMENT_* environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse saved detail-page HTML files into JSON records, one per line
    Extract {
        files: Vec<PathBuf>,
        /// Source URL to record (default: the file path)
        #[arg(short, long)]
        url: Option<String>,
        /// Print the flat key/citation row instead of the full record
        #[arg(long)]
        rows: bool,
    },
    /// Split a plain-text judgment body into sections
    Sections { file: PathBuf },
    /// Parse a citation string
    Citation { text: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { files, url, rows } => {
            if files.is_empty() {
                println!("No files given.");
                return Ok(());
            }
            let parser = DocumentParser::new(&settings)?;
            let counts = extract_files(&parser, &files, url.as_deref(), rows)?;
            info!(ok = counts.ok, failed = counts.failed, "extraction finished");
            eprintln!("Extracted {} records ({} failed).", counts.ok, counts.failed);
        }
        Commands::Sections { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let parser = DocumentParser::new(&settings)?;
            let sections = parser.sections().decompose(&text);
            println!("{}", serde_json::to_string_pretty(&sections)?);
        }
        Commands::Citation { text } => {
            let citation = Citation::parse(&text);
            if citation.is_empty() {
                warn!(text = %text, "citation did not parse");
            }
            println!("{}", serde_json::to_string_pretty(&citation)?);
            println!("key: {}", citation.key());
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

struct ExtractCounts {
    ok: usize,
    failed: usize,
}

fn extract_files(
    parser: &DocumentParser,
    files: &[PathBuf],
    url: Option<&str>,
    rows: bool,
) -> anyhow::Result<ExtractCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let fetched_at = now_taipei();
    let mut counts = ExtractCounts { ok: 0, failed: 0 };

    for chunk in files.chunks(200) {
        let results: Vec<Result<JudgmentRecord, ExtractionFailure>> = chunk
            .par_iter()
            .map(|path| {
                let source = url.map(str::to_string).unwrap_or_else(|| path.display().to_string());
                parser.process_file(path, &source, &fetched_at)
            })
            .collect();

        for result in results {
            match result {
                Ok(record) => {
                    let line = if rows {
                        serde_json::to_string(&record.db_row())?
                    } else {
                        serde_json::to_string(&record)?
                    };
                    pb.suspend(|| println!("{}", line));
                    counts.ok += 1;
                }
                Err(failure) => {
                    pb.suspend(|| warn!(url = %failure.url, reason = %failure.reason, "{}", failure.detail));
                    counts.failed += 1;
                }
            }
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
