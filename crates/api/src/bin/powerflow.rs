//! Command-line front end for the screening and ingestion pipeline.
//!
//! Every command prints JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use api::{AppConfig, Pipeline};
use api::pipeline::{MANUAL_REASONING, MANUAL_SCORE};
use brief::{DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS};
use clap::{Args, Parser, Subcommand};
use extract::ScreeningResult;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "powerflow")]
#[command(about = "Screen, ingest, score and summarise intelligence sources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a PDF for relevance. Nothing is written.
    Screen { pdf: PathBuf },

    /// Extract a source and write it to the databases
    Ingest(IngestArgs),

    /// Re-score actors by page id
    Score {
        #[arg(required = true)]
        actor_ids: Vec<String>,
    },

    /// Generate the weekly brief
    Brief {
        #[arg(
            long,
            default_value_t = DEFAULT_LOOKBACK_DAYS,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_LOOKBACK_DAYS))
        )]
        days: u32,
        #[arg(long)]
        priority: Option<String>,
        /// Save the brief to the briefs database
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args)]
struct IngestArgs {
    #[arg(
        long,
        conflicts_with_all = ["text", "pdf", "file"],
        required_unless_present_any = ["text", "pdf", "file"]
    )]
    url: Option<String>,
    #[arg(long, conflicts_with_all = ["pdf", "file"])]
    text: Option<String>,
    /// PDF to screen before extraction
    #[arg(long, conflicts_with = "file")]
    pdf: Option<PathBuf>,
    /// Plain text or markdown notes, ingested without screening
    #[arg(long)]
    file: Option<PathBuf>,
    /// Write the extraction. Without this flag only the preview is printed.
    #[arg(long)]
    yes: bool,
}

#[derive(Serialize)]
struct Preview<'a> {
    written: bool,
    screening: &'a ScreeningResult,
    extraction: &'a extract::ExtractionResult,
    warnings: &'a [extract::CoercionWarning],
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn read_pdf(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

async fn ingest(pipeline: &Pipeline, args: IngestArgs) -> Result<()> {
    let (text, url, screening) = if let Some(path) = &args.pdf {
        let bytes = read_pdf(path).await?;
        let screened = pipeline
            .screen_pdf(&bytes, &path.display().to_string())
            .await?;
        (screened.document.text, None, screened.result)
    } else if let Some(url) = &args.url {
        let text = pipeline.fetch_article(url).await?;
        (
            text,
            Some(url.as_str()),
            ScreeningResult::manual(MANUAL_SCORE, MANUAL_REASONING),
        )
    } else if let Some(path) = &args.file {
        let document = ingest::read_document(path).await?;
        (
            document.text,
            None,
            ScreeningResult::manual(MANUAL_SCORE, MANUAL_REASONING),
        )
    } else {
        let text = args.text.clone().unwrap_or_default();
        (
            text,
            None,
            ScreeningResult::manual(MANUAL_SCORE, MANUAL_REASONING),
        )
    };

    let extraction = pipeline.preview(&text).await?;
    if !args.yes {
        return print_json(&Preview {
            written: false,
            screening: &screening,
            extraction: &extraction.result,
            warnings: &extraction.warnings,
        });
    }

    let report = pipeline.persist(extraction, url, &screening).await?;
    print_json(&report)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let pipeline = Pipeline::from_config(&config)?;

    match cli.command {
        Commands::Screen { pdf } => {
            let bytes = read_pdf(&pdf).await?;
            let screened = pipeline.screen_pdf(&bytes, &pdf.display().to_string()).await?;
            print_json(&serde_json::json!({
                "document_id": screened.document.doc_id,
                "result": screened.result,
            }))
        }
        Commands::Ingest(args) => ingest(&pipeline, args).await,
        Commands::Score { actor_ids } => {
            let outcomes = pipeline.score(&actor_ids).await;
            print_json(&outcomes)
        }
        Commands::Brief {
            days,
            priority,
            save,
        } => {
            let report = pipeline
                .brief(days, priority.as_deref().unwrap_or_default(), save)
                .await?;
            print_json(&report)
        }
    }
}
