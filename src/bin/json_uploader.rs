//! Bulk-loads a JSON file of `{title, content}` chunks into the vector index.
//!
//! ```text
//! json_uploader --input cv_chunks.json
//! ```
//!
//! Each chunk becomes one record with `source = title`. Failed chunks are
//! logged and summarised; the exit code is 1 if any chunk failed.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use ai_llm_service::config::EnvReader;
use ai_llm_service::telemetry;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rag_engine::{AppConfig, BatchItem, CallContext, Pipeline, Progress};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "json_uploader",
    about = "Ingest a JSON array of {title, content} chunks into the vector index"
)]
struct Args {
    /// JSON file to upload; relative paths resolve against the current directory.
    #[arg(short, long)]
    input: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Chunk {
    title: String,
    content: String,
}

struct BarProgress {
    pb: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}/{len:3} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Self { pb }
    }
}

impl Progress for BarProgress {
    fn set_total(&self, n: u64) {
        self.pb.set_length(n);
    }

    fn step(&self, label: &str, ok: bool) {
        self.pb.inc(1);
        self.pb
            .set_message(format!("{} {label}", if ok { "ok" } else { "FAILED" }));
    }

    fn finish(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("warn", Level::WARN))
        .with(telemetry::layer())
        .init();

    let args = Args::parse();
    let raw = tokio::fs::read_to_string(&args.input)
        .await
        .map_err(|e| format!("cannot read {}: {e}", args.input.display()))?;
    let chunks: Vec<Chunk> = serde_json::from_str(&raw)
        .map_err(|e| format!("{} is not a JSON array of {{title, content}}: {e}", args.input.display()))?;
    info!(input = %args.input.display(), chunks = chunks.len(), "chunks loaded");

    let cfg = AppConfig::from_env(&EnvReader::process())?;
    let pipeline = Pipeline::from_config(&cfg)?;

    let token = CancellationToken::new();
    let on_ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, remaining chunks will be skipped");
            on_ctrl_c.cancel();
        }
    });

    let items: Vec<BatchItem> = chunks
        .into_iter()
        .map(|c| BatchItem {
            text: c.content,
            source: c.title,
        })
        .collect();

    let report = pipeline
        .ingestor
        .ingest_batch_with(&CallContext::new(token), &items, &BarProgress::new())
        .await;

    for f in &report.failed {
        warn!(position = f.position, title = %f.label, code = f.code, error = %f.error, "chunk failed");
    }
    info!(
        total = report.total,
        ingested = report.ingested.len(),
        failed = report.failed.len(),
        "upload finished"
    );
    println!(
        "{} of {} chunks uploaded, {} failed",
        report.ingested.len(),
        report.total,
        report.failed.len()
    );

    Ok(if report.failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
