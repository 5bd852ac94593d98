//! Snapshot Service - Offline dump of the dashboard's chart tables
//!
//! Runs the same pipeline the API serves from, once per chart, and writes
//! the shaped tables to a JSON file. Useful as a smoke check against the
//! live statistics API and for inspecting exactly what a chart would
//! receive.
//!
//! Usage:
//!   # All charts, Estonian labels:
//!   cargo run --bin snapshot
//!
//!   # One chart in English to a chosen file:
//!   cargo run --bin snapshot -- --chart sectors --lang en --out ./sectors.json

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use tokio::fs;

use pipeline::client::{StatClient, DEFAULT_BASE_URL};
use pipeline::Lang;

#[derive(Parser, Debug)]
#[command(name = "snapshot", about = "Dumps shaped chart tables to a JSON file")]
struct Args {
    /// Charts to fetch (default: all)
    #[arg(long, value_enum)]
    chart: Vec<Chart>,

    /// Language for labels and upstream locale
    #[arg(long, default_value = "et")]
    lang: String,

    /// Output file
    #[arg(long, default_value = "./data/snapshot.json")]
    out: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Chart {
    /// Salary time series, all indicators (PA103)
    Salary,
    /// Latest-year ranked sector comparison (PA103)
    Sectors,
    /// Short-term salary series (PA117)
    Short,
}

impl Chart {
    fn key(self) -> &'static str {
        match self {
            Chart::Salary => "salary",
            Chart::Sectors => "sectors",
            Chart::Short => "short",
        }
    }
}

async fn fetch_chart(client: &StatClient, chart: Chart, lang: Lang) -> Result<serde_json::Value> {
    let value = match chart {
        Chart::Salary => {
            let table = client.salary_series(None, None, None, lang).await?;
            serde_json::to_value(table)?
        }
        Chart::Sectors => {
            let table = client.sector_comparison(lang).await?;
            serde_json::to_value(table)?
        }
        Chart::Short => {
            let table = client.short_term_series(None, lang).await?;
            serde_json::to_value(table)?
        }
    };
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let lang = Lang::parse(&args.lang)
        .with_context(|| format!("Unsupported language '{}' (expected et or en)", args.lang))?;
    let base_url =
        std::env::var("STAT_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let timeout_secs: u64 = std::env::var("HTTP_TIMEOUT_SECS")
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .unwrap_or(30);

    println!("=== Stats Dashboard Snapshot ===");
    println!("Upstream: {}", base_url);
    println!("Language: {}", lang.as_str());

    let client = StatClient::new(base_url, Duration::from_secs(timeout_secs))
        .context("Failed to build upstream HTTP client")?;

    let charts = if args.chart.is_empty() {
        vec![Chart::Salary, Chart::Sectors, Chart::Short]
    } else {
        args.chart.clone()
    };

    let mut tables = serde_json::Map::new();
    let mut fetched = 0;
    let mut failed = 0;

    for chart in charts {
        println!("\n[{}] Fetching...", chart.key());
        match fetch_chart(&client, chart, lang).await {
            Ok(value) => {
                println!("  ✓ Fetched");
                tables.insert(chart.key().to_string(), value);
                fetched += 1;
            }
            Err(e) => {
                // one failed chart must not take the others down
                eprintln!("  ✗ Failed: {:#}", e);
                failed += 1;
            }
        }
    }

    if fetched == 0 {
        anyhow::bail!("Every chart failed; nothing to write");
    }

    let snapshot = serde_json::json!({
        "generated_at": Utc::now(),
        "lang": lang.as_str(),
        "charts": tables,
    });

    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(&args.out, serde_json::to_vec_pretty(&snapshot)?)
        .await
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    println!("\n=== Snapshot Summary ===");
    println!("Fetched: {}", fetched);
    println!("Failed: {}", failed);
    println!("Written to: {}", args.out.display());

    Ok(())
}
