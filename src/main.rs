mod config;
mod db;
mod discovery;
mod extract;
mod gate;
mod html;
mod orchestrator;
mod persist;
mod profile;
mod record;
mod session;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use config::{Config, DEFAULT_OUTPUT_DIR, DEFAULT_PAGES, WORKERS};
use orchestrator::{Accepted, Orchestrator};
use persist::HttpFetcher;
use profile::{Layout, SiteProfile};
use session::{HttpSessionFactory, SessionFactory};

#[derive(Parser)]
#[command(name = "rt_scraper", about = "Rotten Tomatoes TV series scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover series, scrape each one and persist the complete records
    Run {
        /// Times to press "load more" on the listing
        #[arg(short, long, default_value_t = DEFAULT_PAGES)]
        pages: usize,
        /// Output root (one directory per title)
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
        /// Detail page layout
        #[arg(short, long, value_enum, default_value_t = Layout::LabelScan)]
        layout: Layout,
        /// Parallel workers
        #[arg(short, long, default_value_t = WORKERS)]
        workers: usize,
    },
    /// Print the discovered URL set
    Discover {
        #[arg(short, long, default_value_t = DEFAULT_PAGES)]
        pages: usize,
    },
    /// Extract one detail page and print it; nothing is written
    Extract {
        url: String,
        #[arg(short, long, value_enum, default_value_t = Layout::LabelScan)]
        layout: Layout,
    },
    /// Show catalog statistics
    Stats {
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
    },
    /// Catalog table
    List {
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output: PathBuf,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            pages,
            output,
            layout,
            workers,
        } => {
            let config = Config {
                pages,
                workers,
                output_dir: output,
                layout,
                ..Config::default()
            };
            let orchestrator = build(&config)?;
            let summary = orchestrator.run().await?;
            summary.print();
            index_run(&config, &summary.records);
            Ok(())
        }
        Commands::Discover { pages } => {
            let config = Config {
                pages,
                ..Config::default()
            };
            let urls = build(&config)?.discover().await?;
            for url in &urls {
                println!("{}", url);
            }
            println!("\n{} urls", urls.len());
            Ok(())
        }
        Commands::Extract { url, layout } => extract_one(&url, layout).await,
        Commands::Stats { output } => {
            let config = Config {
                output_dir: output,
                ..Config::default()
            };
            let conn = db::connect(&config.catalog_path())?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Records:          {}", s.records);
            println!("Complete:         {}", s.complete);
            println!("Missing document: {}", s.missing_document);
            println!("Missing image:    {}", s.missing_asset);
            Ok(())
        }
        Commands::List { output, limit } => {
            let config = Config {
                output_dir: output,
                ..Config::default()
            };
            let conn = db::connect(&config.catalog_path())?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, limit)?;
            if rows.is_empty() {
                println!("No records found. Run 'run' first.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<32} | {:>5} | {:>5} | {:<28} | {:<5}",
                "#", "Title", "Score", "Aud.", "Captured", "Files"
            );
            println!("{}", "-".repeat(92));
            for (i, r) in rows.iter().enumerate() {
                let files = match (r.document_ok, r.asset_ok) {
                    (true, true) => "both",
                    (true, false) => "json",
                    (false, true) => "jpg",
                    (false, false) => "-",
                };
                println!(
                    "{:>3} | {:<32} | {:>5} | {:>5} | {:<28} | {:<5}",
                    i + 1,
                    truncate(&r.title, 32),
                    r.primary_score,
                    r.secondary_score,
                    r.captured_at,
                    files
                );
            }
            println!("\n{} records", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn build(config: &Config) -> anyhow::Result<Orchestrator> {
    let sessions = HttpSessionFactory::new(&config.timeouts)?;
    let fetcher = HttpFetcher::new()?;
    Ok(Orchestrator::new(
        config,
        Arc::new(sessions),
        Arc::new(fetcher),
    ))
}

/// Record the run in the catalog. Failure is logged; the scraped files are
/// already on disk and the run still counts.
fn index_run(config: &Config, records: &[Accepted]) -> Option<usize> {
    let path = config.catalog_path();
    let indexed = db::connect(&path).and_then(|conn| {
        db::init_schema(&conn)?;
        db::save_records(&conn, records)
    });
    match indexed {
        Ok(n) => {
            info!("Indexed {} records in {}", n, path.display());
            Some(n)
        }
        Err(e) => {
            warn!("catalog {} not updated: {:#}", path.display(), e);
            None
        }
    }
}

async fn extract_one(url: &str, layout: Layout) -> anyhow::Result<()> {
    let config = Config {
        layout,
        ..Config::default()
    };
    let sessions = HttpSessionFactory::new(&config.timeouts)?;
    let mut session = sessions.open().await?;
    if let Err(e) = session.navigate(url).await {
        session.close().await?;
        return Err(e).with_context(|| format!("loading {}", url));
    }
    let extractor = extract::Extractor::new(SiteProfile::for_layout(layout).detail, config.timeouts);
    let record = extractor.extract(session.as_mut()).await;
    session.close().await?;

    match gate::validate(record) {
        Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        Err(rejected) => println!("{}", rejected),
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
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
