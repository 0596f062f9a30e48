use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::config::{Config, Timeouts};
use crate::discovery::{self, DiscoveryError};
use crate::extract::Extractor;
use crate::gate;
use crate::persist::{AssetFetcher, PersistReport, Persister};
use crate::profile::{ListingProfile, SiteProfile};
use crate::record::Record;
use crate::session::{PageSession, SessionFactory};

/// A record that passed the gate, with what the persister made of it.
pub struct Accepted {
    pub url: String,
    pub record: Record,
    pub report: PersistReport,
}

enum Outcome {
    Persisted(Box<Accepted>),
    Discarded,
}

/// Totals for one run.
#[derive(Default)]
pub struct RunSummary {
    pub attempted: usize,
    pub persisted: usize,
    pub discarded: usize,
    pub records: Vec<Accepted>,
}

impl RunSummary {
    /// Persisted as a percentage of attempted; 0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.persisted as f64 / self.attempted as f64 * 100.0
        }
    }

    /// Whole percent, truncated.
    pub fn success_percent(&self) -> u64 {
        self.success_rate().floor() as u64
    }

    pub fn print(&self) {
        println!("{} urls scraped", self.attempted);
        println!("{} items saved", self.persisted);
        println!("{} results omitted", self.discarded);
        println!("{}% scrape success rate", self.success_percent());
    }
}

/// Discovery, then one task per URL on a fixed-size pool.
pub struct Orchestrator {
    sessions: Arc<dyn SessionFactory>,
    extractor: Arc<Extractor>,
    persister: Arc<Persister>,
    listing: ListingProfile,
    pages: usize,
    workers: usize,
    timeouts: Timeouts,
}

impl Orchestrator {
    pub fn new(
        config: &Config,
        sessions: Arc<dyn SessionFactory>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Self {
        let profile = SiteProfile::for_layout(config.layout);
        Self {
            sessions,
            extractor: Arc::new(Extractor::new(profile.detail, config.timeouts)),
            persister: Arc::new(Persister::new(&config.output_dir, fetcher)),
            listing: profile.listing,
            pages: config.pages,
            workers: config.workers.max(1),
            timeouts: config.timeouts,
        }
    }

    pub async fn run(&self) -> Result<RunSummary, DiscoveryError> {
        let urls = self.discover().await?;
        Ok(self.run_urls(urls).await)
    }

    /// One discovery pass on its own session.
    pub async fn discover(&self) -> Result<Vec<String>, DiscoveryError> {
        let mut session = self
            .sessions
            .open()
            .await
            .map_err(DiscoveryError::Unreachable)?;
        let result =
            discovery::discover(session.as_mut(), &self.listing, self.pages, &self.timeouts).await;
        if let Err(e) = session.close().await {
            debug!("closing discovery session: {}", e);
        }
        result
    }

    /// Scrape every URL and block until all of them are done.
    pub async fn run_urls(&self, urls: Vec<String>) -> RunSummary {
        let attempted = urls.len();
        info!("Scraping {} urls with {} workers", attempted, self.workers);

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let (tx, mut rx) = mpsc::channel::<Outcome>(self.workers * 2);

        for url in urls {
            let sessions = Arc::clone(&self.sessions);
            let extractor = Arc::clone(&self.extractor);
            let persister = Arc::clone(&self.persister);
            let sem = Arc::clone(&semaphore);
            let tx = tx.clone();

            tokio::spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return;
                };
                let outcome = scrape_one(sessions.as_ref(), &extractor, &persister, url).await;
                let _ = tx.send(outcome).await;
            });
        }

        // rx closes once every task has dropped its sender
        drop(tx);

        let pb = progress_bar(attempted);
        let mut records = Vec::new();
        while let Some(outcome) = rx.recv().await {
            if let Outcome::Persisted(accepted) = outcome {
                records.push(*accepted);
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        let persisted = records.len();
        let discarded = attempted - persisted;
        info!(
            "Scraped {} urls ({} saved, {} omitted)",
            attempted, persisted, discarded
        );

        RunSummary {
            attempted,
            persisted,
            discarded,
            records,
        }
    }
}

/// One URL end to end. The session is closed on every path. An accepted
/// record only counts as saved once its document is on disk; a missing
/// poster alone does not undo that.
async fn scrape_one(
    sessions: &dyn SessionFactory,
    extractor: &Extractor,
    persister: &Persister,
    url: String,
) -> Outcome {
    let mut session = match sessions.open().await {
        Ok(s) => s,
        Err(e) => {
            warn!("{}: no session: {}", url, e);
            return Outcome::Discarded;
        }
    };

    let record = visit(session.as_mut(), extractor, &url).await;
    if let Err(e) = session.close().await {
        debug!("{}: closing session: {}", url, e);
    }

    match gate::validate(record) {
        Ok(record) => {
            let report = persister.persist(&record).await;
            if !report.document_ok() {
                warn!("{}: nothing saved, result omitted", record.title());
                return Outcome::Discarded;
            }
            Outcome::Persisted(Box::new(Accepted {
                url,
                record,
                report,
            }))
        }
        Err(_) => Outcome::Discarded,
    }
}

/// A failed navigation still goes through extraction; every lookup then
/// misses and the gate drops the record.
async fn visit(session: &mut dyn PageSession, extractor: &Extractor, url: &str) -> Record {
    if let Err(e) = session.navigate(url).await {
        warn!("{}: {}", url, e);
    }
    extractor.extract(session).await
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
