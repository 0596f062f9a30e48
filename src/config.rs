use std::path::PathBuf;
use std::time::Duration;

use crate::profile::Layout;

/// Size of the worker pool. Static: never derived from the URL count.
pub const WORKERS: usize = 4;
pub const DEFAULT_PAGES: usize = 4;
pub const DEFAULT_OUTPUT_DIR: &str = "raw_data";

const ELEMENT_WAIT: Duration = Duration::from_secs(10);
const CONSENT_WAIT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub const USER_AGENT: &str = concat!("rt_scraper/", env!("CARGO_PKG_VERSION"));

/// Independent bounds for every wait the pipeline performs.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Consent interstitial; expiry is a no-op.
    pub consent: Duration,
    /// "Load more" control and poster image.
    pub element: Duration,
    pub poll: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            consent: CONSENT_WAIT,
            element: ELEMENT_WAIT,
            poll: POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub pages: usize,
    pub workers: usize,
    pub output_dir: PathBuf,
    pub layout: Layout,
    pub timeouts: Timeouts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pages: DEFAULT_PAGES,
            workers: WORKERS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            layout: Layout::LabelScan,
            timeouts: Timeouts::default(),
        }
    }
}

impl Config {
    pub fn catalog_path(&self) -> PathBuf {
        self.output_dir.join("catalog.sqlite")
    }
}
