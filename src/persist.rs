use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::USER_AGENT;
use crate::record::{Record, IMAGE_REFERENCE, TITLE};

const DOCUMENT_NAME: &str = "data.json";
const ASSET_EXT: &str = "jpg";

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let bytes = self
            .client
            .get(uri)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

/// What happened to each of the two independent writes.
#[derive(Debug)]
pub struct PersistReport {
    pub directory: PathBuf,
    pub document: Result<PathBuf, String>,
    pub asset: Result<PathBuf, String>,
}

impl PersistReport {
    pub fn document_ok(&self) -> bool {
        self.document.is_ok()
    }

    pub fn asset_ok(&self) -> bool {
        self.asset.is_ok()
    }
}

/// Writes accepted records as `<root>/<TITLE>/data.json` plus
/// `<root>/<TITLE>/<TITLE>.jpg`.
///
/// The document and the asset are written independently. Either can fail
/// without affecting the other and nothing is rolled back, so a title
/// directory may end up holding only one of the two.
pub struct Persister {
    root: PathBuf,
    fetcher: Arc<dyn AssetFetcher>,
}

impl Persister {
    pub fn new(root: impl Into<PathBuf>, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self {
            root: root.into(),
            fetcher,
        }
    }

    pub async fn persist(&self, record: &Record) -> PersistReport {
        let Some(title) = record.text(TITLE) else {
            let reason = "record has no title".to_string();
            warn!("Not persisting: {}", reason);
            return PersistReport {
                directory: self.root.clone(),
                document: Err(reason.clone()),
                asset: Err(reason),
            };
        };
        let dir = self.root.join(title);

        let document = self.write_document(&dir, record).await.map_err(|e| {
            warn!("{}: document not saved: {:#}", title, e);
            format!("{:#}", e)
        });
        let asset = self.write_asset(&dir, title, record).await.map_err(|e| {
            warn!("{}: image not saved: {:#}", title, e);
            format!("{:#}", e)
        });

        if document.is_ok() && asset.is_ok() {
            info!("{} scraped successfully", title);
        }

        PersistReport {
            directory: dir,
            document,
            asset,
        }
    }

    async fn write_document(&self, dir: &Path, record: &Record) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(DOCUMENT_NAME);
        let json = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    async fn write_asset(&self, dir: &Path, title: &str, record: &Record) -> Result<PathBuf> {
        let uri = record
            .text(IMAGE_REFERENCE)
            .ok_or_else(|| anyhow!("no image reference"))?;
        let bytes = self
            .fetcher
            .fetch(uri)
            .await
            .with_context(|| format!("fetching {}", uri))?;
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(format!("{}.{}", title, ASSET_EXT));
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
pub mod stub {
    use std::collections::HashMap;

    use super::*;

    /// Serves fixed bytes per URI; anything else is a 404.
    #[derive(Default)]
    pub struct StubFetcher {
        pub assets: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl AssetFetcher for StubFetcher {
        async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
            self.assets
                .get(uri)
                .cloned()
                .ok_or_else(|| anyhow!("HTTP status client error (404 Not Found) for url ({})", uri))
        }
    }

    /// Every fetch succeeds with a one-byte body.
    pub struct AnyFetcher;

    #[async_trait]
    impl AssetFetcher for AnyFetcher {
        async fn fetch(&self, _uri: &str) -> Result<Vec<u8>> {
            Ok(vec![0xFF])
        }
    }
}
