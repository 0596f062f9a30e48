//! Page-session boundary.
//!
//! Everything above this module talks to a [`PageSession`]: navigate, look
//! things up by CSS selector, click, wait. Lookups missing is the normal
//! case and is reported as `Ok(None)` rather than an error.
//!
//! [`HtmlSession`] implements the trait over static HTML. Pages come from a
//! [`PageSource`] (HTTP in production, a fixture map in tests) and are
//! queried with the `scraper` crate. Clicking follows the node's link.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::{Timeouts, USER_AGENT};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid selector {selector}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("no page loaded")]
    NoPage,
    #[error("{selector} not present after {waited:?}")]
    Timeout { selector: String, waited: Duration },
    #[error("cannot click {0}")]
    Unsupported(String),
}

/// Owned snapshot of one matched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub selector: String,
    /// Position among the matches of `selector`.
    pub index: usize,
    pub text: String,
    pub html: String,
    pub attrs: BTreeMap<String, String>,
}

impl Node {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

#[async_trait]
pub trait PageSession: Send + Sync {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    fn current_url(&self) -> Option<&Url>;

    async fn find(&self, selector: &str) -> Result<Option<Node>, SessionError>;

    async fn find_all(&self, selector: &str) -> Result<Vec<Node>, SessionError>;

    async fn click(&mut self, node: &Node) -> Result<(), SessionError>;

    async fn wait_until_present(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Node, SessionError>;

    async fn close(&mut self) -> Result<(), SessionError>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageSession>, SessionError>;
}

/// Where an [`HtmlSession`] gets its markup from.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn load(&self, url: &Url) -> Result<String, SessionError>;
}

struct LoadedPage {
    url: Url,
    html: String,
}

pub struct HtmlSession<S> {
    source: S,
    page: Option<LoadedPage>,
    poll: Duration,
}

impl<S: PageSource> HtmlSession<S> {
    pub fn new(source: S, poll: Duration) -> Self {
        Self {
            source,
            page: None,
            poll,
        }
    }

    fn loaded(&self) -> Result<&LoadedPage, SessionError> {
        self.page.as_ref().ok_or(SessionError::NoPage)
    }
}

#[async_trait]
impl<S: PageSource> PageSession for HtmlSession<S> {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let target = match self.page.as_ref() {
            Some(p) => p.url.join(url),
            None => Url::parse(url),
        }
        .map_err(|e| SessionError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let html = self.source.load(&target).await?;
        debug!("Loaded {} ({} bytes)", target, html.len());
        self.page = Some(LoadedPage { url: target, html });
        Ok(())
    }

    fn current_url(&self) -> Option<&Url> {
        self.page.as_ref().map(|p| &p.url)
    }

    async fn find(&self, selector: &str) -> Result<Option<Node>, SessionError> {
        let page = self.loaded()?;
        Ok(query(&page.html, selector)?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Node>, SessionError> {
        let page = self.loaded()?;
        query(&page.html, selector)
    }

    async fn click(&mut self, node: &Node) -> Result<(), SessionError> {
        match node.attr("href").filter(|h| !h.trim().is_empty()) {
            Some(href) => {
                let href = href.to_string();
                self.navigate(&href).await
            }
            None => Err(SessionError::Unsupported(format!(
                "{}[{}] has no link target",
                node.selector, node.index
            ))),
        }
    }

    async fn wait_until_present(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Node, SessionError> {
        let start = Instant::now();
        loop {
            if let Some(node) = self.find(selector).await? {
                return Ok(node);
            }
            let waited = start.elapsed();
            if waited >= timeout {
                return Err(SessionError::Timeout {
                    selector: selector.to_string(),
                    waited,
                });
            }
            tokio::time::sleep(self.poll.min(timeout - waited)).await;
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.page = None;
        Ok(())
    }
}

/// Run a CSS query against a document and snapshot the matches.
fn query(html: &str, selector: &str) -> Result<Vec<Node>, SessionError> {
    let sel = Selector::parse(selector).map_err(|e| SessionError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })?;
    let doc = Html::parse_document(html);
    let nodes = doc
        .select(&sel)
        .enumerate()
        .map(|(index, el)| Node {
            selector: selector.to_string(),
            index,
            text: el.text().collect::<String>(),
            html: el.inner_html(),
            attrs: el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
        .collect();
    Ok(nodes)
}

// ── HTTP ──

pub struct HttpSource {
    client: reqwest::Client,
}

#[async_trait]
impl PageSource for HttpSource {
    async fn load(&self, url: &Url) -> Result<String, SessionError> {
        let fail = |reason: String| SessionError::Navigation {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fail(e.to_string()))?;
        response.text().await.map_err(|e| fail(e.to_string()))
    }
}

/// Opens one independent HTTP-backed session per call.
pub struct HttpSessionFactory {
    client: reqwest::Client,
    poll: Duration,
}

impl HttpSessionFactory {
    pub fn new(timeouts: &Timeouts) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            poll: timeouts.poll,
        })
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageSession>, SessionError> {
        let source = HttpSource {
            client: self.client.clone(),
        };
        Ok(Box::new(HtmlSession::new(source, self.poll)))
    }
}

// ── Fixtures ──


#[cfg(test)]
mod tests {
    use super::fixture::{session, FixtureSource};
    use super::*;

    const PAGE: &str = r#"<html><body>
        <ul>
          <li class="item"><a href="/tv/one">One</a></li>
          <li class="item"><a href="https://other.example/tv/two">Two &amp; more</a></li>
        </ul>
        <button class="noop">Toggle</button>
    </body></html>"#;

    fn source() -> FixtureSource {
        FixtureSource::new([
            ("https://x.example/list".to_string(), PAGE.to_string()),
            ("https://x.example/tv/one".to_string(), "<h1>One</h1>".to_string()),
        ])
    }

    #[tokio::test]
    async fn find_before_navigate_is_an_error() {
        let s = session(source());
        assert!(matches!(s.find("a").await, Err(SessionError::NoPage)));
    }

    #[tokio::test]
    async fn find_and_find_all() {
        let mut s = session(source());
        s.navigate("https://x.example/list").await.unwrap();

        let links = s.find_all("li.item a").await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].attr("href"), Some("/tv/one"));
        assert_eq!(links[1].index, 1);
        assert_eq!(links[1].text, "Two & more");

        assert!(s.find("table").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_selector_is_reported() {
        let mut s = session(source());
        s.navigate("https://x.example/list").await.unwrap();
        assert!(matches!(
            s.find("li[[").await,
            Err(SessionError::InvalidSelector { .. })
        ));
    }

    #[tokio::test]
    async fn click_follows_relative_link() {
        let mut s = session(source());
        s.navigate("https://x.example/list").await.unwrap();
        let link = s.find("li.item a").await.unwrap().unwrap();
        s.click(&link).await.unwrap();
        assert_eq!(s.current_url().unwrap().as_str(), "https://x.example/tv/one");
        assert!(s.find("h1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn click_without_target_is_unsupported() {
        let mut s = session(source());
        s.navigate("https://x.example/list").await.unwrap();
        let button = s.find("button.noop").await.unwrap().unwrap();
        assert!(matches!(s.click(&button).await, Err(SessionError::Unsupported(_))));
    }

    #[tokio::test]
    async fn wait_times_out_when_absent() {
        let mut s = session(source());
        s.navigate("https://x.example/list").await.unwrap();
        let err = s
            .wait_until_present("img.poster", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Timeout { .. }));
        assert!(s
            .wait_until_present("button", Duration::from_millis(20))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn unknown_page_fails_navigation() {
        let mut s = session(source());
        let err = s.navigate("https://x.example/missing").await.unwrap_err();
        assert!(matches!(err, SessionError::Navigation { .. }));
    }
}
