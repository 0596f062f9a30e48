use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Timeouts;
use crate::profile::ListingProfile;
use crate::session::{PageSession, SessionError};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("listing page unreachable: {0}")]
    Unreachable(#[source] SessionError),
    #[error("load-more control {selector} did not appear within {waited:?} (expansion {step})")]
    Timeout {
        selector: String,
        waited: Duration,
        step: usize,
    },
    #[error("expansion {step} failed: {source}")]
    Expand {
        step: usize,
        #[source]
        source: SessionError,
    },
    #[error("reading tiles failed: {0}")]
    Tiles(#[source] SessionError),
}

/// Expand the listing `page_count` times and collect every tile's target.
///
/// Duplicates are kept: a tile that shows up twice is visited twice.
pub async fn discover(
    session: &mut dyn PageSession,
    listing: &ListingProfile,
    page_count: usize,
    timeouts: &Timeouts,
) -> Result<Vec<String>, DiscoveryError> {
    info!("Opening listing {}", listing.url);
    session
        .navigate(&listing.url)
        .await
        .map_err(DiscoveryError::Unreachable)?;

    accept_consent(session, &listing.consent, timeouts.consent).await;

    for step in 1..=page_count {
        let button = session
            .wait_until_present(&listing.load_more, timeouts.element)
            .await
            .map_err(|e| match e {
                SessionError::Timeout { selector, waited } => DiscoveryError::Timeout {
                    selector,
                    waited,
                    step,
                },
                other => DiscoveryError::Expand { step, source: other },
            })?;
        match session.click(&button).await {
            Ok(()) => {}
            // a button with no link target: load the next page by its query
            Err(SessionError::Unsupported(_)) => {
                let next = page_url(&listing.url, &listing.page_param, step + 1)
                    .map_err(|source| DiscoveryError::Expand { step, source })?;
                debug!("load-more has no target, opening {}", next);
                session
                    .navigate(&next)
                    .await
                    .map_err(|source| DiscoveryError::Expand { step, source })?;
            }
            Err(source) => return Err(DiscoveryError::Expand { step, source }),
        }
    }
    info!("{} pages loaded", page_count + 1);

    let base = session.current_url().cloned();
    let tiles = session
        .find_all(&listing.tile)
        .await
        .map_err(DiscoveryError::Tiles)?;

    let mut urls = Vec::with_capacity(tiles.len());
    for tile in tiles {
        let Some(href) = tile.attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
            debug!("tile {} has no target", tile.index);
            continue;
        };
        let resolved = match &base {
            Some(b) => b.join(href),
            None => url::Url::parse(href),
        };
        match resolved {
            Ok(u) => urls.push(u.to_string()),
            Err(e) => debug!("tile {} target {:?} unusable: {}", tile.index, href, e),
        }
    }

    info!("Discovered {} urls", urls.len());
    Ok(urls)
}

/// `base` with `param` set to `page`, replacing any earlier value.
fn page_url(base: &str, param: &str, page: usize) -> Result<String, SessionError> {
    let mut url = url::Url::parse(base).map_err(|e| SessionError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(param, &page.to_string());
    Ok(url.to_string())
}

/// Best effort: click the consent banner if it shows up in time.
async fn accept_consent(session: &mut dyn PageSession, selector: &str, timeout: Duration) {
    match session.wait_until_present(selector, timeout).await {
        Ok(node) => {
            if let Err(e) = session.click(&node).await {
                debug!("consent click ignored: {}", e);
            }
        }
        Err(e) => debug!("no consent banner: {}", e),
    }
}
