use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::record::Lookup;
use crate::session::PageSession;

/// Wait for the poster, then read its source as an absolute URL.
pub async fn extract(
    session: &dyn PageSession,
    selector: &str,
    attrs: &[String],
    timeout: Duration,
) -> Lookup {
    let node = match session.wait_until_present(selector, timeout).await {
        Ok(node) => node,
        Err(e) => {
            debug!("poster: {}", e);
            return Lookup::Missing;
        }
    };
    let Some(src) = attrs
        .iter()
        .filter_map(|a| node.attr(a))
        .map(str::trim)
        .find(|v| !v.is_empty())
    else {
        return Lookup::Missing;
    };

    let resolved = match session.current_url() {
        Some(base) => base.join(src),
        None => Url::parse(src),
    };
    match resolved {
        Ok(url) => Lookup::Found(url.to_string()),
        Err(e) => {
            debug!("poster src {:?} unusable: {}", src, e);
            Lookup::Missing
        }
    }
}
