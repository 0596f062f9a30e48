use crate::html;
use crate::record::Lookup;
use crate::session::PageSession;

/// Expand the synopsis if the page offers a toggle, then read it as
/// cleaned text.
pub async fn extract(
    session: &mut dyn PageSession,
    show_more: Option<&str>,
    selector: &str,
) -> Lookup {
    if let Some(toggle) = show_more {
        super::fire_and_forget(session, toggle).await;
    }
    super::find(session, selector)
        .await
        .map(|n| Lookup::text(html::clean(&n.html)))
        .unwrap_or(Lookup::Missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fixture::{session, FixtureSource};

    const CLAMPED: &str = r#"<p class="synopsis">Short&hellip;</p>
        <a class="more" href="/tv/show?full=1">More</a>"#;
    const FULL: &str = r#"<p class="synopsis">The whole <em>story</em>.</p>"#;

    fn source() -> FixtureSource {
        FixtureSource::new([
            ("https://x.example/tv/show".to_string(), CLAMPED.to_string()),
            ("https://x.example/tv/show?full=1".to_string(), FULL.to_string()),
        ])
    }

    #[tokio::test]
    async fn toggle_is_followed_when_present() {
        let mut s = session(source());
        s.navigate("https://x.example/tv/show").await.unwrap();
        let got = extract(&mut s, Some("a.more"), "p.synopsis").await;
        assert_eq!(got, Lookup::Found("The whole story.".into()));
    }

    #[tokio::test]
    async fn missing_toggle_is_ignored() {
        let mut s = session(source());
        s.navigate("https://x.example/tv/show").await.unwrap();
        let got = extract(&mut s, Some("button.absent"), "p.synopsis").await;
        assert_eq!(got, Lookup::Found("Short…".into()));
        let got = extract(&mut s, None, "p.synopsis").await;
        assert_eq!(got, Lookup::Found("Short…".into()));
    }

    #[tokio::test]
    async fn missing_synopsis_is_sentinel() {
        let mut s = session(source());
        s.navigate("https://x.example/tv/show").await.unwrap();
        assert_eq!(extract(&mut s, None, "div#movieSynopsis").await, Lookup::Missing);
    }
}
