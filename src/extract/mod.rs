pub mod image;
pub mod metadata;
pub mod scores;
pub mod summary;
pub mod title;

use tracing::debug;
use uuid::Uuid;

use crate::config::Timeouts;
use crate::profile::DetailProfile;
use crate::record::*;
use crate::session::{Node, PageSession};

const TIMESTAMP_FORMAT: &str = "%d-%b-%Y (%H:%M:%S%.6f)";

/// Reads one record from whatever page the session is on.
///
/// Every field is looked up independently; a miss leaves that field at the
/// sentinel and moves on. Nothing here returns an error.
pub struct Extractor {
    profile: DetailProfile,
    timeouts: Timeouts,
}

impl Extractor {
    pub fn new(profile: DetailProfile, timeouts: Timeouts) -> Self {
        Self { profile, timeouts }
    }

    pub async fn extract(&self, session: &mut dyn PageSession) -> Record {
        let p = &self.profile;
        let mut record = Record::new(&p.metadata.fields());
        let page = session
            .current_url()
            .map(|u| u.to_string())
            .unwrap_or_default();

        if let Some(consent) = &p.consent {
            fire_and_forget(session, consent).await;
        }

        let mut put = |field: &str, lookup: Lookup| {
            if !record.fill(field, lookup) {
                debug!("{}: {} not found", page, field);
            }
        };

        put(TITLE, title::extract(session, &p.title).await);
        put(PRIMARY_SCORE, scores::extract(session, &p.primary_score).await);
        put(SECONDARY_SCORE, scores::extract(session, &p.secondary_score).await);
        put(
            SUMMARY,
            summary::extract(session, p.show_more.as_deref(), &p.summary).await,
        );
        for (field, lookup) in metadata::extract(session, &p.metadata).await {
            put(&field, lookup);
        }
        put(
            IMAGE_REFERENCE,
            image::extract(session, &p.image, &p.image_attrs, self.timeouts.element).await,
        );
        put(CAPTURED_AT, Lookup::Found(timestamp()));
        put(RECORD_ID, Lookup::Found(Uuid::new_v4().to_string()));

        record
    }
}

pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// First match for `selector`, treating lookup errors as a miss.
async fn find(session: &dyn PageSession, selector: &str) -> Option<Node> {
    match session.find(selector).await {
        Ok(node) => node,
        Err(e) => {
            debug!("lookup {} failed: {}", selector, e);
            None
        }
    }
}

async fn read_text(session: &dyn PageSession, selector: &str) -> Lookup {
    Lookup::from(find(session, selector).await.map(|n| n.text))
}

/// Click `selector` once if it is there. The outcome is ignored.
pub async fn fire_and_forget(session: &mut dyn PageSession, selector: &str) {
    if let Some(node) = find(session, selector).await {
        if let Err(e) = session.click(&node).await {
            debug!("click {} ignored: {}", selector, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::profile::{Layout, SiteProfile, GENRE, NETWORK, PREMIERE_DATE};
    use crate::session::fixture::{session, FixtureSource};

    const URL: &str = "https://www.rottentomatoes.com/tv/the_bear";

    fn timeouts() -> Timeouts {
        Timeouts {
            consent: Duration::from_millis(10),
            element: Duration::from_millis(20),
            poll: Duration::from_millis(5),
        }
    }

    async fn extract_fixture(fixture: &str, layout: Layout) -> Record {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", fixture)).unwrap();
        let mut s = session(FixtureSource::new([(URL.to_string(), html)]));
        s.navigate(URL).await.unwrap();
        let extractor = Extractor::new(SiteProfile::for_layout(layout).detail, timeouts());
        extractor.extract(&mut s).await
    }

    #[tokio::test]
    async fn label_scan_page_is_complete() {
        let r = extract_fixture("the_bear", Layout::LabelScan).await;
        assert_eq!(r.first_missing(), None);
        assert_eq!(r.text(TITLE), Some("THE_BEAR"));
        assert_eq!(r.text(PRIMARY_SCORE), Some("93"));
        assert_eq!(r.text(SECONDARY_SCORE), Some("88"));
        assert_eq!(r.text(NETWORK), Some("FX"));
        assert_eq!(r.text(PREMIERE_DATE), Some("Jun 23, 2022"));
        assert_eq!(r.text(GENRE), Some("Comedy, Drama"));
        assert_eq!(
            r.text(IMAGE_REFERENCE),
            Some("https://resizing.flixster.com/posters/the_bear.jpg")
        );
        assert!(!r.text(SUMMARY).unwrap().contains('<'));
        assert!(Uuid::parse_str(r.text(RECORD_ID).unwrap()).is_ok());
    }

    #[tokio::test]
    async fn per_field_page_matches_shape() {
        let legacy = extract_fixture("the_last_of_us_legacy", Layout::PerField).await;
        let current = extract_fixture("the_bear", Layout::LabelScan).await;
        assert_eq!(legacy.first_missing(), None);
        assert_eq!(legacy.names().collect::<Vec<_>>(), current.names().collect::<Vec<_>>());
        assert_eq!(legacy.text(TITLE), Some("THE_LAST_OF_US"));
        assert_eq!(legacy.text(PRIMARY_SCORE), Some("96"));
        assert_eq!(legacy.text(NETWORK), Some("HBO"));
        assert_eq!(
            legacy.text(IMAGE_REFERENCE),
            Some("https://www.rottentomatoes.com/assets/posters/tlou.jpg")
        );
    }

    #[tokio::test]
    async fn misses_are_local() {
        let r = extract_fixture("no_audience_score", Layout::LabelScan).await;
        assert_eq!(r.first_missing(), Some(SECONDARY_SCORE));
        assert_eq!(r.get(SECONDARY_SCORE), Some(&FieldValue::Unknown));
        // everything after the miss is still read
        assert_eq!(r.text(GENRE), Some("Drama"));
        assert!(r.text(IMAGE_REFERENCE).is_some());
    }

    #[tokio::test]
    async fn empty_page_yields_sentinels_only_where_lookups_miss() {
        let mut s = session(FixtureSource::new([(
            URL.to_string(),
            "<html><body></body></html>".to_string(),
        )]));
        s.navigate(URL).await.unwrap();
        let extractor = Extractor::new(SiteProfile::for_layout(Layout::LabelScan).detail, timeouts());
        let r = extractor.extract(&mut s).await;

        for name in r.names() {
            let expect_known = name == CAPTURED_AT || name == RECORD_ID;
            assert_eq!(r.get(name) != Some(&FieldValue::Unknown), expect_known, "{}", name);
        }
    }

    #[tokio::test]
    async fn record_ids_are_fresh() {
        let a = extract_fixture("the_bear", Layout::LabelScan).await;
        let b = extract_fixture("the_bear", Layout::LabelScan).await;
        assert_ne!(a.text(RECORD_ID), b.text(RECORD_ID));
    }

    #[test]
    fn timestamp_has_microseconds() {
        let ts = timestamp();
        let re = regex::Regex::new(r"^\d{2}-[A-Z][a-z]{2}-\d{4} \(\d{2}:\d{2}:\d{2}\.\d{6}\)$").unwrap();
        assert!(re.is_match(&ts), "{}", ts);
    }
}
