//! Selectors for the Rotten Tomatoes TV catalog.
//!
//! The detail page has shipped in two layouts. Both feed the same record
//! shape; they differ in where the scores live and how the metadata table
//! is laid out.

use clap::ValueEnum;

const LISTING_URL: &str = "https://www.rottentomatoes.com/browse/tv_series_browse/sort:popular";
const CONSENT: &str = "#onetrust-accept-btn-handler";

/// Names of the metadata fields, in record order.
pub const NETWORK: &str = "network";
pub const PREMIERE_DATE: &str = "premiere_date";
pub const GENRE: &str = "genre";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// Scoreboard attributes and a `label: value` info list
    LabelScan,
    /// Legacy page with one table cell per metadata field
    PerField,
}

#[derive(Debug, Clone)]
pub struct ListingProfile {
    pub url: String,
    pub consent: String,
    pub load_more: String,
    /// Query parameter the listing paginates on, used when the load-more
    /// control is a button rather than a link.
    pub page_param: String,
    pub tile: String,
}

#[derive(Debug, Clone)]
pub enum ScoreSource {
    /// Attribute of an element, e.g. `<score-board tomatometerscore="96">`
    Attribute { selector: String, attr: String },
    /// Visible text, e.g. `<span>96%</span>`
    Text { selector: String },
}

#[derive(Debug, Clone)]
pub enum MetadataStrategy {
    /// One element per field: `(field, selector)`.
    PerField(Vec<(String, String)>),
    /// Every `item` holds `Label: value`; `labels` maps label → field.
    LabelScan {
        item: String,
        labels: Vec<(String, String)>,
    },
}

impl MetadataStrategy {
    /// Field names this strategy can fill, in declaration order.
    pub fn fields(&self) -> Vec<String> {
        match self {
            MetadataStrategy::PerField(pairs) => pairs.iter().map(|(f, _)| f.clone()).collect(),
            MetadataStrategy::LabelScan { labels, .. } => {
                labels.iter().map(|(_, f)| f.clone()).collect()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetailProfile {
    pub consent: Option<String>,
    pub title: String,
    pub primary_score: ScoreSource,
    pub secondary_score: ScoreSource,
    pub show_more: Option<String>,
    pub summary: String,
    pub metadata: MetadataStrategy,
    pub image: String,
    /// Tried in order; the first non-empty one wins.
    pub image_attrs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub listing: ListingProfile,
    pub detail: DetailProfile,
}

impl SiteProfile {
    pub fn for_layout(layout: Layout) -> Self {
        let detail = match layout {
            Layout::LabelScan => label_scan_detail(),
            Layout::PerField => per_field_detail(),
        };
        Self {
            listing: listing(),
            detail,
        }
    }
}

fn listing() -> ListingProfile {
    ListingProfile {
        url: LISTING_URL.to_string(),
        consent: CONSENT.to_string(),
        load_more: r#"[data-qa="dlp-load-more-button"]"#.to_string(),
        page_param: "page".to_string(),
        tile: "a.js-tile-link".to_string(),
    }
}

fn label_scan_detail() -> DetailProfile {
    let scoreboard = "score-board.scoreboard";
    DetailProfile {
        consent: Some(CONSENT.to_string()),
        title: "p.scoreboard__title".to_string(),
        primary_score: ScoreSource::Attribute {
            selector: scoreboard.to_string(),
            attr: "tomatometerscore".to_string(),
        },
        secondary_score: ScoreSource::Attribute {
            selector: scoreboard.to_string(),
            attr: "audiencescore".to_string(),
        },
        show_more: Some("button.button--link".to_string()),
        summary: r#"p[data-qa="series-info-description"]"#.to_string(),
        metadata: MetadataStrategy::LabelScan {
            item: "section#series-info div ul li".to_string(),
            labels: vec![
                ("TV Network".to_string(), NETWORK.to_string()),
                ("Premiere Date".to_string(), PREMIERE_DATE.to_string()),
                ("Genre".to_string(), GENRE.to_string()),
            ],
        },
        image: r#"img[data-qa="poster-image"]"#.to_string(),
        image_attrs: vec!["src".to_string(), "data-src".to_string()],
    }
}

fn per_field_detail() -> DetailProfile {
    DetailProfile {
        consent: Some(CONSENT.to_string()),
        title: "h1.mop-ratings-wrap__title.mop-ratings-wrap__title--top".to_string(),
        primary_score: ScoreSource::Text {
            selector: r#"span[data-qa="tomatometer"]"#.to_string(),
        },
        secondary_score: ScoreSource::Text {
            selector: r#"span[data-qa="audience-score"]"#.to_string(),
        },
        show_more: Some(r#"button[data-qa="more-btn"]"#.to_string()),
        summary: "div#movieSynopsis".to_string(),
        metadata: MetadataStrategy::PerField(vec![
            (
                NETWORK.to_string(),
                r#"td[data-qa="series-details-network"]"#.to_string(),
            ),
            (
                PREMIERE_DATE.to_string(),
                r#"td[data-qa="series-details-premiere-date"]"#.to_string(),
            ),
            (
                GENRE.to_string(),
                r#"td[data-qa="series-details-genre"]"#.to_string(),
            ),
        ]),
        image: "img.posterImage".to_string(),
        image_attrs: vec!["src".to_string(), "data-src".to_string()],
    }
}
