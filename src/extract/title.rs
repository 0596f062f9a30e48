use crate::record::Lookup;
use crate::session::PageSession;

pub async fn extract(session: &dyn PageSession, selector: &str) -> Lookup {
    match super::read_text(session, selector).await {
        Lookup::Found(raw) => Lookup::text(normalize(&raw)),
        Lookup::Missing => Lookup::Missing,
    }
}

/// `"The Last of Us"` → `"THE_LAST_OF_US"`.
///
/// Whitespace runs become one `_`; anything outside `[A-Za-z0-9_]` is
/// dropped. Total and idempotent.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}
