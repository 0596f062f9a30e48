use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

pub const TITLE: &str = "title";
pub const PRIMARY_SCORE: &str = "primary_score";
pub const SECONDARY_SCORE: &str = "secondary_score";
pub const SUMMARY: &str = "summary";
pub const IMAGE_REFERENCE: &str = "image_reference";
pub const CAPTURED_AT: &str = "captured_at";
pub const RECORD_ID: &str = "record_id";

/// Rendering of the sentinel in diagnostics.
pub const SENTINEL: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Not yet populated, or could not be.
    Unknown,
    Known(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unknown => f.write_str(SENTINEL),
            FieldValue::Known(v) => f.write_str(v),
        }
    }
}

/// Outcome of a single field lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(String),
    Missing,
}

impl Lookup {
    /// Trimmed text, with empty treated as missing.
    pub fn text(raw: impl AsRef<str>) -> Self {
        let t = raw.as_ref().trim();
        if t.is_empty() {
            Lookup::Missing
        } else {
            Lookup::Found(t.to_string())
        }
    }
}

impl From<Option<String>> for Lookup {
    fn from(value: Option<String>) -> Self {
        value.map(Lookup::text).unwrap_or(Lookup::Missing)
    }
}

/// Fixed, ordered set of named fields. Keys are decided at construction
/// and never added or removed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// All fields start out as the sentinel.
    pub fn new(metadata: &[String]) -> Self {
        let mut names: Vec<String> = [TITLE, PRIMARY_SCORE, SECONDARY_SCORE, SUMMARY]
            .iter()
            .map(|s| s.to_string())
            .collect();
        names.extend(metadata.iter().cloned());
        names.extend([IMAGE_REFERENCE, CAPTURED_AT, RECORD_ID].iter().map(|s| s.to_string()));

        Self {
            fields: names.into_iter().map(|n| (n, FieldValue::Unknown)).collect(),
        }
    }

    /// Store a found value. `Missing` and unknown field names leave the
    /// record untouched. Returns whether a value was written.
    pub fn fill(&mut self, field: &str, lookup: Lookup) -> bool {
        let Lookup::Found(value) = lookup else {
            return false;
        };
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => {
                *slot = FieldValue::Known(value);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == field).map(|(_, v)| v)
    }

    /// Value of a populated field.
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.get(field) {
            Some(FieldValue::Known(v)) => Some(v),
            _ => None,
        }
    }

    /// Title for diagnostics; the sentinel when not populated.
    pub fn title(&self) -> &str {
        self.text(TITLE).unwrap_or(SENTINEL)
    }

    pub fn first_missing(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(_, v)| *v == FieldValue::Unknown)
            .map(|(n, _)| n.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, &value.to_string())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{GENRE, NETWORK, PREMIERE_DATE};

    fn metadata() -> Vec<String> {
        vec![NETWORK.into(), PREMIERE_DATE.into(), GENRE.into()]
    }

    #[test]
    fn starts_all_sentinel() {
        let r = Record::new(&metadata());
        assert_eq!(r.names().count(), 10);
        assert_eq!(r.first_missing(), Some(TITLE));
        assert!(r.names().all(|n| r.get(n) == Some(&FieldValue::Unknown)));
        assert_eq!(r.title(), SENTINEL);
    }

    #[test]
    fn field_order_is_fixed() {
        let r = Record::new(&metadata());
        let names: Vec<&str> = r.names().collect();
        assert_eq!(
            names,
            vec![
                "title",
                "primary_score",
                "secondary_score",
                "summary",
                "network",
                "premiere_date",
                "genre",
                "image_reference",
                "captured_at",
                "record_id"
            ]
        );
    }

    #[test]
    fn fill_never_adds_keys() {
        let mut r = Record::new(&[]);
        assert!(!r.fill("director", Lookup::Found("x".into())));
        assert!(r.get("director").is_none());
        assert_eq!(r.names().count(), 7);
    }

    #[test]
    fn missing_keeps_sentinel() {
        let mut r = Record::new(&[]);
        assert!(!r.fill(TITLE, Lookup::Missing));
        assert_eq!(r.get(TITLE), Some(&FieldValue::Unknown));
        assert!(r.fill(TITLE, Lookup::text("  THE_BEAR ")));
        assert_eq!(r.text(TITLE), Some("THE_BEAR"));
        assert_eq!(r.first_missing(), Some(PRIMARY_SCORE));
    }

    #[test]
    fn empty_text_is_missing() {
        assert_eq!(Lookup::text("   "), Lookup::Missing);
        assert_eq!(Lookup::from(None), Lookup::Missing);
        assert_eq!(Lookup::from(Some(" HBO ".to_string())), Lookup::Found("HBO".into()));
    }

    #[test]
    fn serializes_in_field_order() {
        let mut r = Record::new(&[GENRE.to_string()]);
        r.fill(TITLE, Lookup::text("SEVERANCE"));
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.starts_with(r#"{"title":"SEVERANCE","primary_score":"N/A""#));
        assert!(json.find("genre").unwrap() < json.find("image_reference").unwrap());
    }
}
