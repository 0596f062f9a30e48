use std::fmt;

use tracing::warn;

use crate::record::Record;

/// A record that still held the sentinel somewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub title: String,
    /// First field, in record order, left at the sentinel.
    pub field: String,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: invalid {} data, result omitted", self.title, self.field)
    }
}

/// All-or-nothing completeness check. The only place a record is dropped.
pub fn validate(record: Record) -> Result<Record, Rejected> {
    match record.first_missing() {
        None => Ok(record),
        Some(field) => {
            let rejected = Rejected {
                title: record.title().to_string(),
                field: field.to_string(),
            };
            warn!("{}", rejected);
            Err(rejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::record::{Lookup, TITLE};

    const META: [&str; 3] = ["network", "premiere_date", "genre"];

    fn record(filled: &[bool]) -> Record {
        let meta: Vec<String> = META.iter().map(|s| s.to_string()).collect();
        let mut r = Record::new(&meta);
        let names: Vec<String> = r.names().map(str::to_string).collect();
        for (name, fill) in names.iter().zip(filled) {
            if *fill {
                r.fill(name, Lookup::Found(format!("{}-value", name)));
            }
        }
        r
    }

    #[test]
    fn complete_record_passes_unchanged() {
        let r = record(&[true; 10]);
        assert_eq!(validate(r.clone()), Ok(r));
    }

    #[test]
    fn nine_of_ten_is_rejected() {
        let mut filled = [true; 10];
        filled[6] = false;
        let err = validate(record(&filled)).unwrap_err();
        assert_eq!(err.title, "title-value");
        assert_eq!(err.field, "genre");
        assert_eq!(err.to_string(), "title-value: invalid genre data, result omitted");
    }

    #[test]
    fn names_first_offender_and_sentinel_title() {
        let err = validate(record(&[false; 10])).unwrap_err();
        assert_eq!(err.title, "N/A");
        assert_eq!(err.field, TITLE);
    }

    proptest! {
        #[test]
        fn rejects_iff_any_sentinel(filled in proptest::collection::vec(any::<bool>(), 10)) {
            let r = record(&filled);
            prop_assert_eq!(validate(r).is_err(), filled.iter().any(|f| !f));
        }
    }
}
