use crate::profile::ScoreSource;
use crate::record::Lookup;
use crate::session::PageSession;

pub async fn extract(session: &dyn PageSession, source: &ScoreSource) -> Lookup {
    let raw = match source {
        ScoreSource::Attribute { selector, attr } => super::find(session, selector)
            .await
            .and_then(|n| n.attr(attr).map(str::to_string)),
        ScoreSource::Text { selector } => super::find(session, selector).await.map(|n| n.text),
    };
    raw.map(|r| normalize(&r)).unwrap_or(Lookup::Missing)
}

/// `"96%"` and `"96"` both give `96`. Empty means unknown, not zero.
pub fn normalize(raw: &str) -> Lookup {
    let t = raw.trim();
    let t = t.strip_suffix('%').unwrap_or(t).trim();
    match t.parse::<f64>() {
        Ok(v) if v.is_finite() => Lookup::Found(t.to_string()),
        _ => Lookup::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_and_plain() {
        assert_eq!(normalize("96%"), Lookup::Found("96".into()));
        assert_eq!(normalize(" 90 "), Lookup::Found("90".into()));
        assert_eq!(normalize("0"), Lookup::Found("0".into()));
    }

    #[test]
    fn empty_is_unknown_not_zero() {
        assert_eq!(normalize(""), Lookup::Missing);
        assert_eq!(normalize("  %"), Lookup::Missing);
    }

    #[test]
    fn malformed_is_unknown() {
        assert_eq!(normalize("--"), Lookup::Missing);
        assert_eq!(normalize("NaN"), Lookup::Missing);
        assert_eq!(normalize("Tomatometer"), Lookup::Missing);
    }
}
