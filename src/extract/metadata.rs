use crate::profile::MetadataStrategy;
use crate::record::Lookup;
use crate::session::PageSession;

/// One lookup per metadata field, in the strategy's field order, whichever
/// way the page lays the values out.
pub async fn extract(session: &dyn PageSession, strategy: &MetadataStrategy) -> Vec<(String, Lookup)> {
    match strategy {
        MetadataStrategy::PerField(pairs) => {
            let mut out = Vec::with_capacity(pairs.len());
            for (field, selector) in pairs {
                out.push((field.clone(), super::read_text(session, selector).await));
            }
            out
        }
        MetadataStrategy::LabelScan { item, labels } => {
            let entries: Vec<String> = match session.find_all(item).await {
                Ok(nodes) => nodes.into_iter().map(|n| n.text).collect(),
                Err(e) => {
                    tracing::debug!("metadata list {} unreadable: {}", item, e);
                    Vec::new()
                }
            };
            scan_labels(&entries, labels)
        }
    }
}

/// Dispatch `Label: value` entries into fields. Entries without a `:` or
/// with an unmapped label are skipped; a repeated label keeps the last value.
pub fn scan_labels(entries: &[String], labels: &[(String, String)]) -> Vec<(String, Lookup)> {
    let mut out: Vec<(String, Lookup)> = labels
        .iter()
        .map(|(_, field)| (field.clone(), Lookup::Missing))
        .collect();

    for entry in entries {
        let Some((label, value)) = entry.split_once(':') else {
            continue;
        };
        let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
        let Some(pos) = labels.iter().position(|(l, _)| *l == label) else {
            continue;
        };
        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        if let Lookup::Found(v) = Lookup::text(value) {
            out[pos].1 = Lookup::Found(v);
        }
    }

    out
}
