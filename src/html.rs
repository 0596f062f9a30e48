use std::sync::LazyLock;

use regex::{Captures, Regex};

static BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(br|p|div|li|tr|td|h[1-6])\b[^<>]*>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[A-Za-z!][^<>]*>").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,6});").unwrap());
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip markup and entities from scraped text.
///
/// Block-level tags become a space, inline tags vanish. As in HTML, a tag
/// starts with a name right after the `<`, so `x < y` is left alone. Tag removal and
/// entity decoding are repeated until neither changes the
/// text (decoding `&lt;b&gt;` yields a tag that must go too), then runs of
/// whitespace collapse to one space. The result is a fixed point, so
/// `clean(clean(x)) == clean(x)`.
pub fn clean(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let next = {
            let spaced = BREAK_RE.replace_all(&text, " ");
            let stripped = TAG_RE.replace_all(&spaced, "");
            ENTITY_RE.replace_all(&stripped, decode_entity).into_owned()
        };
        if next == text {
            break;
        }
        text = next;
    }
    SPACE_RE.replace_all(text.trim(), " ").into_owned()
}

fn decode_entity(caps: &Captures) -> String {
    let body = &caps[1];
    let decoded = match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "ndash" => Some('–'),
        "mdash" => Some('—'),
        "hellip" => Some('…'),
        "rsquo" => Some('’'),
        "lsquo" => Some('‘'),
        "rdquo" => Some('”'),
        "ldquo" => Some('“'),
        _ => numeric_entity(body),
    };
    match decoded {
        Some(c) => c.to_string(),
        None => caps[0].to_string(),
    }
}

fn numeric_entity(body: &str) -> Option<char> {
    let digits = body.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}
