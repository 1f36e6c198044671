//! `Link` header pagination

use reqwest::header::{HeaderMap, LINK};

/// Extract the `rel="next"` target from a `Link` header
#[must_use]
pub fn next_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(parse_next)
}

fn parse_next(entry: &str) -> Option<String> {
    let mut parts = entry.split(';');
    let target = parts.next()?.trim();
    let target = target.strip_prefix('<')?.strip_suffix('>')?;
    let is_next = parts.any(|param| {
        let param = param.trim();
        param
            .strip_prefix("rel=")
            .map(|rel| rel.trim_matches('"'))
            .is_some_and(|rel| rel.split_whitespace().any(|r| r == "next"))
    });
    is_next.then(|| target.to_string())
}
