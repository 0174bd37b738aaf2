//! Minimal RFC 8288 `Link` header parsing.
//!
//! Only the target URL and its `rel` values are extracted; other parameters
//! are ignored.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub url: String,
    pub rels: Vec<String>,
}

pub fn parse_link_header(value: &str) -> Vec<LinkEntry> {
    split_entries(value)
        .into_iter()
        .filter_map(parse_entry)
        .collect()
}

/// URL of the first link carrying relation `rel`.
pub fn find_link(value: &str, rel: &str) -> Option<String> {
    parse_link_header(value)
        .into_iter()
        .find(|entry| entry.rels.iter().any(|r| r.eq_ignore_ascii_case(rel)))
        .map(|entry| entry.url)
}

// Commas inside `<...>` or quoted strings do not separate entries.
fn split_entries(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_angle = false;
    let mut in_quote = false;
    let mut start = 0;
    for (idx, c) in value.char_indices() {
        match c {
            '<' if !in_quote => in_angle = true,
            '>' if !in_quote => in_angle = false,
            '"' if !in_angle => in_quote = !in_quote,
            ',' if !in_angle && !in_quote => {
                entries.push(&value[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    entries.push(&value[start..]);
    entries
}

fn parse_entry(entry: &str) -> Option<LinkEntry> {
    let entry = entry.trim().strip_prefix('<')?;
    let (url, params) = entry.split_once('>')?;
    let rels = params
        .split(';')
        .filter_map(|param| param.split_once('='))
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case("rel"))
        .flat_map(|(_, value)| {
            value
                .trim()
                .trim_matches('"')
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    Some(LinkEntry {
        url: url.trim().to_string(),
        rels,
    })
}
