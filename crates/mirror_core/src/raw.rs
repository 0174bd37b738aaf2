use serde::Deserialize;
use serde_json::Value;

/// A post or page exactly as the content API returns it with `_embed` set.
///
/// Only the fields needed to plan the mirror are modelled; everything else in
/// the payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub slug: String,
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<Embedded>,
}

/// Related records embedded under `_embedded`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Embedded {
    #[serde(default)]
    pub author: Vec<RawAuthor>,
    /// One entry per taxonomy. An entry is a list of terms, or an error object
    /// when the taxonomy is not exposed over REST.
    #[serde(rename = "wp:term", alias = "https://api.w.org/term", default)]
    pub terms: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawAuthor {
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawTerm {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub taxonomy: String,
}

impl RawItem {
    pub fn primary_author(&self) -> Option<&RawAuthor> {
        self.embedded.as_ref().and_then(|e| e.author.first())
    }

    /// All well-formed embedded terms, flattened across taxonomies.
    pub fn terms(&self) -> Vec<RawTerm> {
        let Some(embedded) = self.embedded.as_ref() else {
            return Vec::new();
        };
        embedded
            .terms
            .iter()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(|term| RawTerm::deserialize(term).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skips_taxonomies_reported_as_errors() {
        let item: RawItem = serde_json::from_value(json!({
            "slug": "hello",
            "_embedded": {
                "wp:term": [
                    [{ "slug": "news", "taxonomy": "category" }],
                    { "code": "rest_no_route", "data": { "status": 404 } }
                ]
            }
        }))
        .unwrap();

        let terms = item.terms();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].slug, "news");
    }

    #[test]
    fn accepts_legacy_term_relation_key() {
        let item: RawItem = serde_json::from_value(json!({
            "slug": "hello",
            "_embedded": {
                "https://api.w.org/term": [[{ "slug": "misc", "taxonomy": "category" }]]
            }
        }))
        .unwrap();

        assert_eq!(item.terms()[0].slug, "misc");
    }
}
