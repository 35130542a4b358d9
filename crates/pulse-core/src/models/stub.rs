use serde_json::Value;

use super::shape::FieldShape;

/// Nested fields of a profile entry that may carry a DOI, in scan order.
pub const IDENTIFIER_FIELDS: [&str; 5] = [
    "inline_links",
    "links",
    "source",
    "publication_info",
    "publication",
];

/// One publication entry as returned by the author-profile source.
///
/// Built once from the raw payload and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublicationStub {
    pub title: String,
    /// Citation count the profile source reports inline (`cited_by.value`).
    pub cited_by: Option<u32>,
    pub year: Option<i32>,
    /// `publication.year`, when `publication` is a mapping.
    pub publication_year: Option<i32>,
    /// `publication.name`, when `publication` is a mapping.
    pub publication_name: Option<String>,
    /// `source`, when it is a plain string.
    pub source_name: Option<String>,
    pub authors: Vec<String>,
    /// `external_ids` entries with string values, payload order.
    pub external_ids: Vec<(String, String)>,
    /// The fields named in [`IDENTIFIER_FIELDS`] that are present, in scan order.
    pub identifier_fields: Vec<(String, FieldShape)>,
}

impl PublicationStub {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn from_json(v: &Value) -> Self {
        let title = v
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();

        let cited_by = match v.get("cited_by") {
            Some(Value::Object(obj)) => obj.get("value").and_then(non_negative_count),
            Some(other) => non_negative_count(other),
            None => None,
        };

        let publication = v.get("publication").and_then(Value::as_object);
        let publication_year = publication
            .and_then(|p| p.get("year"))
            .and_then(parse_year_value);
        let publication_name = publication
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned);

        let source_name = v
            .get("source")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned);

        let authors = v
            .get("authors")
            .or_else(|| v.get("authors_parsed"))
            .map(parse_authors)
            .unwrap_or_default();

        let external_ids = v
            .get("external_ids")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|val| (k.clone(), val.to_string())))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let identifier_fields = IDENTIFIER_FIELDS
            .iter()
            .filter_map(|key| {
                v.get(*key)
                    .map(|value| (key.to_string(), FieldShape::from_value(value)))
            })
            .collect();

        Self {
            title,
            cited_by,
            year: v.get("year").and_then(parse_year_value),
            publication_year,
            publication_name,
            source_name,
            authors,
            external_ids,
            identifier_fields,
        }
    }

    /// Explicit identifier value, trying `DOI` before `doi`.
    pub fn explicit_doi(&self) -> Option<&str> {
        ["DOI", "doi"].iter().find_map(|key| {
            self.external_ids
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.trim())
                .filter(|v| !v.is_empty())
        })
    }
}

/// The profile of one researcher: display name plus publication stubs in
/// profile order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorProfile {
    pub name: String,
    pub articles: Vec<PublicationStub>,
}

impl AuthorProfile {
    pub fn from_json(v: &Value) -> Self {
        let name = v
            .get("author")
            .and_then(|a| a.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        let articles = v
            .get("articles")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(PublicationStub::from_json).collect())
            .unwrap_or_default();
        Self { name, articles }
    }
}

/// Accept a 4-digit year only; anything else is treated as unknown.
pub fn four_digit_year(n: i64) -> Option<i32> {
    if (1000..=9999).contains(&n) {
        i32::try_from(n).ok()
    } else {
        None
    }
}

/// Year from a JSON number or numeric string.
pub fn parse_year_value(v: &Value) -> Option<i32> {
    match v {
        Value::Number(n) => n.as_i64().and_then(four_digit_year),
        Value::String(s) => s.trim().parse::<i64>().ok().and_then(four_digit_year),
        _ => None,
    }
}

fn non_negative_count(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

fn parse_authors(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(obj) => obj
                    .get("name")
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string()),
                _ => None,
            })
            .filter(|name| !name.is_empty())
            .collect(),
        // Profile listings give "A Author, B Author, ..." as one string.
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != "..." && *name != "…")
            .map(ToOwned::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_profile_article() {
        let stub = PublicationStub::from_json(&json!({
            "title": "  Deep learning ",
            "authors": "Y LeCun, Y Bengio, G Hinton",
            "publication": "Nature 521 (7553), 436-444, 2015",
            "cited_by": {"value": 12, "link": "https://scholar.google.com/x"},
            "year": "2015"
        }));

        assert_eq!(stub.title, "Deep learning");
        assert_eq!(stub.cited_by, Some(12));
        assert_eq!(stub.year, Some(2015));
        assert_eq!(stub.authors.len(), 3);
        assert!(stub.publication_year.is_none());
        assert_eq!(stub.identifier_fields.len(), 1);
        assert_eq!(stub.identifier_fields[0].0, "publication");
    }

    #[test]
    fn nested_publication_mapping() {
        let stub = PublicationStub::from_json(&json!({
            "title": "T",
            "publication": {"name": "Journal of Things", "year": 2019},
            "source": "Elsevier",
            "cited_by": 7
        }));
        assert_eq!(stub.publication_name.as_deref(), Some("Journal of Things"));
        assert_eq!(stub.publication_year, Some(2019));
        assert_eq!(stub.source_name.as_deref(), Some("Elsevier"));
        assert_eq!(stub.cited_by, Some(7));
        let keys: Vec<_> = stub.identifier_fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["source", "publication"]);
    }

    #[test]
    fn rejects_non_four_digit_years() {
        assert_eq!(parse_year_value(&json!(0)), None);
        assert_eq!(parse_year_value(&json!("n.d.")), None);
        assert_eq!(parse_year_value(&json!(20190)), None);
        assert_eq!(parse_year_value(&json!(" 1998 ")), Some(1998));
    }

    #[test]
    fn explicit_doi_prefers_uppercase_key() {
        let stub = PublicationStub::from_json(&json!({
            "title": "T",
            "external_ids": {"doi": "10.1/lower", "DOI": "10.1/upper"}
        }));
        assert_eq!(stub.explicit_doi(), Some("10.1/upper"));
    }

    #[test]
    fn author_list_of_objects() {
        let stub = PublicationStub::from_json(&json!({
            "title": "T",
            "authors": [{"name": "A"}, {"name": ""}, "B", 3]
        }));
        assert_eq!(stub.authors, vec!["A", "B"]);
    }

    #[test]
    fn profile_with_articles() {
        let profile = AuthorProfile::from_json(&json!({
            "author": {"name": "Ada Lovelace"},
            "articles": [{"title": "One"}, {"title": "Two"}]
        }));
        assert_eq!(profile.name, "Ada Lovelace");
        assert_eq!(profile.articles.len(), 2);
        assert_eq!(profile.articles[1].title, "Two");
    }

    #[test]
    fn missing_articles_is_empty_profile() {
        let profile = AuthorProfile::from_json(&json!({"author": {}}));
        assert!(profile.name.is_empty());
        assert!(profile.articles.is_empty());
    }
}
