use serde::{Deserialize, Serialize};

/// One work as described by the scholarly-metadata registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryWork {
    pub doi: Option<String>,
    pub title: Vec<String>,
    pub container_title: Vec<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    /// First component of `issued.date-parts`.
    pub issued_year: Option<i32>,
    /// First component of `published-print.date-parts`.
    pub published_print_year: Option<i32>,
    pub authors: Vec<RegistryAuthor>,
    /// Funder names; unnamed funder entries are kept as empty strings.
    pub funders: Vec<String>,
}

impl RegistryWork {
    pub fn first_title(&self) -> Option<&str> {
        first_non_empty(&self.title)
    }

    pub fn first_container_title(&self) -> Option<&str> {
        first_non_empty(&self.container_title)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryAuthor {
    pub name: String,
    /// Non-empty affiliation names in registry order.
    pub affiliations: Vec<String>,
}

/// Citation-graph view of a paper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationInfo {
    pub paper_id: Option<String>,
    pub citation_count: u32,
    pub year: Option<i32>,
    pub is_retracted: bool,
    /// DOI listed in the service's external identifiers, if any.
    pub doi: Option<String>,
}

fn first_non_empty(values: &[String]) -> Option<&str> {
    values
        .first()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}
