use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScienceError};

/// `10.<4-9 digit registrant>/<non-whitespace suffix>`, anywhere in a string.
pub static DOI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)10\.\d{4,9}/\S+").expect("valid regex"));

static DOI_EXACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^10\.\d{4,9}/\S+$").expect("valid regex"));

const PREFIXES: [&str; 5] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Doi {
    pub raw: String,
    pub normalized: String,
    pub url: String,
}

impl Doi {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let stripped = PREFIXES
            .iter()
            .find_map(|p| {
                input
                    .get(..p.len())
                    .filter(|head| head.eq_ignore_ascii_case(p))
                    .map(|_| input[p.len()..].trim_start())
            })
            .unwrap_or(input);

        if !DOI_EXACT.is_match(stripped) {
            return Err(ScienceError::InvalidDoi(input.to_string()));
        }

        let normalized = stripped.to_lowercase();
        let url = format!("https://doi.org/{normalized}");

        Ok(Self {
            raw: input.to_string(),
            normalized,
            url,
        })
    }

    /// First DOI-looking substring of free text.
    pub fn find_in(text: &str) -> Option<Self> {
        DOI_PATTERN
            .find(text)
            .and_then(|m| Self::parse(m.as_str()).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}
