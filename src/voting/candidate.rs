use std::collections::{HashMap, HashSet};

use serde::{Serialize, Deserialize};

use super::id::CountryCode;
use crate::error::{self, ValidationError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: CountryCode,
    #[serde(default)]
    pub name: String,
}

/// One competing song. Everything except the identifier and country is for display only.
/// Feeds that omit `identifier` get `{number}-{code}` when the catalog is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub identifier: String,
    #[serde(rename = "number")]
    pub display_number: u32,
    #[serde(rename = "title")]
    pub display_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub country: Country,
}

impl Candidate {
    pub fn country_code(&self) -> &CountryCode {
        &self.country.code
    }
}

/// Snapshot of the running order, sorted by song number.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    candidates: Vec<Candidate>,
}

impl Catalog {
    pub fn new(mut candidates: Vec<Candidate>) -> Result<Catalog, ValidationError> {
        for candidate in candidates.iter_mut().filter(|c| c.identifier.trim().is_empty()) {
            candidate.identifier = format!("{}-{}", candidate.display_number, candidate.country.code);
        }

        let mut identifiers = HashSet::new();
        let mut countries: HashMap<&CountryCode, &str> = HashMap::new();
        for candidate in candidates.iter() {
            if !identifiers.insert(candidate.identifier.as_str()) {
                return Err(error::catalog_duplicate_identifier(&candidate.identifier));
            }
            if let Some(first) = countries.insert(candidate.country_code(), &candidate.identifier) {
                return Err(error::catalog_duplicate_country(
                    candidate.country_code(),
                    first,
                    &candidate.identifier,
                ));
            }
        }

        candidates.sort_by_key(|c| c.display_number);
        Ok(Catalog { candidates })
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn get(&self, country: &CountryCode) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.country_code() == country)
    }

    pub fn contains(&self, country: &CountryCode) -> bool {
        self.get(country).is_some()
    }

    pub fn country_codes(&self) -> HashSet<CountryCode> {
        self.candidates.iter().map(|c| c.country_code().clone()).collect()
    }
}
