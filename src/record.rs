//! User records and their validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fields every record must carry with a non-blank value.
pub const REQUIRED_FIELDS: [&str; 3] = ["name", "email", "role"];

/// One input row: field name to value. Serialized as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// The identifying field used in logs and reports.
    pub fn email(&self) -> &str {
        self.get("email").unwrap_or("<no email>")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pairs: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| format!("{k}={v:?}"))
            .collect();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}

/// Result of checking a record's required fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Required fields that are absent or blank, in [`REQUIRED_FIELDS`] order.
    pub missing: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Checks that every required field is present and non-blank after trimming.
pub fn validate(record: &Record) -> ValidationResult {
    let missing = REQUIRED_FIELDS
        .iter()
        .filter(|field| record.get(field).is_none_or(|v| v.trim().is_empty()))
        .map(|field| field.to_string())
        .collect();
    ValidationResult { missing }
}
