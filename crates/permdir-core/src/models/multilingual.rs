//! Multilingual attribute values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PermdirError;

/// A value translated into one or more locales, keyed by language code.
///
/// At least one translation is always present. A locale without an entry is
/// absent, which is distinct from an entry holding the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct Multilingual(BTreeMap<String, String>);

impl Multilingual {
    pub fn new(locale: impl Into<String>, value: impl Into<String>) -> Self {
        let mut values = BTreeMap::new();
        values.insert(locale.into(), value.into());
        Self(values)
    }

    /// Adds (or replaces) the translation for `locale`.
    pub fn with(mut self, locale: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(locale.into(), value.into());
        self
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.0.get(locale).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl TryFrom<BTreeMap<String, String>> for Multilingual {
    type Error = PermdirError;

    fn try_from(values: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        if values.is_empty() {
            return Err(PermdirError::Validation {
                message: "multilingual value needs at least one locale".into(),
            });
        }
        Ok(Self(values))
    }
}

impl From<Multilingual> for BTreeMap<String, String> {
    fn from(value: Multilingual) -> Self {
        value.0
    }
}
