//! Locale configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::error::{PermdirError, PermdirResult};

/// Locale used when neither the caller nor a forced locale decides.
pub const DEFAULT_LOCALE: &str = "en";

/// Which translation of multilingual attributes a query compares against.
///
/// Passed explicitly to every query so no request depends on process-wide
/// settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Fallback for callers that supply no active locale.
    pub default_locale: String,
    /// Per entity type, a locale that overrides the caller's active locale.
    pub forced_locales: BTreeMap<EntityKind, String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_locale: DEFAULT_LOCALE.into(),
            forced_locales: BTreeMap::new(),
        }
    }
}

impl LocaleConfig {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
            forced_locales: BTreeMap::new(),
        }
    }

    pub fn with_forced_locale(mut self, kind: EntityKind, locale: impl Into<String>) -> Self {
        self.forced_locales.insert(kind, locale.into());
        self
    }

    pub fn forced_locale(&self, kind: EntityKind) -> Option<&str> {
        self.forced_locales.get(&kind).map(String::as_str)
    }

    /// Parses an `entity=locale` pair such as `role=de`.
    pub fn parse_forced_locale(pair: &str) -> PermdirResult<(EntityKind, String)> {
        let (entity, locale) = pair.split_once('=').ok_or_else(|| {
            PermdirError::Configuration(format!("expected entity=locale, got {pair:?}"))
        })?;
        let kind = entity
            .trim()
            .parse::<EntityKind>()
            .map_err(|e| PermdirError::Configuration(e.to_string()))?;
        let locale = locale.trim();
        if locale.is_empty() {
            return Err(PermdirError::Configuration(format!("empty locale for {kind}")));
        }
        Ok((kind, locale.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_locale_lookup() {
        let config = LocaleConfig::default()
            .with_forced_locale(EntityKind::Role, "de");
        assert_eq!(config.forced_locale(EntityKind::Role), Some("de"));
        assert_eq!(config.forced_locale(EntityKind::Scope), None);
        assert_eq!(config.default_locale, "en");
    }

    #[test]
    fn parse_pairs() {
        assert_eq!(
            LocaleConfig::parse_forced_locale("role=de").unwrap(),
            (EntityKind::Role, "de".to_string())
        );
        assert!(LocaleConfig::parse_forced_locale("role").is_err());
        assert!(LocaleConfig::parse_forced_locale("group=de").is_err());
        assert!(LocaleConfig::parse_forced_locale("scope= ").is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: LocaleConfig =
            serde_json::from_str(r#"{"forced_locales": {"scope": "fr"}}"#).unwrap();
        assert_eq!(config.default_locale, "en");
        assert_eq!(config.forced_locale(EntityKind::Scope), Some("fr"));
    }
}
