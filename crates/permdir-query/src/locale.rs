//! Locale resolution for multilingual attributes.

use permdir_core::config::LocaleConfig;
use permdir_core::entity::EntityKind;

use crate::registry::{FieldDescriptor, FieldKind};

/// Picks the translation a request compares multilingual values in.
///
/// A forced locale configured for the queried entity type wins, then one
/// configured for the entity type owning the attribute, then the caller's
/// active locale. Without an active locale the configured default applies.
#[derive(Debug, Clone, Copy)]
pub struct LocaleResolver<'a> {
    config: &'a LocaleConfig,
    active: Option<&'a str>,
}

impl<'a> LocaleResolver<'a> {
    pub fn new(config: &'a LocaleConfig, active: Option<&'a str>) -> Self {
        Self { config, active }
    }

    /// Locale for multilingual attributes owned by `owner`, reached from a
    /// query over `root`.
    pub fn resolve(&self, root: EntityKind, owner: EntityKind) -> &'a str {
        self.config
            .forced_locale(root)
            .or_else(|| self.config.forced_locale(owner))
            .or(self.active)
            .unwrap_or(self.config.default_locale.as_str())
    }

    /// Locale for a field declared on `kind` itself; `None` for fields that
    /// are not multilingual.
    pub fn resolve_field(&self, kind: EntityKind, field: &FieldDescriptor) -> Option<&'a str> {
        (field.kind == FieldKind::Multilingual).then(|| self.resolve(kind, kind))
    }
}

#[cfg(test)]
mod tests {
    use permdir_core::models::multilingual::Multilingual;

    use super::*;
    use crate::registry::{Lookup, REGISTRY};

    fn role_name() -> Multilingual {
        Multilingual::new("de", "deutscher name")
            .with("en", "english name")
    }

    #[test]
    fn active_locale_applies_without_forced_locale() {
        let config = LocaleConfig::default();
        let resolver = LocaleResolver::new(&config, Some("de"));
        let locale = resolver.resolve(EntityKind::Role, EntityKind::Role);
        assert_eq!(locale, "de");
        assert_eq!(role_name().get(locale), Some("deutscher name"));
    }

    #[test]
    fn forced_locale_overrides_active_locale() {
        let config = LocaleConfig::default()
            .with_forced_locale(EntityKind::Role, "de");
        let resolver = LocaleResolver::new(&config, Some("en"));
        assert_eq!(resolver.resolve(EntityKind::Role, EntityKind::Role), "de");
        assert_eq!(resolver.resolve(EntityKind::Scope, EntityKind::Scope), "en");
        assert_eq!(resolver.resolve(EntityKind::User, EntityKind::Role), "de");
    }

    #[test]
    fn queried_kind_forced_locale_wins_over_owner() {
        let config = LocaleConfig::default()
            .with_forced_locale(EntityKind::User, "de")
            .with_forced_locale(EntityKind::Scope, "fr");
        let resolver = LocaleResolver::new(&config, Some("en"));
        assert_eq!(resolver.resolve(EntityKind::User, EntityKind::Role), "de");
        assert_eq!(resolver.resolve(EntityKind::User, EntityKind::Scope), "de");
        assert_eq!(resolver.resolve(EntityKind::Acl, EntityKind::Scope), "fr");
    }

    #[test]
    fn default_locale_fills_in_for_missing_active_locale() {
        let config = LocaleConfig::new("fr");
        let resolver = LocaleResolver::new(&config, None);
        assert_eq!(resolver.resolve(EntityKind::Scope, EntityKind::Scope), "fr");
    }

    #[test]
    fn missing_translation_has_no_fallback() {
        let config = LocaleConfig::default();
        let resolver = LocaleResolver::new(&config, Some("it"));
        let locale = resolver.resolve(EntityKind::Role, EntityKind::Role);
        assert_eq!(role_name().get(locale), None);
    }

    #[test]
    fn only_multilingual_fields_resolve() {
        let config = LocaleConfig::default();
        let resolver = LocaleResolver::new(&config, Some("de"));
        let roles = REGISTRY.entity(EntityKind::Role).unwrap();
        let name = roles.field_lookup("name", Lookup::Exact).unwrap();
        let id = roles.field_lookup("id", Lookup::Exact).unwrap();
        assert_eq!(resolver.resolve_field(EntityKind::Role, name), Some("de"));
        assert_eq!(resolver.resolve_field(EntityKind::Role, id), None);
    }
}
