//! Query engine: compiles request parameters against the registry and
//! evaluates them over an [`EntityStore`].

use permdir_core::config::LocaleConfig;
use permdir_core::entity::{EntityKey, EntityKind, EntityRef};
use permdir_core::error::{PermdirError, PermdirResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::QueryError;
use crate::filter::build_filter_predicate;
use crate::has_role::{RoleTraversal, build_has_role_predicate};
use crate::locale::LocaleResolver;
use crate::params::{FilterParam, QueryParams};
use crate::predicate::Predicate;
use crate::registry::{CompositeKind, EntityRegistry, FilterTarget, Lookup, REGISTRY, Registry};
use crate::search::build_search_predicate;
use crate::sort::Ordering;
use crate::store::EntityStore;

/// Separator between a filter name and its lookup suffix.
const LOOKUP_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub role_traversal: RoleTraversal,
}

/// A validated query, ready to run against any store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub kind: EntityKind,
    pub predicate: Predicate,
    pub ordering: Ordering,
}

impl CompiledQuery {
    pub fn run<'s, S>(&self, store: &'s S) -> Vec<EntityRef<'s>>
    where
        S: EntityStore + ?Sized,
    {
        let mut matched = store.select(self.kind, &self.predicate);
        self.ordering.apply(&mut matched);
        matched
    }
}

#[derive(Debug, Clone)]
pub struct QueryEngine {
    registry: &'static Registry,
    locales: LocaleConfig,
    options: EngineOptions,
}

impl QueryEngine {
    /// Engine over the built-in registry.
    pub fn new(locales: LocaleConfig) -> PermdirResult<Self> {
        Self::with_registry(&REGISTRY, locales, EngineOptions::default())
    }

    /// Engine over a custom registry. The registry is validated here so a
    /// broken table fails at startup rather than on some later request.
    pub fn with_registry(
        registry: &'static Registry,
        locales: LocaleConfig,
        options: EngineOptions,
    ) -> PermdirResult<Self> {
        registry.validate()?;
        Ok(Self {
            registry,
            locales,
            options,
        })
    }

    /// Validates `params` for `kind` and builds the query.
    ///
    /// Every parameter is checked before anything is evaluated; the first
    /// invalid one rejects the whole request. `active_locale` is the
    /// caller's request locale, if any.
    #[instrument(level = "debug", skip_all, fields(entity = %kind))]
    pub fn compile(
        &self,
        kind: EntityKind,
        params: &QueryParams,
        active_locale: Option<&str>,
    ) -> PermdirResult<CompiledQuery> {
        let entity = self.registry.entity(kind)?;
        let locales = LocaleResolver::new(&self.locales, active_locale);

        let query = self.build(entity, params, &locales).map_err(|err| {
            debug!(error = %err, "Rejected query");
            PermdirError::from(err)
        })?;
        debug!(
            predicate = ?query.predicate,
            sort_keys = query.ordering.keys().len(),
            "Compiled query"
        );
        Ok(query)
    }

    fn build(
        &self,
        entity: &EntityRegistry,
        params: &QueryParams,
        locales: &LocaleResolver<'_>,
    ) -> Result<CompiledQuery, QueryError> {
        let mut terms = Vec::with_capacity(params.filters.len() + 1);
        for param in &params.filters {
            terms.push(self.filter_predicate(entity, param, locales)?);
        }
        terms.push(build_search_predicate(
            entity,
            params.search.as_deref(),
            locales,
        ));

        let ordering = match params.sort.as_deref() {
            Some(raw) => Ordering::parse(entity, raw, locales)?,
            None => Ordering::default(),
        };

        Ok(CompiledQuery {
            kind: entity.kind,
            predicate: Predicate::all(terms),
            ordering,
        })
    }

    fn filter_predicate(
        &self,
        entity: &EntityRegistry,
        param: &FilterParam,
        locales: &LocaleResolver<'_>,
    ) -> Result<Predicate, QueryError> {
        let (name, lookup) = split_lookup(&param.name);
        match entity.filter(name) {
            Some(FilterTarget::Field(field)) => build_filter_predicate(
                entity.kind,
                field,
                lookup.unwrap_or(Lookup::Exact),
                &param.value,
                locales,
            ),
            Some(FilterTarget::Composite(composite)) => match (composite.kind, lookup) {
                (CompositeKind::HasRole, None) => Ok(build_has_role_predicate(
                    &param.value,
                    self.options.role_traversal,
                )),
                (_, Some(lookup)) => Err(QueryError::UnsupportedLookup {
                    entity: entity.kind,
                    field: composite.name.into(),
                    lookup: lookup.as_str().into(),
                }),
            },
            None => Err(QueryError::UnknownFilter {
                entity: entity.kind,
                name: param.name.clone(),
            }),
        }
    }

    /// Compiles and runs a query in one step.
    pub fn execute<'s, S>(
        &self,
        store: &'s S,
        kind: EntityKind,
        params: &QueryParams,
        active_locale: Option<&str>,
    ) -> PermdirResult<Vec<EntityRef<'s>>>
    where
        S: EntityStore + ?Sized,
    {
        let query = self.compile(kind, params, active_locale)?;
        let results = query.run(store);
        debug!(entity = %kind, matched = results.len(), "Executed query");
        Ok(results)
    }

    /// Like [`execute`](Self::execute), returning primary keys only.
    pub fn execute_keys<S>(
        &self,
        store: &S,
        kind: EntityKind,
        params: &QueryParams,
        active_locale: Option<&str>,
    ) -> PermdirResult<Vec<EntityKey>>
    where
        S: EntityStore + ?Sized,
    {
        Ok(self
            .execute(store, kind, params, active_locale)?
            .into_iter()
            .map(|entity| entity.key())
            .collect())
    }
}

/// Splits `name__lookup` into its parts. A suffix that is not a known
/// lookup stays part of the name, which then fails to resolve.
fn split_lookup(name: &str) -> (&str, Option<Lookup>) {
    match name.rsplit_once(LOOKUP_SEPARATOR) {
        Some((base, suffix)) => match Lookup::from_suffix(suffix) {
            Some(lookup) => (base, Some(lookup)),
            None => (name, None),
        },
        None => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use permdir_core::Directory;

    use super::*;

    #[test]
    fn split_lookup_recognises_known_suffixes() {
        assert_eq!(split_lookup("id__in"), ("id", Some(Lookup::In)));
        assert_eq!(
            split_lookup("first_name__icontains"),
            ("first_name", Some(Lookup::IContains))
        );
        assert_eq!(split_lookup("first_name"), ("first_name", None));
        assert_eq!(split_lookup("id__gt"), ("id__gt", None));
    }

    #[test]
    fn unknown_lookup_suffix_is_an_unknown_filter() {
        let engine = QueryEngine::new(LocaleConfig::default()).unwrap();
        let err = engine
            .compile(
                EntityKind::User,
                &QueryParams::new().filter("id__gt", "1"),
                None,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            PermdirError::InvalidFilter { ref message } if message.contains("id__gt")
        ));
    }

    #[test]
    fn composite_filters_take_no_lookup() {
        let engine = QueryEngine::new(LocaleConfig::default()).unwrap();
        let err = engine
            .compile(
                EntityKind::User,
                &QueryParams::new().filter("has_role__in", "admin"),
                None,
            )
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn empty_params_select_everything_in_key_order() {
        let engine = QueryEngine::new(LocaleConfig::default()).unwrap();
        let query = engine
            .compile(EntityKind::User, &QueryParams::new(), None)
            .unwrap();
        assert!(query.predicate.is_always());
        assert!(query.ordering.keys().is_empty());

        let dir = Directory::new();
        assert!(query.run(&dir).is_empty());
    }

    #[test]
    fn broken_registry_fails_at_construction() {
        static EMPTY_DUPLICATE: Registry = Registry {
            entities: &[
                EntityRegistry {
                    kind: EntityKind::Role,
                    fields: &[],
                    composites: &[],
                    search: &[],
                },
                EntityRegistry {
                    kind: EntityKind::Role,
                    fields: &[],
                    composites: &[],
                    search: &[],
                },
            ],
        };
        let err = QueryEngine::with_registry(
            &EMPTY_DUPLICATE,
            LocaleConfig::default(),
            EngineOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PermdirError::Configuration(_)));
    }
}
