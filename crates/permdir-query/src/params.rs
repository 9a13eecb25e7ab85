//! Request parameter parsing.
//!
//! The boundary hands over raw `key=value` pairs as they appeared in the
//! request. Keys of the form `filter[...]` and `sort` are consumed here;
//! everything else (`page[...]`, `include`, ...) belongs to outer layers
//! and is ignored.

use crate::error::QueryError;
use crate::registry::SEARCH_FILTER;

pub const SORT_PARAM: &str = "sort";
const FILTER_PREFIX: &str = "filter[";

/// One `filter[name]=value` parameter. `name` may carry a `__lookup`
/// suffix, which the engine splits off against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParam {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub filters: Vec<FilterParam>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses raw request pairs.
    ///
    /// `filter[name]__lookup` is read as `filter[name__lookup]`. A key that
    /// starts like a filter but is not well formed is rejected.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            if key == SORT_PARAM {
                params.sort = Some(value.into());
                continue;
            }
            let Some(rest) = key.strip_prefix(FILTER_PREFIX) else {
                continue;
            };
            let malformed = || QueryError::MalformedKey { key: key.into() };
            let (inner, suffix) = rest.split_once(']').ok_or_else(malformed)?;
            if inner.is_empty() || inner.contains('[') {
                return Err(malformed());
            }
            let name = match suffix {
                "" => inner.to_string(),
                s if s.starts_with("__") && s.len() > 2 => format!("{inner}{s}"),
                _ => return Err(malformed()),
            };
            if name == SEARCH_FILTER {
                params.search = Some(value.into());
            } else {
                params.filters.push(FilterParam {
                    name,
                    value: value.into(),
                });
            }
        }
        Ok(params)
    }

    pub fn filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(FilterParam {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort(mut self, raw: impl Into<String>) -> Self {
        self.sort = Some(raw.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_filters_search_and_sort() {
        let params = QueryParams::from_pairs([
            ("filter[id__in]", "a,b"),
            ("filter[search]", "adm"),
            ("filter[hasRole]", "admin"),
            ("sort", "-email"),
            ("page[number]", "2"),
            ("include", "acls"),
        ])
        .unwrap();
        assert_eq!(
            params,
            QueryParams::new()
                .filter("id__in", "a,b")
                .filter("hasRole", "admin")
                .search("adm")
                .sort("-email")
        );
    }

    #[test]
    fn lookup_outside_brackets_is_accepted() {
        let pairs = [("filter[email]__in", "a@x,b@x")];
        let params = QueryParams::from_pairs(pairs).unwrap();
        assert_eq!(params.filters[0].name, "email__in");
    }

    #[test]
    fn malformed_filter_keys_are_rejected() {
        for key in [
            "filter[]",
            "filter[id",
            "filter[a[b]]",
            "filter[id]x",
            "filter[id]__",
        ] {
            assert!(
                matches!(
                    QueryParams::from_pairs([(key, "1")]),
                    Err(QueryError::MalformedKey { .. })
                ),
                "{key} should be rejected"
            );
        }
    }
}
