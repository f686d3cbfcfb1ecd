//! Query expressions and the result-name → query mapping a factory is built from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Delimiter between dict-path segments.
pub const DICT_LOOKUP: &str = " > ";

/// One query expression.
///
/// Deserializes from either a bare string or `{"base": ..., "children": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Query {
    Simple(String),
    Structured {
        base: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        children: Option<String>,
    },
}

impl Query {
    #[must_use]
    pub fn structured(base: impl Into<String>, children: Option<&str>) -> Self {
        Self::Structured {
            base: base.into(),
            children: children.map(str::to_string),
        }
    }

    /// The base expression, whatever the shape.
    #[must_use]
    pub fn base(&self) -> &str {
        match self {
            Self::Simple(query) => query,
            Self::Structured { base, .. } => base,
        }
    }

    /// The children sub-query. An empty string counts as absent.
    #[must_use]
    pub fn children(&self) -> Option<&str> {
        match self {
            Self::Structured {
                children: Some(children),
                ..
            } if !children.is_empty() => Some(children),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured { .. })
    }
}

impl From<&str> for Query {
    fn from(query: &str) -> Self {
        Self::Simple(query.to_string())
    }
}

impl From<String> for Query {
    fn from(query: String) -> Self {
        Self::Simple(query)
    }
}

/// Mapping from result name to query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuerySpec(BTreeMap<String, Query>);

impl QuerySpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Left-fold a chain of specs, most-base first. Later layers override
    /// same-named entries of earlier ones.
    #[must_use]
    pub fn layered<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        layers.into_iter().fold(Self::new(), |mut merged, layer| {
            merged.extend(layer);
            merged
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, query: impl Into<Query>) {
        self.0.insert(name.into(), query.into());
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, query: impl Into<Query>) -> Self {
        self.insert(name, query);
        self
    }

    /// Shallow merge: entries of `other` win.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Query> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Query)> {
        self.0.iter().map(|(name, query)| (name.as_str(), query))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, Q> FromIterator<(K, Q)> for QuerySpec
where
    K: Into<String>,
    Q: Into<Query>,
{
    fn from_iter<I: IntoIterator<Item = (K, Q)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, query)| (name.into(), query.into()))
                .collect(),
        )
    }
}
