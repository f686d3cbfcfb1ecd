//! Extension members a factory attaches to its facades on top of the
//! declared queries.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::facade::Lookup;

pub type PropertyFn = dyn Fn(&dyn Lookup) -> Result<Value> + Send + Sync;
pub type MethodFn = dyn Fn(&dyn Lookup, &[Value]) -> Result<Value> + Send + Sync;

#[derive(Clone)]
pub enum Member {
    /// Zero-argument, computed from other attributes. Memoized and
    /// included in bulk materialization.
    Property(Arc<PropertyFn>),
    /// Takes arguments. Never memoized, never materialized in bulk, but
    /// still an attribute for combined resolution.
    Method(Arc<MethodFn>),
}

impl Member {
    #[must_use]
    pub const fn is_property(&self) -> bool {
        matches!(self, Self::Property(_))
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(_) => f.write_str("Property"),
            Self::Method(_) => f.write_str("Method"),
        }
    }
}

/// Named members in registration order.
#[derive(Clone, Default)]
pub struct Members {
    entries: Vec<(String, Member)>,
}

impl Members {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member; a later registration under the same name replaces
    /// the earlier one.
    pub fn register(&mut self, name: impl Into<String>, member: Member) {
        let name = name.into();
        debug!(member = %name, kind = ?member, "registering member");
        if let Some(slot) = self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = member;
        } else {
            self.entries.push((name, member));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Member> {
        self.entries
            .iter()
            .find_map(|(existing, member)| (existing == name).then_some(member))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Names of the members bulk materialization includes.
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, member)| member.is_property())
            .map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Members {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, member)| (name, member)))
            .finish()
    }
}

pub(crate) fn property<F>(f: F) -> Member
where
    F: Fn(&dyn Lookup) -> Result<Value> + Send + Sync + 'static,
{
    Member::Property(Arc::new(f))
}

pub(crate) fn method<F>(f: F) -> Member
where
    F: Fn(&dyn Lookup, &[Value]) -> Result<Value> + Send + Sync + 'static,
{
    Member::Method(Arc::new(f))
}
