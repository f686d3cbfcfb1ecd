//! Facades: one piece of content, its declared results exposed as lazily
//! computed, memoized attributes.

use serde_json::{Map, Value};
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::extraction::{Extraction, maybe_strip};
use crate::extractor::{Extractor, Source};
use crate::factory::Blueprint;
use crate::member::Member;
use crate::query::Query;

/// Name-based access to a facade, whatever its format.
pub trait Lookup {
    /// Declared result names plus extension member names.
    fn attributes(&self) -> Vec<String>;

    /// What the empty sentinel surfaces as.
    fn empty_result(&self) -> Value;

    /// Resolve an attribute, keeping the sentinel visible.
    fn lookup(&self, name: &str) -> Result<Extraction>;

    /// Run an ad-hoc query, keeping the sentinel visible.
    fn query(&self, query: &str) -> Result<Extraction>;

    /// Invoke a parametrized method member.
    fn call(&self, name: &str, args: &[Value]) -> Result<Value>;

    /// Every declared result and property member, by name.
    ///
    /// A member or query that fails contributes the empty result instead;
    /// only a parse error aborts the batch.
    fn parse_all(&self) -> Result<Map<String, Value>>;

    fn get(&self, name: &str) -> Result<Value> {
        Ok(self.lookup(name)?.into_value(self.empty_result()))
    }

    fn evaluate(&self, query: &str) -> Result<Value> {
        Ok(self.query(query)?.into_value(self.empty_result()))
    }
}

/// Resolve one name for bulk materialization.
pub(crate) fn materialize(
    facade: &dyn Lookup,
    name: &str,
    into: &mut Map<String, Value>,
) -> Result<()> {
    let value = match facade.get(name) {
        Ok(value) => value,
        Err(err) if err.is_parse() => return Err(err),
        Err(err) => {
            warn!(attribute = name, %err, "substituting empty result");
            facade.empty_result()
        }
    };
    into.insert(name.to_string(), value);
    Ok(())
}

pub struct Facade<E: Extractor> {
    blueprint: Arc<Blueprint<E>>,
    content: String,
    parsed: OnceCell<Result<E::Parsed>>,
    values: RefCell<HashMap<String, Extraction>>,
    queries: RefCell<HashMap<String, Extraction>>,
}

impl<E: Extractor> Facade<E> {
    pub(crate) fn new(blueprint: Arc<Blueprint<E>>, content: &str) -> Self {
        let content = blueprint.extractor.prepare(content).into_owned();
        Self {
            blueprint,
            content,
            parsed: OnceCell::new(),
            values: RefCell::new(HashMap::new()),
            queries: RefCell::new(HashMap::new()),
        }
    }

    /// The content this facade reads, after format preparation.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The parsed representation, built on first call. A parse failure is
    /// remembered and returned again rather than retried.
    pub fn parsed(&self) -> Result<&E::Parsed> {
        self.parsed
            .get_or_init(|| {
                let extractor = &self.blueprint.extractor;
                debug!(format = extractor.format(), bytes = self.content.len(), "parsing content");
                extractor.parse(&self.content)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    fn run(&self, compiled: &E::Compiled) -> Result<Extraction> {
        let parsed = self.parsed()?;
        let strip = self.blueprint.strip;
        let source = Source {
            raw: &self.content,
            parsed,
            strip,
        };
        Ok(self
            .blueprint
            .extractor
            .evaluate(&source, compiled)
            .map(|value| maybe_strip(value, strip)))
    }

    fn resolve(&self, name: &str) -> Result<Extraction> {
        if let Some(member) = self.blueprint.members.get(name) {
            return match member {
                Member::Property(property) => property(self).map(Extraction::Found),
                Member::Method(_) => Err(Error::NotAProperty(name.to_string())),
            };
        }
        if let Some(compiled) = self.blueprint.compiled.get(name) {
            return self.run(compiled);
        }

        let parsed = self.parsed()?;
        self.blueprint
            .extractor
            .proxy(parsed, name)
            .ok_or_else(|| Error::UnknownAttribute(name.to_string()))
    }
}

impl<E: Extractor> Lookup for Facade<E> {
    fn attributes(&self) -> Vec<String> {
        self.blueprint.attributes()
    }

    fn empty_result(&self) -> Value {
        self.blueprint.extractor.empty_result()
    }

    fn lookup(&self, name: &str) -> Result<Extraction> {
        let cached = self.values.borrow().get(name).cloned();
        if let Some(hit) = cached {
            trace!(attribute = name, "attribute cache hit");
            return Ok(hit);
        }

        let extraction = self.resolve(name)?;
        self.values
            .borrow_mut()
            .insert(name.to_string(), extraction.clone());
        Ok(extraction)
    }

    fn query(&self, query: &str) -> Result<Extraction> {
        let cached = self.queries.borrow().get(query).cloned();
        if let Some(hit) = cached {
            trace!(query, "query cache hit");
            return Ok(hit);
        }

        let compiled = self.blueprint.extractor.compile(&Query::from(query))?;
        let extraction = self.run(&compiled)?;
        self.queries
            .borrow_mut()
            .insert(query.to_string(), extraction.clone());
        Ok(extraction)
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self.blueprint.members.get(name) {
            Some(Member::Method(method)) => method(self, args),
            Some(Member::Property(_)) => Err(Error::NotAMethod(name.to_string())),
            None if self.blueprint.spec.contains(name) => Err(Error::NotAMethod(name.to_string())),
            None => Err(Error::UnknownAttribute(name.to_string())),
        }
    }

    fn parse_all(&self) -> Result<Map<String, Value>> {
        let mut result = Map::new();
        for name in self.blueprint.materialized() {
            materialize(self, &name, &mut result)?;
        }
        Ok(result)
    }
}

impl<E: Extractor> std::fmt::Debug for Facade<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Facade")
            .field("format", &self.blueprint.extractor.format())
            .field("parsed", &self.parsed.get().map(Result::is_ok))
            .field("cached", &self.values.borrow().len())
            .finish_non_exhaustive()
    }
}
