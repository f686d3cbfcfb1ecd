//! Several factories over the same content, resolved with ordered fallback.
//!
//! An attribute goes to the first underlying facade that declares it and
//! produces something other than its empty result. Facades that fail to
//! parse, or fail the lookup, are passed over. Underlying facades are only
//! built when a lookup first reaches them.

use serde_json::{Map, Value};
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::ops::BitAnd;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::extraction::Extraction;
use crate::facade::{Lookup, materialize};
use crate::factory::Build;
use crate::member::{self, Member, Members};

/// Ordered list of factories; earlier ones take precedence.
#[derive(Clone, Default)]
pub struct CombinedFacadeFactory {
    parts: Vec<Arc<dyn Build>>,
    members: Members,
}

impl CombinedFacadeFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_parts(parts: Vec<Arc<dyn Build>>) -> Self {
        Self {
            parts,
            members: Members::new(),
        }
    }

    /// Append a factory with the lowest precedence so far.
    #[must_use]
    pub fn with_part(mut self, part: impl Build + 'static) -> Self {
        self.parts.push(Arc::new(part));
        self
    }

    pub fn push(&mut self, part: Arc<dyn Build>) {
        self.parts.push(part);
    }

    #[must_use]
    pub fn property<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&dyn Lookup) -> Result<Value> + Send + Sync + 'static,
    {
        self.members.register(name, member::property(f));
        self
    }

    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&dyn Lookup, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.members.register(name, member::method(f));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Own member names followed by every part's attributes, duplicates
    /// kept.
    #[must_use]
    pub fn attributes(&self) -> Vec<String> {
        self.members
            .names()
            .map(str::to_string)
            .chain(self.parts.iter().flat_map(|part| part.attributes()))
            .collect()
    }

    #[must_use]
    pub fn parse(&self, content: &str) -> CombinedFacade {
        CombinedFacade {
            content: content.to_string(),
            members: self.members.clone(),
            parts: self
                .parts
                .iter()
                .map(|factory| Part {
                    names: factory.attributes(),
                    factory: Arc::clone(factory),
                    facade: OnceCell::new(),
                })
                .collect(),
            values: RefCell::new(HashMap::new()),
        }
    }

    pub fn parse_all(&self, content: &str) -> Result<Map<String, Value>> {
        self.parse(content).parse_all()
    }
}

impl std::fmt::Debug for CombinedFacadeFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedFacadeFactory")
            .field("parts", &self.parts.len())
            .field("members", &self.members)
            .finish()
    }
}

impl Build for CombinedFacadeFactory {
    fn attributes(&self) -> Vec<String> {
        Self::attributes(self)
    }

    fn build(&self, content: &str) -> Box<dyn Lookup> {
        Box::new(self.parse(content))
    }
}

/// Chained composition appends, so `a & b & c` holds three parts.
impl<R: Build + 'static> BitAnd<R> for CombinedFacadeFactory {
    type Output = Self;

    fn bitand(self, rhs: R) -> Self {
        self.with_part(rhs)
    }
}

struct Part {
    factory: Arc<dyn Build>,
    names: Vec<String>,
    facade: OnceCell<Box<dyn Lookup>>,
}

impl Part {
    fn declares(&self, name: &str) -> bool {
        self.names.iter().any(|declared| declared == name)
    }

    fn facade(&self, content: &str) -> &dyn Lookup {
        self.facade
            .get_or_init(|| self.factory.build(content))
            .as_ref()
    }
}

pub struct CombinedFacade {
    content: String,
    members: Members,
    parts: Vec<Part>,
    values: RefCell<HashMap<String, Extraction>>,
}

impl CombinedFacade {
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of underlying facades built so far.
    #[must_use]
    pub fn built_parts(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| part.facade.get().is_some())
            .count()
    }

    fn walk(&self, name: &str) -> Extraction {
        for (index, part) in self.parts.iter().enumerate() {
            if !part.declares(name) {
                trace!(part = index, attribute = name, "not declared, skipping");
                continue;
            }
            let facade = part.facade(&self.content);
            match facade.lookup(name) {
                Ok(extraction) if !extraction.is_vacant(&facade.empty_result()) => {
                    return extraction;
                }
                Ok(_) => debug!(part = index, attribute = name, "empty, trying next part"),
                Err(err) => debug!(part = index, attribute = name, %err, "failed, trying next part"),
            }
        }
        Extraction::Empty
    }
}

impl Lookup for CombinedFacade {
    fn attributes(&self) -> Vec<String> {
        self.members
            .names()
            .map(str::to_string)
            .chain(self.parts.iter().flat_map(|part| part.names.iter().cloned()))
            .collect()
    }

    fn empty_result(&self) -> Value {
        Value::Null
    }

    fn lookup(&self, name: &str) -> Result<Extraction> {
        let cached = self.values.borrow().get(name).cloned();
        if let Some(hit) = cached {
            trace!(attribute = name, "attribute cache hit");
            return Ok(hit);
        }

        let extraction = match self.members.get(name) {
            Some(Member::Property(property)) => Extraction::Found(property(self)?),
            Some(Member::Method(_)) => return Err(Error::NotAProperty(name.to_string())),
            None => self.walk(name),
        };
        self.values
            .borrow_mut()
            .insert(name.to_string(), extraction.clone());
        Ok(extraction)
    }

    /// First part with a non-empty answer wins; parts that reject the query
    /// or the content are passed over.
    fn query(&self, query: &str) -> Result<Extraction> {
        for (index, part) in self.parts.iter().enumerate() {
            let facade = part.facade(&self.content);
            match facade.query(query) {
                Ok(extraction) if !extraction.is_vacant(&facade.empty_result()) => {
                    return Ok(extraction);
                }
                Ok(_) => trace!(part = index, query, "empty, trying next part"),
                Err(err) => debug!(part = index, query, %err, "failed, trying next part"),
            }
        }
        Ok(Extraction::Empty)
    }

    fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self.members.get(name) {
            Some(Member::Method(method)) => return method(self, args),
            Some(Member::Property(_)) => return Err(Error::NotAMethod(name.to_string())),
            None => {}
        }

        let mut last_error = None;
        for part in self.parts.iter().filter(|part| part.declares(name)) {
            match part.facade(&self.content).call(name, args) {
                Ok(value) => return Ok(value),
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or_else(|| Error::UnknownAttribute(name.to_string())))
    }

    /// Own properties first, then each part's results; later parts
    /// overwrite earlier ones.
    fn parse_all(&self) -> Result<Map<String, Value>> {
        let mut result = Map::new();
        for name in self.members.properties() {
            materialize(self, name, &mut result)?;
        }
        for part in &self.parts {
            result.extend(part.facade(&self.content).parse_all()?);
        }
        Ok(result)
    }
}

impl std::fmt::Debug for CombinedFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedFacade")
            .field("parts", &self.parts.len())
            .field("built", &self.built_parts())
            .finish_non_exhaustive()
    }
}
