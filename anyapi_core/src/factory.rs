//! Factories: a query spec compiled once, then turned into a facade per
//! piece of content.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::ops::BitAnd;
use std::sync::Arc;
use tracing::debug;

use crate::combined::CombinedFacadeFactory;
use crate::error::Result;
use crate::extractor::{
    AjaxExtractor, CsvDialect, CsvExtractor, Extractor, HtmlExtractor, IndexOfExtractor,
    JsonExtractor, ObjectifyExtractor, RegexExtractor, RegexFlags, XmlExtractor, YamlExtractor,
};
use crate::facade::{Facade, Lookup};
use crate::member::{self, Members};
use crate::query::{Query, QuerySpec};

/// Object-safe view of any factory, so different formats can be combined.
pub trait Build: Send + Sync {
    /// Names facades from this factory answer to.
    fn attributes(&self) -> Vec<String>;

    fn build(&self, content: &str) -> Box<dyn Lookup>;
}

/// Everything a facade needs from its factory.
pub(crate) struct Blueprint<E: Extractor> {
    pub(crate) extractor: E,
    pub(crate) spec: QuerySpec,
    pub(crate) compiled: HashMap<String, E::Compiled>,
    pub(crate) members: Members,
    pub(crate) strip: bool,
}

impl<E: Extractor> Blueprint<E> {
    /// No declared results, no members, no stripping.
    pub(crate) fn bare(extractor: E) -> Self {
        Self {
            extractor,
            spec: QuerySpec::new(),
            compiled: HashMap::new(),
            members: Members::new(),
            strip: false,
        }
    }

    pub(crate) fn attributes(&self) -> Vec<String> {
        self.spec
            .names()
            .chain(self.members.names())
            .map(str::to_string)
            .collect()
    }

    /// Names bulk materialization covers: declared results and properties.
    pub(crate) fn materialized(&self) -> Vec<String> {
        self.spec
            .names()
            .chain(self.members.properties())
            .map(str::to_string)
            .collect()
    }
}

/// Collects configuration for a [`FacadeFactory`].
pub struct FactoryBuilder<E: Extractor> {
    extractor: E,
    spec: QuerySpec,
    members: Members,
    strip: bool,
}

impl<E: Extractor> FactoryBuilder<E> {
    #[must_use]
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            spec: QuerySpec::new(),
            members: Members::new(),
            strip: false,
        }
    }

    /// Merge a spec over what is already configured. Calling this once per
    /// ancestry level, most-base first, gives settings inheritance.
    #[must_use]
    pub fn settings(mut self, spec: QuerySpec) -> Self {
        self.spec.extend(spec);
        self
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, query: impl Into<Query>) -> Self {
        self.spec.insert(name, query);
        self
    }

    /// Trim whitespace around textual results.
    #[must_use]
    pub const fn strip(mut self, strip: bool) -> Self {
        self.strip = strip;
        self
    }

    /// Attach a memoized derived attribute.
    #[must_use]
    pub fn property<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&dyn Lookup) -> Result<Value> + Send + Sync + 'static,
    {
        self.members.register(name, member::property(f));
        self
    }

    /// Attach a method taking arguments.
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&dyn Lookup, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.members.register(name, member::method(f));
        self
    }

    /// Compile every declared query. Invalid queries fail here rather than
    /// on first access.
    pub fn build(self) -> Result<FacadeFactory<E>> {
        let compiled = self
            .spec
            .iter()
            .map(|(name, query)| Ok((name.to_string(), self.extractor.compile(query)?)))
            .collect::<Result<HashMap<_, _>>>()?;

        debug!(
            format = self.extractor.format(),
            queries = compiled.len(),
            members = ?self.members,
            "factory built"
        );

        Ok(FacadeFactory {
            blueprint: Arc::new(Blueprint {
                extractor: self.extractor,
                spec: self.spec,
                compiled,
                members: self.members,
                strip: self.strip,
            }),
        })
    }
}

impl FactoryBuilder<RegexExtractor> {
    #[must_use]
    pub const fn flags(mut self, flags: RegexFlags) -> Self {
        self.extractor = RegexExtractor::new(flags);
        self
    }
}

impl FactoryBuilder<CsvExtractor> {
    #[must_use]
    pub const fn dialect(mut self, dialect: CsvDialect) -> Self {
        self.extractor = CsvExtractor::new(dialect);
        self
    }
}

/// Reusable, format-specific builder of facades.
pub struct FacadeFactory<E: Extractor> {
    blueprint: Arc<Blueprint<E>>,
}

pub type HtmlFactory = FacadeFactory<HtmlExtractor>;
pub type XmlFactory = FacadeFactory<XmlExtractor>;
pub type ObjectifyFactory = FacadeFactory<ObjectifyExtractor>;
pub type JsonFactory = FacadeFactory<JsonExtractor>;
pub type YamlFactory = FacadeFactory<YamlExtractor>;
pub type AjaxFactory = FacadeFactory<AjaxExtractor>;
pub type RegexFactory = FacadeFactory<RegexExtractor>;
pub type CsvFactory = FacadeFactory<CsvExtractor>;
pub type IndexOfFactory = FacadeFactory<IndexOfExtractor>;

impl<E: Extractor + Default> FacadeFactory<E> {
    /// Start configuring a factory with the format's default options.
    #[must_use]
    pub fn configure(spec: QuerySpec) -> FactoryBuilder<E> {
        FactoryBuilder::new(E::default()).settings(spec)
    }

    pub fn new(spec: QuerySpec) -> Result<Self> {
        Self::configure(spec).build()
    }
}

impl<E: Extractor> FacadeFactory<E> {
    #[must_use]
    pub fn builder(extractor: E) -> FactoryBuilder<E> {
        FactoryBuilder::new(extractor)
    }

    #[must_use]
    pub fn attributes(&self) -> Vec<String> {
        self.blueprint.attributes()
    }

    /// The effective, merged spec.
    #[must_use]
    pub fn spec(&self) -> &QuerySpec {
        &self.blueprint.spec
    }

    #[must_use]
    pub fn extractor(&self) -> &E {
        &self.blueprint.extractor
    }

    #[must_use]
    pub fn strips(&self) -> bool {
        self.blueprint.strip
    }

    /// Wrap content in a facade. Nothing is parsed until an attribute or
    /// query is first read.
    #[must_use]
    pub fn parse(&self, content: &str) -> Facade<E> {
        Facade::new(Arc::clone(&self.blueprint), content)
    }

    /// Like [`Self::parse`]; invalid UTF-8 is replaced rather than rejected.
    #[must_use]
    pub fn parse_bytes(&self, content: &[u8]) -> Facade<E> {
        self.parse(&String::from_utf8_lossy(content))
    }

    pub fn parse_all(&self, content: &str) -> Result<Map<String, Value>> {
        self.parse(content).parse_all()
    }
}

impl<E: Extractor> Clone for FacadeFactory<E> {
    fn clone(&self) -> Self {
        Self {
            blueprint: Arc::clone(&self.blueprint),
        }
    }
}

impl<E: Extractor> std::fmt::Debug for FacadeFactory<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacadeFactory")
            .field("format", &self.blueprint.extractor.format())
            .field("spec", &self.blueprint.spec)
            .field("members", &self.blueprint.members)
            .field("strip", &self.blueprint.strip)
            .finish()
    }
}

impl<E: Extractor> Build for FacadeFactory<E> {
    fn attributes(&self) -> Vec<String> {
        self.blueprint.attributes()
    }

    fn build(&self, content: &str) -> Box<dyn Lookup> {
        Box::new(self.parse(content))
    }
}

impl<E: Extractor, R: Build + 'static> BitAnd<R> for FacadeFactory<E> {
    type Output = CombinedFacadeFactory;

    fn bitand(self, rhs: R) -> CombinedFacadeFactory {
        CombinedFacadeFactory::new().with_part(self).with_part(rhs)
    }
}
