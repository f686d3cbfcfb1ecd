//! Per-format parse + evaluate strategies.
//!
//! An [`Extractor`] owns two steps: turning raw content into a parsed
//! representation (run at most once per facade, the only step allowed to
//! fail on bad content) and running one compiled query against it. Queries
//! are compiled when a factory is built, so malformed configuration is
//! rejected before any content is seen.

use serde_json::Value;
use std::borrow::Cow;

use crate::error::Result;
use crate::extraction::Extraction;
use crate::query::Query;

pub mod ajax;
pub mod delimited;
pub mod dict;
pub mod index_of;
pub mod objectify;
pub mod pattern;
mod tree;
pub mod xpath;

pub use ajax::AjaxExtractor;
pub use delimited::{CsvDialect, CsvExtractor};
pub use dict::{DictPath, JsonExtractor, YamlExtractor};
pub use index_of::IndexOfExtractor;
pub use objectify::ObjectifyExtractor;
pub use pattern::{RegexExtractor, RegexFlags};
pub use xpath::{HtmlExtractor, XmlExtractor};

/// What an extractor sees when evaluating a query.
#[derive(Debug)]
pub struct Source<'a, P> {
    /// The content as handed to the facade, after [`Extractor::prepare`].
    pub raw: &'a str,
    pub parsed: &'a P,
    /// Whether textual results should be trimmed.
    pub strip: bool,
}

pub trait Extractor: Send + Sync + 'static {
    type Parsed: 'static;
    type Compiled: Send + Sync + 'static;

    /// Short label used in errors and logs.
    fn format(&self) -> &'static str;

    /// What the sentinel surfaces as for this format.
    fn empty_result(&self) -> Value {
        Value::Null
    }

    /// Validate and pre-process a query.
    fn compile(&self, query: &Query) -> Result<Self::Compiled>;

    /// Hook to transform content before it is stored on the facade.
    fn prepare<'a>(&self, content: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(content)
    }

    fn parse(&self, content: &str) -> Result<Self::Parsed>;

    /// Run a compiled query. Never fails: a query that matches nothing, or
    /// walks into something it cannot traverse, yields [`Extraction::Empty`].
    fn evaluate(&self, source: &Source<'_, Self::Parsed>, query: &Self::Compiled) -> Extraction;

    /// Attribute-miss fallback for formats that expose the parsed tree
    /// directly. `None` means the format has no such fallback.
    fn proxy(&self, _parsed: &Self::Parsed, _name: &str) -> Option<Extraction> {
        None
    }
}

/// Reject structured queries for formats with no children semantics.
pub(crate) fn simple_only<'q>(format: &'static str, query: &'q Query) -> Result<&'q str> {
    match query {
        Query::Simple(query) => Ok(query),
        Query::Structured { base, .. } => Err(crate::Error::invalid_query(
            format,
            base.clone(),
            "structured queries are not supported by this format",
        )),
    }
}
