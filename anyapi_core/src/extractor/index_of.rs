//! Substring probe: the query is a literal needle, the result whether the
//! content contains it.

use serde_json::Value;

use super::{Extractor, Source, simple_only};
use crate::error::Result;
use crate::extraction::Extraction;
use crate::query::Query;

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOfExtractor;

impl Extractor for IndexOfExtractor {
    type Parsed = ();
    type Compiled = String;

    fn format(&self) -> &'static str {
        "index_of"
    }

    fn compile(&self, query: &Query) -> Result<String> {
        simple_only(self.format(), query).map(str::to_string)
    }

    fn parse(&self, _content: &str) -> Result<()> {
        Ok(())
    }

    fn evaluate(&self, source: &Source<'_, ()>, needle: &String) -> Extraction {
        Extraction::Found(Value::Bool(source.raw.contains(needle.as_str())))
    }
}
