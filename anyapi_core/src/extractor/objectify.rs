//! XML exposed as an object: the root's child elements are attributes.
//!
//! ```xml
//! <xml><test>123</test></xml>
//! ```
//!
//! gives `test == 123` and `not_test == null`. No queries are taken; the
//! facade falls back to [`Extractor::proxy`] for every name it is asked.

use serde_json::{Map, Value};
use sxd_document::Package;
use sxd_document::dom::{ChildOfElement, ChildOfRoot, Element};

use super::xpath::strip_encoding;
use super::{Extractor, Source, tree};
use crate::error::{Error, Result};
use crate::extraction::Extraction;
use crate::query::Query;

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectifyExtractor;

fn root_element(package: &Package) -> Option<Element<'_>> {
    package
        .as_document()
        .root()
        .children()
        .into_iter()
        .find_map(|child| match child {
            ChildOfRoot::Element(element) => Some(element),
            _ => None,
        })
}

fn child_elements<'d>(element: &Element<'d>) -> Vec<Element<'d>> {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Element(element) => Some(element),
            _ => None,
        })
        .collect()
}

fn text_of(element: &Element<'_>) -> String {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Text(text) => Some(text.text().to_string()),
            _ => None,
        })
        .collect()
}

/// Leaf text typed the way objectify does it.
fn typed(text: &str) -> Value {
    let trimmed = text.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    match trimmed {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(text.to_string()),
    }
}

fn to_value(element: &Element<'_>) -> Value {
    let children = child_elements(element);
    if children.is_empty() {
        return typed(&text_of(element));
    }

    let mut map = Map::new();
    for child in &children {
        let name = child.name().local_part().to_string();
        let value = to_value(child);
        match map.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(name, value);
            }
        }
    }
    Value::Object(map)
}

impl Extractor for ObjectifyExtractor {
    type Parsed = Package;
    type Compiled = ();

    fn format(&self) -> &'static str {
        "objectify"
    }

    fn compile(&self, query: &Query) -> Result<()> {
        Err(Error::invalid_query(
            self.format(),
            query.base(),
            "object facades take no queries; read attributes directly",
        ))
    }

    fn prepare<'a>(&self, content: &'a str) -> std::borrow::Cow<'a, str> {
        strip_encoding(content)
    }

    fn parse(&self, content: &str) -> Result<Package> {
        tree::parse_xml(content)
            .map_err(|_| Error::parse(self.format(), "XML data can not be parsed.", content))
    }

    fn evaluate(&self, _source: &Source<'_, Package>, _query: &()) -> Extraction {
        Extraction::Empty
    }

    fn proxy(&self, parsed: &Package, name: &str) -> Option<Extraction> {
        let value = root_element(parsed)
            .and_then(|root| {
                child_elements(&root)
                    .into_iter()
                    .find(|child| child.name().local_part() == name)
            })
            .map_or(Value::Null, |element| to_value(&element));
        Some(Extraction::Found(value))
    }
}
