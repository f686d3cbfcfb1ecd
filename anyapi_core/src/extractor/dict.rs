//! Dict-path lookups over decoded JSON and YAML.
//!
//! A path is a list of segments joined by `" > "`:
//!
//! ```json
//! { "external_id": "container > id" }
//! ```
//!
//! gets `"123"` from `{"container": {"id": "123"}}`. Segments into a mapping
//! are keys; anything else is indexed by integer (negative counts from the
//! end). Traversal stops and hands back the current value as soon as it is
//! falsy.

use serde_json::Value;

use super::{Extractor, Source};
use crate::error::{Error, Result};
use crate::extraction::{Extraction, maybe_strip, resolve_index, truthy};
use crate::query::{DICT_LOOKUP, Query};

/// A parsed `a > b > 0` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictPath {
    source: String,
    segments: Vec<String>,
}

impl DictPath {
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            source: path.to_string(),
            segments: path
                .split(DICT_LOOKUP)
                .map(|segment| segment.trim().to_string())
                .collect(),
        }
    }

    /// The path exactly as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn walk(&self, target: &Value) -> Extraction {
        walk(target, &self.segments)
    }
}

fn walk(target: &Value, segments: &[String]) -> Extraction {
    let Some((segment, rest)) = segments.split_first() else {
        return Extraction::Found(target.clone());
    };
    if !truthy(target) {
        return Extraction::Found(target.clone());
    }

    match target {
        Value::Object(map) => map
            .get(segment)
            .map_or(Extraction::Empty, |next| walk(next, rest)),
        Value::Array(items) => index(segment, items.len())
            .map_or(Extraction::Empty, |i| walk(&items[i], rest)),
        Value::String(text) => {
            let chars: Vec<char> = text.chars().collect();
            index(segment, chars.len()).map_or(Extraction::Empty, |i| {
                walk(&Value::String(chars[i].to_string()), rest)
            })
        }
        _ => Extraction::Empty,
    }
}

fn index(segment: &str, len: usize) -> Option<usize> {
    resolve_index(segment.parse().ok()?, len)
}

/// Items a children query maps over: sequence elements, mapping keys or
/// string characters.
fn elements(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => Some(map.into_iter().map(|(key, _)| Value::String(key)).collect()),
        Value::String(text) => Some(
            text.chars()
                .map(|c| Value::String(c.to_string()))
                .collect(),
        ),
        _ => None,
    }
}

/// Apply `children` to every element of a structured base result.
/// Falsy per-element results become `null`.
pub(crate) fn map_children(
    base: Extraction,
    children: &DictPath,
    strip: bool,
) -> Extraction {
    let Extraction::Found(value) = base else {
        return Extraction::Empty;
    };
    if !truthy(&value) {
        return Extraction::Empty;
    }
    let Some(items) = elements(value) else {
        return Extraction::Empty;
    };

    let mapped = items
        .iter()
        .map(|item| match children.walk(item) {
            Extraction::Found(found) if truthy(&found) => maybe_strip(found, strip),
            _ => Value::Null,
        })
        .collect();
    Extraction::Found(Value::Array(mapped))
}

/// A compiled dict-path query.
#[derive(Debug, Clone)]
pub struct DictQuery {
    base: DictPath,
    children: Option<DictPath>,
}

impl DictQuery {
    #[must_use]
    pub fn new(query: &Query) -> Self {
        Self {
            base: DictPath::new(query.base()),
            children: query.children().map(DictPath::new),
        }
    }

    fn evaluate(&self, data: &Value, strip: bool) -> Extraction {
        let base = self.base.walk(data);
        match &self.children {
            Some(children) => map_children(base, children, strip),
            None => base,
        }
    }
}

/// JSON content.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

impl Extractor for JsonExtractor {
    type Parsed = Value;
    type Compiled = DictQuery;

    fn format(&self) -> &'static str {
        "json"
    }

    fn compile(&self, query: &Query) -> Result<DictQuery> {
        Ok(DictQuery::new(query))
    }

    fn parse(&self, content: &str) -> Result<Value> {
        serde_json::from_str(content).map_err(|err| {
            tracing::debug!(%err, "json rejected");
            Error::parse(self.format(), "JSON data can not be parsed.", content)
        })
    }

    fn evaluate(&self, source: &Source<'_, Value>, query: &DictQuery) -> Extraction {
        query.evaluate(source.parsed, source.strip)
    }
}

/// YAML content, decoded into the same value model as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlExtractor;

impl Extractor for YamlExtractor {
    type Parsed = Value;
    type Compiled = DictQuery;

    fn format(&self) -> &'static str {
        "yaml"
    }

    fn compile(&self, query: &Query) -> Result<DictQuery> {
        Ok(DictQuery::new(query))
    }

    fn parse(&self, content: &str) -> Result<Value> {
        serde_yaml::from_str(content).map_err(|err| {
            tracing::debug!(%err, "yaml rejected");
            Error::parse(self.format(), "YAML data can not be parsed.", content)
        })
    }

    fn evaluate(&self, source: &Source<'_, Value>, query: &DictQuery) -> Extraction {
        query.evaluate(source.parsed, source.strip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn get(path: &str, data: &Value) -> Extraction {
        DictPath::new(path).walk(data)
    }

    #[test]
    fn nested_key_lookup() {
        let data = json!({"container": {"id": "123"}});
        assert_eq!(get("container > id", &data), Extraction::Found(json!("123")));
    }

    #[test]
    fn segments_are_trimmed() {
        let data = json!({"container": [10, 20]});
        assert_eq!(get("container >  1 ", &data), Extraction::Found(json!(20)));
    }

    #[test]
    fn missing_key_and_bad_index_are_empty() {
        let data = json!({"container": {"fail": [1]}});
        assert_eq!(get("container > nope", &data), Extraction::Empty);
        assert_eq!(get("container > fail > 1", &data), Extraction::Empty);
        assert_eq!(get("container > fail > x", &data), Extraction::Empty);
        assert_eq!(get("container > fail > 0 > 0", &data), Extraction::Empty);
    }

    #[test]
    fn negative_index_and_string_indexing() {
        let data = json!({"items": ["ab", "cd"]});
        assert_eq!(get("items > -1", &data), Extraction::Found(json!("cd")));
        assert_eq!(get("items > 0 > 1", &data), Extraction::Found(json!("b")));
    }

    #[test]
    fn falsy_intermediate_short_circuits() {
        let data = json!({"count": 0, "list": [], "none": null});
        assert_eq!(get("count > anything", &data), Extraction::Found(json!(0)));
        assert_eq!(get("list > 0", &data), Extraction::Found(json!([])));
        assert_eq!(get("none > deeper", &data), Extraction::Found(Value::Null));
        assert_eq!(get("a", &json!({})), Extraction::Found(json!({})));
    }

    #[test]
    fn children_map_over_elements() {
        let data = json!({"container": [["a", "b"], ["c"], [], "xy"]});
        let query = DictQuery::new(&Query::structured("container", Some("0")));
        assert_eq!(
            query.evaluate(&data, false),
            Extraction::Found(json!(["a", "c", null, "x"]))
        );
    }

    #[test]
    fn children_over_empty_base_is_empty() {
        let data = json!({"container": []});
        let query = DictQuery::new(&Query::structured("container", Some("0")));
        assert_eq!(query.evaluate(&data, false), Extraction::Empty);

        let missing = DictQuery::new(&Query::structured("nope", Some("0")));
        assert_eq!(missing.evaluate(&data, false), Extraction::Empty);
    }

    #[test]
    fn structured_without_children_returns_base_as_is() {
        let data = json!({"container": []});
        let query = DictQuery::new(&Query::structured("container", None));
        assert_eq!(query.evaluate(&data, false), Extraction::Found(json!([])));
    }

    #[test]
    fn children_strip_each_element() {
        let data = json!({"rows": [{"name": " a "}, {"name": "b "}]});
        let query = DictQuery::new(&Query::structured("rows", Some("name")));
        assert_eq!(query.evaluate(&data, true), Extraction::Found(json!(["a", "b"])));
    }

    #[test]
    fn yaml_decodes_into_the_same_model() {
        let parsed = YamlExtractor.parse("container:\n  test: value\n").unwrap();
        assert_eq!(parsed, json!({"container": {"test": "value"}}));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = JsonExtractor.parse("not json").unwrap_err();
        match err {
            Error::Parse { format, content, .. } => {
                assert_eq!(format, "json");
                assert_eq!(content, "not json");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
