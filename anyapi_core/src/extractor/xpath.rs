//! `XPath` over HTML and XML trees.
//!
//! Settings example:
//!
//! ```json
//! {
//!     "errors": {
//!         "base": "//ul[@class='alerts']/div",
//!         "children": "text()|*//text()"
//!     }
//! }
//! ```
//!
//! `children` runs against every node `base` selects; each node's matches are
//! concatenated into one string. `XPath` 1.0 only.

use serde_json::Value;
use std::borrow::Cow;
use sxd_document::Package;
use sxd_xpath::{Context, Value as XPathValue};

use super::{Extractor, Source, tree};
use crate::error::{Error, Result};
use crate::extraction::{Extraction, maybe_strip};
use crate::query::Query;

/// A validated `XPath` query.
#[derive(Debug, Clone)]
pub struct XPathQuery {
    base: String,
    children: Option<String>,
    structured: bool,
}

fn compile(format: &'static str, query: &Query) -> Result<XPathQuery> {
    let check = |expression: &str| {
        tree::validate_xpath(expression)
            .map_err(|reason| Error::invalid_query(format, expression, reason))
    };
    check(query.base())?;
    if let Some(children) = query.children() {
        check(children)?;
    }
    Ok(XPathQuery {
        base: query.base().to_string(),
        children: query.children().map(str::to_string),
        structured: query.is_structured(),
    })
}

fn evaluate(source: &Source<'_, Package>, query: &XPathQuery) -> Extraction {
    let document = source.parsed.as_document();
    let Some(result) = tree::run_xpath(&query.base, document.root().into()) else {
        return Extraction::Empty;
    };

    if !query.structured {
        return tree::to_extraction(result);
    }

    // Structured results are always sequences.
    let nodes = match result {
        XPathValue::Nodeset(nodes) => nodes.document_order(),
        scalar => {
            return match query.children {
                Some(_) => Extraction::Empty,
                None => Extraction::Found(Value::Array(vec![tree::scalar_to_json(&scalar)])),
            };
        }
    };
    if nodes.is_empty() {
        return Extraction::Empty;
    }

    let items = match &query.children {
        None => nodes
            .iter()
            .map(|node| Value::String(node.string_value()))
            .collect(),
        Some(children) => {
            let Some(xpath) = tree::compile_xpath(children) else {
                return Extraction::Empty;
            };
            let context = Context::new();
            nodes
                .into_iter()
                .map(|node| {
                    let joined = tree::eval_xpath(&xpath, &context, node)
                        .map(|value| tree::joined_text(&value))
                        .unwrap_or_default();
                    maybe_strip(Value::String(joined), source.strip)
                })
                .collect()
        }
    };
    Extraction::Found(Value::Array(items))
}

/// Forgiving HTML parsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl Extractor for HtmlExtractor {
    type Parsed = Package;
    type Compiled = XPathQuery;

    fn format(&self) -> &'static str {
        "html"
    }

    fn empty_result(&self) -> Value {
        Value::String(String::new())
    }

    fn compile(&self, query: &Query) -> Result<XPathQuery> {
        compile(self.format(), query)
    }

    fn parse(&self, content: &str) -> Result<Package> {
        tree::parse_html(content)
            .ok_or_else(|| Error::parse(self.format(), "HTML data can not be parsed.", content))
    }

    fn evaluate(&self, source: &Source<'_, Package>, query: &XPathQuery) -> Extraction {
        evaluate(source, query)
    }
}

/// Strict XML parsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlExtractor;

/// Drop literal UTF-8 encoding declarations; the content is already text.
pub(crate) fn strip_encoding(content: &str) -> Cow<'_, str> {
    if content.contains("encoding=\"UTF-8\"") || content.contains("encoding=\"utf-8\"") {
        Cow::Owned(
            content
                .replace("encoding=\"UTF-8\"", "")
                .replace("encoding=\"utf-8\"", ""),
        )
    } else {
        Cow::Borrowed(content)
    }
}

impl Extractor for XmlExtractor {
    type Parsed = Package;
    type Compiled = XPathQuery;

    fn format(&self) -> &'static str {
        "xml"
    }

    fn empty_result(&self) -> Value {
        Value::String(String::new())
    }

    fn compile(&self, query: &Query) -> Result<XPathQuery> {
        compile(self.format(), query)
    }

    fn prepare<'a>(&self, content: &'a str) -> Cow<'a, str> {
        strip_encoding(content)
    }

    fn parse(&self, content: &str) -> Result<Package> {
        tree::parse_xml(content).map_err(|detail| {
            tracing::debug!(%detail, "xml rejected");
            Error::parse(self.format(), "XML data can not be parsed.", content)
        })
    }

    fn evaluate(&self, source: &Source<'_, Package>, query: &XPathQuery) -> Extraction {
        evaluate(source, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HTML: &str = r#"
        <ul class="alerts">
            <div><b>Error</b> one</div>
            <div>  two  </div>
        </ul>
        <p>first</p><p>second</p>
    "#;

    fn run<E: Extractor<Parsed = Package, Compiled = XPathQuery>>(
        extractor: &E,
        content: &str,
        query: &Query,
        strip: bool,
    ) -> Extraction {
        let parsed = extractor.parse(content).unwrap();
        let compiled = extractor.compile(query).unwrap();
        let source = Source { raw: content, parsed: &parsed, strip };
        extractor.evaluate(&source, &compiled)
    }

    #[test]
    fn simple_node_set_becomes_string_array() {
        let result = run(&HtmlExtractor, HTML, &Query::from("//p"), false);
        assert_eq!(result, Extraction::Found(json!(["first", "second"])));
    }

    #[test]
    fn string_function_returns_scalar() {
        let result = run(&HtmlExtractor, HTML, &Query::from("string(//p)"), false);
        assert_eq!(result, Extraction::Found(json!("first")));
    }

    #[test]
    fn empty_selection_is_empty() {
        let result = run(&HtmlExtractor, HTML, &Query::from("//table"), false);
        assert_eq!(result, Extraction::Empty);
    }

    #[test]
    fn children_are_joined_per_node() {
        let query = Query::structured("//ul[@class='alerts']/div", Some("text()|*//text()"));
        let result = run(&HtmlExtractor, HTML, &query, false);
        assert_eq!(result, Extraction::Found(json!(["Error one", "  two  "])));

        let stripped = run(&HtmlExtractor, HTML, &query, true);
        assert_eq!(stripped, Extraction::Found(json!(["Error one", "two"])));
    }

    #[test]
    fn children_run_against_every_selected_node() {
        let content = r#"<r><i id="a"/><i id="b"/><i/><i id="d"/></r>"#;
        let query = Query::structured("//i", Some("string(@id)"));
        let result = run(&XmlExtractor, content, &query, false);
        assert_eq!(result, Extraction::Found(json!(["a", "b", "", "d"])));
    }

    #[test]
    fn structured_scalar_base_is_a_sequence() {
        let query = Query::structured("count(//p)", None);
        let result = run(&HtmlExtractor, HTML, &query, false);
        assert_eq!(result, Extraction::Found(json!([2.0])));
    }

    #[test]
    fn structured_empty_base_is_empty() {
        let query = Query::structured("//table", Some("text()"));
        assert_eq!(run(&HtmlExtractor, HTML, &query, false), Extraction::Empty);
    }

    #[test]
    fn xml_encoding_declaration_is_removed() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?><root><a>1</a></root>"#;
        let prepared = XmlExtractor.prepare(content);
        assert!(!prepared.contains("encoding"));
        let result = run(&XmlExtractor, &prepared, &Query::from("string(/root/a)"), false);
        assert_eq!(result, Extraction::Found(json!("1")));
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = XmlExtractor.parse("<root><a></root>").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn bad_xpath_is_rejected_at_compile_time() {
        let err = HtmlExtractor.compile(&Query::from("//p[")).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery { format: "html", .. }));
    }
}
