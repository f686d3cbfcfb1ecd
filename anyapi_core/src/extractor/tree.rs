//! Markup trees: HTML via `html5ever` converted into an `sxd` document,
//! strict XML via the `sxd` parser, and the `XPath` plumbing both share.

use html5ever::tendril::TendrilSink as _;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use serde_json::Value;
use sxd_document::Package;
use sxd_document::dom::{Document, Element};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value as XPathValue, XPath};
use tracing::debug;

use crate::extraction::Extraction;

/// Parse forgiving HTML. Only content with nothing in it is rejected.
pub fn parse_html(content: &str) -> Option<Package> {
    if content.trim().is_empty() {
        return None;
    }

    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(content);

    let package = Package::new();
    {
        let document = package.as_document();
        for child in dom.document.children.borrow().iter() {
            if let Some(element) = convert_element(&document, child) {
                document.root().append_child(element);
            }
        }
    }
    Some(package)
}

pub fn parse_xml(content: &str) -> Result<Package, String> {
    sxd_document::parser::parse(content).map_err(|err| format!("{err:?}"))
}

fn convert_element<'d>(document: &Document<'d>, handle: &Handle) -> Option<Element<'d>> {
    let NodeData::Element { name, attrs, .. } = &handle.data else {
        return None;
    };

    let element = document.create_element(&*name.local);
    for attr in attrs.borrow().iter() {
        element.set_attribute_value(&*attr.name.local, &attr.value);
    }

    for child in handle.children.borrow().iter() {
        match &child.data {
            NodeData::Element { .. } => {
                if let Some(nested) = convert_element(document, child) {
                    element.append_child(nested);
                }
            }
            NodeData::Text { contents } => {
                element.append_child(document.create_text(&contents.borrow()));
            }
            NodeData::Comment { contents } => {
                element.append_child(document.create_comment(contents));
            }
            _ => {}
        }
    }
    Some(element)
}

/// Check that an expression compiles.
pub fn validate_xpath(expression: &str) -> Result<(), String> {
    match Factory::new().build(expression) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err("empty expression".to_string()),
        Err(err) => Err(format!("{err:?}")),
    }
}

pub fn compile_xpath(expression: &str) -> Option<XPath> {
    Factory::new().build(expression).ok().flatten()
}

/// Evaluate a compiled expression with `node` as the context node.
/// Evaluation failures are treated as "nothing selected".
pub fn eval_xpath<'d>(
    xpath: &XPath,
    context: &Context<'d>,
    node: Node<'d>,
) -> Option<XPathValue<'d>> {
    match xpath.evaluate(context, node) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(?err, "xpath evaluation failed");
            None
        }
    }
}

/// Compile and evaluate `expression` once against `node`.
pub fn run_xpath<'d>(expression: &str, node: Node<'d>) -> Option<XPathValue<'d>> {
    let xpath = compile_xpath(expression)?;
    eval_xpath(&xpath, &Context::new(), node)
}

/// Raw result shape: node-sets become arrays of string values, scalars pass
/// through. An empty node-set selected nothing.
pub fn to_extraction(value: XPathValue<'_>) -> Extraction {
    match value {
        XPathValue::Nodeset(nodes) => {
            let items: Vec<Value> = nodes
                .document_order()
                .iter()
                .map(|node| Value::String(node.string_value()))
                .collect();
            if items.is_empty() {
                Extraction::Empty
            } else {
                Extraction::Found(Value::Array(items))
            }
        }
        scalar => Extraction::Found(scalar_to_json(&scalar)),
    }
}

/// Scalar results as JSON. A non-finite number, such as the `NaN` that
/// `number()` gives for non-numeric text, has no JSON form and becomes
/// `null`.
pub fn scalar_to_json(value: &XPathValue<'_>) -> Value {
    match value {
        XPathValue::Boolean(flag) => Value::Bool(*flag),
        XPathValue::Number(number) => {
            serde_json::Number::from_f64(*number).map_or(Value::Null, Value::Number)
        }
        XPathValue::String(text) => Value::String(text.clone()),
        XPathValue::Nodeset(_) => Value::String(joined_text(value)),
    }
}

/// Concatenate a result into one string, the way a children query's
/// matches are glued together.
pub fn joined_text(value: &XPathValue<'_>) -> String {
    match value {
        XPathValue::Nodeset(nodes) => nodes
            .document_order()
            .iter()
            .map(Node::string_value)
            .collect(),
        XPathValue::String(text) => text.clone(),
        XPathValue::Number(number) => number.to_string(),
        XPathValue::Boolean(flag) => flag.to_string(),
    }
}
