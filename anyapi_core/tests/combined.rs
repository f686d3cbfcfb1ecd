//! Combined facades: ordered fallback over several formats.

use std::sync::Arc;

use anyapi_core::{
    Build, CombinedFacadeFactory, Error, JsonFactory, Lookup, Query, QuerySpec, RegexFactory,
};
use serde_json::{Value, json};

fn dummy() -> CombinedFacadeFactory {
    let json = JsonFactory::new([("success", "container > test")].into_iter().collect()).unwrap();
    let regex = RegexFactory::new([("test", "href='(.*)'")].into_iter().collect()).unwrap();

    (json & regex)
        .property("combined", |facade| {
            let success = facade.get("success")?;
            Ok(json!(format!("123-{}", success.as_str().unwrap_or_default())))
        })
        .method("method", |facade, args| {
            let success = facade.get("success")?;
            let suffix = args.first().and_then(Value::as_str).unwrap_or_default();
            Ok(json!(format!("{}{suffix}", success.as_str().unwrap_or_default())))
        })
}

fn empty_values() -> CombinedFacadeFactory {
    let regex = RegexFactory::new([("test", r"\d,\d")].into_iter().collect()).unwrap();
    let json = JsonFactory::new(
        [
            ("test", Query::structured("container > test", None)),
            ("second", Query::structured("container > fail > 1", None)),
            ("third", Query::structured("container", Some("0"))),
            ("null", Query::structured("container", None)),
        ]
        .into_iter()
        .collect(),
    )
    .unwrap();
    CombinedFacadeFactory::new().with_part(regex).with_part(json)
}

#[test]
fn test_first_declaring_part_wins() {
    let facade = dummy().parse(r#"{"container": {"test": "value"}}"#);

    assert_eq!(facade.get("success").unwrap(), json!("value"));
    assert_eq!(facade.get("combined").unwrap(), json!("123-value"));
    assert_eq!(facade.call("method", &[json!("_x")]).unwrap(), json!("value_x"));
    assert_eq!(facade.get("test").unwrap(), Value::Null);
}

#[test]
fn test_unparseable_parts_are_passed_over() {
    let facade = dummy().parse("<a href='link'>");

    assert_eq!(facade.get("test").unwrap(), json!("link"));
    assert_eq!(facade.get("success").unwrap(), Value::Null);
}

#[test]
fn test_empty_results_fall_through() {
    let facade = empty_values().parse(r#"{"container": {"test": "value", "fail": [1]}}"#);

    assert_eq!(facade.get("test").unwrap(), json!("value"));
    assert_eq!(facade.get("second").unwrap(), Value::Null);

    let facade = empty_values().parse(r#"{"container": {"test": "1,2"}}"#);
    assert_eq!(facade.get("test").unwrap(), json!("1,2"));
}

#[test]
fn test_structured_children_through_combination() {
    let facade = empty_values().parse(r#"{"container": [[1, 2], [3]]}"#);

    assert_eq!(facade.get("third").unwrap(), json!([1, 3]));
    assert_eq!(facade.get("null").unwrap(), json!([[1, 2], [3]]));
}

#[test]
fn test_undeclaring_parts_are_never_built() {
    let regex = RegexFactory::new([("b", "b+")].into_iter().collect()).unwrap();
    let json = JsonFactory::new([("a", "a")].into_iter().collect()).unwrap();
    let facade = (regex & json).parse(r#"{"a": 1}"#);

    assert_eq!(facade.get("a").unwrap(), json!(1));
    assert_eq!(facade.built_parts(), 1);
    assert_eq!(facade.get("a").unwrap(), json!(1));
    assert_eq!(facade.built_parts(), 1);
}

#[test]
fn test_unknown_attribute_is_empty() {
    let facade = dummy().parse("{}");

    assert_eq!(facade.get("nothing").unwrap(), Value::Null);
    assert!(matches!(facade.call("nothing", &[]), Err(Error::UnknownAttribute(_))));
    assert!(matches!(facade.get("method"), Err(Error::NotAProperty(_))));
}

#[test]
fn test_attributes_keep_duplicates() {
    let first = JsonFactory::new([("a", "a")].into_iter().collect()).unwrap();
    let second = RegexFactory::new([("a", "a"), ("b", "b")].into_iter().collect()).unwrap();
    let combined = first & second;

    assert_eq!(combined.attributes(), ["a", "a", "b"]);
    assert_eq!(Build::attributes(&combined), ["a", "a", "b"]);
}

#[test]
fn test_chained_composition_is_flat() {
    let a = JsonFactory::new(QuerySpec::new()).unwrap();
    let b = RegexFactory::new([("x", "x")].into_iter().collect()).unwrap();
    let c = JsonFactory::new([("y", "y")].into_iter().collect()).unwrap();

    let chained = a.clone() & b.clone() & c.clone();
    let listed = CombinedFacadeFactory::from_parts(vec![Arc::new(a), Arc::new(b), Arc::new(c)]);

    assert_eq!(chained.len(), 3);
    assert_eq!(chained.attributes(), listed.attributes());
}

#[test]
fn test_parse_all_merges_parts_in_order() {
    let regex = RegexFactory::new([("shared", "n"), ("digits", r"\d+")].into_iter().collect())
        .unwrap();
    let json = JsonFactory::new([("shared", "n")].into_iter().collect()).unwrap();
    let result = (regex & json)
        .property("own", |_| Ok(json!("mine")))
        .parse_all(r#"{"n": 7}"#)
        .unwrap();

    assert_eq!(
        Value::Object(result),
        json!({"own": "mine", "shared": 7, "digits": "7"})
    );
}

#[test]
fn test_ad_hoc_query_tries_every_part() {
    let facade = dummy().parse(r#"{"container": {"test": "value"}}"#);

    assert_eq!(facade.evaluate("container > test").unwrap(), json!("value"));
    assert_eq!(facade.evaluate("missing").unwrap(), Value::Null);
}
