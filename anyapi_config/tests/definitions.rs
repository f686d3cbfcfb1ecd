//! Loading definitions from disk and building factories from them.

use std::io::Write;

use anyapi_config::{DefinitionFormat, FacadeConfig, NestedFormat};
use serde_json::{Value, json};
use tempfile::{Builder, TempDir};

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn test_load_json_definition() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "definition.json",
        r#"{
            "format": "json",
            "strip": true,
            "settings": {"test": "container > test"}
        }"#,
    );

    let factory = FacadeConfig::load(&path).unwrap().build().unwrap();
    let facade = factory.build(r#"{"container": {"test": " value "}}"#);

    assert_eq!(facade.get("test").unwrap(), json!("value"));
}

#[test]
fn test_load_yaml_definition_with_extends() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "definition.yml",
        "format: regex\n\
         flags: [ignore_case]\n\
         extends:\n\
         \x20 - {word: 'hello', number: '\\d+'}\n\
         settings:\n\
         \x20 word: 'WORLD'\n",
    );

    let config = FacadeConfig::load(&path).unwrap();
    assert_eq!(config.format(), "regex");

    let facade = config.build().unwrap().build("Hello world 42");
    assert_eq!(facade.get("word").unwrap(), json!("world"));
    assert_eq!(facade.get("number").unwrap(), json!("42"));
}

#[test]
fn test_structured_queries_in_definitions() {
    let config = FacadeConfig::from_str_with(
        DefinitionFormat::Json,
        r#"{
            "format": "json",
            "settings": {
                "names": {"base": "users", "children": "name"},
                "first": "users > 0 > name"
            }
        }"#,
    )
    .unwrap();

    let facade = config
        .build()
        .unwrap()
        .build(r#"{"users": [{"name": "a"}, {"name": "b"}]}"#);
    assert_eq!(facade.get("names").unwrap(), json!(["a", "b"]));
    assert_eq!(facade.get("first").unwrap(), json!("a"));
}

#[test]
fn test_combined_definition() {
    let config = FacadeConfig::from_str_with(
        DefinitionFormat::Yaml,
        "format: combined\n\
         parts:\n\
         \x20 - format: json\n\
         \x20   settings: {id: id}\n\
         \x20 - format: regex\n\
         \x20   settings: {id: 'id=(\\d+)'}\n",
    )
    .unwrap();
    let factory = config.build().unwrap();

    assert_eq!(factory.attributes(), ["id", "id"]);
    assert_eq!(factory.build(r#"{"id": 7}"#).get("id").unwrap(), json!(7));
    assert_eq!(factory.build("?id=12").get("id").unwrap(), json!("12"));
}

#[test]
fn test_ajax_nested_format() {
    let config = FacadeConfig::from_str_with(
        DefinitionFormat::Json,
        r#"{"format": "ajax", "nested": "xml", "settings": {"b": "doc > string(//b)"}}"#,
    )
    .unwrap();
    assert!(matches!(
        config,
        FacadeConfig::Ajax {
            nested: NestedFormat::Xml,
            ..
        }
    ));

    let facade = config.build().unwrap().build(r#"{"doc": "<a><b>x</b></a>"}"#);
    assert_eq!(facade.get("b").unwrap(), json!("x"));
}

#[test]
fn test_csv_dialect() {
    let config = FacadeConfig::from_str_with(
        DefinitionFormat::Json,
        r#"{"format": "csv", "dialect": {"delimiter": ";"}, "settings": {"cell": "1:-1"}}"#,
    )
    .unwrap();

    let facade = config.build().unwrap().build("a;b;c\nd;e;f");
    assert_eq!(facade.get("cell").unwrap(), json!("f"));

    let wide = FacadeConfig::from_str_with(
        DefinitionFormat::Json,
        r#"{"format": "csv", "dialect": {"delimiter": "→"}}"#,
    )
    .unwrap();
    assert!(wide.build().is_err());
}

#[test]
fn test_invalid_query_fails_build() {
    let config = FacadeConfig::from_str_with(
        DefinitionFormat::Json,
        r#"{"format": "xml", "settings": {"bad": "//["}}"#,
    )
    .unwrap();

    let err = config.build().err().unwrap();
    assert!(err.to_string().contains("xml"));
}

#[test]
fn test_unknown_format_is_rejected() {
    assert!(FacadeConfig::from_str_with(DefinitionFormat::Json, r#"{"format": "toml"}"#).is_err());
    assert!(DefinitionFormat::from_path(std::path::Path::new("definition.toml")).is_err());
}

#[test]
fn test_create_template_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("definition.yaml");

    FacadeConfig::create_template(&path).unwrap();
    let config = FacadeConfig::load(&path).unwrap();
    assert_eq!(config.format(), "combined");

    let facade = config
        .build()
        .unwrap()
        .build(r#"{"title": "From JSON", "tags": ["x"]}"#);
    assert_eq!(facade.get("title").unwrap(), json!("From JSON"));
    assert_eq!(facade.get("first_tag").unwrap(), json!("x"));
    assert_eq!(facade.get("links").unwrap(), Value::Null);

    assert!(FacadeConfig::create_template(&path).is_err());
}

#[test]
fn test_template_round_trips_through_json() {
    let file = Builder::new().suffix(".json").tempfile().unwrap();
    let path = file.path().to_path_buf();
    drop(file);

    FacadeConfig::create_template(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();

    assert_eq!(value["format"], json!("combined"));
    assert_eq!(value["parts"][1]["settings"]["links"]["children"], json!("@href"));
}
