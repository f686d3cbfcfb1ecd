#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Declarative, lazily evaluated extraction over HTML, XML, JSON, YAML,
//! CSV and plain text.
//!
//! A [`FacadeFactory`] is configured once with named queries; every piece
//! of content it parses becomes a facade whose attributes are computed on
//! first access and memoized.
//!
//! ```
//! use anyapi_core::{JsonFactory, Lookup, QuerySpec};
//! use serde_json::json;
//!
//! let factory = JsonFactory::new(QuerySpec::new().with("test", "container > test")).unwrap();
//! let facade = factory.parse(r#"{"container": {"test": "value"}}"#);
//! assert_eq!(facade.get("test").unwrap(), json!("value"));
//! ```

pub mod combined;
pub mod error;
pub mod extraction;
pub mod extractor;
pub mod facade;
pub mod factory;
pub mod member;
pub mod query;

pub use combined::{CombinedFacade, CombinedFacadeFactory};
pub use error::{Error, Result};
pub use extraction::Extraction;
pub use extractor::{
    AjaxExtractor, CsvDialect, CsvExtractor, DictPath, Extractor, HtmlExtractor, IndexOfExtractor,
    JsonExtractor, ObjectifyExtractor, RegexExtractor, RegexFlags, Source, XmlExtractor,
    YamlExtractor,
};
pub use facade::{Facade, Lookup};
pub use factory::{
    AjaxFactory, Build, CsvFactory, FacadeFactory, FactoryBuilder, HtmlFactory, IndexOfFactory,
    JsonFactory, ObjectifyFactory, RegexFactory, XmlFactory, YamlFactory,
};
pub use member::{Member, Members};
pub use query::{DICT_LOOKUP, Query, QuerySpec};
