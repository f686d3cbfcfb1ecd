//! JSON whose string leaves carry markup.
//!
//! ```json
//! { "p": "container > string(//p)" }
//! ```
//!
//! gets `"p_content"` from `{"container": "<p>p_content</p>"}`. Everything
//! left of the last `" > "` is a dict-path to the embedded document; the
//! rest is a query for the nested format. One nested facade is kept per
//! dict-path, so several queries into the same fragment share a parse.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};

use super::dict::{DictPath, map_children};
use super::{Extractor, HtmlExtractor, JsonExtractor, Source};
use crate::error::{Error, Result};
use crate::extraction::Extraction;
use crate::facade::{Facade, Lookup as _};
use crate::factory::Blueprint;
use crate::query::{DICT_LOOKUP, Query};

pub struct AjaxExtractor<N: Extractor = HtmlExtractor> {
    nested: Arc<Blueprint<N>>,
}

impl<N: Extractor> AjaxExtractor<N> {
    #[must_use]
    pub fn with_nested(nested: N) -> Self {
        Self {
            nested: Arc::new(Blueprint::bare(nested)),
        }
    }

    fn nested_value(&self, document: &AjaxDocument<N>, path: &DictPath, query: &str) -> Value {
        let facade = {
            let mut cache = document.nested.borrow_mut();
            if let Some(facade) = cache.get(path.as_str()) {
                trace!(path = path.as_str(), "nested facade cache hit");
                Rc::clone(facade)
            } else {
                let Extraction::Found(Value::String(fragment)) = path.walk(&document.data) else {
                    return self.nested.extractor.empty_result();
                };
                let facade = Rc::new(Facade::new(Arc::clone(&self.nested), &fragment));
                cache.insert(path.as_str().to_string(), Rc::clone(&facade));
                facade
            }
        };

        facade.evaluate(query).unwrap_or_else(|err| {
            debug!(path = path.as_str(), %err, "nested content rejected");
            self.nested.extractor.empty_result()
        })
    }
}

impl<N: Extractor + Default> Default for AjaxExtractor<N> {
    fn default() -> Self {
        Self::with_nested(N::default())
    }
}

impl<N: Extractor> std::fmt::Debug for AjaxExtractor<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AjaxExtractor")
            .field("nested", &self.nested.extractor.format())
            .finish()
    }
}

/// Decoded JSON plus the nested facades built from it so far.
pub struct AjaxDocument<N: Extractor> {
    data: Value,
    nested: RefCell<HashMap<String, Rc<Facade<N>>>>,
}

impl<N: Extractor> AjaxDocument<N> {
    /// Number of distinct fragments parsed so far.
    #[must_use]
    pub fn nested_count(&self) -> usize {
        self.nested.borrow().len()
    }
}

#[derive(Debug, Clone)]
pub struct AjaxQuery {
    path: DictPath,
    nested: String,
    children: Option<DictPath>,
}

impl<N: Extractor> Extractor for AjaxExtractor<N> {
    type Parsed = AjaxDocument<N>;
    type Compiled = AjaxQuery;

    fn format(&self) -> &'static str {
        "ajax"
    }

    fn compile(&self, query: &Query) -> Result<AjaxQuery> {
        let Some((path, nested)) = query.base().rsplit_once(DICT_LOOKUP) else {
            return Err(Error::invalid_query(
                self.format(),
                query.base(),
                format!("expected `<dict-path>{DICT_LOOKUP}<{} query>`", self.nested.extractor.format()),
            ));
        };
        self.nested.extractor.compile(&Query::from(nested))?;

        Ok(AjaxQuery {
            path: DictPath::new(path),
            nested: nested.to_string(),
            children: query.children().map(DictPath::new),
        })
    }

    fn parse(&self, content: &str) -> Result<AjaxDocument<N>> {
        let data = JsonExtractor.parse(content).map_err(|err| match err {
            Error::Parse { message, content, .. } => Error::Parse {
                format: self.format(),
                message,
                content,
            },
            other => other,
        })?;
        Ok(AjaxDocument {
            data,
            nested: RefCell::new(HashMap::new()),
        })
    }

    fn evaluate(&self, source: &Source<'_, AjaxDocument<N>>, query: &AjaxQuery) -> Extraction {
        let base = Extraction::Found(self.nested_value(source.parsed, &query.path, &query.nested));
        match &query.children {
            Some(children) => map_children(base, children, source.strip),
            None => base,
        }
    }
}
