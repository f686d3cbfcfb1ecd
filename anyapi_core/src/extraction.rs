//! The empty-result sentinel and the value helpers shared by every format.

use serde_json::Value;

/// Outcome of running one query.
///
/// `Empty` is distinct from any value a format can produce, including
/// `null`, so "matched nothing" never collides with a legitimate null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Found(Value),
    Empty,
}

impl Extraction {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Surface the sentinel as the format's configured empty result.
    #[must_use]
    pub fn into_value(self, empty_result: Value) -> Value {
        match self {
            Self::Found(value) => value,
            Self::Empty => empty_result,
        }
    }

    /// True when this contributes nothing: the sentinel itself, or a value
    /// equal to the format's empty result.
    #[must_use]
    pub fn is_vacant(&self, empty_result: &Value) -> bool {
        match self {
            Self::Found(value) => value == empty_result,
            Self::Empty => true,
        }
    }

    #[must_use]
    pub fn map(self, f: impl FnOnce(Value) -> Value) -> Self {
        match self {
            Self::Found(value) => Self::Found(f(value)),
            Self::Empty => Self::Empty,
        }
    }
}

impl From<Value> for Extraction {
    fn from(value: Value) -> Self {
        Self::Found(value)
    }
}

/// Truthiness in the dynamic-language sense: null, false, zero and empty
/// containers are falsy.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Trim leading and trailing whitespace from textual results when `strip`
/// is set. Anything that is not a string passes through untouched.
#[must_use]
pub fn maybe_strip(value: Value, strip: bool) -> Value {
    match value {
        Value::String(text) if strip => Value::String(text.trim().to_string()),
        other => other,
    }
}

/// Resolve a possibly negative index against a sequence length.
pub(crate) fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { len + index } else { index };
    if (0..len).contains(&resolved) {
        usize::try_from(resolved).ok()
    } else {
        None
    }
}
