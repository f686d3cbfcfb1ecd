//! Regular expressions straight over the raw text.
//!
//! ```json
//! { "result": "^ok$", "errors": "^Error \\d+$" }
//! ```
//!
//! The first match wins. With no capture groups the whole match is the
//! result, with one group that group, with several an array of the groups.

use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::ops::BitOr;

use super::{Extractor, Source, simple_only};
use crate::error::{Error, Result};
use crate::extraction::Extraction;
use crate::query::Query;

/// Engine flags, fixed when the factory is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegexFlags(u8);

impl RegexFlags {
    pub const NONE: Self = Self(0);
    pub const IGNORE_CASE: Self = Self(1);
    pub const MULTILINE: Self = Self(1 << 1);
    /// `.` also matches `\n`.
    pub const DOTALL: Self = Self(1 << 2);
    /// Whitespace and `#` comments in the pattern are ignored.
    pub const VERBOSE: Self = Self(1 << 3);

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Look a flag up by its lowercase name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ignore_case" | "ignorecase" | "i" => Some(Self::IGNORE_CASE),
            "multiline" | "m" => Some(Self::MULTILINE),
            "dotall" | "s" => Some(Self::DOTALL),
            "verbose" | "x" => Some(Self::VERBOSE),
            _ => None,
        }
    }
}

impl BitOr for RegexFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractor {
    flags: RegexFlags,
}

impl RegexExtractor {
    #[must_use]
    pub const fn new(flags: RegexFlags) -> Self {
        Self { flags }
    }

    #[must_use]
    pub const fn flags(&self) -> RegexFlags {
        self.flags
    }
}

impl Extractor for RegexExtractor {
    /// Patterns run over the raw text; there is nothing to parse.
    type Parsed = ();
    type Compiled = Regex;

    fn format(&self) -> &'static str {
        "regex"
    }

    fn compile(&self, query: &Query) -> Result<Regex> {
        let pattern = simple_only(self.format(), query)?;
        RegexBuilder::new(pattern)
            .case_insensitive(self.flags.contains(RegexFlags::IGNORE_CASE))
            .multi_line(self.flags.contains(RegexFlags::MULTILINE))
            .dot_matches_new_line(self.flags.contains(RegexFlags::DOTALL))
            .ignore_whitespace(self.flags.contains(RegexFlags::VERBOSE))
            .build()
            .map_err(|err| Error::invalid_query(self.format(), pattern, err.to_string()))
    }

    fn parse(&self, _content: &str) -> Result<()> {
        Ok(())
    }

    fn evaluate(&self, source: &Source<'_, ()>, query: &Regex) -> Extraction {
        let Some(captures) = query.captures(source.raw) else {
            return Extraction::Empty;
        };

        let group = |i: usize| {
            Value::String(
                captures
                    .get(i)
                    .map_or_else(String::new, |m| m.as_str().to_string()),
            )
        };
        let value = match captures.len() {
            1 => group(0),
            2 => group(1),
            n => Value::Array((1..n).map(group).collect()),
        };
        Extraction::Found(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(flags: RegexFlags, pattern: &str, content: &str) -> Extraction {
        let extractor = RegexExtractor::new(flags);
        let compiled = extractor.compile(&Query::from(pattern)).unwrap();
        let source = Source { raw: content, parsed: &(), strip: false };
        extractor.evaluate(&source, &compiled)
    }

    #[test]
    fn whole_match_without_groups() {
        assert_eq!(
            run(RegexFlags::NONE, r"\d+.\d+", "pi is 3.14 or 2.71"),
            Extraction::Found(json!("3.14"))
        );
    }

    #[test]
    fn single_group_is_returned() {
        assert_eq!(
            run(RegexFlags::NONE, "href='(.*)'", "<a href='/home'>"),
            Extraction::Found(json!("/home"))
        );
    }

    #[test]
    fn several_groups_form_an_array() {
        assert_eq!(
            run(RegexFlags::NONE, r"(\w+)=(\d+)?", "a= b=2"),
            Extraction::Found(json!(["a", ""]))
        );
    }

    #[test]
    fn no_match_is_empty() {
        assert_eq!(run(RegexFlags::NONE, "^ok$", "Error 100"), Extraction::Empty);
    }

    #[test]
    fn flags_change_matching() {
        let content = "<p>a\nb</p>";
        assert_eq!(run(RegexFlags::NONE, "<p>(.*)</p>", content), Extraction::Empty);
        assert_eq!(
            run(RegexFlags::DOTALL, "<p>(.*)</p>", content),
            Extraction::Found(json!("a\nb"))
        );
        assert_eq!(
            run(RegexFlags::IGNORE_CASE | RegexFlags::DOTALL, "<P>(.*)</P>", content),
            Extraction::Found(json!("a\nb"))
        );
    }

    #[test]
    fn invalid_pattern_and_structured_queries_are_rejected() {
        let extractor = RegexExtractor::default();
        assert!(extractor.compile(&Query::from("(unclosed")).is_err());
        assert!(extractor.compile(&Query::structured("a", None)).is_err());
    }
}
