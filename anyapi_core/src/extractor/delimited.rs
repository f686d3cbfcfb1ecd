//! Delimited rows addressed as `row:column`.
//!
//! ```json
//! { "value": "1:2" }
//! ```
//!
//! gets `"6"` from `"1,2,3\r\n4,5,6"`. Records are separated by whitespace
//! before the reader sees them, so a field cannot contain a space.

use csv::{ReaderBuilder, Trim};
use serde_json::Value;

use super::{Extractor, Source, simple_only};
use crate::error::{Error, Result};
use crate::extraction::{Extraction, resolve_index};
use crate::query::Query;

/// Reader options handed to the CSV reader as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvDialect {
    pub delimiter: u8,
    pub quote: u8,
    pub double_quote: bool,
    pub escape: Option<u8>,
    pub trim: bool,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            double_quote: true,
            escape: None,
            trim: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExtractor {
    dialect: CsvDialect,
}

impl CsvExtractor {
    #[must_use]
    pub const fn new(dialect: CsvDialect) -> Self {
        Self { dialect }
    }

    #[must_use]
    pub const fn dialect(&self) -> CsvDialect {
        self.dialect
    }
}

/// A `row:column` address. Negative indices count from the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    row: i64,
    column: i64,
}

impl Extractor for CsvExtractor {
    type Parsed = Vec<Vec<String>>;
    type Compiled = Cell;

    fn format(&self) -> &'static str {
        "csv"
    }

    fn compile(&self, query: &Query) -> Result<Cell> {
        let address = simple_only(self.format(), query)?;
        let invalid = || Error::invalid_query(self.format(), address, "expected `row:column`");

        let (row, column) = address.split_once(':').ok_or_else(invalid)?;
        Ok(Cell {
            row: row.trim().parse().map_err(|_| invalid())?,
            column: column.trim().parse().map_err(|_| invalid())?,
        })
    }

    fn parse(&self, content: &str) -> Result<Vec<Vec<String>>> {
        let records = content.split_whitespace().collect::<Vec<_>>().join("\n");
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.dialect.delimiter)
            .quote(self.dialect.quote)
            .double_quote(self.dialect.double_quote)
            .escape(self.dialect.escape)
            .trim(if self.dialect.trim { Trim::All } else { Trim::None })
            .from_reader(records.as_bytes());

        reader
            .records()
            .map(|record| {
                record
                    .map(|record| record.iter().map(str::to_string).collect())
                    .map_err(|err| {
                        tracing::debug!(%err, "csv rejected");
                        Error::parse(self.format(), "CSV data can not be parsed.", content)
                    })
            })
            .collect()
    }

    fn evaluate(&self, source: &Source<'_, Vec<Vec<String>>>, query: &Cell) -> Extraction {
        let rows = source.parsed;
        resolve_index(query.row, rows.len())
            .map(|r| &rows[r])
            .and_then(|row| resolve_index(query.column, row.len()).map(|c| &row[c]))
            .map_or(Extraction::Empty, |cell| Extraction::Found(Value::String(cell.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(dialect: CsvDialect, address: &str, content: &str) -> Extraction {
        let extractor = CsvExtractor::new(dialect);
        let parsed = extractor.parse(content).unwrap();
        let compiled = extractor.compile(&Query::from(address)).unwrap();
        let source = Source { raw: content, parsed: &parsed, strip: false };
        extractor.evaluate(&source, &compiled)
    }

    #[test]
    fn row_and_column_lookup() {
        assert_eq!(
            run(CsvDialect::default(), "1:2", "1,2,3\r\n4,5,6"),
            Extraction::Found(json!("6"))
        );
        assert_eq!(
            run(CsvDialect::default(), "-1:0", "1,2,3\r\n4,5,6"),
            Extraction::Found(json!("4"))
        );
    }

    #[test]
    fn out_of_range_is_empty() {
        assert_eq!(run(CsvDialect::default(), "2:0", "1,2\n3,4"), Extraction::Empty);
        assert_eq!(run(CsvDialect::default(), "0:5", "1,2\n3,4"), Extraction::Empty);
    }

    #[test]
    fn dialect_is_forwarded() {
        let dialect = CsvDialect {
            delimiter: b';',
            quote: b'\'',
            ..CsvDialect::default()
        };
        assert_eq!(
            run(dialect, "0:1", "a;'b;c'\nd;e"),
            Extraction::Found(json!("b;c"))
        );
    }

    #[test]
    fn non_numeric_address_is_rejected() {
        let extractor = CsvExtractor::default();
        assert!(extractor.compile(&Query::from("a:b")).is_err());
        assert!(extractor.compile(&Query::from("12")).is_err());
        assert!(extractor.compile(&Query::from("1:2:3")).is_err());
    }
}
