use std::collections::HashMap;
use std::fmt;

use crate::errors::TagscopeError;

/// A single result field, coerced from its raw CSV text. The coercion is
/// purely syntactic: anything with a decimal point is tried as a float,
/// everything else as an integer, with text as the fallback. A value like
/// `1.2` is classified as a float even when it is really a version
/// string; `1.2.3` survives as text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn coerce(raw: &str) -> CellValue {
        if raw.contains('.') {
            if let Ok(f) = raw.parse::<f64>() {
                return CellValue::Float(f);
            }
        } else if let Ok(i) = raw.parse::<i64>() {
            return CellValue::Int(i);
        }
        CellValue::Text(raw.to_string())
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) => Some(*f as i64),
            CellValue::Text(t) => t.parse().ok(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Text(t) => t.parse().ok(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{}", i),
            // Integral floats keep a trailing .0 so re-coercing the
            // rendered text yields the same value.
            CellValue::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{:.1}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(t) => f.write_str(t),
        }
    }
}

/// One result row, keyed by column name.
pub type Row = HashMap<String, CellValue>;

pub fn cell_i64(row: &Row, column: &str) -> i64 {
    row.get(column).and_then(CellValue::as_i64).unwrap_or(0)
}

pub fn cell_f64(row: &Row, column: &str) -> f64 {
    row.get(column).and_then(CellValue::as_f64).unwrap_or(0.0)
}

pub fn cell_text(row: &Row, column: &str) -> String {
    row.get(column)
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Parsed result of one query execution, including the metadata worth
/// logging about the run itself.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub query_execution_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub data_scanned_bytes: i64,
}

impl QueryResult {
    /// Parse a result artifact (CSV with a header row) into coerced rows.
    pub fn from_csv(query_execution_id: &str, data: &[u8]) -> Result<Self, TagscopeError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
        let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row = Row::with_capacity(columns.len());
            for (column, field) in columns.iter().zip(record.iter()) {
                row.insert(column.clone(), CellValue::coerce(field));
            }
            rows.push(row);
        }

        Ok(Self {
            query_execution_id: query_execution_id.to_string(),
            columns,
            rows,
            data_scanned_bytes: 0,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
