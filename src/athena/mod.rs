//! Athena query construction, execution, and result parsing.

pub mod executor;
pub mod query;
pub mod types;

pub use executor::{PollSettings, QueryExecutor, QueryState};
pub use query::TaggingQueries;
pub use types::{cell_f64, cell_i64, cell_text, CellValue, QueryResult, Row};
