//! Output writers for the export pipeline: Parquet, Excel, and DuckDB,
//! with per-format value sanitizers and run-time column type inference.

pub mod duckdb;
pub mod excel;
pub mod parquet;
pub mod sanitize;
pub mod schema;

pub use duckdb::write_duckdb;
pub use excel::write_excel;
pub use parquet::write_parquet;
pub use sanitize::{MAX_CELL_LENGTH, MAX_URL_LENGTH, columnar_value, sheet_value};
pub use schema::{ColumnType, build_record_batch, infer_column_type};
