//! DuckDB output — one table per dataset.
//!
//! Tables are loaded through a Parquet spill and `read_parquet`, which
//! gets DuckDB's own type mapping for free instead of hand-built DDL.

use std::path::{Path, PathBuf};

use anyhow::Context;
use duckdb::Connection;
use vulnex_core::{FlatTable, ParquetSink, fmt_num};

use crate::schema::build_record_batch;

/// Spill compression for the intermediate parquet files
const SPILL_ZSTD_LEVEL: i32 = 1;

/// Write all non-empty tables into a DuckDB database.
///
/// The filename defaults to `tenable_export_{ts}.duckdb` and can be
/// overridden. Tables with no rows or no columns are skipped.
pub fn write_duckdb(
    tables: &[(String, FlatTable)],
    out_dir: &Path,
    ts: &str,
    filename: Option<&str>,
) -> anyhow::Result<PathBuf> {
    let db_name = filename
        .map(String::from)
        .unwrap_or_else(|| format!("tenable_export_{ts}.duckdb"));
    let db_path = out_dir.join(db_name);
    log::info!("Writing DuckDB database {}", db_path.display());

    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open DuckDB database {}", db_path.display()))?;

    let spill_dir = tempfile::TempDir::new().context("cannot create spill directory")?;

    for (name, table) in tables {
        if table.is_empty() || table.num_columns() == 0 {
            log::info!("  Table {name} is empty (no columns or rows), skipping");
            continue;
        }
        log::info!("  Table {name} ({} rows)", fmt_num(table.num_rows()));

        let spill_path = spill_dir.path().join(format!("{name}.parquet"));
        let batch = build_record_batch(table)
            .with_context(|| format!("failed to build record batch for {name}"))?;
        let mut sink = ParquetSink::create(&spill_path, &batch.schema(), SPILL_ZSTD_LEVEL)
            .with_context(|| format!("cannot create spill file for {name}"))?;
        sink.write_batch(&batch)?;
        sink.finalize()?;

        conn.execute_batch(&format!(
            "CREATE OR REPLACE TABLE \"{name}\" AS SELECT * FROM read_parquet('{}')",
            spill_path.display()
        ))
        .with_context(|| format!("failed to create table {name}"))?;
    }

    Ok(db_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_table() -> FlatTable {
        let mut t = FlatTable::new();
        t.push_row(vec![
            ("id".to_string(), json!(1)),
            ("name".to_string(), json!("a")),
        ]);
        t.push_row(vec![
            ("id".to_string(), json!(2)),
            ("name".to_string(), json!("b")),
        ]);
        t
    }

    #[test]
    fn creates_queryable_tables() {
        let dir = TempDir::new().unwrap();
        let tables = vec![
            ("VM_Vulnerabilities".to_string(), sample_table()),
            ("WAS_Vulnerabilities".to_string(), FlatTable::new()),
        ];

        let db_path = write_duckdb(&tables, dir.path(), "20250101_000000", None).unwrap();
        assert_eq!(
            db_path.file_name().unwrap(),
            "tenable_export_20250101_000000.duckdb"
        );

        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM VM_Vulnerabilities", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 2);

        // Empty dataset must not create a table
        let exists: i64 = conn
            .query_row(
                "SELECT count(*) FROM information_schema.tables WHERE table_name = 'WAS_Vulnerabilities'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(exists, 0);
    }

    #[test]
    fn filename_override() {
        let dir = TempDir::new().unwrap();
        let tables = vec![("T".to_string(), sample_table())];
        let db_path = write_duckdb(&tables, dir.path(), "ts", Some("custom.duckdb")).unwrap();
        assert_eq!(db_path.file_name().unwrap(), "custom.duckdb");
    }
}
