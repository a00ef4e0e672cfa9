//! Parquet output — one file per non-empty dataset

use std::path::{Path, PathBuf};

use anyhow::Context;
use vulnex_core::{FlatTable, ParquetSink, fmt_num};

use crate::schema::build_record_batch;

/// Write each non-empty table as `{name}_{ts}.parquet` in `out_dir`.
///
/// Returns the paths written. Empty tables are skipped with a log line.
pub fn write_parquet(
    tables: &[(String, FlatTable)],
    out_dir: &Path,
    ts: &str,
    zstd_level: i32,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (name, table) in tables {
        if table.is_empty() {
            log::info!("Skipping empty Parquet file for {name}");
            continue;
        }
        let path = out_dir.join(format!("{name}_{ts}.parquet"));
        log::info!(
            "Writing Parquet {} ({} rows)",
            path.display(),
            fmt_num(table.num_rows())
        );

        let batch = build_record_batch(table)
            .with_context(|| format!("failed to build record batch for {name}"))?;
        let mut sink = ParquetSink::create(&path, &batch.schema(), zstd_level)
            .with_context(|| format!("cannot create {}", path.display()))?;
        sink.write_batch(&batch)
            .with_context(|| format!("failed to write {}", path.display()))?;
        sink.finalize()
            .with_context(|| format!("failed to finalize {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use vulnex_core::is_valid_parquet;

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
    fn writes_valid_parquet_per_table() {
        let dir = TempDir::new().unwrap();
        let tables = vec![("VM_Vulnerabilities".to_string(), sample_table())];

        let written = write_parquet(&tables, dir.path(), "20250101_000000", 3).unwrap();

        assert_eq!(written.len(), 1);
        assert_eq!(
            written[0].file_name().unwrap(),
            "VM_Vulnerabilities_20250101_000000.parquet"
        );
        assert!(is_valid_parquet(&written[0]));
    }

    #[test]
    fn empty_tables_skipped() {
        let dir = TempDir::new().unwrap();
        let tables = vec![
            ("Empty".to_string(), FlatTable::new()),
            ("Full".to_string(), sample_table()),
        ];

        let written = write_parquet(&tables, dir.path(), "ts", 3).unwrap();

        assert_eq!(written.len(), 1);
        assert!(!dir.path().join("Empty_ts.parquet").exists());
    }
}
