//! Excel workbook output — one sheet per dataset

use std::path::{Path, PathBuf};

use anyhow::Context;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde_json::Value;
use vulnex_core::{FlatTable, fmt_num};

use crate::sanitize::sheet_value;

/// Excel sheet name limit
const MAX_SHEET_NAME: usize = 31;

/// Write all tables into a single workbook `tenable_vm_was_assets_{ts}.xlsx`.
///
/// Empty tables still get a sheet (header-only when columns are known) so
/// every expected tab exists in the workbook.
pub fn write_excel(
    tables: &[(String, FlatTable)],
    out_dir: &Path,
    ts: &str,
) -> anyhow::Result<PathBuf> {
    let path = out_dir.join(format!("tenable_vm_was_assets_{ts}.xlsx"));
    log::info!("Writing Excel workbook {}", path.display());

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for (name, table) in tables {
        if table.is_empty() {
            log::info!("  Sheet {name} (empty, headers only)");
        } else {
            log::info!("  Sheet {name} ({} rows)", fmt_num(table.num_rows()));
        }
        let worksheet = workbook.add_worksheet();
        let sheet_name: String = name.chars().take(MAX_SHEET_NAME).collect();
        worksheet
            .set_name(&sheet_name)
            .with_context(|| format!("invalid sheet name {sheet_name}"))?;
        write_sheet(worksheet, table, &header_format)
            .with_context(|| format!("failed to write sheet {sheet_name}"))?;
    }

    workbook
        .save(&path)
        .with_context(|| format!("failed to save workbook {}", path.display()))?;
    Ok(path)
}

fn write_sheet(
    worksheet: &mut Worksheet,
    table: &FlatTable,
    header_format: &Format,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_with_format(0, col as u16, name.as_str(), header_format)?;
    }

    for row in 0..table.num_rows() {
        for (col, name) in table.columns().iter().enumerate() {
            let Some(raw) = table.value(row, col) else {
                continue;
            };
            let xl_row = (row + 1) as u32;
            let xl_col = col as u16;
            match sheet_value(raw, name) {
                Value::String(s) => worksheet.write_string(xl_row, xl_col, &s)?,
                Value::Number(n) => {
                    worksheet.write_number(xl_row, xl_col, n.as_f64().unwrap_or_default())?
                }
                Value::Bool(b) => worksheet.write_boolean(xl_row, xl_col, b)?,
                Value::Null => continue,
                // sheet_value never returns arrays or objects
                other => worksheet.write_string(xl_row, xl_col, &other.to_string())?,
            };
        }
    }
    Ok(())
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
            ("tags".to_string(), json!(["a", "b"])),
            ("seen".to_string(), json!(true)),
        ]);
        t
    }

    #[test]
    fn writes_workbook_with_all_sheets() {
        let dir = TempDir::new().unwrap();
        let tables = vec![
            ("VM_Vulnerabilities".to_string(), sample_table()),
            ("WAS_Vulnerabilities".to_string(), FlatTable::new()),
        ];

        let path = write_excel(&tables, dir.path(), "20250101_000000").unwrap();

        assert_eq!(
            path.file_name().unwrap(),
            "tenable_vm_was_assets_20250101_000000.xlsx"
        );
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn long_table_name_truncated_to_sheet_limit() {
        let dir = TempDir::new().unwrap();
        let long_name = "X".repeat(40);
        let tables = vec![(long_name, sample_table())];

        // Would fail inside rust_xlsxwriter if the name were not truncated
        write_excel(&tables, dir.path(), "ts").unwrap();
    }
}
