//! Column type inference and Arrow record batch assembly
//!
//! Export columns are schema-less, so types are inferred per run from the
//! sanitized values actually present.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde_json::Value;
use vulnex_core::FlatTable;

use crate::sanitize::columnar_value;

/// Inferred Arrow type for one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    Int,
    Float,
    Utf8,
}

impl ColumnType {
    fn data_type(self) -> DataType {
        match self {
            Self::Bool => DataType::Boolean,
            Self::Int => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::Utf8 => DataType::Utf8,
        }
    }
}

/// Infer a column type from its values.
///
/// All-bool → Boolean, all-integer → Int64, numeric with any float →
/// Float64; anything else (strings, lists, mixed, all-null) → Utf8.
pub fn infer_column_type<'a>(values: impl Iterator<Item = Option<&'a Value>>) -> ColumnType {
    let mut seen_bool = false;
    let mut seen_int = false;
    let mut seen_float = false;
    let mut seen_any = false;

    for value in values.flatten() {
        match value {
            Value::Null => continue,
            Value::Bool(_) => seen_bool = true,
            Value::Number(n) => {
                if n.as_i64().is_some() {
                    seen_int = true;
                } else {
                    seen_float = true;
                }
            }
            _ => return ColumnType::Utf8,
        }
        seen_any = true;
        if seen_bool && (seen_int || seen_float) {
            return ColumnType::Utf8;
        }
    }

    match (seen_any, seen_bool, seen_float) {
        (false, _, _) => ColumnType::Utf8,
        (true, true, _) => ColumnType::Bool,
        (true, false, true) => ColumnType::Float,
        (true, false, false) => ColumnType::Int,
    }
}

/// Build an Arrow record batch from a flat table, sanitizing values for
/// columnar storage first. All fields are nullable.
pub fn build_record_batch(table: &FlatTable) -> anyhow::Result<RecordBatch> {
    let num_rows = table.num_rows();
    let mut fields = Vec::with_capacity(table.num_columns());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.num_columns());

    for (col_idx, name) in table.columns().iter().enumerate() {
        let sanitized: Vec<Option<Value>> = table
            .column_values(col_idx)
            .map(|v| v.map(columnar_value))
            .collect();
        let col_type = infer_column_type(sanitized.iter().map(|v| v.as_ref()));

        let array: ArrayRef = match col_type {
            ColumnType::Bool => {
                let mut b = BooleanBuilder::with_capacity(num_rows);
                for v in &sanitized {
                    b.append_option(v.as_ref().and_then(Value::as_bool));
                }
                Arc::new(b.finish())
            }
            ColumnType::Int => {
                let mut b = Int64Builder::with_capacity(num_rows);
                for v in &sanitized {
                    b.append_option(v.as_ref().and_then(Value::as_i64));
                }
                Arc::new(b.finish())
            }
            ColumnType::Float => {
                let mut b = Float64Builder::with_capacity(num_rows);
                for v in &sanitized {
                    b.append_option(v.as_ref().and_then(Value::as_f64));
                }
                Arc::new(b.finish())
            }
            ColumnType::Utf8 => {
                let mut b = StringBuilder::new();
                for v in &sanitized {
                    match v {
                        Some(Value::String(s)) => b.append_value(s),
                        Some(Value::Null) | None => b.append_null(),
                        // Mixed column — render scalars as their JSON text
                        Some(other) => b.append_value(other.to_string()),
                    }
                }
                Arc::new(b.finish())
            }
        };

        fields.push(Field::new(name, col_type.data_type(), true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let options = RecordBatchOptions::new().with_row_count(Some(num_rows));
    RecordBatch::try_new_with_options(schema, arrays, &options)
        .map_err(|e| anyhow::anyhow!("failed to assemble record batch: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use serde_json::json;
    use vulnex_core::FlatRow;

    fn table(rows: Vec<Vec<(&str, Value)>>) -> FlatTable {
        let mut t = FlatTable::new();
        for row in rows {
            let row: FlatRow = row.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
            t.push_row(row);
        }
        t
    }

    fn infer(values: &[Value]) -> ColumnType {
        let opts: Vec<Option<&Value>> = values.iter().map(Some).collect();
        infer_column_type(opts.into_iter())
    }

    #[test]
    fn infer_int() {
        assert_eq!(infer(&[json!(1), json!(2), Value::Null]), ColumnType::Int);
    }

    #[test]
    fn infer_float_when_mixed_numeric() {
        assert_eq!(infer(&[json!(1), json!(2.5)]), ColumnType::Float);
    }

    #[test]
    fn infer_bool() {
        assert_eq!(infer(&[json!(true), json!(false)]), ColumnType::Bool);
    }

    #[test]
    fn infer_utf8_for_strings_and_mixed() {
        assert_eq!(infer(&[json!("a")]), ColumnType::Utf8);
        assert_eq!(infer(&[json!(1), json!("a")]), ColumnType::Utf8);
        assert_eq!(infer(&[json!(true), json!(1)]), ColumnType::Utf8);
    }

    #[test]
    fn infer_all_null_is_utf8() {
        assert_eq!(infer(&[Value::Null, Value::Null]), ColumnType::Utf8);
        assert_eq!(infer(&[]), ColumnType::Utf8);
    }

    #[test]
    fn batch_types_and_nulls() {
        let t = table(vec![
            vec![("id", json!(1)), ("score", json!(1.5)), ("name", json!("a"))],
            vec![("id", json!(2)), ("name", json!("b")), ("extra", json!(true))],
        ]);
        let batch = build_record_batch(&t).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 4);

        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Int64);
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(3).data_type(), &DataType::Boolean);

        // score is null in row 1, extra is null in row 0
        assert!(batch.column(1).is_null(1));
        assert!(batch.column(3).is_null(0));
    }

    #[test]
    fn batch_lists_become_json_strings() {
        let t = table(vec![vec![("tags", json!(["a", "b"]))]]);
        let batch = build_record_batch(&t).unwrap();
        let col = batch
            .column(0)
            .as_any()
            .downcast_ref::<arrow::array::StringArray>()
            .unwrap();
        assert_eq!(col.value(0), "[\"a\",\"b\"]");
    }

    #[test]
    fn batch_empty_table() {
        let batch = build_record_batch(&FlatTable::new()).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 0);
    }
}
