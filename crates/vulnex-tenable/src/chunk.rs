//! Chunk download and NDJSON parsing

use std::io::BufRead;

use indicatif::ProgressBar;
use serde_json::Value;
use vulnex_core::{ChunkError, FlatRow, open_ndjson_reader, upgrade_to_bar};

use crate::client::TenableClient;
use crate::dataset::Dataset;
use crate::flatten::flatten;

/// Update the progress bar every this many lines
const PB_UPDATE_LINES: usize = 500;

/// Rows and per-chunk counters from one chunk download
#[derive(Debug, Default)]
pub struct ChunkResult {
    pub rows: Vec<FlatRow>,
    pub parse_errors: usize,
}

/// Download one chunk and parse its NDJSON body into flattened rows.
///
/// Network and I/O errors are returned for the retry layer; malformed lines
/// are counted and logged, never fatal.
pub fn fetch_chunk(
    client: &TenableClient,
    dataset: Dataset,
    uuid: &str,
    chunk_id: u64,
    pb: &ProgressBar,
) -> Result<ChunkResult, ChunkError> {
    let path = dataset.chunk_path(uuid, chunk_id);
    log::info!("[{dataset}] Downloading chunk {path}");

    let (reader, counter, total_bytes) = open_ndjson_reader(client.get(&path))?;
    if let Some(total) = total_bytes {
        upgrade_to_bar(pb, total);
    }

    let label = format!("{dataset} chunk {chunk_id}");
    let mut result = ChunkResult::default();
    let mut line_num = 0usize;

    for line in reader.lines() {
        let line = line?;
        line_num += 1;
        if line_num % PB_UPDATE_LINES == 0 {
            pb.set_position(counter.load(std::sync::atomic::Ordering::Relaxed));
        }
        parse_line(&line, line_num, &label, &mut result);
    }

    Ok(result)
}

/// Parse one NDJSON line into zero or more flattened rows.
///
/// A dict becomes one row; a list contributes one row per element (dicts
/// flattened, primitives wrapped); a bare primitive is wrapped as `value`.
fn parse_line(line: &str, line_num: usize, label: &str, result: &mut ChunkResult) {
    if line.trim().is_empty() {
        return;
    }
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("[{label}] Failed to decode line {line_num}: {e}");
            result.parse_errors += 1;
            return;
        }
    };
    match value {
        Value::Object(map) => result.rows.push(flatten(map)),
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(map) => result.rows.push(flatten(map)),
                    other => result.rows.push(vec![("value".to_string(), other)]),
                }
            }
        }
        other => result.rows.push(vec![("value".to_string(), other)]),
    }
}

/// Parse a whole NDJSON body (used by tests and retained for local replay)
pub fn parse_ndjson(reader: impl BufRead, label: &str) -> std::io::Result<ChunkResult> {
    let mut result = ChunkResult::default();
    for (idx, line) in reader.lines().enumerate() {
        parse_line(&line?, idx + 1, label, &mut result);
    }
    Ok(result)
}
