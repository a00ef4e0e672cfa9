//! Per-dataset export orchestration: start → poll → download chunks

use std::time::{Duration, Instant};

use anyhow::Context;
use vulnex_core::{FlatTable, SharedProgress, fmt_num, is_shutdown_requested, retry_with_backoff};

use crate::chunk::fetch_chunk;
use crate::client::TenableClient;
use crate::config::ExportSettings;
use crate::dataset::Dataset;
use crate::export::{poll_export_status, start_export};

/// Outcome counters for one dataset export
#[derive(Debug)]
pub struct DatasetStats {
    pub dataset: Dataset,
    pub skipped: bool,
    pub status: String,
    pub chunks_total: usize,
    pub chunks_fetched: usize,
    pub rows: usize,
    pub parse_errors: usize,
    pub expected_total: Option<u64>,
    pub elapsed: Duration,
}

impl DatasetStats {
    fn skipped(dataset: Dataset, elapsed: Duration) -> Self {
        Self {
            dataset,
            skipped: true,
            status: String::new(),
            chunks_total: 0,
            chunks_fetched: 0,
            rows: 0,
            parse_errors: 0,
            expected_total: None,
            elapsed,
        }
    }

    /// Log summary line (non-TTY mode)
    pub fn log(&self) {
        if self.skipped {
            log::info!("{}: skipped", self.dataset);
            return;
        }
        log::info!(
            "{}: {} rows from {}/{} chunks ({} parse errors) [{:.1}s]",
            self.dataset,
            fmt_num(self.rows),
            self.chunks_fetched,
            self.chunks_total,
            self.parse_errors,
            self.elapsed.as_secs_f64()
        );
    }
}

/// Run the full export pipeline for one dataset.
///
/// Returns the assembled flat table plus counters. An optional dataset the
/// API refuses with 403 yields an empty table with `skipped` set.
pub fn export_dataset(
    client: &TenableClient,
    dataset: Dataset,
    settings: &ExportSettings,
    progress: &SharedProgress,
) -> anyhow::Result<(FlatTable, DatasetStats)> {
    let started = Instant::now();
    let stage = progress.stage_line(dataset.label());
    stage.set_message("starting export job...");

    let Some(uuid) = start_export(client, dataset, settings)? else {
        stage.finish_and_clear();
        return Ok((
            FlatTable::new(),
            DatasetStats::skipped(dataset, started.elapsed()),
        ));
    };

    let status = poll_export_status(client, dataset, &uuid, settings, &stage)?;
    if !status.is_finished() {
        log::warn!(
            "{dataset} export finished with status {}, downloading available chunks anyway",
            status.status
        );
    }
    log::info!("{dataset} chunks available: {:?}", status.chunks);
    if status.chunks.is_empty() {
        log::warn!("{dataset} export finished but no chunks available");
    }

    let mut table = FlatTable::new();
    let mut parse_errors = 0usize;
    let mut chunks_fetched = 0usize;

    for &chunk_id in &status.chunks {
        anyhow::ensure!(
            !is_shutdown_requested(),
            "shutdown requested while downloading {dataset} chunks"
        );
        stage.set_message(format!(
            "chunk {}/{}",
            chunks_fetched + 1,
            status.chunks.len()
        ));

        let label = format!("{} chunk {chunk_id}", dataset.label());
        let pb = progress.chunk_bar(&label);
        let result = retry_with_backoff(&label, &pb, || {
            fetch_chunk(client, dataset, &uuid, chunk_id, &pb)
        })
        .with_context(|| format!("{dataset} chunk {chunk_id} download failed"))?;
        pb.finish_and_clear();

        chunks_fetched += 1;
        parse_errors += result.parse_errors;
        let rows_before = table.num_rows();
        table.extend(result.rows);
        log::info!(
            "[{dataset}] Chunk {chunk_id}: {} rows (total so far: {})",
            fmt_num(table.num_rows() - rows_before),
            fmt_num(table.num_rows())
        );
    }
    stage.finish_and_clear();

    if let Some(expected) = status.total {
        if table.num_rows() as u64 != expected {
            log::warn!(
                "{dataset} count mismatch: expected {expected}, got {}",
                table.num_rows()
            );
        }
    }

    let stats = DatasetStats {
        dataset,
        skipped: false,
        status: status.status,
        chunks_total: status.chunks.len(),
        chunks_fetched,
        rows: table.num_rows(),
        parse_errors,
        expected_total: status.total,
        elapsed: started.elapsed(),
    };
    Ok((table, stats))
}
