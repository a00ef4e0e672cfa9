//! Export job lifecycle — start and status polling

use anyhow::Context;
use indicatif::ProgressBar;
use serde_json::Value;
use vulnex_core::is_shutdown_requested;

use crate::client::TenableClient;
use crate::config::ExportSettings;
use crate::dataset::Dataset;

/// Parsed export status response
#[derive(Debug, Default)]
pub struct ExportStatus {
    pub status: String,
    pub chunks: Vec<u64>,
    pub total: Option<u64>,
}

impl ExportStatus {
    /// Parse the status document. Chunk ids may arrive as ints or numeric
    /// strings; anything else is logged and skipped.
    pub fn parse(doc: &Value) -> Self {
        let status = doc
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_uppercase();

        let mut chunks = Vec::new();
        if let Some(items) = doc.get("chunks_available").and_then(Value::as_array) {
            for item in items {
                match chunk_id(item) {
                    Some(id) => chunks.push(id),
                    None => log::warn!("Invalid chunk id in status response: {item}, skipping"),
                }
            }
        }

        // Some exports report the total under different keys
        let total = ["total", "total_count", "count"]
            .iter()
            .find_map(|k| doc.get(*k).and_then(Value::as_u64));

        Self {
            status,
            chunks,
            total,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "FINISHED" | "ERROR" | "CANCELLED")
    }

    pub fn is_finished(&self) -> bool {
        self.status == "FINISHED"
    }
}

fn chunk_id(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Start an export job, returning its UUID.
///
/// Returns `Ok(None)` when an optional dataset is refused with 403 (the key
/// has no license for it) — the caller skips the dataset.
pub fn start_export(
    client: &TenableClient,
    dataset: Dataset,
    settings: &ExportSettings,
) -> anyhow::Result<Option<String>> {
    let body = dataset.start_body(settings);
    log::info!("Starting {dataset} export with body={body}");

    let doc = match client.post_json(dataset.export_path(), &body) {
        Ok(doc) => doc,
        Err(e) if dataset.is_optional() && e.status() == Some(403) => {
            log::error!(
                "{dataset} export forbidden (403): this API key likely has no {dataset} access. \
                 Skipping {dataset} export."
            );
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("{dataset} export start failed"));
        }
    };

    let uuid = doc
        .get("export_uuid")
        .or_else(|| doc.get("uuid"))
        .and_then(Value::as_str)
        .map(String::from)
        .with_context(|| format!("{dataset} export: no export_uuid in response: {doc}"))?;

    log::info!("{dataset} export UUID: {uuid}");
    Ok(Some(uuid))
}

/// Poll the status endpoint at a fixed interval until a terminal status.
///
/// Errors on attempt exhaustion or shutdown request. A terminal status other
/// than FINISHED is returned as-is; the caller decides how loudly to complain.
pub fn poll_export_status(
    client: &TenableClient,
    dataset: Dataset,
    uuid: &str,
    settings: &ExportSettings,
    pb: &ProgressBar,
) -> anyhow::Result<ExportStatus> {
    let path = dataset.status_path(uuid);
    let max_attempts = settings.max_poll_attempts;

    for attempt in 1..=max_attempts {
        anyhow::ensure!(
            !is_shutdown_requested(),
            "shutdown requested while polling {dataset} export status"
        );

        let doc = client
            .get_json(&path)
            .with_context(|| format!("{dataset} status request failed"))?;
        let status = ExportStatus::parse(&doc);

        log::info!(
            "{dataset} export status: {} (attempt {attempt}/{max_attempts})",
            status.status
        );
        pb.set_message(format!(
            "{} (attempt {attempt}/{max_attempts})",
            status.status
        ));
        if let Some(total) = status.total {
            log::info!("{dataset} export reports total count: {total}");
        }

        if status.is_terminal() {
            return Ok(status);
        }
        std::thread::sleep(settings.poll_interval);
    }

    let minutes = settings.poll_interval.as_secs_f64() * f64::from(max_attempts) / 60.0;
    anyhow::bail!(
        "{dataset} export status polling timed out after {max_attempts} attempts ({minutes:.1} minutes)"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_int_chunks() {
        let status = ExportStatus::parse(&json!({
            "status": "FINISHED",
            "chunks_available": [1, 2, 3],
        }));
        assert_eq!(status.chunks, vec![1, 2, 3]);
        assert!(status.is_finished());
    }

    #[test]
    fn parse_string_chunks() {
        let status = ExportStatus::parse(&json!({
            "status": "FINISHED",
            "chunks_available": ["1", "2"],
        }));
        assert_eq!(status.chunks, vec![1, 2]);
    }

    #[test]
    fn invalid_chunk_ids_skipped() {
        let status = ExportStatus::parse(&json!({
            "status": "FINISHED",
            "chunks_available": [1, "x", null, 2.5, "3"],
        }));
        assert_eq!(status.chunks, vec![1, 3]);
    }

    #[test]
    fn status_uppercased() {
        let status = ExportStatus::parse(&json!({"status": "finished"}));
        assert!(status.is_finished());
        assert!(status.is_terminal());
    }

    #[test]
    fn error_and_cancelled_terminal() {
        assert!(ExportStatus::parse(&json!({"status": "ERROR"})).is_terminal());
        assert!(ExportStatus::parse(&json!({"status": "CANCELLED"})).is_terminal());
        assert!(!ExportStatus::parse(&json!({"status": "PROCESSING"})).is_terminal());
    }

    #[test]
    fn total_count_aliases() {
        assert_eq!(
            ExportStatus::parse(&json!({"status": "FINISHED", "total": 10})).total,
            Some(10)
        );
        assert_eq!(
            ExportStatus::parse(&json!({"status": "FINISHED", "total_count": 11})).total,
            Some(11)
        );
        assert_eq!(
            ExportStatus::parse(&json!({"status": "FINISHED", "count": 12})).total,
            Some(12)
        );
        assert_eq!(
            ExportStatus::parse(&json!({"status": "FINISHED"})).total,
            None
        );
    }

    #[test]
    fn missing_fields_default() {
        let status = ExportStatus::parse(&json!({}));
        assert_eq!(status.status, "");
        assert!(status.chunks.is_empty());
        assert!(!status.is_terminal());
    }
}
