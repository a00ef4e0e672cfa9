//! Tenable.io export semantics: client, job lifecycle, chunk parsing,
//! JSON flattening, and per-dataset orchestration.

pub mod chunk;
pub mod client;
pub mod config;
pub mod dataset;
pub mod export;
pub mod flatten;
pub mod runner;

pub use chunk::{ChunkResult, fetch_chunk, parse_ndjson};
pub use client::{Credentials, TenableClient};
pub use config::ExportSettings;
pub use dataset::Dataset;
pub use export::{ExportStatus, poll_export_status, start_export};
pub use flatten::flatten;
pub use runner::{DatasetStats, export_dataset};
