//! Vulnex Core - Common infrastructure for the Tenable export pipeline
//!
//! This crate provides reusable components for downloading, flattening,
//! and writing vulnerability and asset export data.

pub mod error;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod shutdown;
pub mod sink;
pub mod stream;
pub mod table;

// Re-exports for convenience
pub use error::ChunkError;
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num, upgrade_to_bar};
pub use retry::retry_with_backoff;
pub use shutdown::{install_signal_handlers, is_shutdown_requested, request_shutdown};
pub use sink::{ParquetSink, cleanup_tmp_files, is_valid_parquet};
pub use stream::{
    ByteCounter, HttpConfig, NdjsonReader, SHARED_RUNTIME, StreamError, build_http_client,
    http_config, open_ndjson_reader, set_http_config,
};
pub use table::{FlatRow, FlatTable};
