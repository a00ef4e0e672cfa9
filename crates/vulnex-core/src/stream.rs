//! HTTP streaming with read timeout for chunk downloads.
//!
//! Uses async reqwest internally with tokio::time::timeout for stall detection,
//! but presents a sync interface so the export loop stays plain sequential code.

use std::io::{self, BufReader, Read};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, OnceLock};
use std::task::Context;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncRead, ReadBuf};

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime-tunable HTTP settings (config file defaults, CLI overrides)
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    pub read_timeout: Duration,
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            max_retries: 5,
        }
    }
}

static HTTP_CONFIG: OnceLock<HttpConfig> = OnceLock::new();

/// Install global HTTP settings. Later calls are ignored.
pub fn set_http_config(config: HttpConfig) {
    let _ = HTTP_CONFIG.set(config);
}

/// Get global HTTP settings (defaults if never set)
pub fn http_config() -> HttpConfig {
    HTTP_CONFIG.get().copied().unwrap_or_default()
}

/// Error types for stream operations
#[derive(Debug)]
pub enum StreamError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// I/O error
    Io(std::io::Error),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for StreamError {}

impl StreamError {
    /// Create HTTP error from reqwest error
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    /// HTTP status code, if the error carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            Self::Io(_) => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            // 429 = rate limited, 5xx = server side; no status = transport error
            Self::Http { status, .. } => {
                matches!(status, None | Some(429) | Some(500..=599))
            }
            Self::Io(e) => {
                // Disk full is not retryable, timeout IS retryable
                e.kind() != std::io::ErrorKind::StorageFull
            }
        }
    }
}

impl From<std::io::Error> for StreamError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Build an HTTP client with optional TLS verification bypass.
///
/// Authentication headers are the caller's concern (`default_headers`).
pub fn build_http_client(
    default_headers: reqwest::header::HeaderMap,
    verify_tls: bool,
) -> Result<reqwest::Client, StreamError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(4)
        .default_headers(default_headers)
        .danger_accept_invalid_certs(!verify_tls)
        .build()
        .map_err(|e| StreamError::from_reqwest(&e))
}

/// Buffer size for the chunk stream reader (256KB)
const CHUNK_BUF_SIZE: usize = 256 * 1024;

/// Buffered reader over an NDJSON chunk body with byte counting
pub type NdjsonReader = BufReader<CountingReader<TimeoutReader>>;

/// Shared byte counter for progress tracking
pub type ByteCounter = Arc<AtomicU64>;

/// HTTP GET → buffered line reader with byte counter.
///
/// Returns (reader, byte_counter, total_bytes).
pub fn open_ndjson_reader(
    request: reqwest::RequestBuilder,
) -> Result<(NdjsonReader, ByteCounter, Option<u64>), StreamError> {
    let (reader, total_bytes) = SHARED_RUNTIME.handle().block_on(async {
        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StreamError::from_reqwest(&e))?;

        let total_bytes = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());

        // Convert response body stream to AsyncRead
        let stream = response.bytes_stream();
        let async_reader = tokio_util::io::StreamReader::new(
            stream.map(|result| result.map_err(io::Error::other)),
        );

        Ok::<_, StreamError>((TimeoutReader::new(Box::pin(async_reader)), total_bytes))
    })?;

    let counter = Arc::new(AtomicU64::new(0));
    let counting_reader = CountingReader {
        inner: reader,
        count: counter.clone(),
    };
    let buf = BufReader::with_capacity(CHUNK_BUF_SIZE, counting_reader);

    Ok((buf, counter, total_bytes))
}

/// Reader wrapper that tracks bytes read
pub struct CountingReader<R> {
    inner: R,
    count: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// Async-to-sync bridge with read timeout.
///
/// Wraps an async reader and provides sync Read interface.
/// Each read operation has a timeout - if no data arrives within
/// the configured read timeout, returns TimedOut error (which triggers retry).
pub struct TimeoutReader {
    inner: Pin<Box<dyn AsyncRead + Send + Sync>>,
}

impl TimeoutReader {
    fn new(inner: Pin<Box<dyn AsyncRead + Send + Sync>>) -> Self {
        Self { inner }
    }
}

impl Read for TimeoutReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read_timeout = http_config().read_timeout;
        SHARED_RUNTIME.handle().block_on(async {
            let read_future = async {
                let mut read_buf = ReadBuf::new(buf);
                std::future::poll_fn(|cx: &mut Context<'_>| {
                    Pin::as_mut(&mut self.inner).poll_read(cx, &mut read_buf)
                })
                .await?;
                Ok::<_, io::Error>(read_buf.filled().len())
            };

            match tokio::time::timeout(read_timeout, read_future).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "read timeout (no data from server)",
                )),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_err(status: u16) -> StreamError {
        StreamError::Http {
            status: Some(status),
            message: "test".to_string(),
        }
    }

    #[test]
    fn http_403_not_retryable() {
        assert!(!http_err(403).is_retryable());
    }

    #[test]
    fn http_404_not_retryable() {
        assert!(!http_err(404).is_retryable());
    }

    #[test]
    fn http_400_not_retryable() {
        assert!(!http_err(400).is_retryable());
    }

    #[test]
    fn http_500_retryable() {
        assert!(http_err(500).is_retryable());
    }

    #[test]
    fn http_429_retryable() {
        assert!(http_err(429).is_retryable());
    }

    #[test]
    fn io_timeout_retryable() {
        let err = StreamError::Io(io::Error::new(io::ErrorKind::TimedOut, "timeout"));
        assert!(err.is_retryable());
    }

    #[test]
    fn io_storage_full_not_retryable() {
        let err = StreamError::Io(io::Error::new(io::ErrorKind::StorageFull, "disk full"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn http_none_status_retryable() {
        // Network error without status code should be retryable
        let err = StreamError::Http {
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn status_accessor() {
        assert_eq!(http_err(429).status(), Some(429));
        let err = StreamError::Io(io::Error::other("x"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn display_http_with_status() {
        let err = http_err(404);
        assert_eq!(format!("{err}"), "HTTP 404: test");
    }

    #[test]
    fn display_http_without_status() {
        let err = StreamError::Http {
            status: None,
            message: "timeout".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP error: timeout");
    }

    #[test]
    fn http_config_defaults() {
        let cfg = HttpConfig::default();
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.read_timeout, Duration::from_secs(30));
    }
}
