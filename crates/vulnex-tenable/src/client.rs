//! Tenable.io API client
//!
//! Key-pair header auth, JSON request helpers with retry for rate limits
//! (429) and server errors (5xx).

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde_json::Value;
use vulnex_core::{SHARED_RUNTIME, StreamError, build_http_client, http_config};

const API_BASE_DELAY: Duration = Duration::from_secs(2);

/// How much of an error response body to keep in the error message
const ERROR_BODY_SNIPPET: usize = 500;

/// API key pair for the `X-ApiKeys` header
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

/// Authenticated client for the Tenable.io REST API
pub struct TenableClient {
    http: reqwest::Client,
    base_url: String,
}

impl TenableClient {
    /// Build a client with default headers applied to every request
    pub fn new(base_url: &str, creds: &Credentials, verify_tls: bool) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut api_keys = HeaderValue::from_str(&format!(
            "accessKey={}; secretKey={}",
            creds.access_key, creds.secret_key
        ))?;
        api_keys.set_sensitive(true);
        headers.insert("X-ApiKeys", api_keys);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("vulnex/", env!("CARGO_PKG_VERSION"))),
        );

        let http = build_http_client(headers, verify_tls)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET request builder for an API path (used for chunk streaming)
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.get(format!("{}{path}", self.base_url))
    }

    /// GET a JSON document with retry
    pub fn get_json(&self, path: &str) -> Result<Value, StreamError> {
        self.request_json(path, None)
    }

    /// POST a JSON body and return the JSON response, with retry
    pub fn post_json(&self, path: &str, body: &Value) -> Result<Value, StreamError> {
        self.request_json(path, Some(body))
    }

    fn request_json(&self, path: &str, body: Option<&Value>) -> Result<Value, StreamError> {
        let url = format!("{}{path}", self.base_url);
        let max_retries = http_config().max_retries;

        for attempt in 0..=max_retries {
            let result = SHARED_RUNTIME.handle().block_on(async {
                let req = match body {
                    Some(b) => self.http.post(&url).json(b),
                    None => self.http.get(&url),
                };
                let resp = req.send().await.map_err(|e| StreamError::from_reqwest(&e))?;
                let status = resp.status();
                if !status.is_success() {
                    // Keep a body snippet — Tenable error payloads explain the refusal
                    let text = resp.text().await.unwrap_or_default();
                    let snippet: String = text.chars().take(ERROR_BODY_SNIPPET).collect();
                    return Err(StreamError::Http {
                        status: Some(status.as_u16()),
                        message: if snippet.is_empty() {
                            "no response body".to_string()
                        } else {
                            snippet
                        },
                    });
                }
                resp.json::<Value>()
                    .await
                    .map_err(|e| StreamError::from_reqwest(&e))
            });

            match result {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let delay = API_BASE_DELAY * 2u32.pow(attempt);
                    log::warn!(
                        "API request to {path} failed ({e}), retry {}/{max_retries} in {delay:?}",
                        attempt + 1,
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
        unreachable!("retry loop returns on final attempt")
    }
}

impl std::fmt::Debug for TenableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenableClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
