//! Blocking HTTP client for the racerd wire protocol.
//!
//! Racerd answers with JSON on 200 OK and with 204 No Content when a
//! request succeeded but produced no completions or definitions. Any
//! other status is a transport failure carrying the observed code.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// Request deadline for a single HTTP exchange.
pub const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Blocking HTTP client bound to the racerd JSON conventions.
#[derive(Debug)]
pub struct HttpClient {
    /// Underlying HTTP client.
    client: reqwest::blocking::Client,
}

impl HttpClient {
    /// Creates a new client with the bridge's default request deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Creates a new client with an explicit request deadline.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent("racerd-bridge")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self { client }
    }

    /// POSTs `body` as JSON to `endpoint` on the server at `base`.
    ///
    /// Blocks the calling thread until the exchange completes or the
    /// deadline expires. A 204 yields `Ok(None)`; any other 2xx yields
    /// the parsed JSON body; a non-2xx status yields
    /// [`Error::Transport`] with the exact code.
    pub fn post<T: Serialize>(
        &self,
        base: &str,
        endpoint: &str,
        body: &T,
    ) -> Result<Option<Value>> {
        let url = target_url(base, endpoint);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(classify)?;

        let status = response.status();
        if status.as_u16() == 204 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::Transport {
                status: status.as_u16(),
            });
        }

        let value = response.json::<Value>().map_err(classify)?;
        Ok(Some(value))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Joins the server's base address with an endpoint path.
fn target_url(base: &str, endpoint: &str) -> String {
    format!(
        "http://{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// Distinguishes deadline expiry from other HTTP failures.
fn classify(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout
    } else {
        Error::Http(error)
    }
}
