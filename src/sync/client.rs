//! Blocking HTTP client for the bulk submit endpoint.

use std::time::Duration;

use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::{EngineError, Result};

use super::wire::{RemoteFieldErrors, SubmitRequest, flatten_field_errors};

pub struct SubmitClient {
    url: String,
    http: reqwest::blocking::Client,
}

impl SubmitClient {
    pub fn new(remote: &RemoteConfig) -> Result<Self> {
        if remote.base_url.is_empty() {
            return Err(EngineError::MissingConfig("remote.base_url".to_string()));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(remote.timeout_secs))
            .build()
            .map_err(|e| EngineError::Config(format!("HTTP client error: {e}")))?;
        Ok(Self {
            url: format!("{}{}", remote.base_url, remote.submit_path),
            http,
        })
    }

    /// One POST per submission; any 2xx commits. A 422 body carries field
    /// errors surfaced verbatim; everything else is a transport failure.
    pub fn post_bulk(&self, request: &SubmitRequest, request_id: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("X-Request-ID", request_id)
            .json(request)
            .send()
            .map_err(|e| EngineError::Transport(format!("bulk submit failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "bulk submit accepted");
            return Ok(());
        }

        let body = response
            .text()
            .map_err(|e| EngineError::Transport(format!("failed to read submit response: {e}")))?;

        if status.as_u16() == 422 {
            let parsed: RemoteFieldErrors = serde_json::from_str(&body).unwrap_or_default();
            let messages = flatten_field_errors(&parsed);
            if messages.is_empty() {
                return Err(EngineError::Transport(format!(
                    "bulk submit rejected ({status})"
                )));
            }
            return Err(EngineError::RemoteRejected { messages });
        }

        Err(EngineError::Transport(format!(
            "bulk submit failed ({status})"
        )))
    }
}
