// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP client for the remote VLM watch endpoint
//!
//! One POST per query: a base64 JPEG frame plus a text prompt, authenticated
//! with a bearer token. Transient failures (network, timeout, 5xx) are
//! retried with bounded exponential backoff; auth rejections and malformed
//! responses surface immediately since retrying cannot change them.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::image_utils;
use super::types::{QueryError, WatchReport, WatchRequest};
use crate::camera::Frame;
use crate::config::{ConfigError, WatchConfig};

/// First retry delay; doubles per retry
const BASE_BACKOFF_MS: u64 = 250;
/// Backoff ceiling
const MAX_BACKOFF_MS: u64 = 5_000;

/// Client for the remote VLM watch endpoint
pub struct VlmClient {
    client: Client,
    endpoint: String,
    auth_token: String,
    robot_id: String,
    request_timeout: Duration,
    max_retries: u32,
}

impl VlmClient {
    /// Create a new VLM client from the startup configuration
    pub fn new(config: &WatchConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::InvalidSetting {
                setting: "request-timeout",
                reason: e.to_string(),
            })?;

        info!(
            "VLM client configured: endpoint={}, robot_id={}, max_retries={}",
            config.endpoint_url, config.robot_id, config.max_retries
        );

        Ok(Self {
            client,
            endpoint: config.endpoint_url.clone(),
            auth_token: config.auth_token.clone(),
            robot_id: config.robot_id.clone(),
            request_timeout: config.request_timeout,
            max_retries: config.max_retries,
        })
    }

    /// Query the endpoint with one frame and prompt.
    ///
    /// Issues one initial attempt plus up to `max_retries` retries for
    /// transient errors. Returns the report from the first successful
    /// attempt; once retries are exhausted the last transient error is
    /// surfaced wrapped in [`QueryError::RetriesExhausted`] so the attempt
    /// count reaches the caller. Permanent errors (and transient errors when
    /// no retry budget exists) surface as-is.
    pub async fn describe(&self, frame: &Frame, prompt: &str) -> Result<WatchReport, QueryError> {
        let image_b64 = image_utils::to_base64(&frame.data)?;
        let request = WatchRequest {
            robot_id: self.robot_id.clone(),
            prompt: prompt.to_string(),
            image_b64,
        };
        debug!(
            "querying VLM: {}x{} frame ({} bytes), prompt={:?}",
            frame.width,
            frame.height,
            frame.size_bytes(),
            prompt
        );

        let mut retry = 0u32;
        loop {
            match self.send_once(&request).await {
                Ok(report) => {
                    if retry > 0 {
                        info!("query succeeded after {} retries", retry);
                    }
                    return Ok(report);
                }
                Err(err) if err.is_transient() && retry < self.max_retries => {
                    retry += 1;
                    let delay = backoff_delay(retry);
                    warn!(
                        "transient query error (retry {}/{}): {}; backing off {:?}",
                        retry, self.max_retries, err, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) if err.is_transient() && retry > 0 => {
                    let attempts = retry + 1;
                    warn!("giving up after {} attempts: {}", attempts, err);
                    return Err(QueryError::RetriesExhausted {
                        attempts,
                        source: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(&self, request: &WatchRequest) -> Result<WatchReport, QueryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.auth_token)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QueryError::Timeout {
                        timeout_ms: self.request_timeout.as_millis() as u64,
                    }
                } else {
                    QueryError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(QueryError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(QueryError::Server {
                status: status.as_u16(),
                message,
            });
        }

        // The deadline can also expire while the body is being read; that is
        // still a timeout, not a malformed response.
        let report: WatchReport = response.json().await.map_err(|e| {
            if e.is_timeout() {
                QueryError::Timeout {
                    timeout_ms: self.request_timeout.as_millis() as u64,
                }
            } else if e.is_decode() {
                QueryError::Malformed(e.to_string())
            } else {
                QueryError::Network(e.to_string())
            }
        })?;
        if report.description.trim().is_empty() {
            return Err(QueryError::Malformed("empty description".to_string()));
        }

        Ok(report)
    }
}

// The credential must never reach logs.
impl std::fmt::Debug for VlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VlmClient")
            .field("endpoint", &self.endpoint)
            .field("auth_token", &"***")
            .field("robot_id", &self.robot_id)
            .field("request_timeout", &self.request_timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Exponential backoff for the nth retry (1-based), capped
fn backoff_delay(retry: u32) -> Duration {
    let exp = retry.saturating_sub(1).min(16);
    let ms = BASE_BACKOFF_MS
        .saturating_mul(1u64 << exp)
        .min(MAX_BACKOFF_MS);
    Duration::from_millis(ms)
}
