// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wire types and error taxonomy for VLM queries

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::image_utils::ImageError;

/// One query to the VLM endpoint: a frame paired with a prompt
#[derive(Debug, Clone, Serialize)]
pub struct WatchRequest {
    /// Robot identifier, echoed back in reports
    pub robot_id: String,
    /// Text prompt sent alongside the image
    pub prompt: String,
    /// Base64-encoded JPEG payload
    pub image_b64: String,
}

/// Structured scene report returned by the VLM endpoint.
///
/// Only `description` is required; the remaining fields are filled in when
/// the remote model provides a structured analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchReport {
    /// Natural-language scene description
    pub description: String,
    /// Scene environment (e.g., "kitchen", "street")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// "indoor" or "outdoor"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indoor_or_outdoor: Option<String>,
    /// Lighting condition (e.g., "bright", "dim")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting_condition: Option<String>,
    /// Whether humans are visible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human: Option<String>,
    /// Whether animals are visible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animals: Option<String>,
    /// Objects identified in the frame
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<String>,
    /// Hazards identified in the frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hazards: Option<String>,
    /// Size of the analyzed image as seen by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    /// Robot identifier echoed by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robot_id: Option<String>,
}

/// Errors that can occur while querying the VLM endpoint
#[derive(Debug, Error)]
pub enum QueryError {
    /// The credential was rejected
    #[error("Authentication rejected by VLM endpoint (HTTP {status})")]
    Auth {
        /// HTTP status returned (401 or 403)
        status: u16,
    },

    /// The endpoint could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// No response within the request deadline
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// The deadline that was exceeded
        timeout_ms: u64,
    },

    /// The endpoint returned a failure status
    #[error("VLM endpoint error: HTTP {status} - {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// The response body is not a usable watch report
    #[error("Malformed response from VLM endpoint: {0}")]
    Malformed(String),

    /// The frame could not be turned into a transport payload
    #[error("Image payload error: {0}")]
    Image(#[from] ImageError),

    /// A transient error persisted through the whole retry budget
    #[error("{source} (giving up after {attempts} attempts)")]
    RetriesExhausted {
        /// Total attempts made, initial attempt included
        attempts: u32,
        /// The last transient error observed
        #[source]
        source: Box<QueryError>,
    },
}

impl QueryError {
    /// Whether a retry could plausibly change the outcome.
    ///
    /// Server-side 5xx statuses count as transient; auth rejections and
    /// malformed bodies do not, since retrying cannot change them. An
    /// exhausted retry budget is final even though its cause was transient.
    pub fn is_transient(&self) -> bool {
        match self {
            QueryError::Network(_) | QueryError::Timeout { .. } => true,
            QueryError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_full_deserialization() {
        let json = serde_json::json!({
            "description": "a cluttered workbench",
            "environment": "workshop",
            "indoor_or_outdoor": "indoor",
            "lighting_condition": "bright",
            "human": "no",
            "animals": "no",
            "objects": ["drill", "vise", "cables"],
            "hazards": "loose cables on the floor",
            "file_size_bytes": 48213,
            "robot_id": "Robot_CV"
        });
        let report: WatchReport = serde_json::from_value(json).unwrap();
        assert_eq!(report.description, "a cluttered workbench");
        assert_eq!(report.objects.len(), 3);
        assert_eq!(report.hazards.as_deref(), Some("loose cables on the floor"));
        assert_eq!(report.file_size_bytes, Some(48213));
    }

    #[test]
    fn test_report_description_only() {
        let json = serde_json::json!({ "description": "a red ball" });
        let report: WatchReport = serde_json::from_value(json).unwrap();
        assert_eq!(report.description, "a red ball");
        assert!(report.environment.is_none());
        assert!(report.objects.is_empty());
    }

    #[test]
    fn test_report_without_description_rejected() {
        let json = serde_json::json!({ "environment": "kitchen" });
        let result: Result<WatchReport, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_request_serialization() {
        let request = WatchRequest {
            robot_id: "Robot_CV".to_string(),
            prompt: "What do you see?".to_string(),
            image_b64: "aGVsbG8=".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["robot_id"], "Robot_CV");
        assert_eq!(json["prompt"], "What do you see?");
        assert_eq!(json["image_b64"], "aGVsbG8=");
    }

    #[test]
    fn test_transient_kinds() {
        assert!(QueryError::Network("connection reset".to_string()).is_transient());
        assert!(QueryError::Timeout { timeout_ms: 30000 }.is_transient());
        assert!(QueryError::Server {
            status: 503,
            message: String::new()
        }
        .is_transient());
    }

    #[test]
    fn test_exhausted_display_names_attempt_count() {
        let err = QueryError::RetriesExhausted {
            attempts: 4,
            source: Box::new(QueryError::Network("connection refused".to_string())),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("giving up after 4 attempts"));
        assert!(rendered.contains("connection refused"));
        // The budget is spent: no further retries
        assert!(!err.is_transient());
    }

    #[test]
    fn test_permanent_kinds() {
        assert!(!QueryError::Auth { status: 401 }.is_transient());
        assert!(!QueryError::Malformed("not json".to_string()).is_transient());
        // Client-side failure statuses are not retried either
        assert!(!QueryError::Server {
            status: 422,
            message: String::new()
        }
        .is_transient());
    }
}
