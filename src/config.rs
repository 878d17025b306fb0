// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Startup configuration for the watch loop
//!
//! All settings are collected once at startup (CLI flags with environment
//! fallbacks) into an immutable [`WatchConfig`] that is shared by reference
//! with the frame source, the query client and the loop controller. There is
//! no ambient mutable state after initialization.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Command-line surface of the client
#[derive(Parser, Debug)]
#[command(name = "cv-robot-client")]
#[command(version)]
#[command(about = "Captures robot camera frames and queries a remote VLM for scene descriptions", long_about = None)]
pub struct WatchArgs {
    /// Remote VLM endpoint URL
    #[arg(long, env = "VLM_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Bearer credential for the VLM endpoint (never logged)
    #[arg(long, env = "ROBOT_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Robot identifier sent with every query
    #[arg(long, env = "ROBOT_ID", default_value = "Robot_CV")]
    pub robot_id: String,

    /// Prompt sent alongside every captured frame
    #[arg(long, default_value = "What do you see?")]
    pub prompt: String,

    /// Seconds between automatic captures in continuous mode
    #[arg(long, default_value_t = 1)]
    pub interval: u64,

    /// Seconds before a VLM request is abandoned
    #[arg(long, default_value_t = 30)]
    pub request_timeout: u64,

    /// Seconds before a camera capture is abandoned
    #[arg(long, default_value_t = 5)]
    pub capture_timeout: u64,

    /// Maximum retries for transient query errors
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    /// V4L2 camera device path
    #[arg(long, default_value = "/dev/video0")]
    pub camera_device: PathBuf,

    /// Use a static image file instead of the live camera
    #[arg(long)]
    pub test_image: Option<PathBuf>,

    /// Capture and query once, then exit
    #[arg(long)]
    pub once: bool,
}

/// Errors that make startup impossible
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No credential was supplied
    #[error("Missing auth token: set ROBOT_AUTH_TOKEN or pass --auth-token")]
    MissingAuthToken,

    /// No endpoint was supplied
    #[error("Missing endpoint URL: set VLM_ENDPOINT_URL or pass --endpoint-url")]
    MissingEndpoint,

    /// The endpoint is not a usable http(s) URL
    #[error("Invalid endpoint URL `{url}`: {reason}")]
    InvalidEndpoint {
        /// The rejected value
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// A numeric setting is outside its valid range
    #[error("Invalid value for {setting}: {reason}")]
    InvalidSetting {
        /// Name of the offending setting
        setting: &'static str,
        /// Why the value is invalid
        reason: String,
    },
}

/// Immutable process-wide configuration, built once at startup
#[derive(Clone)]
pub struct WatchConfig {
    /// VLM endpoint URL, trailing slash trimmed
    pub endpoint_url: String,
    /// Bearer credential for the endpoint
    pub auth_token: String,
    /// Robot identifier sent with every query
    pub robot_id: String,
    /// Prompt sent with every frame
    pub prompt: String,
    /// Delay between iterations in continuous mode
    pub capture_interval: Duration,
    /// Deadline for a single VLM request
    pub request_timeout: Duration,
    /// Deadline for a single camera capture
    pub capture_timeout: Duration,
    /// Bounded retry count for transient query errors
    pub max_retries: u32,
    /// V4L2 device path for live capture
    pub camera_device: PathBuf,
    /// Static image substituted for the live camera, if any
    pub test_image: Option<PathBuf>,
    /// Single-shot mode
    pub once: bool,
}

impl WatchConfig {
    /// Validate parsed arguments into an immutable config.
    ///
    /// Fatal at startup: every rejection names the offending setting.
    pub fn from_args(args: WatchArgs) -> Result<Self, ConfigError> {
        let endpoint_url = args.endpoint_url.ok_or(ConfigError::MissingEndpoint)?;
        let parsed = Url::parse(&endpoint_url).map_err(|e| ConfigError::InvalidEndpoint {
            url: endpoint_url.clone(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::InvalidEndpoint {
                url: endpoint_url,
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }

        let auth_token = match args.auth_token {
            Some(token) if !token.trim().is_empty() => token,
            _ => return Err(ConfigError::MissingAuthToken),
        };

        if args.interval == 0 {
            return Err(ConfigError::InvalidSetting {
                setting: "interval",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if args.request_timeout == 0 {
            return Err(ConfigError::InvalidSetting {
                setting: "request-timeout",
                reason: "must be at least 1 second".to_string(),
            });
        }
        if args.capture_timeout == 0 {
            return Err(ConfigError::InvalidSetting {
                setting: "capture-timeout",
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            endpoint_url: endpoint_url.trim_end_matches('/').to_string(),
            auth_token,
            robot_id: args.robot_id,
            prompt: args.prompt,
            capture_interval: Duration::from_secs(args.interval),
            request_timeout: Duration::from_secs(args.request_timeout),
            capture_timeout: Duration::from_secs(args.capture_timeout),
            max_retries: args.max_retries,
            camera_device: args.camera_device,
            test_image: args.test_image,
            once: args.once,
        })
    }
}

// The credential must never reach logs, so Debug redacts it.
impl std::fmt::Debug for WatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("auth_token", &"***")
            .field("robot_id", &self.robot_id)
            .field("prompt", &self.prompt)
            .field("capture_interval", &self.capture_interval)
            .field("request_timeout", &self.request_timeout)
            .field("capture_timeout", &self.capture_timeout)
            .field("max_retries", &self.max_retries)
            .field("camera_device", &self.camera_device)
            .field("test_image", &self.test_image)
            .field("once", &self.once)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> WatchArgs {
        WatchArgs {
            endpoint_url: Some("http://localhost:8081/watch".to_string()),
            auth_token: Some("secret-token".to_string()),
            robot_id: "Robot_CV".to_string(),
            prompt: "What do you see?".to_string(),
            interval: 1,
            request_timeout: 30,
            capture_timeout: 5,
            max_retries: 3,
            camera_device: PathBuf::from("/dev/video0"),
            test_image: None,
            once: false,
        }
    }

    #[test]
    fn test_valid_args_build_config() {
        let config = WatchConfig::from_args(base_args()).unwrap();
        assert_eq!(config.endpoint_url, "http://localhost:8081/watch");
        assert_eq!(config.robot_id, "Robot_CV");
        assert_eq!(config.capture_interval, Duration::from_secs(1));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let mut args = base_args();
        args.endpoint_url = Some("http://localhost:8081/watch/".to_string());
        let config = WatchConfig::from_args(args).unwrap();
        assert_eq!(config.endpoint_url, "http://localhost:8081/watch");
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut args = base_args();
        args.auth_token = None;
        let err = WatchConfig::from_args(args).unwrap_err();
        assert!(matches!(err, ConfigError::MissingAuthToken));
    }

    #[test]
    fn test_blank_token_rejected() {
        let mut args = base_args();
        args.auth_token = Some("   ".to_string());
        let err = WatchConfig::from_args(args).unwrap_err();
        assert!(matches!(err, ConfigError::MissingAuthToken));
    }

    #[test]
    fn test_missing_endpoint_rejected() {
        let mut args = base_args();
        args.endpoint_url = None;
        let err = WatchConfig::from_args(args).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEndpoint));
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let mut args = base_args();
        args.endpoint_url = Some("not a url".to_string());
        let err = WatchConfig::from_args(args).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let mut args = base_args();
        args.endpoint_url = Some("ftp://example.com/watch".to_string());
        let err = WatchConfig::from_args(args).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut args = base_args();
        args.interval = 0;
        let err = WatchConfig::from_args(args).unwrap_err();
        match err {
            ConfigError::InvalidSetting { setting, .. } => assert_eq!(setting, "interval"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        let mut args = base_args();
        args.request_timeout = 0;
        let err = WatchConfig::from_args(args).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                setting: "request-timeout",
                ..
            }
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = WatchConfig::from_args(base_args()).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("***"));
    }
}
