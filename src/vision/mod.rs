// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Remote VLM query client
//!
//! This module provides:
//! - The HTTP client that sends one frame + prompt per query
//! - The wire types for requests and structured watch reports
//! - Frame encoding helpers (JPEG + base64 payloads)
//!
//! All inference happens on the remote endpoint; nothing here touches a model.

pub mod image_utils;
pub mod types;
pub mod vlm_client;

pub use image_utils::{detect_format, encode_jpeg, to_base64, ImageError};
pub use types::{QueryError, WatchReport, WatchRequest};
pub use vlm_client::VlmClient;
