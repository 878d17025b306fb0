// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Frame sources for the watch loop
//!
//! A frame source hands the controller one JPEG-encoded frame per capture
//! call, bounded by the configured capture timeout. Two implementations are
//! provided: a live V4L2 camera (behind the `v4l2` feature) and a static
//! image file for testing without hardware.

pub mod static_source;
#[cfg(feature = "v4l2")]
pub mod v4l2;

pub use static_source::StaticImageSource;
#[cfg(feature = "v4l2")]
pub use v4l2::V4l2Source;

use async_trait::async_trait;
use image::ImageFormat;
use thiserror::Error;

use crate::vision::image_utils::ImageError;

/// Errors produced while capturing a frame.
///
/// All of these are per-iteration errors: the loop controller logs them and
/// keeps running.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The camera device could not be opened, configured or read
    #[error("Camera unavailable: {0}")]
    Device(String),

    /// No frame arrived within the capture deadline
    #[error("Capture timed out after {timeout_ms}ms")]
    Timeout {
        /// The deadline that was exceeded
        timeout_ms: u64,
    },

    /// The device delivered a zero-length buffer
    #[error("Camera produced an empty frame")]
    EmptyFrame,

    /// The frame bytes could not be decoded or re-encoded
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// One captured image, immutable once produced
#[derive(Debug, Clone)]
pub struct Frame {
    /// Encoded image bytes (JPEG for both sources)
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Encoding of `data`
    pub format: ImageFormat,
}

impl Frame {
    /// Size of the encoded payload in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Anything that can produce frames on demand.
///
/// The controller owns exactly one source and calls it sequentially, so
/// implementations may hold per-call device state without synchronization.
#[async_trait]
pub trait FrameSource: Send {
    /// Capture a single frame, bounded by the source's configured timeout.
    async fn capture(&mut self) -> Result<Frame, CaptureError>;
}
