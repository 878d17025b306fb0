// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Static image frame source
//!
//! Substitutes a file for the live camera (`--test-image`). The file is
//! decoded once at startup and re-encoded to JPEG; every capture then serves
//! the same frame.

use async_trait::async_trait;
use image::ImageFormat;
use std::path::Path;
use tracing::info;

use super::{CaptureError, Frame, FrameSource};
use crate::vision::image_utils::{self, ImageError};

/// Frame source backed by a single image file
#[derive(Debug, Clone)]
pub struct StaticImageSource {
    frame: Frame,
}

impl StaticImageSource {
    /// Load and re-encode the image at `path`.
    ///
    /// Fails at startup for a missing file, an unsupported format or a
    /// corrupted image, mirroring a permanently unavailable camera.
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let bytes = std::fs::read(path)
            .map_err(|e| CaptureError::Device(format!("{}: {}", path.display(), e)))?;
        if bytes.is_empty() {
            return Err(CaptureError::Image(ImageError::EmptyData));
        }

        let source_format = image_utils::detect_format(&bytes)?;
        let img = image::load_from_memory_with_format(&bytes, source_format)
            .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;
        let data = image_utils::encode_jpeg(&img)?;

        info!(
            "static test image loaded: {} ({}x{} {}, {} bytes as JPEG)",
            path.display(),
            img.width(),
            img.height(),
            image_utils::format_to_extension(source_format),
            data.len()
        );

        Ok(Self {
            frame: Frame {
                width: img.width(),
                height: img.height(),
                data,
                format: ImageFormat::Jpeg,
            },
        })
    }

    /// Build a source from an already-encoded frame (test seam)
    pub fn from_frame(frame: Frame) -> Self {
        Self { frame }
    }
}

#[async_trait]
impl FrameSource for StaticImageSource {
    async fn capture(&mut self) -> Result<Frame, CaptureError> {
        Ok(self.frame.clone())
    }
}
