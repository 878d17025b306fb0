// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Live camera capture via V4L2
//!
//! The device is opened inside each capture call and released when the grab
//! finishes, so the exclusive handle is never held between iterations.

use async_trait::async_trait;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use super::{CaptureError, Frame, FrameSource};

/// Frames drained before the one returned, so auto-exposure can settle
const WARMUP_FRAMES: usize = 2;

/// V4L2-backed frame source requesting MJPEG frames
pub struct V4l2Source {
    device: PathBuf,
    width: u32,
    height: u32,
    timeout: Duration,
}

impl V4l2Source {
    /// Create a source for the given device path.
    ///
    /// Probes the device once so a permanently missing camera fails at
    /// startup rather than on the first loop iteration.
    pub fn new(device: PathBuf, timeout: Duration) -> Result<Self, CaptureError> {
        Device::with_path(&device).map_err(|e| {
            CaptureError::Device(format!("{}: {}", device.display(), e))
        })?;
        debug!("camera probe ok: {}", device.display());

        Ok(Self {
            device,
            width: 1280,
            height: 720,
            timeout,
        })
    }

    /// Override the requested capture resolution
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

impl std::fmt::Debug for V4l2Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4l2Source")
            .field("device", &self.device)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl FrameSource for V4l2Source {
    async fn capture(&mut self) -> Result<Frame, CaptureError> {
        let device = self.device.clone();
        let (width, height) = (self.width, self.height);

        let grab = tokio::task::spawn_blocking(move || grab_jpeg(&device, width, height));

        // On timeout the blocking grab runs to completion on its worker
        // thread; the device handle is released when it finishes.
        match tokio::time::timeout(self.timeout, grab).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(CaptureError::Device(join_err.to_string())),
            Err(_) => Err(CaptureError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

/// Open the device, negotiate MJPEG and grab one frame.
fn grab_jpeg(path: &Path, width: u32, height: u32) -> Result<Frame, CaptureError> {
    let device = Device::with_path(path)
        .map_err(|e| CaptureError::Device(format!("{}: {}", path.display(), e)))?;

    let mut format = device
        .format()
        .map_err(|e| CaptureError::Device(format!("query format: {e}")))?;
    format.width = width;
    format.height = height;
    format.fourcc = FourCC::new(b"MJPG");
    let format = device
        .set_format(&format)
        .map_err(|e| CaptureError::Device(format!("set format: {e}")))?;
    if format.fourcc.repr != *b"MJPG" {
        return Err(CaptureError::Device(format!(
            "device does not support MJPEG (got {})",
            format.fourcc
        )));
    }

    let mut stream = MmapStream::with_buffers(&device, Type::VideoCapture, 4)
        .map_err(|e| CaptureError::Device(format!("start stream: {e}")))?;

    for _ in 0..WARMUP_FRAMES {
        stream
            .next()
            .map_err(|e| CaptureError::Device(format!("warmup read: {e}")))?;
    }

    let (buffer, meta) = stream
        .next()
        .map_err(|e| CaptureError::Device(format!("read frame: {e}")))?;
    let used = payload_len(meta.bytesused, buffer.len());
    if used == 0 {
        return Err(CaptureError::EmptyFrame);
    }

    debug!(
        "grabbed {}x{} MJPEG frame ({} bytes)",
        format.width, format.height, used
    );

    Ok(Frame {
        data: buffer[..used].to_vec(),
        width: format.width,
        height: format.height,
        format: ImageFormat::Jpeg,
    })
}

/// Drivers can misreport `bytesused`; never slice past the mapped buffer.
fn payload_len(bytesused: u32, buffer_len: usize) -> usize {
    (bytesused as usize).min(buffer_len)
}
