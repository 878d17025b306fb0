// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod camera;
pub mod config;
pub mod version;
pub mod vision;
pub mod watch;

// Re-export main types
pub use camera::{CaptureError, Frame, FrameSource, StaticImageSource};
#[cfg(feature = "v4l2")]
pub use camera::V4l2Source;
pub use config::{ConfigError, WatchArgs, WatchConfig};
pub use vision::{QueryError, VlmClient, WatchReport, WatchRequest};
pub use watch::{ConsolePresenter, LoopState, Presenter, WatchController};
