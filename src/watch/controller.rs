// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Loop controller for the capture-query-present cycle
//!
//! One logical thread of control: iterations run strictly in sequence
//! (Idle → Capturing → Querying → Presenting → Idle), a new capture never
//! starts before the previous iteration has returned to Idle or Stopped.
//! Per-iteration failures are logged and contained; only the shutdown signal
//! ends the loop.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::presenter::Presenter;
use crate::camera::FrameSource;
use crate::config::WatchConfig;
use crate::vision::VlmClient;

/// Pause after a failed capture before returning to Idle
const CAPTURE_COOLDOWN: Duration = Duration::from_secs(1);

/// Loop controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the next trigger
    Idle,
    /// Pulling a frame from the source
    Capturing,
    /// Waiting on the VLM endpoint
    Querying,
    /// Delivering the report downstream
    Presenting,
    /// Terminal: shutdown signal observed
    Stopped,
}

/// Orchestrates capture → query → present iterations
pub struct WatchController {
    config: Arc<WatchConfig>,
    source: Box<dyn FrameSource>,
    client: VlmClient,
    presenter: Box<dyn Presenter>,
    state: LoopState,
    iterations: u64,
    presented: u64,
}

impl WatchController {
    pub fn new(
        config: Arc<WatchConfig>,
        source: Box<dyn FrameSource>,
        client: VlmClient,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        Self {
            config,
            source,
            client,
            presenter,
            state: LoopState::Idle,
            iterations: 0,
            presented: 0,
        }
    }

    /// Current loop state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Iterations started so far
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Reports delivered so far
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Drive the loop until shutdown (or after one iteration in single-shot
    /// mode).
    ///
    /// The shutdown signal is honored while idling and across the capture and
    /// query awaits: cancelling mid-iteration drops the in-flight future,
    /// which releases the camera handle and the connection with it.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            "watch loop started: mode={}, interval={:?}",
            if self.config.once { "single-shot" } else { "continuous" },
            self.config.capture_interval
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = self.run_iteration() => {}
            }

            if self.config.once {
                break;
            }

            self.state = LoopState::Idle;
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.config.capture_interval) => {}
            }
        }

        self.state = LoopState::Stopped;
        info!(
            "watch loop stopped after {} iterations ({} presented)",
            self.iterations, self.presented
        );
        Ok(())
    }

    /// One full capture → query → present cycle. Never fails the loop.
    async fn run_iteration(&mut self) {
        self.iterations += 1;

        self.state = LoopState::Capturing;
        let frame = match self.source.capture().await {
            Ok(frame) => frame,
            Err(err) => {
                warn!("capture failed: {err}");
                tokio::time::sleep(CAPTURE_COOLDOWN).await;
                return;
            }
        };
        debug!(
            "captured {}x{} frame ({} bytes)",
            frame.width,
            frame.height,
            frame.size_bytes()
        );

        self.state = LoopState::Querying;
        let report = match self.client.describe(&frame, &self.config.prompt).await {
            Ok(report) => report,
            Err(err) => {
                error!("query failed: {err}");
                return;
            }
        };

        self.state = LoopState::Presenting;
        self.presenter.present(&report).await;
        self.presented += 1;
    }
}
