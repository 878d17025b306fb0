// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! The capture-query-present watch loop
//!
//! This module provides:
//! - The loop controller driving capture → query → present iterations
//! - The presenter seam for delivering reports downstream

pub mod controller;
pub mod presenter;

pub use controller::{LoopState, WatchController};
pub use presenter::{ConsolePresenter, Presenter};
