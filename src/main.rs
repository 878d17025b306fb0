// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use cv_robot_client::{
    camera::FrameSource,
    config::{WatchArgs, WatchConfig},
    watch::{ConsolePresenter, WatchController},
    StaticImageSource, VlmClient,
};
use std::{env, process, sync::Arc};
use tokio::signal;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting CV Robot Client...");
    println!("📦 {}", cv_robot_client::version::get_version_string());
    println!();

    let args = WatchArgs::parse();
    let config = match WatchConfig::from_args(args) {
        Ok(config) => Arc::new(config),
        Err(err) => {
            eprintln!("❌ Configuration error: {err}");
            process::exit(2);
        }
    };

    // Startup failures past this point (camera permanently unavailable,
    // unusable client settings) are fatal with a non-zero exit.
    let source = build_source(&config)?;
    let client = VlmClient::new(&config)?;

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n🛑 Shutdown signal received");
            let _ = stop_tx.send(true);
        }
    });

    let mut controller =
        WatchController::new(config, source, client, Box::new(ConsolePresenter));
    controller.run(stop_rx).await?;

    println!("👋 Clean shutdown");
    Ok(())
}

fn build_source(config: &WatchConfig) -> Result<Box<dyn FrameSource>> {
    if let Some(path) = &config.test_image {
        println!("🖼️  Using static test image: {}", path.display());
        let source = StaticImageSource::open(path)
            .with_context(|| format!("failed to load test image {}", path.display()))?;
        return Ok(Box::new(source));
    }
    live_source(config)
}

#[cfg(feature = "v4l2")]
fn live_source(config: &WatchConfig) -> Result<Box<dyn FrameSource>> {
    println!("📷 Using camera device: {}", config.camera_device.display());
    let source = cv_robot_client::V4l2Source::new(
        config.camera_device.clone(),
        config.capture_timeout,
    )
    .with_context(|| {
        format!(
            "camera unavailable at startup: {}",
            config.camera_device.display()
        )
    })?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "v4l2"))]
fn live_source(_config: &WatchConfig) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!("this build has no camera backend; rebuild with --features v4l2 or pass --test-image")
}
