// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Report delivery seam
//!
//! The controller hands every successful report to an injected [`Presenter`],
//! so tests can substitute a collector and deployments can forward reports to
//! other consumers.

use async_trait::async_trait;

use crate::vision::WatchReport;

/// Downstream consumer of watch reports
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Deliver one report. Must not fail the loop.
    async fn present(&self, report: &WatchReport);
}

/// Renders reports as a console table
pub struct ConsolePresenter;

#[async_trait]
impl Presenter for ConsolePresenter {
    async fn present(&self, report: &WatchReport) {
        let objects = if report.objects.is_empty() {
            "N/A".to_string()
        } else {
            report.objects.join(", ")
        };

        println!();
        println!("😎 Robot Vision Result");
        println!("─────────────────────────────────────────");
        println!("🤖 Robot ID           {}", field(&report.robot_id));
        println!(
            "🏞️  Image Size         {}",
            report
                .file_size_bytes
                .map(|n| format!("{n} bytes"))
                .unwrap_or_else(|| "N/A".to_string())
        );
        println!("📝 Description        {}", report.description);
        println!("🏛️  Environment        {}", field(&report.environment));
        println!("🚪 Indoors/Outdoors   {}", field(&report.indoor_or_outdoor));
        println!("💡 Lighting           {}", field(&report.lighting_condition));
        println!("👥 Human              {}", field(&report.human));
        println!("🐶 Animals            {}", field(&report.animals));
        println!("📦 Objects            {objects}");
        println!("🚧 Hazards            {}", field(&report.hazards));
        println!("─────────────────────────────────────────");
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}
