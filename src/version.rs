// Version information for the CV Robot Client

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-watch-loop-2026-08-30";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2026-08-30";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "v4l2-capture",
    "static-image-source",
    "bounded-retry-backoff",
    "single-shot-mode",
    "structured-watch-report",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("CV Robot Client {} ({})", VERSION_NUMBER, BUILD_DATE)
}
