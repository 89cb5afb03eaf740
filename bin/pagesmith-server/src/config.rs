//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

use pagesmith_core::GhostscriptOptions;

/// Runtime configuration for pagesmith-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind (default: `"0.0.0.0"`).
    pub host: String,

    /// TCP port, read from the conventional `PORT` variable (default: `8080`).
    pub port: u16,

    /// Directory for staged uploads and results (default: `"./data/tmp"`).
    pub scratch_dir: PathBuf,

    /// Ghostscript executable name or path.
    pub gs_binary: PathBuf,

    /// Raster resolution in dpi.
    pub resolution: u32,

    /// JPEG quality, 0-100.
    pub jpeg_quality: u8,

    /// Per-invocation Ghostscript timeout in seconds; `0` disables it.
    pub tool_timeout_secs: u64,

    /// Maximum request body size in MiB.
    pub max_upload_size_mb: usize,

    /// Comma-separated CORS allow-list; `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve the OpenAPI document at `/api/openapi.json`.
    pub enable_docs: bool,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: env_or("PAGESMITH_HOST", "0.0.0.0"),
            port: parse_env("PORT", 8080),
            scratch_dir: PathBuf::from(env_or("PAGESMITH_SCRATCH_DIR", "./data/tmp")),
            gs_binary: PathBuf::from(env_or("PAGESMITH_GS_BIN", "gs")),
            resolution: parse_env("PAGESMITH_RESOLUTION", 300),
            jpeg_quality: parse_env::<u8>("PAGESMITH_JPEG_QUALITY", 90).min(100),
            tool_timeout_secs: parse_env("PAGESMITH_TOOL_TIMEOUT_SECS", 0),
            max_upload_size_mb: parse_env("PAGESMITH_MAX_UPLOAD_SIZE_MB", 100),
            cors_allowed_origins: std::env::var("PAGESMITH_CORS_ORIGINS")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            enable_docs: parse_flag("PAGESMITH_ENABLE_DOCS", true),
            log_level: env_or("PAGESMITH_LOG", "info"),
            log_json: parse_flag("PAGESMITH_LOG_JSON", false),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn ghostscript(&self) -> GhostscriptOptions {
        GhostscriptOptions {
            binary: self.gs_binary.clone(),
            resolution: self.resolution,
            jpeg_quality: self.jpeg_quality,
            timeout: (self.tool_timeout_secs > 0)
                .then(|| Duration::from_secs(self.tool_timeout_secs)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8080,
            scratch_dir: PathBuf::from("./data/tmp"),
            gs_binary: PathBuf::from("gs"),
            resolution: 300,
            jpeg_quality: 90,
            tool_timeout_secs: 0,
            max_upload_size_mb: 100,
            cors_allowed_origins: None,
            enable_docs: true,
            log_level: "info".to_owned(),
            log_json: false,
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}
