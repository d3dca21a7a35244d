//! TOML configuration for the run panel.
//!
//! Layered model: compiled-in defaults, overridden by an optional config
//! file, with the file path itself overridable through `RUNPANEL_CONFIG`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::notify::NOTICE_TTL_MS;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the panel process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub panel: PanelTuning,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PanelConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded panel configuration");
        Ok(config)
    }

    /// Try to load configuration from, in order:
    /// 1. The path specified by the `RUNPANEL_CONFIG` environment variable.
    /// 2. `./runpanel.toml`.
    /// 3. Fall back to compiled-in defaults.
    pub fn load_or_default() -> Self {
        // 1. Environment variable override.
        if let Ok(env_path) = std::env::var("RUNPANEL_CONFIG") {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "RUNPANEL_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        // 2. Working-directory config file.
        let local_path = Path::new("runpanel.toml");
        if local_path.exists() {
            match Self::load(local_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %local_path.display(),
                        error = %e,
                        "local config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        // 3. Defaults.
        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Job source
// ---------------------------------------------------------------------------

/// Where job snapshots come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// API root of the shop-floor backend.
    pub base_url: String,
    /// Per-request timeout (seconds).
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Panel tuning
// ---------------------------------------------------------------------------

/// Clock and refresh cadence for the live panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelTuning {
    /// Wall-clock tick driving duration updates (milliseconds).
    pub tick_ms: u64,
    /// How often the job snapshot is re-fetched (seconds).
    pub refresh_secs: u64,
    /// How long operator notices stay visible (milliseconds).
    pub notice_ttl_ms: i64,
}

impl Default for PanelTuning {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            refresh_secs: 30,
            notice_ttl_ms: NOTICE_TTL_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
