// =============================================================================
// Runtime Configuration — dashboard defaults, engine settings, atomic save
// =============================================================================
//
// Every tunable lives here. All fields carry `#[serde(default)]` so adding a
// field never breaks loading an older file. A missing file means defaults; a
// file that exists but does not parse or validate is an error, never silently
// replaced.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EngineError;
use crate::indicators::IndicatorConfig;
use crate::market_data::CacheConfig;
use crate::narration::NarrationConfig;
use crate::provider::yahoo::ProviderConfig;
use crate::signals::SignalPolicy;
use crate::types::Period;

fn default_symbol() -> String {
    "RELIANCE.NS".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

/// Top-level configuration for the Ticker Pulse engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    // --- Dashboard defaults -------------------------------------------------

    /// Symbol analysed when none is given on the command line.
    #[serde(default = "default_symbol")]
    pub default_symbol: String,

    #[serde(default)]
    pub default_period: Period,

    /// Address the HTTP API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Engine ---------------------------------------------------------------

    #[serde(default)]
    pub policy: SignalPolicy,

    #[serde(default)]
    pub indicators: IndicatorConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub narration: NarrationConfig,

    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_symbol: default_symbol(),
            default_period: Period::default(),
            bind_addr: default_bind_addr(),
            policy: SignalPolicy::default(),
            indicators: IndicatorConfig::default(),
            cache: CacheConfig::default(),
            narration: NarrationConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid config in {}", path.display()))?;

        info!(
            path = %path.display(),
            default_symbol = %config.default_symbol,
            policy = ?config.policy,
            "config loaded"
        );

        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "config saved (atomic)");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.policy.validate()?;
        self.indicators.validate()?;
        self.cache.validate()?;
        if self.policy.require_macd_confirmation && !self.indicators.trend_indicators {
            return Err(EngineError::InvalidConfiguration(
                "MACD confirmation requires trend_indicators to be enabled".into(),
            ));
        }
        if self.provider.request_timeout_secs == 0 {
            return Err(EngineError::InvalidConfiguration(
                "provider.request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
