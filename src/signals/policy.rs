// =============================================================================
// Signal Policy — threshold sets for the classifier
// =============================================================================
//
// Two policies are in use:
//   rsi       RSI < 30 => Buy, RSI > 70 => Sell
//   rsi-macd  RSI < 35 and MACD > signal => Buy,
//             RSI > 65 and MACD < signal => Sell
// Both are plain values of `SignalPolicy`; nothing else is hard-coded.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

fn default_buy_threshold() -> f64 {
    30.0
}

fn default_sell_threshold() -> f64 {
    70.0
}

/// Preset names accepted by [`SignalPolicy::preset`].
pub const PRESET_NAMES: &[&str] = &["rsi", "rsi-macd"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalPolicy {
    /// RSI strictly below this value is oversold.
    #[serde(default = "default_buy_threshold")]
    pub buy_threshold: f64,

    /// RSI strictly above this value is overbought.
    #[serde(default = "default_sell_threshold")]
    pub sell_threshold: f64,

    /// Require MACD to confirm the direction before emitting Buy or Sell.
    #[serde(default)]
    pub require_macd_confirmation: bool,
}

impl Default for SignalPolicy {
    fn default() -> Self {
        Self::rsi_only()
    }
}

impl SignalPolicy {
    /// RSI-only policy with the classic 30 / 70 bands.
    pub fn rsi_only() -> Self {
        Self {
            buy_threshold: default_buy_threshold(),
            sell_threshold: default_sell_threshold(),
            require_macd_confirmation: false,
        }
    }

    /// RSI with MACD confirmation, 35 / 65 bands.
    pub fn macd_confirmed() -> Self {
        Self {
            buy_threshold: 35.0,
            sell_threshold: 65.0,
            require_macd_confirmation: true,
        }
    }

    /// Look up a named preset. Unknown names fail instead of falling back.
    pub fn preset(name: &str) -> Result<Self, EngineError> {
        match name.trim() {
            "rsi" => Ok(Self::rsi_only()),
            "rsi-macd" => Ok(Self::macd_confirmed()),
            other => Err(EngineError::InvalidConfiguration(format!(
                "unknown signal policy '{other}' (expected one of {})",
                PRESET_NAMES.join(", ")
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let (buy, sell) = (self.buy_threshold, self.sell_threshold);
        if !buy.is_finite() || !sell.is_finite() {
            return Err(EngineError::InvalidConfiguration(
                "signal thresholds must be finite".into(),
            ));
        }
        if !(0.0..=100.0).contains(&buy) || !(0.0..=100.0).contains(&sell) {
            return Err(EngineError::InvalidConfiguration(format!(
                "signal thresholds must lie in [0, 100] (buy {buy}, sell {sell})"
            )));
        }
        if buy >= sell {
            return Err(EngineError::InvalidConfiguration(format!(
                "buy threshold {buy} must be below sell threshold {sell}"
            )));
        }
        Ok(())
    }
}
