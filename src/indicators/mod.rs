// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators shown on the
// dashboard. Warm-up and numerical edge cases surface as `None`, never as a
// NaN sentinel, so every consumer has to handle absence explicitly.

pub mod ema;
pub mod macd;
pub mod rsi;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use self::ema::{calculate_ema, DEFAULT_EMA_PERIOD};
use self::macd::{calculate_macd, DEFAULT_MACD_FAST, DEFAULT_MACD_SIGNAL, DEFAULT_MACD_SLOW};
use self::rsi::{calculate_rsi, DEFAULT_RSI_WINDOW};

fn default_rsi_window() -> usize {
    DEFAULT_RSI_WINDOW
}

fn default_ema_period() -> usize {
    DEFAULT_EMA_PERIOD
}

fn default_macd_fast() -> usize {
    DEFAULT_MACD_FAST
}

fn default_macd_slow() -> usize {
    DEFAULT_MACD_SLOW
}

fn default_macd_signal() -> usize {
    DEFAULT_MACD_SIGNAL
}

fn default_true() -> bool {
    true
}

// =============================================================================
// IndicatorConfig
// =============================================================================

/// Look-back windows for every indicator the engine derives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,

    #[serde(default = "default_ema_period")]
    pub ema_period: usize,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    /// Compute MACD and EMA alongside RSI. When `false` only RSI is derived
    /// and the trend fields of every reading stay `None`.
    #[serde(default = "default_true")]
    pub trend_indicators: bool,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_window: default_rsi_window(),
            ema_period: default_ema_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            trend_indicators: true,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let windows = [
            ("rsi_window", self.rsi_window),
            ("ema_period", self.ema_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, w)| *w == 0) {
            return Err(EngineError::InvalidConfiguration(format!(
                "{name} must be at least 1"
            )));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(EngineError::InvalidConfiguration(format!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        Ok(())
    }
}

// =============================================================================
// IndicatorReading
// =============================================================================

/// Indicator values for one bar, aligned with the price series by index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal_line: Option<f64>,
    pub ema: Option<f64>,
}

impl IndicatorReading {
    /// MACD minus signal line, when both are defined.
    pub fn histogram(&self) -> Option<f64> {
        Some(self.macd? - self.signal_line?)
    }
}

/// Derive one [`IndicatorReading`] per close.
///
/// Total over any input length; an empty slice yields an empty vec.
pub fn compute_readings(closes: &[f64], config: &IndicatorConfig) -> Vec<IndicatorReading> {
    let rsi = calculate_rsi(closes, config.rsi_window);

    let (ema, macd) = if config.trend_indicators {
        (
            calculate_ema(closes, config.ema_period),
            calculate_macd(closes, config.macd_fast, config.macd_slow, config.macd_signal),
        )
    } else {
        Default::default()
    };

    (0..closes.len())
        .map(|i| IndicatorReading {
            rsi: rsi[i],
            macd: finite_at(&macd.macd, i),
            signal_line: finite_at(&macd.signal, i),
            ema: finite_at(&ema, i),
        })
        .collect()
}

fn finite_at(series: &[f64], i: usize) -> Option<f64> {
    series.get(i).copied().filter(|v| v.is_finite())
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_are_aligned_with_closes() {
        let closes: Vec<f64> = (1..=40).map(|x| x as f64).collect();
        let readings = compute_readings(&closes, &IndicatorConfig::default());
        assert_eq!(readings.len(), closes.len());
    }

    #[test]
    fn readings_of_empty_series_are_empty() {
        assert!(compute_readings(&[], &IndicatorConfig::default()).is_empty());
    }

    #[test]
    fn warm_up_leaves_rsi_undefined_but_trend_defined() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let readings = compute_readings(&closes, &IndicatorConfig::default());
        assert_eq!(readings[12].rsi, None);
        assert!(readings[13].rsi.is_some());
        assert_eq!(readings[0].ema, Some(1.0));
        assert_eq!(readings[0].macd, Some(0.0));
        assert_eq!(readings[0].signal_line, Some(0.0));
    }

    #[test]
    fn rsi_only_config_skips_trend_fields() {
        let config = IndicatorConfig {
            trend_indicators: false,
            ..IndicatorConfig::default()
        };
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let readings = compute_readings(&closes, &config);
        let last = readings.last().unwrap();
        assert_eq!(last.rsi, Some(100.0));
        assert_eq!(last.macd, None);
        assert_eq!(last.signal_line, None);
        assert_eq!(last.ema, None);
    }

    #[test]
    fn compute_does_not_touch_input() {
        let closes = vec![3.0, 1.0, 2.0];
        let copy = closes.clone();
        let _ = compute_readings(&closes, &IndicatorConfig::default());
        assert_eq!(closes, copy);
    }

    #[test]
    fn histogram_requires_both_lines() {
        let reading = IndicatorReading {
            macd: Some(1.5),
            signal_line: Some(1.0),
            ..IndicatorReading::default()
        };
        assert_eq!(reading.histogram(), Some(0.5));
        assert_eq!(IndicatorReading::default().histogram(), None);
    }

    #[test]
    fn validate_rejects_zero_window() {
        let config = IndicatorConfig {
            rsi_window: 0,
            ..IndicatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn validate_rejects_inverted_macd() {
        let config = IndicatorConfig {
            macd_fast: 26,
            macd_slow: 12,
            ..IndicatorConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(IndicatorConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config: IndicatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, IndicatorConfig::default());
    }
}
