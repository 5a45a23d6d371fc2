// =============================================================================
// Signal Classifier
// =============================================================================
//
// Maps the latest indicator reading onto a discrete trading signal.
//
// Rules (comparisons are strict; a reading equal to a threshold is Hold):
//   RSI only      rsi < buy  => Buy,  rsi > sell => Sell
//   MACD confirm  rsi < buy  and macd > signal => Buy
//                 rsi > sell and macd < signal => Sell
//
// A reading without the inputs the policy needs is `InsufficientData`, which
// is a different observable state from Hold.
// =============================================================================

use serde::Serialize;

use super::policy::SignalPolicy;
use crate::indicators::IndicatorReading;

/// Discrete trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Dashboard badge text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "STRONG BUY",
            Self::Sell => "STRONG SELL",
            Self::Hold => "NEUTRAL",
        }
    }

    /// Human-readable rationale with the symbol filled in.
    pub fn rationale(&self, symbol: &str) -> String {
        match self {
            Self::Buy => {
                format!("{symbol} is oversold. This might be a good buying opportunity.")
            }
            Self::Sell => format!(
                "{symbol} is overbought. You should consider selling or booking profits."
            ),
            Self::Hold => {
                format!("{symbol} is in the neutral zone. Please wait for a clear signal.")
            }
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Sell => write!(f, "Sell"),
            Self::Hold => write!(f, "Hold"),
        }
    }
}

/// Outcome of classifying one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Signal(Signal),
    /// Warm-up window not yet elapsed.
    InsufficientData,
}

impl Classification {
    pub fn signal(&self) -> Option<Signal> {
        match self {
            Self::Signal(s) => Some(*s),
            Self::InsufficientData => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Signal(s) => s.label(),
            Self::InsufficientData => "LOADING",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signal(s) => write!(f, "{s}"),
            Self::InsufficientData => write!(f, "Insufficient data"),
        }
    }
}

/// Classify a single reading under `policy`.
pub fn classify(policy: &SignalPolicy, reading: &IndicatorReading) -> Classification {
    let Some(rsi) = reading.rsi else {
        return Classification::InsufficientData;
    };

    let signal = if policy.require_macd_confirmation {
        let (Some(macd), Some(signal_line)) = (reading.macd, reading.signal_line) else {
            return Classification::InsufficientData;
        };
        if rsi < policy.buy_threshold && macd > signal_line {
            Signal::Buy
        } else if rsi > policy.sell_threshold && macd < signal_line {
            Signal::Sell
        } else {
            Signal::Hold
        }
    } else if rsi < policy.buy_threshold {
        Signal::Buy
    } else if rsi > policy.sell_threshold {
        Signal::Sell
    } else {
        Signal::Hold
    };

    Classification::Signal(signal)
}

/// Classify the most recent reading of an aligned series.
pub fn classify_latest(policy: &SignalPolicy, readings: &[IndicatorReading]) -> Classification {
    readings
        .last()
        .map_or(Classification::InsufficientData, |r| classify(policy, r))
}
