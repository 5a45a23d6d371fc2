// =============================================================================
// Shared types used across the Ticker Pulse engine
// =============================================================================

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One daily OHLCV bar as delivered by the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl PriceBar {
    /// A bar is usable when every price is finite and non-negative.
    fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

// ---------------------------------------------------------------------------
// PriceSeries
// ---------------------------------------------------------------------------

/// Chronologically ordered, date-unique bars for one (symbol, period).
///
/// An empty series is a legitimate result (unknown ticker or no trading
/// history); callers check [`PriceSeries::is_empty`] before using it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from raw provider bars.
    ///
    /// Bars are sorted by date. When a date appears more than once the last
    /// occurrence wins (providers append an intraday row for the current
    /// session). Bars with non-finite or negative values are dropped.
    pub fn from_bars(bars: impl IntoIterator<Item = PriceBar>) -> Self {
        let mut bars: Vec<PriceBar> = bars.into_iter().filter(PriceBar::is_valid).collect();
        // Stable sort keeps provider order among equal dates.
        bars.sort_by_key(|b| b.date);

        let mut unique: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match unique.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => unique.push(bar),
            }
        }

        Self { bars: unique }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing prices in chronological order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Change of the latest close against the previous one, if two bars exist.
    pub fn last_change(&self) -> Option<f64> {
        match self.bars.as_slice() {
            [.., prev, last] => Some(last.close - prev.close),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

/// Look-back window the user may request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[default]
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::FiveYears,
    ];

    /// Provider-facing range string ("1mo", "1y", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::FiveYears => "5y",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| {
                EngineError::InvalidConfiguration(format!(
                    "unsupported period '{s}' (expected one of 1mo, 3mo, 6mo, 1y, 5y)"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// SeriesKey
// ---------------------------------------------------------------------------

/// Composite cache key identifying one requested series.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeriesKey {
    pub symbol: String,
    pub period: Period,
}

impl SeriesKey {
    pub fn new(symbol: impl Into<String>, period: Period) -> Self {
        Self {
            symbol: symbol.into(),
            period,
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.period)
    }
}
