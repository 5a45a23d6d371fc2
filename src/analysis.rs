// =============================================================================
// Analysis Engine — one dashboard request end to end
// =============================================================================
//
// Pipeline:
//   1. Validate the request (symbol, period)
//   2. Retrieve the daily series through the cached store
//   3. Empty series => NotFound, nothing else is computed
//   4. Compute aligned indicator readings (RSI, MACD, EMA)
//   5. Classify the latest reading under the configured policy
//   6. Optionally narrate the result
//   7. Output a Snapshot carrying the series and readings for charting
// =============================================================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::EngineError;
use crate::indicators::{compute_readings, IndicatorConfig, IndicatorReading};
use crate::market_data::PriceSeriesStore;
use crate::narration::Narrator;
use crate::signals::{classify_latest, Classification, SignalPolicy};
use crate::types::{Period, PriceSeries};

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub period: Period,
    pub narrate: bool,
}

impl AnalysisRequest {
    /// Build a request from raw user input. The symbol is trimmed but its case
    /// is left alone.
    pub fn parse(symbol: &str, period: &str, narrate: bool) -> Result<Self, EngineError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "symbol must not be empty".into(),
            ));
        }
        if symbol.chars().any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#')) {
            return Err(EngineError::InvalidConfiguration(format!(
                "symbol '{symbol}' contains unsupported characters"
            )));
        }
        Ok(Self {
            symbol: symbol.to_string(),
            period: period.parse()?,
            narrate,
        })
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Everything the dashboard renders for one successful request.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub period: Period,
    pub current_price: f64,
    /// Change against the previous close; `None` with a single bar.
    pub price_change: Option<f64>,
    pub latest: IndicatorReading,
    pub classification: Classification,
    pub signal_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    /// Full series for the price and volume charts.
    pub series: Arc<PriceSeries>,
    /// Indicator readings aligned with `series` by index.
    pub readings: Vec<IndicatorReading>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Snapshot {
    /// The provider had no bars for this symbol and period.
    NotFound { symbol: String, period: Period },
    Ready(Box<AnalysisReport>),
}

impl Snapshot {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::Ready(report) => Some(report),
            Self::NotFound { .. } => None,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

pub struct AnalysisEngine {
    store: PriceSeriesStore,
    indicators: IndicatorConfig,
    policy: SignalPolicy,
    narrator: Narrator,
}

impl AnalysisEngine {
    /// Validate the configuration and assemble the engine.
    pub fn new(
        store: PriceSeriesStore,
        indicators: IndicatorConfig,
        policy: SignalPolicy,
        narrator: Narrator,
    ) -> Result<Self, EngineError> {
        indicators.validate()?;
        policy.validate()?;
        if policy.require_macd_confirmation && !indicators.trend_indicators {
            return Err(EngineError::InvalidConfiguration(
                "MACD confirmation requires trend_indicators to be enabled".into(),
            ));
        }

        Ok(Self {
            store,
            indicators,
            policy,
            narrator,
        })
    }

    pub fn policy(&self) -> &SignalPolicy {
        &self.policy
    }

    pub fn store(&self) -> &PriceSeriesStore {
        &self.store
    }

    #[instrument(skip(self, request), fields(symbol = %request.symbol, period = %request.period))]
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<Snapshot, EngineError> {
        let series = self.store.get(&request.symbol, request.period).await?;

        let Some(last_bar) = series.last() else {
            info!("no data for symbol");
            return Ok(Snapshot::NotFound {
                symbol: request.symbol.clone(),
                period: request.period,
            });
        };
        let current_price = last_bar.close;
        let price_change = series.last_change();

        let readings = compute_readings(&series.closes(), &self.indicators);
        let latest = readings.last().copied().unwrap_or_default();
        let classification = classify_latest(&self.policy, &readings);

        debug!(
            bars = series.len(),
            rsi = ?latest.rsi,
            macd = ?latest.macd,
            classification = %classification,
            "analysis complete"
        );

        let narration = request.narrate.then(|| {
            self.narrator
                .format(&request.symbol, current_price, &latest, &classification)
        });

        Ok(Snapshot::Ready(Box::new(AnalysisReport {
            symbol: request.symbol.clone(),
            period: request.period,
            current_price,
            price_change,
            latest,
            classification,
            signal_label: classification.label(),
            narration,
            series,
            readings,
            generated_at: Utc::now(),
        })))
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{CacheConfig, SeriesCache};
    use crate::provider::MarketDataProvider;
    use crate::signals::Signal;
    use crate::types::PriceBar;
    use async_trait::async_trait;
    use chrono::{Days, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns the same closes for every symbol except "NOEXIST.XX".
    struct FixedProvider {
        closes: Vec<f64>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_daily_bars(&self, symbol: &str, _period: Period) -> anyhow::Result<Vec<PriceBar>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol == "NOEXIST.XX" {
                return Ok(Vec::new());
            }
            let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
            Ok(self
                .closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PriceBar {
                    date: start + Days::new(i as u64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 500.0,
                })
                .collect())
        }
    }

    fn engine_with(closes: Vec<f64>, policy: SignalPolicy) -> (AnalysisEngine, Arc<FixedProvider>) {
        let provider = Arc::new(FixedProvider {
            closes,
            calls: AtomicUsize::new(0),
        });
        let store = PriceSeriesStore::new(
            provider.clone(),
            Arc::new(SeriesCache::new()),
            CacheConfig::default(),
        );
        let engine = AnalysisEngine::new(
            store,
            IndicatorConfig::default(),
            policy,
            Narrator::default(),
        )
        .unwrap();
        (engine, provider)
    }

    fn falling(n: usize) -> Vec<f64> {
        (0..n).map(|i| 200.0 - i as f64).collect()
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(AnalysisRequest::parse("  ", "1mo", false).is_err());
        assert!(AnalysisRequest::parse("AAPL", "2w", false).is_err());
        assert!(AnalysisRequest::parse("AA PL", "1mo", false).is_err());
        let req = AnalysisRequest::parse(" aapl ", "1y", true).unwrap();
        assert_eq!(req.symbol, "aapl");
        assert_eq!(req.period, Period::OneYear);
    }

    #[test]
    fn confirmation_without_trend_indicators_is_rejected() {
        let provider = Arc::new(FixedProvider {
            closes: vec![],
            calls: AtomicUsize::new(0),
        });
        let store = PriceSeriesStore::new(provider, Arc::new(SeriesCache::new()), CacheConfig::default());
        let indicators = IndicatorConfig {
            trend_indicators: false,
            ..IndicatorConfig::default()
        };
        let result = AnalysisEngine::new(
            store,
            indicators,
            SignalPolicy::macd_confirmed(),
            Narrator::default(),
        );
        assert!(matches!(result, Err(EngineError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn unknown_symbol_is_not_found() {
        let (engine, _) = engine_with(falling(30), SignalPolicy::rsi_only());
        let req = AnalysisRequest::parse("NOEXIST.XX", "1mo", true).unwrap();
        let snapshot = engine.analyze(&req).await.unwrap();
        assert!(matches!(snapshot, Snapshot::NotFound { .. }));
        assert!(snapshot.report().is_none());
    }

    #[tokio::test]
    async fn falling_series_is_buy_with_aligned_readings() {
        let (engine, _) = engine_with(falling(30), SignalPolicy::rsi_only());
        let req = AnalysisRequest::parse("AAPL", "1mo", false).unwrap();
        let snapshot = engine.analyze(&req).await.unwrap();
        let report = snapshot.report().unwrap();

        assert_eq!(report.readings.len(), report.series.len());
        assert_eq!(report.latest.rsi, Some(0.0));
        assert_eq!(report.classification, Classification::Signal(Signal::Buy));
        assert_eq!(report.signal_label, "STRONG BUY");
        assert_eq!(report.current_price, 171.0);
        assert_eq!(report.price_change, Some(-1.0));
        assert!(report.narration.is_none());
    }

    #[tokio::test]
    async fn falling_series_is_hold_under_confirmation_policy() {
        // RSI is 0 but MACD sits below its signal line on a falling ramp.
        let (engine, _) = engine_with(falling(60), SignalPolicy::macd_confirmed());
        let req = AnalysisRequest::parse("AAPL", "3mo", false).unwrap();
        let report = engine.analyze(&req).await.unwrap().report().cloned().unwrap();
        assert_eq!(report.classification, Classification::Signal(Signal::Hold));
    }

    #[tokio::test]
    async fn short_series_is_insufficient_data() {
        let (engine, _) = engine_with(falling(5), SignalPolicy::rsi_only());
        let req = AnalysisRequest::parse("AAPL", "1mo", true).unwrap();
        let report = engine.analyze(&req).await.unwrap().report().cloned().unwrap();

        assert_eq!(report.classification, Classification::InsufficientData);
        assert_eq!(report.latest.rsi, None);
        assert_eq!(report.signal_label, "LOADING");
        let narration = report.narration.unwrap();
        assert!(narration.contains("still collecting data"));
    }

    #[tokio::test]
    async fn repeated_requests_reuse_cached_series() {
        let (engine, provider) = engine_with(falling(30), SignalPolicy::rsi_only());
        let req = AnalysisRequest::parse("AAPL", "1mo", false).unwrap();
        let first = engine.analyze(&req).await.unwrap();
        let second = engine.analyze(&req).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(
            &first.report().unwrap().series,
            &second.report().unwrap().series
        ));
    }

    #[tokio::test]
    async fn snapshot_serialises_with_status_tag() {
        let (engine, _) = engine_with(falling(30), SignalPolicy::rsi_only());
        let req = AnalysisRequest::parse("NOEXIST.XX", "1mo", false).unwrap();
        let json = serde_json::to_value(engine.analyze(&req).await.unwrap()).unwrap();
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["period"], "1mo");

        let req = AnalysisRequest::parse("AAPL", "1mo", true).unwrap();
        let json = serde_json::to_value(engine.analyze(&req).await.unwrap()).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["series"].as_array().unwrap().len(), 30);
        assert_eq!(json["readings"][0]["rsi"], serde_json::Value::Null);
        assert!(json["narration"].is_string());
    }
}
