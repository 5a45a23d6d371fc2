// =============================================================================
// Price Series Store — cached, idempotent retrieval boundary
// =============================================================================
//
// get(symbol, period):
//   fresh cache hit  => stored series, no provider call
//   miss / expired   => provider fetch (bounded by a timeout), stored, returned
//   provider empty   => empty series, cached like any other result
//   provider error   => RetrievalError, nothing cached
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::series_cache::SeriesCache;
use crate::error::{EngineError, RetrievalError};
use crate::provider::MarketDataProvider;
use crate::types::{Period, PriceSeries, SeriesKey};

fn default_ttl_secs() -> u64 {
    600
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

/// Cache lifetime and fetch bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a cached series. Zero disables caching.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Per-period overrides of `ttl_secs`, e.g. a longer lifetime for "5y".
    #[serde(default)]
    pub period_ttl_secs: HashMap<Period, u64>,

    /// Upper bound on a single provider fetch.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            period_ttl_secs: HashMap::new(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl_for(&self, period: Period) -> Duration {
        let secs = self
            .period_ttl_secs
            .get(&period)
            .copied()
            .unwrap_or(self.ttl_secs);
        Duration::from_secs(secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.fetch_timeout_secs == 0 {
            return Err(EngineError::InvalidConfiguration(
                "fetch_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// PriceSeriesStore
// =============================================================================

pub struct PriceSeriesStore {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<SeriesCache>,
    config: CacheConfig,
}

impl PriceSeriesStore {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        cache: Arc<SeriesCache>,
        config: CacheConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<SeriesCache> {
        &self.cache
    }

    /// Return the daily series for (`symbol`, `period`).
    ///
    /// An empty series means the provider had no data for the key; callers
    /// must treat it as "not found" rather than as a failure.
    pub async fn get(&self, symbol: &str, period: Period) -> Result<Arc<PriceSeries>, RetrievalError> {
        let key = SeriesKey::new(symbol, period);
        let ttl = self.config.ttl_for(period);

        if let Some(series) = self.cache.get_fresh(&key) {
            debug!(key = %key, bars = series.len(), "series cache hit");
            return Ok(series);
        }

        let series = Arc::new(self.fetch(&key).await?);

        if series.is_empty() {
            warn!(key = %key, provider = self.provider.name(), "provider returned no bars");
        } else {
            info!(key = %key, bars = series.len(), "series fetched");
        }

        if !ttl.is_zero() {
            self.cache.insert(key, Arc::clone(&series), ttl);
        }
        Ok(series)
    }

    async fn fetch(&self, key: &SeriesKey) -> Result<PriceSeries, RetrievalError> {
        let timeout = self.config.fetch_timeout();
        let fetch = self.provider.fetch_daily_bars(&key.symbol, key.period);

        match tokio::time::timeout(timeout, fetch).await {
            Ok(Ok(bars)) => Ok(PriceSeries::from_bars(bars)),
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "provider fetch failed");
                Err(RetrievalError::Provider {
                    key: key.clone(),
                    provider: self.provider.name(),
                    message: format!("{e:#}"),
                })
            }
            Err(_) => {
                warn!(key = %key, timeout_secs = timeout.as_secs(), "provider fetch timed out");
                Err(RetrievalError::Timeout {
                    key: key.clone(),
                    timeout,
                })
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PriceBar;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider double that replays scripted responses and counts calls.
    struct ScriptedProvider {
        calls: AtomicUsize,
        responses: Mutex<Vec<anyhow::Result<Vec<PriceBar>>>>,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<anyhow::Result<Vec<PriceBar>>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(responses),
                delay: None,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch_daily_bars(&self, _symbol: &str, _period: Period) -> anyhow::Result<Vec<PriceBar>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let mut responses = self.responses.lock();
            if responses.is_empty() {
                anyhow::bail!("no scripted response left");
            }
            responses.remove(0)
        }
    }

    fn bars(n: u32) -> Vec<PriceBar> {
        (1..=n)
            .map(|d| PriceBar {
                date: NaiveDate::from_ymd_opt(2026, 2, d).unwrap(),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0 + d as f64,
                volume: 1_000.0,
            })
            .collect()
    }

    fn make_store(provider: Arc<ScriptedProvider>, config: CacheConfig) -> PriceSeriesStore {
        PriceSeriesStore::new(provider, Arc::new(SeriesCache::new()), config)
    }

    #[tokio::test]
    async fn second_get_within_ttl_hits_cache() {
        let provider = ScriptedProvider::new(vec![Ok(bars(5))]);
        let store = make_store(provider.clone(), CacheConfig::default());

        let first = store.get("AAPL", Period::OneMonth).await.unwrap();
        let second = store.get("AAPL", Period::OneMonth).await.unwrap();

        assert_eq!(provider.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_past_ttl_refetches() {
        let provider = ScriptedProvider::new(vec![Ok(bars(5)), Ok(bars(6))]);
        let store = make_store(provider.clone(), CacheConfig::default());

        assert_eq!(store.get("AAPL", Period::OneMonth).await.unwrap().len(), 5);

        tokio::time::advance(Duration::from_secs(599)).await;
        assert_eq!(store.get("AAPL", Period::OneMonth).await.unwrap().len(), 5);
        assert_eq!(provider.calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("AAPL", Period::OneMonth).await.unwrap().len(), 6);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn distinct_periods_fetch_separately() {
        let provider = ScriptedProvider::new(vec![Ok(bars(5)), Ok(bars(20))]);
        let store = make_store(provider.clone(), CacheConfig::default());

        let month = store.get("AAPL", Period::OneMonth).await.unwrap();
        let year = store.get("AAPL", Period::OneYear).await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(month.len(), 5);
        assert_eq!(year.len(), 20);
    }

    #[tokio::test]
    async fn zero_ttl_refetches_every_call() {
        let provider = ScriptedProvider::new(vec![Ok(bars(3)), Ok(bars(4))]);
        let config = CacheConfig {
            ttl_secs: 0,
            ..CacheConfig::default()
        };
        let store = make_store(provider.clone(), config);

        assert_eq!(store.get("AAPL", Period::OneMonth).await.unwrap().len(), 3);
        assert_eq!(store.get("AAPL", Period::OneMonth).await.unwrap().len(), 4);
        assert_eq!(provider.calls(), 2);
        assert!(store.cache().is_empty());
    }

    #[tokio::test]
    async fn period_override_disables_cache_for_that_period_only() {
        let provider = ScriptedProvider::new(vec![Ok(bars(3)), Ok(bars(3)), Ok(bars(3))]);
        let mut config = CacheConfig::default();
        config.period_ttl_secs.insert(Period::OneMonth, 0);
        let store = make_store(provider.clone(), config);

        store.get("AAPL", Period::OneMonth).await.unwrap();
        store.get("AAPL", Period::OneMonth).await.unwrap();
        store.get("AAPL", Period::OneYear).await.unwrap();
        store.get("AAPL", Period::OneYear).await.unwrap();

        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let provider = ScriptedProvider::new(vec![Ok(Vec::new())]);
        let store = make_store(provider.clone(), CacheConfig::default());

        let series = store.get("NOEXIST.XX", Period::OneMonth).await.unwrap();
        assert!(series.is_empty());
        // Cached: a second lookup does not hit the provider.
        assert!(store.get("NOEXIST.XX", Period::OneMonth).await.unwrap().is_empty());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn provider_failure_is_surfaced_and_not_cached() {
        let provider = ScriptedProvider::new(vec![
            Err(anyhow::anyhow!("connection reset")),
            Ok(bars(5)),
        ]);
        let store = make_store(provider.clone(), CacheConfig::default());

        let err = store.get("AAPL", Period::OneMonth).await.unwrap_err();
        match err {
            RetrievalError::Provider { provider, message, .. } => {
                assert_eq!(provider, "scripted");
                assert!(message.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.cache().is_empty());

        let series = store.get("AAPL", Period::OneMonth).await.unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let provider = Arc::new(ScriptedProvider {
            calls: AtomicUsize::new(0),
            responses: Mutex::new(vec![Ok(bars(5))]),
            delay: Some(Duration::from_secs(60)),
        });
        let config = CacheConfig {
            fetch_timeout_secs: 2,
            ..CacheConfig::default()
        };
        let store = make_store(provider, config);

        let err = store.get("AAPL", Period::OneMonth).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Timeout { .. }));
        assert!(store.cache().is_empty());
    }

    #[test]
    fn cache_config_json_defaults_and_overrides() {
        let cfg: CacheConfig = serde_json::from_str(r#"{ "period_ttl_secs": { "5y": 86400 } }"#).unwrap();
        assert_eq!(cfg.ttl_for(Period::OneMonth), Duration::from_secs(600));
        assert_eq!(cfg.ttl_for(Period::FiveYears), Duration::from_secs(86_400));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_fetch_timeout_is_invalid() {
        let cfg = CacheConfig {
            fetch_timeout_secs: 0,
            ..CacheConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfiguration(_))));
    }
}
