// =============================================================================
// Yahoo Finance chart API client
// =============================================================================
//
// GET /v8/finance/chart/{symbol}?range={period}&interval=1d
//
// Response shape (abridged):
//   { "chart": { "result": [ { "meta": { "gmtoffset": 19800, ... },
//                              "timestamp": [ ... ],
//                              "indicators": { "quote": [ { "open": [...],
//                                "high": [...], "low": [...], "close": [...],
//                                "volume": [...] } ] } } ],
//                "error": null } }
//
// Unknown symbols come back as HTTP 404 with
//   { "chart": { "result": null, "error": { "code": "Not Found", ... } } }
// which is reported as an empty bar list rather than a failure.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::MarketDataProvider;
use crate::types::{Period, PriceBar};

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("ticker-pulse/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Connection settings for the chart API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Chart API client.
#[derive(Clone)]
pub struct YahooChartClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooChartClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %config.base_url, "YahooChartClient initialised");

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl MarketDataProvider for YahooChartClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    #[instrument(skip(self), name = "yahoo::fetch_daily_bars")]
    async fn fetch_daily_bars(&self, symbol: &str, period: Period) -> Result<Vec<PriceBar>> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let resp = self
            .client
            .get(&url)
            .query(&[("range", period.as_str()), ("interval", "1d")])
            .send()
            .await
            .context("GET /v8/finance/chart request failed")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse chart response (HTTP {status})"))?;

        if !status.is_success() && !(status == StatusCode::NOT_FOUND && is_not_found(&body)) {
            anyhow::bail!("Yahoo GET /v8/finance/chart returned {}: {}", status, body);
        }

        let bars = parse_chart_response(&body)?;
        debug!(symbol, %period, count = bars.len(), "daily bars fetched");
        Ok(bars)
    }
}

impl std::fmt::Debug for YahooChartClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooChartClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// =============================================================================
// Response parsing
// =============================================================================

fn is_not_found(body: &serde_json::Value) -> bool {
    body["chart"]["error"]["code"].as_str() == Some("Not Found")
}

/// Turn a chart API payload into bars.
///
/// Rows with a null open/high/low/close are skipped (the API emits them for
/// holidays and for the session currently in progress). A null volume counts
/// as zero. Dates are taken in the exchange's local time using
/// `meta.gmtoffset`.
pub(crate) fn parse_chart_response(body: &serde_json::Value) -> Result<Vec<PriceBar>> {
    let chart = body.get("chart").context("chart response missing 'chart'")?;

    if let Some(error) = chart.get("error").filter(|e| !e.is_null()) {
        if is_not_found(body) {
            return Ok(Vec::new());
        }
        let code = error["code"].as_str().unwrap_or("unknown");
        let description = error["description"].as_str().unwrap_or("");
        anyhow::bail!("chart API error {code}: {description}");
    }

    let Some(result) = chart["result"].as_array().and_then(|r| r.first()) else {
        return Ok(Vec::new());
    };

    // A valid symbol with no sessions in range has no timestamp array.
    let Some(timestamps) = result["timestamp"].as_array() else {
        return Ok(Vec::new());
    };

    let gmt_offset = result["meta"]["gmtoffset"].as_i64().unwrap_or(0);
    let quote = &result["indicators"]["quote"][0];
    if !quote.is_object() {
        anyhow::bail!("chart response missing indicators.quote");
    }

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0usize;

    for (i, ts) in timestamps.iter().enumerate() {
        let ts = ts
            .as_i64()
            .with_context(|| format!("timestamp[{i}] is not an integer"))?;

        let (Some(open), Some(high), Some(low), Some(close)) = (
            quote["open"][i].as_f64(),
            quote["high"][i].as_f64(),
            quote["low"][i].as_f64(),
            quote["close"][i].as_f64(),
        ) else {
            skipped += 1;
            continue;
        };
        let volume = quote["volume"][i].as_f64().unwrap_or(0.0);

        let date = DateTime::from_timestamp(ts + gmt_offset, 0)
            .with_context(|| format!("timestamp {ts} out of range"))?
            .date_naive();

        bars.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    if skipped > 0 {
        warn!(skipped, "skipped chart rows with missing prices");
    }

    Ok(bars)
}

// =============================================================================
// Tests
// =============================================================================
