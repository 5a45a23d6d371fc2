// =============================================================================
// Market Data Provider seam
// =============================================================================
//
// The engine only consumes daily bars. Symbol resolution, retries and rate
// limits belong to the provider behind this trait.

pub mod yahoo;

use async_trait::async_trait;

use crate::types::{Period, PriceBar};

pub use yahoo::YahooChartClient;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Fetch daily bars for `symbol` over `period`.
    ///
    /// An unknown symbol or a period without trading history is `Ok` with an
    /// empty vec. `Err` is reserved for transport and provider failures.
    async fn fetch_daily_bars(&self, symbol: &str, period: Period) -> anyhow::Result<Vec<PriceBar>>;
}
