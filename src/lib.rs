// =============================================================================
// Ticker Pulse — single-ticker technical dashboard engine
// =============================================================================
//
// Daily price history for one ticker, momentum/trend indicators over its
// closes, a BUY/SELL/HOLD classification, and an optional spoken-style
// narration. Served over a CLI and a small JSON API.
// =============================================================================

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod narration;
pub mod provider;
pub mod signals;
pub mod types;
