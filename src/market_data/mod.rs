pub mod series_cache;
pub mod store;

pub use series_cache::{CacheEntry, SeriesCache};
pub use store::{CacheConfig, PriceSeriesStore};
