//! Market data access port.
//!
//! Every series comes back in ascending date order. An empty vector is a
//! valid "no data" answer; `Err` is reserved for provider faults.

use crate::domain::error::ScreenerError;
use crate::domain::market::{IndexBar, MoneyFlowRecord, PriceBar, StockRecord};
use chrono::NaiveDate;

pub trait MarketDataPort {
    /// The day's candidate pool.
    fn fetch_universe(&self) -> Result<Vec<StockRecord>, ScreenerError>;

    /// Daily bars up to and including `as_of` (all bars when `None`).
    fn fetch_prices(
        &self,
        code: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, ScreenerError>;

    fn fetch_money_flow(
        &self,
        code: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<MoneyFlowRecord>, ScreenerError>;

    fn fetch_benchmark(
        &self,
        symbol: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<IndexBar>, ScreenerError>;
}
