//! Market data records consumed by the selection engine.

use chrono::NaiveDate;

/// One member of the day's candidate pool.
#[derive(Debug, Clone, PartialEq)]
pub struct StockRecord {
    pub code: String,
    pub name: String,
    pub industry: Option<String>,
    /// Latest traded value, used only by universe policies.
    pub amount: Option<f64>,
}

impl StockRecord {
    /// Industry label if present and non-blank.
    pub fn industry(&self) -> Option<&str> {
        self.industry
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One trading day for one stock.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub amount: f64,
}

/// One day's main-capital flow observation. `main_net_ratio` is in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct MoneyFlowRecord {
    pub date: NaiveDate,
    pub main_net_in: f64,
    pub main_net_ratio: f64,
}

/// Benchmark close for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBar {
    pub date: NaiveDate,
    pub close: f64,
}

/// True when dates are strictly increasing, which also rules out duplicates.
pub fn strictly_ascending<T>(items: &[T], date_of: impl Fn(&T) -> NaiveDate) -> bool {
    items.windows(2).all(|w| date_of(&w[0]) < date_of(&w[1]))
}
