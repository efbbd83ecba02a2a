#![allow(dead_code)]

use chrono::NaiveDate;
use mainline::domain::error::ScreenerError;
use mainline::domain::market::{IndexBar, MoneyFlowRecord, PriceBar, StockRecord};
use mainline::ports::data_port::MarketDataPort;
use std::cell::Cell;
use std::collections::HashMap;

pub struct MockDataPort {
    pub universe: Vec<StockRecord>,
    pub universe_error: Option<String>,
    pub prices: HashMap<String, Vec<PriceBar>>,
    pub flows: HashMap<String, Vec<MoneyFlowRecord>>,
    pub benchmark: Vec<IndexBar>,
    pub errors: HashMap<String, String>,
    pub price_fetches: Cell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            universe: Vec::new(),
            universe_error: None,
            prices: HashMap::new(),
            flows: HashMap::new(),
            benchmark: Vec::new(),
            errors: HashMap::new(),
            price_fetches: Cell::new(0),
        }
    }

    pub fn with_stock(mut self, code: &str, industry: Option<&str>) -> Self {
        self.universe.push(StockRecord {
            code: code.to_string(),
            name: format!("{code} Holdings"),
            industry: industry.map(String::from),
            amount: None,
        });
        self
    }

    pub fn with_amount(mut self, code: &str, amount: f64) -> Self {
        if let Some(r) = self.universe.iter_mut().find(|r| r.code == code) {
            r.amount = Some(amount);
        }
        self
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<PriceBar>) -> Self {
        self.prices.insert(code.to_string(), bars);
        self
    }

    pub fn with_flows(mut self, code: &str, flows: Vec<MoneyFlowRecord>) -> Self {
        self.flows.insert(code.to_string(), flows);
        self
    }

    /// Stock with history in one call.
    pub fn with_history(
        self,
        code: &str,
        industry: &str,
        bars: Vec<PriceBar>,
        flows: Vec<MoneyFlowRecord>,
    ) -> Self {
        self.with_stock(code, Some(industry))
            .with_bars(code, bars)
            .with_flows(code, flows)
    }

    pub fn with_benchmark(mut self, bars: Vec<IndexBar>) -> Self {
        self.benchmark = bars;
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }

    pub fn with_universe_error(mut self, reason: &str) -> Self {
        self.universe_error = Some(reason.to_string());
        self
    }
}

fn capped<T: Clone>(items: &[T], as_of: Option<NaiveDate>, date_of: impl Fn(&T) -> NaiveDate) -> Vec<T> {
    items
        .iter()
        .filter(|item| as_of.is_none_or(|cap| date_of(item) <= cap))
        .cloned()
        .collect()
}

impl MarketDataPort for MockDataPort {
    fn fetch_universe(&self) -> Result<Vec<StockRecord>, ScreenerError> {
        if let Some(reason) = &self.universe_error {
            return Err(ScreenerError::data(reason.clone()));
        }
        Ok(self.universe.clone())
    }

    fn fetch_prices(
        &self,
        code: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, ScreenerError> {
        self.price_fetches.set(self.price_fetches.get() + 1);
        if let Some(reason) = self.errors.get(code) {
            return Err(ScreenerError::data(reason.clone()));
        }
        let bars = self.prices.get(code).map(Vec::as_slice).unwrap_or_default();
        Ok(capped(bars, as_of, |b| b.date))
    }

    fn fetch_money_flow(
        &self,
        code: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<MoneyFlowRecord>, ScreenerError> {
        let flows = self.flows.get(code).map(Vec::as_slice).unwrap_or_default();
        Ok(capped(flows, as_of, |f| f.date))
    }

    fn fetch_benchmark(
        &self,
        _symbol: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<IndexBar>, ScreenerError> {
        Ok(capped(&self.benchmark, as_of, |b| b.date))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(i: usize) -> NaiveDate {
    date(2024, 1, 1) + chrono::Duration::days(i as i64)
}

pub fn flat_bars(count: usize, close: f64, volume: f64) -> Vec<PriceBar> {
    (0..count)
        .map(|i| PriceBar {
            date: day(i),
            open: close,
            high: close,
            low: close,
            close,
            volume,
            amount: close * volume,
        })
        .collect()
}

/// Flat history ending in a 10% breakout on three days of rising volume.
pub fn breakout_bars(count: usize) -> Vec<PriceBar> {
    let mut bars = flat_bars(count, 10.0, 100.0);
    let n = bars.len();
    bars[n - 3].volume = 150.0;
    bars[n - 2].volume = 180.0;
    bars[n - 1].volume = 400.0;
    bars[n - 1].close = 11.0;
    bars[n - 1].high = 11.0;
    bars
}

/// `count` daily records ending on `day(end)`, all with the same values.
pub fn flows_ending(end: usize, count: usize, net: f64, ratio: f64) -> Vec<MoneyFlowRecord> {
    (end + 1 - count..=end)
        .map(|i| MoneyFlowRecord {
            date: day(i),
            main_net_in: net,
            main_net_ratio: ratio,
        })
        .collect()
}

pub fn rising_index(count: usize) -> Vec<IndexBar> {
    (0..count)
        .map(|i| IndexBar {
            date: day(i),
            close: 3000.0 + i as f64,
        })
        .collect()
}

/// One breakout stock in `industry` plus flat filler stocks in four other
/// industries, so `industry` is the only main-line sector.
pub fn main_line_market(code: &str, industry: &str) -> MockDataPort {
    let mut port = MockDataPort::new()
        .with_history(code, industry, breakout_bars(60), flows_ending(59, 5, 100.0, 25.0))
        .with_benchmark(rising_index(60));
    for (i, filler) in ["Banks", "Insurance", "Utilities", "Steel"].iter().enumerate() {
        let filler_code = format!("F{}", i);
        port = port.with_history(
            &filler_code,
            filler,
            flat_bars(60, 20.0, 500.0),
            flows_ending(59, 5, 10.0, 5.0),
        );
    }
    port
}
