//! Validated per-stock history bundle.

use crate::domain::market::{strictly_ascending, MoneyFlowRecord, PriceBar, StockRecord};
use crate::domain::sector::{StockMetrics, SECTOR_WINDOW};
use crate::domain::selection::SkipReason;
use crate::domain::series::{trailing_flow_sum, trailing_return};

/// Money-flow ratios are percent units and must lie in this closed range.
pub const FLOW_RATIO_LIMIT: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct StockHistory {
    pub record: StockRecord,
    pub prices: Vec<PriceBar>,
    pub flows: Vec<MoneyFlowRecord>,
}

/// Prices finite and positive, volume finite and non-negative.
fn valid_bar(bar: &PriceBar) -> bool {
    [bar.open, bar.high, bar.low, bar.close]
        .iter()
        .all(|p| p.is_finite() && *p > 0.0)
        && bar.volume.is_finite()
        && bar.volume >= 0.0
}

impl StockHistory {
    /// Check ordering, value sanity, the money-flow ratio convention and
    /// minimum length.
    pub fn new(
        record: StockRecord,
        prices: Vec<PriceBar>,
        flows: Vec<MoneyFlowRecord>,
        min_bars: usize,
    ) -> Result<Self, SkipReason> {
        if prices.is_empty() {
            return Err(SkipReason::NoPriceData);
        }
        if !strictly_ascending(&prices, |b| b.date) {
            return Err(SkipReason::UnorderedPrices);
        }
        if !strictly_ascending(&flows, |f| f.date) {
            return Err(SkipReason::UnorderedFlows);
        }
        if let Some(bad) = prices.iter().find(|b| !valid_bar(b)) {
            return Err(SkipReason::InvalidPrice { date: bad.date });
        }
        if let Some(bad) = flows.iter().find(|f| !f.main_net_in.is_finite()) {
            return Err(SkipReason::InvalidFlow { date: bad.date });
        }
        if let Some(bad) = flows
            .iter()
            .find(|f| !f.main_net_ratio.is_finite() || f.main_net_ratio.abs() > FLOW_RATIO_LIMIT)
        {
            return Err(SkipReason::InvalidFlowRatio {
                date: bad.date,
                ratio: bad.main_net_ratio,
            });
        }
        if prices.len() < min_bars {
            return Err(SkipReason::InsufficientBars {
                bars: prices.len(),
                minimum: min_bars,
            });
        }

        Ok(Self {
            record,
            prices,
            flows,
        })
    }

    pub fn code(&self) -> &str {
        &self.record.code
    }

    pub fn bar_count(&self) -> usize {
        self.prices.len()
    }

    pub fn last_bar(&self) -> Option<&PriceBar> {
        self.prices.last()
    }

    /// Short-window return and net inflow for sector aggregation.
    pub fn sector_metrics(&self) -> Result<StockMetrics, SkipReason> {
        let industry = self.record.industry().ok_or(SkipReason::MissingIndustry)?;
        let return_5d = trailing_return(&self.prices, SECTOR_WINDOW).ok_or(
            SkipReason::InsufficientBars {
                bars: self.prices.len(),
                minimum: SECTOR_WINDOW + 1,
            },
        )?;
        Ok(StockMetrics {
            code: self.record.code.clone(),
            industry: industry.to_string(),
            return_5d,
            net_flow_5d: trailing_flow_sum(&self.flows, SECTOR_WINDOW),
        })
    }
}
