//! Selection orchestrator.
//!
//! One pass per run, no state carried between runs:
//!
//! 1. load the candidate universe and the benchmark (fatal if either is unusable)
//! 2. pre-aggregate: fetch and validate each candidate's history, compute its
//!    short-window sector metrics; per-stock problems become [`SkipReason`]s
//! 3. classify sectors from the pre-aggregated subset
//! 4. run the filter chain on each surviving stock; failures become
//!    [`Rejection`]s
//! 5. sort qualifying stocks by score, descending, stable on candidate order
//!
//! The engine does no locking of its own. Callers must not run two
//! selections against the same snapshot concurrently.

use crate::domain::error::ScreenerError;
use crate::domain::history::StockHistory;
use crate::domain::market::{strictly_ascending, IndexBar, StockRecord};
use crate::domain::scoring::{composite_score, SignalFlags};
use crate::domain::sector::{
    classify_sectors, SectorAggregate, SectorTable, StockMetrics, SECTOR_WINDOW,
};
use crate::domain::signal::{
    breakout, money_flow, near_high, relative_strength, rs_qualifies, volume_spike,
};
use crate::domain::universe::UniversePolicy;
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    pub breakout_window: usize,
    pub volume_ma_window: usize,
    pub rs_lookback: usize,
    pub rs_threshold: f64,
    pub min_score: f64,
    pub sector_percentile_cutoff: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            breakout_window: 55,
            volume_ma_window: 20,
            rs_lookback: 20,
            rs_threshold: 0.7,
            min_score: 80.0,
            sector_percentile_cutoff: 0.8,
        }
    }
}

impl SelectionConfig {
    /// Shortest price history accepted during pre-aggregation.
    pub fn min_history_bars(&self) -> usize {
        self.breakout_window + SECTOR_WINDOW
    }
}

/// Everything a run needs besides the data port.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionRequest {
    pub benchmark: String,
    pub as_of: Option<NaiveDate>,
    pub universe: UniversePolicy,
    pub config: SelectionConfig,
}

/// Why a stock never reached the filter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    MissingIndustry,
    NoPriceData,
    InsufficientBars { bars: usize, minimum: usize },
    UnorderedPrices,
    UnorderedFlows,
    InvalidPrice { date: NaiveDate },
    InvalidFlow { date: NaiveDate },
    InvalidFlowRatio { date: NaiveDate, ratio: f64 },
    DuplicateCode,
    Provider { reason: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingIndustry => write!(f, "no industry"),
            SkipReason::NoPriceData => write!(f, "no price data"),
            SkipReason::InsufficientBars { bars, minimum } => {
                write!(f, "only {} bars, minimum {} required", bars, minimum)
            }
            SkipReason::UnorderedPrices => write!(f, "price history not strictly ascending"),
            SkipReason::UnorderedFlows => write!(f, "money-flow history not strictly ascending"),
            SkipReason::InvalidFlowRatio { date, ratio } => {
                write!(f, "money-flow ratio {} on {} outside [-100, 100]", ratio, date)
            }
            SkipReason::InvalidPrice { date } => {
                write!(f, "non-finite or non-positive price bar on {}", date)
            }
            SkipReason::InvalidFlow { date } => {
                write!(f, "non-finite main net inflow on {}", date)
            }
            SkipReason::DuplicateCode => write!(f, "code already in the candidate pool"),
            SkipReason::Provider { reason } => write!(f, "provider error: {}", reason),
        }
    }
}

/// The first filter-chain gate a stock failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    UnknownSector,
    NotMainSector,
    NoBreakout,
    NoVolumeSpike,
    NoMoneyFlow,
    RsUndefined,
    RsBelowThreshold { rs: f64 },
    ScoreBelowMinimum { score: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownSector => write!(f, "industry not classified"),
            Rejection::NotMainSector => write!(f, "not a main-line sector"),
            Rejection::NoBreakout => write!(f, "no breakout"),
            Rejection::NoVolumeSpike => write!(f, "no volume spike"),
            Rejection::NoMoneyFlow => write!(f, "no money-flow signal"),
            Rejection::RsUndefined => write!(f, "RS undefined"),
            Rejection::RsBelowThreshold { rs } => write!(f, "RS {:.2} at or below threshold", rs),
            Rejection::ScoreBelowMinimum { score } => write!(f, "score {:.2} below minimum", score),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedStock {
    pub code: String,
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedStock {
    pub code: String,
    pub name: String,
    pub reason: Rejection,
}

/// One qualifying stock with its diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
    pub code: String,
    pub name: String,
    pub industry: String,
    pub rs: f64,
    pub sector_return_rank: f64,
    pub sector_flow_rank: f64,
    pub sector_score: f64,
    pub sector_avg_return_5d: f64,
    pub sector_net_flow_5d: f64,
    pub score: f64,
    pub close: f64,
    pub near_high: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionReport {
    /// Last benchmark date, the trading day the run describes.
    pub trade_date: NaiveDate,
    pub universe_size: usize,
    /// Stocks that survived pre-aggregation.
    pub evaluated: usize,
    pub sectors: Vec<SectorAggregate>,
    pub results: Vec<SelectionResult>,
    pub skipped: Vec<SkippedStock>,
    pub rejected: Vec<RejectedStock>,
}

impl SelectionReport {
    pub fn main_sectors(&self) -> impl Iterator<Item = &SectorAggregate> {
        self.sectors.iter().filter(|s| s.is_main_sector)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} candidates, {} evaluated, {} skipped, {} selected",
            self.trade_date,
            self.universe_size,
            self.evaluated,
            self.skipped.len(),
            self.results.len()
        )
    }
}

/// Histories that survived pre-aggregation plus the skips.
#[derive(Debug, Clone, Default)]
pub struct Preparation {
    pub histories: Vec<StockHistory>,
    pub metrics: Vec<StockMetrics>,
    pub skipped: Vec<SkippedStock>,
}

pub struct SelectionEngine<'a> {
    port: &'a dyn MarketDataPort,
}

impl<'a> SelectionEngine<'a> {
    pub fn new(port: &'a dyn MarketDataPort) -> Self {
        Self { port }
    }

    /// Run one complete selection.
    pub fn run(&self, request: &SelectionRequest) -> Result<SelectionReport, ScreenerError> {
        let config = &request.config;
        let universe = self.load_universe(&request.universe)?;
        let benchmark = self.load_benchmark(&request.benchmark, request.as_of, config.rs_lookback)?;
        // load_benchmark guarantees at least one point
        let trade_date = benchmark[benchmark.len() - 1].date;

        info!(
            candidates = universe.len(),
            benchmark = %request.benchmark,
            %trade_date,
            "starting selection"
        );

        let prep = self.prepare(&universe, request.as_of, config);
        let sectors = classify_sectors(&prep.metrics, config.sector_percentile_cutoff);
        info!(
            sectors = sectors.len(),
            main = sectors.main_sectors().count(),
            "sectors classified"
        );

        let (results, rejected) = screen(&prep.histories, &sectors, &benchmark, config);
        info!(
            evaluated = prep.histories.len(),
            skipped = prep.skipped.len(),
            selected = results.len(),
            "selection complete"
        );

        Ok(SelectionReport {
            trade_date,
            universe_size: universe.len(),
            evaluated: prep.histories.len(),
            sectors: sectors.into_vec(),
            results,
            skipped: prep.skipped,
            rejected,
        })
    }

    /// Only the sector table, for inspection.
    pub fn classify(&self, request: &SelectionRequest) -> Result<SectorTable, ScreenerError> {
        let universe = self.load_universe(&request.universe)?;
        let prep = self.prepare(&universe, request.as_of, &request.config);
        Ok(classify_sectors(
            &prep.metrics,
            request.config.sector_percentile_cutoff,
        ))
    }

    pub fn load_universe(&self, policy: &UniversePolicy) -> Result<Vec<StockRecord>, ScreenerError> {
        let universe = policy.apply(self.port.fetch_universe()?);
        if universe.is_empty() {
            return Err(ScreenerError::EmptyUniverse);
        }
        Ok(universe)
    }

    pub fn load_benchmark(
        &self,
        symbol: &str,
        as_of: Option<NaiveDate>,
        rs_lookback: usize,
    ) -> Result<Vec<IndexBar>, ScreenerError> {
        let bars = self.port.fetch_benchmark(symbol, as_of)?;
        if bars.is_empty() {
            return Err(ScreenerError::EmptyBenchmark {
                symbol: symbol.to_string(),
            });
        }
        if !strictly_ascending(&bars, |b| b.date) {
            return Err(ScreenerError::UnorderedBenchmark {
                symbol: symbol.to_string(),
            });
        }
        let minimum = rs_lookback + 1;
        if bars.len() < minimum {
            return Err(ScreenerError::InsufficientBenchmark {
                symbol: symbol.to_string(),
                points: bars.len(),
                minimum,
            });
        }
        Ok(bars)
    }

    /// Fetch, validate and measure every candidate. Never fails as a whole.
    pub fn prepare(
        &self,
        universe: &[StockRecord],
        as_of: Option<NaiveDate>,
        config: &SelectionConfig,
    ) -> Preparation {
        let mut prep = Preparation::default();
        let mut seen = HashSet::new();

        for record in universe {
            if !seen.insert(record.code.as_str()) {
                prep.skip(record, SkipReason::DuplicateCode);
                continue;
            }
            match self.prepare_one(record, as_of, config) {
                Ok(history) => match history.sector_metrics() {
                    Ok(metrics) => {
                        debug!(code = %record.code, bars = history.bar_count(), "history ok");
                        prep.metrics.push(metrics);
                        prep.histories.push(history);
                    }
                    Err(reason) => prep.skip(record, reason),
                },
                Err(reason) => prep.skip(record, reason),
            }
        }
        prep
    }

    fn prepare_one(
        &self,
        record: &StockRecord,
        as_of: Option<NaiveDate>,
        config: &SelectionConfig,
    ) -> Result<StockHistory, SkipReason> {
        if record.industry().is_none() {
            return Err(SkipReason::MissingIndustry);
        }
        let prices = self
            .port
            .fetch_prices(&record.code, as_of)
            .map_err(|e| SkipReason::Provider {
                reason: e.to_string(),
            })?;
        let flows = self
            .port
            .fetch_money_flow(&record.code, as_of)
            .map_err(|e| SkipReason::Provider {
                reason: e.to_string(),
            })?;
        StockHistory::new(record.clone(), prices, flows, config.min_history_bars())
    }
}

impl Preparation {
    fn skip(&mut self, record: &StockRecord, reason: SkipReason) {
        warn!(code = %record.code, name = %record.name, %reason, "skipping stock");
        self.skipped.push(SkippedStock {
            code: record.code.clone(),
            name: record.name.clone(),
            reason,
        });
    }
}

/// Filter chain for one stock, short-circuiting on the first failed gate.
pub fn evaluate(
    history: &StockHistory,
    sector: Option<&SectorAggregate>,
    benchmark: &[IndexBar],
    config: &SelectionConfig,
) -> Result<SelectionResult, Rejection> {
    let sector = sector.ok_or(Rejection::UnknownSector)?;
    if !sector.is_main_sector {
        return Err(Rejection::NotMainSector);
    }

    let prices = &history.prices;
    let flags = SignalFlags {
        breakout: breakout(prices, config.breakout_window),
        volume_spike: volume_spike(prices, config.volume_ma_window),
        money_flow: money_flow(&history.flows),
    };
    if !flags.breakout {
        return Err(Rejection::NoBreakout);
    }
    if !flags.volume_spike {
        return Err(Rejection::NoVolumeSpike);
    }
    if !flags.money_flow {
        return Err(Rejection::NoMoneyFlow);
    }

    let rs = relative_strength(prices, benchmark, config.rs_lookback).ok_or(Rejection::RsUndefined)?;
    if !rs_qualifies(Some(rs), config.rs_threshold) {
        return Err(Rejection::RsBelowThreshold { rs });
    }

    let sector_score = sector.sector_score();
    let score = composite_score(flags, sector_score);
    if score < config.min_score {
        return Err(Rejection::ScoreBelowMinimum { score });
    }

    Ok(SelectionResult {
        code: history.record.code.clone(),
        name: history.record.name.clone(),
        industry: sector.industry.clone(),
        rs,
        sector_return_rank: sector.return_percentile,
        sector_flow_rank: sector.flow_percentile,
        sector_score,
        sector_avg_return_5d: sector.avg_return_5d,
        sector_net_flow_5d: sector.sum_net_flow_5d,
        score,
        close: history.last_bar().map(|b| b.close).unwrap_or_default(),
        near_high: near_high(prices),
    })
}

/// Evaluate every prepared stock against a sector table and rank the passes.
pub fn screen(
    histories: &[StockHistory],
    sectors: &SectorTable,
    benchmark: &[IndexBar],
    config: &SelectionConfig,
) -> (Vec<SelectionResult>, Vec<RejectedStock>) {
    let mut results = Vec::new();
    let mut rejected = Vec::new();

    for history in histories {
        let sector = history.record.industry().and_then(|i| sectors.get(i));
        match evaluate(history, sector, benchmark, config) {
            Ok(result) => {
                info!(code = %result.code, score = result.score, rs = result.rs, "selected");
                results.push(result);
            }
            Err(reason) => {
                debug!(code = %history.code(), %reason, "rejected");
                rejected.push(RejectedStock {
                    code: history.record.code.clone(),
                    name: history.record.name.clone(),
                    reason,
                });
            }
        }
    }

    rank_results(&mut results);
    (results, rejected)
}

/// Descending by score; equal scores keep candidate order.
pub fn rank_results(results: &mut [SelectionResult]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
}
