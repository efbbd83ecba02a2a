//! Per-stock signal predicates.
//!
//! Every predicate fails closed: short or unusable history yields `false`
//! (or `None` for RS), never an error.

use crate::domain::market::{IndexBar, MoneyFlowRecord, PriceBar};
use crate::domain::series::{trailing_max, trailing_mean};

pub const BREAKOUT_MARGIN: f64 = 1.01;
pub const VOLUME_MULTIPLIER: f64 = 1.5;
pub const VOLUME_STREAK_DAYS: usize = 3;
pub const MONEY_FLOW_DAYS: usize = 3;
/// Percent units: 20.0 means 20%.
pub const MONEY_FLOW_RATIO_MIN: f64 = 20.0;
pub const NEAR_HIGH_TOLERANCE: f64 = 0.98;

/// Last close above the highest high of the preceding `window` bars by the
/// breakout margin.
pub fn breakout(bars: &[PriceBar], window: usize) -> bool {
    match (trailing_max(bars, window), bars.last()) {
        (Some(highest), Some(today)) => today.close > highest * BREAKOUT_MARGIN,
        _ => false,
    }
}

/// Today's volume exceeds 1.5x its trailing mean, and each of the last three
/// days beat its own trailing mean.
pub fn volume_spike(bars: &[PriceBar], ma_window: usize) -> bool {
    if bars.len() < ma_window + VOLUME_STREAK_DAYS {
        return false;
    }
    let end = bars.len();
    let Some(today_mean) = trailing_mean(bars, ma_window) else {
        return false;
    };
    if bars[end - 1].volume <= today_mean * VOLUME_MULTIPLIER {
        return false;
    }
    (end - VOLUME_STREAK_DAYS..end).all(|i| {
        trailing_mean(&bars[..=i], ma_window).is_some_and(|mean| bars[i].volume > mean)
    })
}

/// Positive main net inflow on each of the last three records and a latest
/// main net ratio above 20%.
pub fn money_flow(flows: &[MoneyFlowRecord]) -> bool {
    if flows.len() < MONEY_FLOW_DAYS {
        return false;
    }
    let recent = &flows[flows.len() - MONEY_FLOW_DAYS..];
    let all_inflow = recent.iter().all(|f| f.main_net_in > 0.0);
    let ratio_ok = recent
        .last()
        .is_some_and(|f| f.main_net_ratio > MONEY_FLOW_RATIO_MIN);
    all_inflow && ratio_ok
}

/// Stock return over `lookback` bars divided by the benchmark return over the
/// same number of points.
///
/// `None` when either series is shorter than `lookback + 1`, a base close is
/// non-positive, or the benchmark return is exactly zero.
pub fn relative_strength(prices: &[PriceBar], index: &[IndexBar], lookback: usize) -> Option<f64> {
    if lookback == 0 || prices.len() < lookback + 1 || index.len() < lookback + 1 {
        return None;
    }
    let stock_base = prices[prices.len() - 1 - lookback].close;
    let index_base = index[index.len() - 1 - lookback].close;
    if stock_base <= 0.0 || index_base <= 0.0 {
        return None;
    }
    let stock_return = prices[prices.len() - 1].close / stock_base - 1.0;
    let index_return = index[index.len() - 1].close / index_base - 1.0;
    if index_return == 0.0 {
        return None;
    }
    Some(stock_return / index_return)
}

/// An undefined RS never qualifies.
pub fn rs_qualifies(rs: Option<f64>, threshold: f64) -> bool {
    rs.is_some_and(|v| v > threshold)
}

/// Last close within 2% of the highest high in the whole history.
pub fn near_high(bars: &[PriceBar]) -> bool {
    let Some(today) = bars.last() else {
        return false;
    };
    let all_high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    today.close >= all_high * NEAR_HIGH_TOLERANCE
}
