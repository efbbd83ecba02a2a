//! Rolling-window statistics over ascending price and money-flow series.
//!
//! Every function looks at the trailing slice ending at the last element
//! ("today"). Input must already be in ascending date order; nothing here
//! re-sorts.

use crate::domain::market::{MoneyFlowRecord, PriceBar};

/// The `window` bars immediately before the last bar, or `None` when fewer
/// than `window + 1` bars exist.
fn preceding(bars: &[PriceBar], window: usize) -> Option<&[PriceBar]> {
    if window == 0 || bars.len() < window + 1 {
        return None;
    }
    let last = bars.len() - 1;
    Some(&bars[last - window..last])
}

/// Highest `high` over the `window` bars preceding the last bar.
pub fn trailing_max(bars: &[PriceBar], window: usize) -> Option<f64> {
    preceding(bars, window).map(|slice| {
        slice
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Mean `volume` over the `window` bars preceding the last bar.
pub fn trailing_mean(bars: &[PriceBar], window: usize) -> Option<f64> {
    preceding(bars, window)
        .map(|slice| slice.iter().map(|b| b.volume).sum::<f64>() / window as f64)
}

/// `close[-1] / close[-1 - window] - 1`. `None` on short history or a
/// non-positive base close.
pub fn trailing_return(bars: &[PriceBar], window: usize) -> Option<f64> {
    if window == 0 || bars.len() < window + 1 {
        return None;
    }
    let last = bars[bars.len() - 1].close;
    let base = bars[bars.len() - 1 - window].close;
    if base <= 0.0 {
        return None;
    }
    Some(last / base - 1.0)
}

/// Sum of `main_net_in` over the last `window` records, or over all of them
/// when fewer exist.
pub fn trailing_flow_sum(flows: &[MoneyFlowRecord], window: usize) -> f64 {
    let start = flows.len().saturating_sub(window);
    flows[start..].iter().map(|f| f.main_net_in).sum()
}
