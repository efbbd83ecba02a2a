//! Composite 0-100 score.
//!
//! Weights are whole points out of 100. Their sum is checked at compile time,
//! so a full-marks stock scores exactly 100.0.

pub const BREAKOUT_POINTS: u32 = 30;
pub const VOLUME_POINTS: u32 = 25;
pub const MONEY_FLOW_POINTS: u32 = 25;
pub const SECTOR_POINTS: u32 = 20;
pub const TOTAL_POINTS: u32 = 100;

const _: () = assert!(BREAKOUT_POINTS + VOLUME_POINTS + MONEY_FLOW_POINTS + SECTOR_POINTS == TOTAL_POINTS);

/// Weights as fractions of the whole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub breakout: f64,
    pub volume: f64,
    pub money_flow: f64,
    pub sector: f64,
}

pub const WEIGHTS: ScoreWeights = ScoreWeights {
    breakout: BREAKOUT_POINTS as f64 / TOTAL_POINTS as f64,
    volume: VOLUME_POINTS as f64 / TOTAL_POINTS as f64,
    money_flow: MONEY_FLOW_POINTS as f64 / TOTAL_POINTS as f64,
    sector: SECTOR_POINTS as f64 / TOTAL_POINTS as f64,
};

/// Boolean outcomes of the three scored signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalFlags {
    pub breakout: bool,
    pub volume_spike: bool,
    pub money_flow: bool,
}

fn points(hit: bool, weight: u32) -> f64 {
    if hit { weight as f64 } else { 0.0 }
}

/// Weighted score in [0, 100]. `sector_score` is clamped to [0, 1].
pub fn composite_score(flags: SignalFlags, sector_score: f64) -> f64 {
    let sector_score = if sector_score.is_nan() {
        0.0
    } else {
        sector_score.clamp(0.0, 1.0)
    };
    points(flags.breakout, BREAKOUT_POINTS)
        + points(flags.volume_spike, VOLUME_POINTS)
        + points(flags.money_flow, MONEY_FLOW_POINTS)
        + SECTOR_POINTS as f64 * sector_score
}
