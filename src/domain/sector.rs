//! Sector strength classification.
//!
//! Industries are ranked against each other on the mean short-window return
//! and the summed short-window net inflow of their members. Ranking is
//! relative to the industries present in the run's candidate pool, so the
//! same absolute numbers can classify differently on different days.

use std::collections::{BTreeMap, HashMap};

/// Bars (and money-flow records) in the short sector window.
pub const SECTOR_WINDOW: usize = 5;

/// Per-stock inputs to sector aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct StockMetrics {
    pub code: String,
    pub industry: String,
    pub return_5d: f64,
    pub net_flow_5d: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorAggregate {
    pub industry: String,
    pub members: usize,
    pub avg_return_5d: f64,
    pub sum_net_flow_5d: f64,
    pub return_percentile: f64,
    pub flow_percentile: f64,
    pub is_main_sector: bool,
}

impl SectorAggregate {
    /// Mean of the two percentiles, in [0, 1].
    pub fn sector_score(&self) -> f64 {
        (self.return_percentile + self.flow_percentile) / 2.0
    }
}

/// All sectors of one run, ordered by industry name.
#[derive(Debug, Clone, Default)]
pub struct SectorTable {
    sectors: Vec<SectorAggregate>,
    index: HashMap<String, usize>,
}

impl SectorTable {
    pub fn from_aggregates(mut sectors: Vec<SectorAggregate>) -> Self {
        sectors.sort_by(|a, b| a.industry.cmp(&b.industry));
        let index = sectors
            .iter()
            .enumerate()
            .map(|(i, s)| (s.industry.clone(), i))
            .collect();
        Self { sectors, index }
    }

    pub fn get(&self, industry: &str) -> Option<&SectorAggregate> {
        self.index.get(industry).map(|&i| &self.sectors[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectorAggregate> {
        self.sectors.iter()
    }

    pub fn main_sectors(&self) -> impl Iterator<Item = &SectorAggregate> {
        self.sectors.iter().filter(|s| s.is_main_sector)
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn into_vec(self) -> Vec<SectorAggregate> {
        self.sectors
    }
}

/// Fractional ranks (rank / count) with tied values sharing their average rank.
pub fn percentile_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // 1-based positions start+1 ..= end
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = avg_rank / n as f64;
        }
        start = end;
    }
    ranks
}

/// Top-band on both percentiles and a positive aggregate inflow.
pub fn is_main_sector(return_percentile: f64, flow_percentile: f64, net_flow: f64, cutoff: f64) -> bool {
    return_percentile > cutoff && flow_percentile > cutoff && net_flow > 0.0
}

/// Group stocks by industry, rank the industries and mark main-line sectors.
pub fn classify_sectors(metrics: &[StockMetrics], cutoff: f64) -> SectorTable {
    let mut groups: BTreeMap<&str, (f64, usize, f64)> = BTreeMap::new();
    for m in metrics {
        let entry = groups.entry(m.industry.as_str()).or_insert((0.0, 0, 0.0));
        entry.0 += m.return_5d;
        entry.1 += 1;
        entry.2 += m.net_flow_5d;
    }

    let industries: Vec<&str> = groups.keys().copied().collect();
    let avg_returns: Vec<f64> = groups
        .values()
        .map(|&(sum, count, _)| sum / count as f64)
        .collect();
    let net_flows: Vec<f64> = groups.values().map(|&(_, _, flow)| flow).collect();

    let return_pct = percentile_ranks(&avg_returns);
    let flow_pct = percentile_ranks(&net_flows);

    let sectors = industries
        .iter()
        .enumerate()
        .map(|(i, industry)| SectorAggregate {
            industry: industry.to_string(),
            members: groups[industry].1,
            avg_return_5d: avg_returns[i],
            sum_net_flow_5d: net_flows[i],
            return_percentile: return_pct[i],
            flow_percentile: flow_pct[i],
            is_main_sector: is_main_sector(return_pct[i], flow_pct[i], net_flows[i], cutoff),
        })
        .collect();

    SectorTable::from_aggregates(sectors)
}
