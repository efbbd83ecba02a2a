//! Candidate pool policy.
//!
//! The engine screens whatever pool it is given. These helpers let the caller
//! narrow the provider's universe to a configured code list and/or the most
//! liquid names by traded amount.

use crate::domain::market::StockRecord;
use std::collections::HashSet;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniversePolicy {
    /// Keep only these codes (matched case-insensitively).
    pub codes: Option<Vec<String>>,
    /// Keep the N records with the largest traded amount.
    pub top_n: Option<usize>,
}

impl UniversePolicy {
    /// Whitelist first, then the traded-amount cap. Provider order is kept
    /// for whitelisted pools; a capped pool is ordered by amount descending
    /// with ties in provider order.
    pub fn apply(&self, records: Vec<StockRecord>) -> Vec<StockRecord> {
        let mut pool = match &self.codes {
            Some(codes) => {
                let wanted: HashSet<String> = codes.iter().map(|c| c.to_uppercase()).collect();
                records
                    .into_iter()
                    .filter(|r| wanted.contains(&r.code.to_uppercase()))
                    .collect()
            }
            None => records,
        };

        if let Some(n) = self.top_n {
            pool = top_by_amount(pool, n);
        }
        pool
    }
}

/// Largest `amount` first; records without an amount rank last.
pub fn top_by_amount(mut records: Vec<StockRecord>, n: usize) -> Vec<StockRecord> {
    records.sort_by(|a, b| {
        let a = a.amount.unwrap_or(f64::NEG_INFINITY);
        let b = b.amount.unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });
    records.truncate(n);
    records
}
