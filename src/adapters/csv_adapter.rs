//! CSV directory data adapter.
//!
//! Layout under the base path:
//!
//! ```text
//! universe.csv          code,name,industry[,amount]
//! prices/<code>.csv     date,open,high,low,close,volume,amount
//! flows/<code>.csv      date,main_net_in,main_net_ratio
//! index/<symbol>.csv    date,close
//! ```
//!
//! Dates are `YYYY-MM-DD` or `YYYYMMDD`. A missing per-stock file means "no
//! data"; a missing universe or benchmark file is an error.

use crate::domain::error::ScreenerError;
use crate::domain::market::{IndexBar, MoneyFlowRecord, PriceBar, StockRecord};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fmt::Display;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let path = config
            .get_string("data", "path")
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ScreenerError::ConfigMissing {
                section: "data".into(),
                key: "path".into(),
            })?;
        Ok(Self::new(PathBuf::from(path)))
    }

    fn universe_path(&self) -> PathBuf {
        self.base_path.join("universe.csv")
    }

    /// Codes and symbols become file names, so they must stay inside `dir`.
    fn series_path(&self, dir: &str, key: &str) -> Result<PathBuf, ScreenerError> {
        if !safe_file_key(key) {
            return Err(ScreenerError::data(format!(
                "{:?} is not usable as a file name",
                key
            )));
        }
        Ok(self.base_path.join(dir).join(format!("{}.csv", key)))
    }

    /// `Ok(None)` when the file does not exist.
    fn read_records(path: &Path) -> Result<Option<Vec<StringRecord>>, ScreenerError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ScreenerError::data(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| {
                ScreenerError::data(format!("CSV parse error in {}: {}", path.display(), e))
            })?;
            records.push(record);
        }
        Ok(Some(records))
    }

    fn read_required(path: &Path) -> Result<Vec<StringRecord>, ScreenerError> {
        Self::read_records(path)?
            .ok_or_else(|| ScreenerError::data(format!("{} not found", path.display())))
    }

    fn read_optional(path: &Path) -> Result<Vec<StringRecord>, ScreenerError> {
        match Self::read_records(path)? {
            Some(records) => Ok(records),
            None => {
                debug!(path = %path.display(), "no data file");
                Ok(Vec::new())
            }
        }
    }
}

fn field<'r>(record: &'r StringRecord, idx: usize, name: &str) -> Result<&'r str, ScreenerError> {
    record
        .get(idx)
        .ok_or_else(|| ScreenerError::data(format!("missing {} column", name)))
}

fn parse_field<T>(record: &StringRecord, idx: usize, name: &str) -> Result<T, ScreenerError>
where
    T: FromStr,
    T::Err: Display,
{
    field(record, idx, name)?
        .parse()
        .map_err(|e| ScreenerError::data(format!("invalid {} value: {}", name, e)))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ScreenerError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .map_err(|e| ScreenerError::data(format!("invalid date {:?}: {}", value, e)))
}

fn safe_file_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && !key.contains("..")
        && !key.contains(['/', '\\', ':'])
}

fn within(date: NaiveDate, as_of: Option<NaiveDate>) -> bool {
    as_of.is_none_or(|cap| date <= cap)
}

fn optional_text(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

impl MarketDataPort for CsvAdapter {
    fn fetch_universe(&self) -> Result<Vec<StockRecord>, ScreenerError> {
        let path = self.universe_path();
        let mut stocks = Vec::new();
        for record in Self::read_required(&path)? {
            let amount = match optional_text(&record, 3) {
                Some(text) => Some(text.parse::<f64>().map_err(|e| {
                    ScreenerError::data(format!("invalid amount value: {}", e))
                })?),
                None => None,
            };
            stocks.push(StockRecord {
                code: field(&record, 0, "code")?.to_string(),
                name: field(&record, 1, "name")?.to_string(),
                industry: optional_text(&record, 2),
                amount,
            });
        }
        Ok(stocks)
    }

    fn fetch_prices(
        &self,
        code: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, ScreenerError> {
        let path = self.series_path("prices", code)?;
        let mut bars = Vec::new();
        for record in Self::read_optional(&path)? {
            let date = parse_date(field(&record, 0, "date")?)?;
            if !within(date, as_of) {
                continue;
            }
            bars.push(PriceBar {
                date,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
                amount: parse_field(&record, 6, "amount")?,
            });
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn fetch_money_flow(
        &self,
        code: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<MoneyFlowRecord>, ScreenerError> {
        let path = self.series_path("flows", code)?;
        let mut flows = Vec::new();
        for record in Self::read_optional(&path)? {
            let date = parse_date(field(&record, 0, "date")?)?;
            if !within(date, as_of) {
                continue;
            }
            flows.push(MoneyFlowRecord {
                date,
                main_net_in: parse_field(&record, 1, "main_net_in")?,
                main_net_ratio: parse_field(&record, 2, "main_net_ratio")?,
            });
        }
        flows.sort_by_key(|f| f.date);
        Ok(flows)
    }

    fn fetch_benchmark(
        &self,
        symbol: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<IndexBar>, ScreenerError> {
        let path = self.series_path("index", symbol)?;
        let mut bars = Vec::new();
        for record in Self::read_required(&path)? {
            let date = parse_date(field(&record, 0, "date")?)?;
            if !within(date, as_of) {
                continue;
            }
            bars.push(IndexBar {
                date,
                close: parse_field(&record, 1, "close")?,
            });
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}
