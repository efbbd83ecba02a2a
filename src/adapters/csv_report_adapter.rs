//! CSV report adapter implementing ReportPort.
//!
//! Writes one row per selected stock in rank order. With diagnostics enabled
//! a sibling `<stem>_diagnostics.csv` lists every skipped and rejected stock.

use crate::domain::error::ScreenerError;
use crate::domain::selection::SelectionReport;
use crate::ports::report_port::ReportPort;
use std::path::{Path, PathBuf};
use tracing::info;

const RESULT_HEADER: [&str; 13] = [
    "trade_date",
    "rank",
    "code",
    "name",
    "industry",
    "score",
    "rs",
    "sector_return_rank",
    "sector_flow_rank",
    "sector_score",
    "close",
    "near_high",
    "sector_net_flow_5d",
];

#[derive(Debug, Default)]
pub struct CsvReportAdapter {
    include_diagnostics: bool,
}

impl CsvReportAdapter {
    pub fn new(include_diagnostics: bool) -> Self {
        Self {
            include_diagnostics,
        }
    }
}

pub fn diagnostics_path(output_path: &Path) -> PathBuf {
    let stem = output_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("selection");
    output_path.with_file_name(format!("{}_diagnostics.csv", stem))
}

fn csv_error(path: &Path, e: csv::Error) -> ScreenerError {
    ScreenerError::data(format!("failed to write {}: {}", path.display(), e))
}

fn write_results(report: &SelectionReport, path: &Path) -> Result<(), ScreenerError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    wtr.write_record(RESULT_HEADER)
        .map_err(|e| csv_error(path, e))?;

    let trade_date = report.trade_date.to_string();
    for (i, r) in report.results.iter().enumerate() {
        wtr.write_record([
            trade_date.clone(),
            (i + 1).to_string(),
            r.code.clone(),
            r.name.clone(),
            r.industry.clone(),
            format!("{:.2}", r.score),
            format!("{:.2}", r.rs),
            format!("{:.3}", r.sector_return_rank),
            format!("{:.3}", r.sector_flow_rank),
            format!("{:.3}", r.sector_score),
            format!("{:.2}", r.close),
            r.near_high.to_string(),
            format!("{:.2}", r.sector_net_flow_5d),
        ])
        .map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_diagnostics(report: &SelectionReport, path: &Path) -> Result<(), ScreenerError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    wtr.write_record(["code", "name", "stage", "reason"])
        .map_err(|e| csv_error(path, e))?;

    for s in &report.skipped {
        wtr.write_record([
            s.code.as_str(),
            s.name.as_str(),
            "skipped",
            &s.reason.to_string(),
        ])
        .map_err(|e| csv_error(path, e))?;
    }
    for r in &report.rejected {
        wtr.write_record([
            r.code.as_str(),
            r.name.as_str(),
            "rejected",
            &r.reason.to_string(),
        ])
        .map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &SelectionReport, output_path: &str) -> Result<(), ScreenerError> {
        let path = Path::new(output_path);
        write_results(report, path)?;
        info!(path = %path.display(), rows = report.results.len(), "report written");

        if self.include_diagnostics {
            let diag = diagnostics_path(path);
            write_diagnostics(report, &diag)?;
            info!(
                path = %diag.display(),
                rows = report.skipped.len() + report.rejected.len(),
                "diagnostics written"
            );
        }
        Ok(())
    }
}
