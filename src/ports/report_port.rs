//! Report output port.

use crate::domain::error::ScreenerError;
use crate::domain::selection::SelectionReport;

/// Hands a finished selection report to its consumer.
pub trait ReportPort {
    fn write(&self, report: &SelectionReport, output_path: &str) -> Result<(), ScreenerError>;
}
