//! Report generation port trait.

use crate::domain::error::DivtraderError;
use crate::domain::ledger::DailyLedgerRecord;
use crate::domain::summary::SimulationSummary;

/// Port for writing simulation results.
pub trait ReportPort {
    fn write(
        &self,
        records: &[DailyLedgerRecord],
        summary: &SimulationSummary,
        output_path: &str,
    ) -> Result<(), DivtraderError>;
}
