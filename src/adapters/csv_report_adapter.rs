//! CSV ledger export adapter.
//!
//! One row per simulated day; the actions column packs the day's events as
//! `kind:qty@price` entries separated by spaces.

use crate::domain::error::DivtraderError;
use crate::domain::ledger::DailyLedgerRecord;
use crate::domain::summary::SimulationSummary;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn format_actions(record: &DailyLedgerRecord) -> String {
        record
            .actions
            .iter()
            .map(|a| format!("{}:{}@{:.2}", a.kind(), a.quantity(), a.price()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        records: &[DailyLedgerRecord],
        summary: &SimulationSummary,
        output_path: &str,
    ) -> Result<(), DivtraderError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| DivtraderError::Report {
            reason: format!("failed to open {}: {}", output_path, e),
        })?;

        wtr.write_record([
            "date",
            "close",
            "prev_close",
            "change_pct",
            "mode",
            "buy_qty",
            "sell_qty",
            "net_qty",
            "realized_pl",
            "total_cash",
            "total_holdings",
            "total_value",
            "total_assets",
            "return_pct",
            "rebalanced",
            "actions",
        ])
        .map_err(|e| DivtraderError::Report {
            reason: e.to_string(),
        })?;

        for record in records {
            wtr.write_record([
                record.date.format("%Y-%m-%d").to_string(),
                format!("{:.4}", record.close),
                format!("{:.4}", record.prev_close),
                format!("{:.4}", record.change_rate),
                record.mode.as_str().to_string(),
                record.total_buy_quantity.to_string(),
                record.total_sell_quantity.to_string(),
                record.net_quantity.to_string(),
                format!("{:.4}", record.daily_realized_pl),
                format!("{:.4}", record.total_cash),
                record.total_holdings.to_string(),
                format!("{:.4}", record.total_value),
                format!("{:.4}", record.total_assets),
                format!("{:.4}", record.return_rate),
                record.rebalanced.to_string(),
                Self::format_actions(record),
            ])
            .map_err(|e| DivtraderError::Report {
                reason: e.to_string(),
            })?;
        }

        wtr.flush().map_err(|e| DivtraderError::Report {
            reason: e.to_string(),
        })?;

        eprintln!(
            "Wrote {} ledger rows ({} trades) to {}",
            records.len(),
            summary.total_trades,
            output_path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::{simulate, SimConfig};
    use crate::domain::mode::ConfiguredMode;
    use crate::domain::series::ClosePoint;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn weekday_series(closes: &[f64]) -> Vec<ClosePoint> {
        let mut current = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut out = Vec::new();
        for &close in closes {
            while matches!(
                chrono::Datelike::weekday(&current),
                chrono::Weekday::Sat | chrono::Weekday::Sun
            ) {
                current = current.succ_opt().unwrap();
            }
            out.push(ClosePoint::new(current, close));
            current = current.succ_opt().unwrap();
        }
        out
    }

    #[test]
    fn writes_header_and_one_row_per_day() {
        let config = SimConfig {
            initial_capital: 10_000.0,
            divisions: 2,
            mode: ConfiguredMode::Safe,
            rebalance_period: 10,
        };
        let series = weekday_series(&[100.0, 95.0, 95.2, 95.2]);
        let records = simulate(&config, &series, None).unwrap();
        let summary = SimulationSummary::compute(&records);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        CsvReportAdapter::new()
            .write(&records, &summary, path.to_str().unwrap())
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), records.len() + 1);
        assert!(lines[0].starts_with("date,close,prev_close"));
        assert!(lines[2].contains("BUY"), "buy day should list its action");
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let result = CsvReportAdapter::new().write(
            &[],
            &SimulationSummary::compute(&[]),
            "/nonexistent/dir/ledger.csv",
        );
        assert!(matches!(result, Err(DivtraderError::Report { .. })));
    }
}
