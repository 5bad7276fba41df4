//! CSV file data adapter.
//!
//! Reads `<base>/<code>.csv` with a `date,close` header row; extra columns
//! are ignored so exports carrying volume or OHLC data load unchanged.

use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

use crate::domain::error::DivtraderError;
use crate::domain::series::ClosePoint;
use crate::ports::data_port::DataPort;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }

    fn read_all(&self, code: &str) -> Result<Vec<ClosePoint>, DivtraderError> {
        let path = self.csv_path(code);
        let content = fs::read_to_string(&path).map_err(|e| DivtraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| DivtraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(0).ok_or_else(|| DivtraderError::Data {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                DivtraderError::Data {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            let close: f64 = record
                .get(1)
                .ok_or_else(|| DivtraderError::Data {
                    reason: "missing close column".into(),
                })?
                .parse()
                .map_err(|e| DivtraderError::Data {
                    reason: format!("invalid close value: {}", e),
                })?;

            points.push(ClosePoint::new(date, close));
        }

        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_closes(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<ClosePoint>, DivtraderError> {
        let points = self.read_all(code)?;
        Ok(points
            .into_iter()
            .filter(|p| p.date >= start_date && p.date <= end_date)
            .collect())
    }

    fn list_codes(&self) -> Result<Vec<String>, DivtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| DivtraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut codes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DivtraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(code) = name_str.strip_suffix(".csv") {
                codes.push(code.to_string());
            }
        }

        codes.sort();
        Ok(codes)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DivtraderError> {
        let points = self.read_all(code)?;
        Ok(match (points.first(), points.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, points.len())),
            _ => None,
        })
    }
}
