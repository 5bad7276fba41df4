#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use divtrader::domain::engine::SimConfig;
use divtrader::domain::error::DivtraderError;
use divtrader::domain::mode::ConfiguredMode;
pub use divtrader::domain::series::ClosePoint;
use divtrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn point(date_str: &str, close: f64) -> ClosePoint {
    ClosePoint::new(
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        close,
    )
}

/// Consecutive weekday series starting on (or after) `start`.
pub fn weekday_series(start: NaiveDate, closes: &[f64]) -> Vec<ClosePoint> {
    let mut out = Vec::with_capacity(closes.len());
    let mut current = start;
    for &close in closes {
        while matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current = current.succ_opt().unwrap();
        }
        out.push(ClosePoint::new(current, close));
        current = current.succ_opt().unwrap();
    }
    out
}

/// Weekday series with a repeating saw-tooth of dips and recoveries, enough
/// to trigger buys and sells in both modes.
pub fn volatile_series(start: NaiveDate, days: usize, base: f64) -> Vec<ClosePoint> {
    let pattern = [0.0, -0.06, -0.04, 0.05, 0.03, -0.07, 0.06, 0.01];
    let mut closes = Vec::with_capacity(days);
    let mut price = base;
    for i in 0..days {
        price *= 1.0 + pattern[i % pattern.len()];
        closes.push(price);
    }
    weekday_series(start, &closes)
}

pub fn sample_config() -> SimConfig {
    SimConfig {
        initial_capital: 10_000.0,
        divisions: 5,
        mode: ConfiguredMode::Safe,
        rebalance_period: 10,
    }
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<ClosePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, code: &str, series: Vec<ClosePoint>) -> Self {
        self.data.insert(code.to_string(), series);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_closes(
        &self,
        code: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<ClosePoint>, DivtraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(DivtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(code).cloned().unwrap_or_default())
    }

    fn list_codes(&self) -> Result<Vec<String>, DivtraderError> {
        Ok(self.data.keys().cloned().collect())
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, DivtraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(DivtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(code).and_then(|series| {
            match (series.first(), series.last()) {
                (Some(first), Some(last)) => Some((first.date, last.date, series.len())),
                _ => None,
            }
        }))
    }
}
