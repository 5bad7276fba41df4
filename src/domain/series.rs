//! Daily close-price series input.

use chrono::NaiveDate;

use crate::domain::error::DivtraderError;

/// One daily observation: the date and that day's closing price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl ClosePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        ClosePoint { date, close }
    }
}

/// Day-over-day fractional change.
pub fn change_rate(today_close: f64, prev_close: f64) -> f64 {
    (today_close - prev_close) / prev_close
}

/// The engine assumes strictly ascending, deduplicated dates and positive
/// closes; callers validate before handing a series over.
pub fn validate_series(series: &[ClosePoint]) -> Result<(), DivtraderError> {
    for pair in series.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(DivtraderError::Series {
                reason: format!(
                    "dates not strictly ascending: {} then {}",
                    pair[0].date, pair[1].date
                ),
            });
        }
    }
    for point in series {
        if point.close <= 0.0 {
            return Err(DivtraderError::Series {
                reason: format!("non-positive close {} on {}", point.close, point.date),
            });
        }
    }
    Ok(())
}
