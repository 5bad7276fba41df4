//! Trading-day arithmetic. Weekends are the only non-trading days; there is
//! no holiday calendar.

use chrono::{Datelike, NaiveDate, Weekday};

/// Inclusive count of weekdays from `start` through `end`.
/// Returns 0 when `start > end`.
pub fn trading_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if start > end {
        return 0;
    }

    let mut days = 0;
    let mut current = start;
    while current <= end {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            days += 1;
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    days
}
