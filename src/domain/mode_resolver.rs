//! Momentum-based mode selection.
//!
//! The weekly rule set compares the two most recent weekly oscillator
//! readings; the daily rule set compares consecutive daily readings and uses
//! its own thresholds. Rules are evaluated in order, first match wins.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::domain::mode::Mode;
use crate::domain::rsi::{self, RSI_PERIOD, SignalStrength};
use crate::domain::series::ClosePoint;

/// Outcome of comparing the last two weekly oscillator readings.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyModeDecision {
    pub mode: Mode,
    pub reason: String,
    pub last_week_rsi: Option<f64>,
    pub prior_week_rsi: Option<f64>,
    pub last_week_date: Option<NaiveDate>,
    pub prior_week_date: Option<NaiveDate>,
}

/// Decide the risk profile from the two most recent weekly readings.
pub fn resolve_weekly_mode(last_week: Option<f64>, prior_week: Option<f64>) -> (Mode, String) {
    let (Some(current), Some(previous)) = (last_week, prior_week) else {
        return (Mode::Safe, "insufficient data".to_string());
    };

    let rising = current > previous;
    let falling = current < previous;

    if falling {
        return (
            Mode::Safe,
            format!("RSI falling ({previous:.1} -> {current:.1})"),
        );
    }
    if previous >= 50.0 && current < 50.0 {
        return (
            Mode::Safe,
            format!("RSI crossed below 50 ({previous:.1} -> {current:.1})"),
        );
    }
    if current > 65.0 {
        return (Mode::Safe, format!("RSI overbought ({current:.1})"));
    }
    if rising {
        return (
            Mode::Aggressive,
            format!("RSI rising ({previous:.1} -> {current:.1})"),
        );
    }
    if previous < 50.0 && current >= 50.0 {
        return (
            Mode::Aggressive,
            format!("RSI crossed above 50 ({previous:.1} -> {current:.1})"),
        );
    }
    if current < 35.0 && rising {
        return (
            Mode::Aggressive,
            format!("RSI oversold rebound ({previous:.1} -> {current:.1})"),
        );
    }

    (
        Mode::Safe,
        format!("RSI steady ({current:.1}), defaulting to safe"),
    )
}

/// Latest weekly decision for a daily series.
pub fn weekly_mode_info(series: &[ClosePoint]) -> WeeklyModeDecision {
    let weekly = rsi::calculate_weekly_rsi(series, RSI_PERIOD);
    if weekly.len() < 2 {
        return WeeklyModeDecision {
            mode: Mode::Safe,
            reason: "insufficient data".to_string(),
            last_week_rsi: None,
            prior_week_rsi: None,
            last_week_date: None,
            prior_week_date: None,
        };
    }

    let last = &weekly[weekly.len() - 1];
    let prior = &weekly[weekly.len() - 2];
    let (mode, reason) = resolve_weekly_mode(last.rsi, prior.rsi);

    WeeklyModeDecision {
        mode,
        reason,
        last_week_rsi: last.rsi,
        prior_week_rsi: prior.rsi,
        last_week_date: Some(last.date),
        prior_week_date: Some(prior.date),
    }
}

/// Build the date-to-mode map for auto runs: resolve once per weekly reading
/// pair and broadcast each decision forward until the next one. Days before
/// the first decision carry the safe default.
pub fn build_mode_map(series: &[ClosePoint]) -> BTreeMap<NaiveDate, Mode> {
    let weekly = rsi::calculate_weekly_rsi(series, RSI_PERIOD);

    let mut decisions: BTreeMap<NaiveDate, Mode> = BTreeMap::new();
    for pair in weekly.windows(2) {
        let (mode, _) = resolve_weekly_mode(pair[1].rsi, pair[0].rsi);
        decisions.insert(pair[1].date, mode);
    }

    let mut map = BTreeMap::new();
    let mut current = Mode::Safe;
    for point in series {
        if let Some(mode) = decisions.get(&point.date) {
            current = *mode;
        }
        map.insert(point.date, current);
    }
    map
}

/// One daily oscillator sample with its derived mode.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiSample {
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: Option<f64>,
    pub prev_rsi: Option<f64>,
    pub mode: Mode,
    pub reason: String,
    pub strength: SignalStrength,
}

/// Day-over-day rule set used for per-sample enrichment.
pub fn resolve_daily_mode(current: Option<f64>, previous: Option<f64>) -> (Mode, String) {
    let (Some(current), Some(previous)) = (current, previous) else {
        return (Mode::Safe, "insufficient data".to_string());
    };

    let rising = current > previous;
    let falling = current < previous;
    let delta = current - previous;

    if current > 65.0 && falling {
        return (
            Mode::Safe,
            format!("RSI {current:.1} falling from overbought ({delta:+.2})"),
        );
    }
    if current > 40.0 && current < 50.0 && falling {
        return (
            Mode::Safe,
            format!("RSI {current:.1} slipping below neutral ({delta:+.2})"),
        );
    }
    if previous >= 50.0 && current < 50.0 {
        return (
            Mode::Safe,
            format!("RSI {current:.1} crossed below 50 ({delta:+.2})"),
        );
    }
    if previous < 50.0 && current >= 50.0 {
        return (
            Mode::Aggressive,
            format!("RSI {current:.1} crossed above 50 ({delta:+.2})"),
        );
    }
    if current < 35.0 && rising {
        return (
            Mode::Aggressive,
            format!("RSI {current:.1} rebounding from oversold ({delta:+.2})"),
        );
    }
    if current > 30.0 && current < 60.0 && rising {
        return (
            Mode::Aggressive,
            format!("RSI {current:.1} rising through neutral ({delta:+.2})"),
        );
    }

    (Mode::Safe, format!("RSI {current:.1}, defaulting to safe"))
}

/// Attach oscillator values, mode, and strength bucket to every day.
pub fn enrich_daily(series: &[ClosePoint]) -> Vec<RsiSample> {
    let points = rsi::calculate_rsi(series, RSI_PERIOD);

    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let prev_rsi = if i == 0 { None } else { points[i - 1].rsi };
            let (mode, reason) = if i == 0 || point.rsi.is_none() {
                (Mode::Safe, "insufficient data".to_string())
            } else {
                resolve_daily_mode(point.rsi, prev_rsi)
            };
            RsiSample {
                date: point.date,
                close: point.close,
                rsi: point.rsi,
                prev_rsi,
                mode,
                reason,
                strength: SignalStrength::from_rsi(point.rsi),
            }
        })
        .collect()
}
