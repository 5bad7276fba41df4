//! Relative Strength Index over daily and weekly close series.
//!
//! Simple-average variant: average gain/loss are plain means of the trailing
//! `period` day-over-day deltas (no Wilder smoothing).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 with any gain: RSI = 100. A window with no movement at
//! all reads neutral 50.
//!
//! Warmup: the first `period` points are undefined. A series with fewer than
//! `period + 1` points gets a flat neutral 50 instead.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeMap;

use crate::domain::series::ClosePoint;

/// Look-back window, in days for the daily series and weeks for the
/// resampled one.
pub const RSI_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiPoint {
    pub date: NaiveDate,
    pub close: f64,
    /// None during warm-up when there are too few deltas for a full window.
    pub rsi: Option<f64>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn window_rsi(closes: &[f64], index: usize, period: usize) -> f64 {
    let mut gains = 0.0;
    let mut losses = 0.0;
    for j in (index + 1 - period)..=index {
        let change = closes[j] - closes[j - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses += -change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        round2(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
    }
}

/// RSI over a daily close series.
pub fn calculate_rsi(series: &[ClosePoint], period: usize) -> Vec<RsiPoint> {
    if period == 0 || series.len() < period + 1 {
        return series
            .iter()
            .map(|p| RsiPoint {
                date: p.date,
                close: p.close,
                rsi: Some(50.0),
            })
            .collect();
    }

    let closes: Vec<f64> = series.iter().map(|p| p.close).collect();
    series
        .iter()
        .enumerate()
        .map(|(i, p)| RsiPoint {
            date: p.date,
            close: p.close,
            rsi: if i < period {
                None
            } else {
                Some(window_rsi(&closes, i, period))
            },
        })
        .collect()
}

/// Resample a daily series to one close per ISO calendar week: the Friday
/// close if the week has one, otherwise the week's last available close.
pub fn resample_weekly(series: &[ClosePoint]) -> Vec<ClosePoint> {
    let mut weeks: BTreeMap<(i32, u32), Vec<ClosePoint>> = BTreeMap::new();
    for point in series {
        let week = point.date.iso_week();
        weeks
            .entry((week.year(), week.week()))
            .or_default()
            .push(*point);
    }

    weeks
        .into_values()
        .filter_map(|days| {
            days.iter()
                .copied()
                .find(|d| d.date.weekday() == Weekday::Fri)
                .or_else(|| days.last().copied())
        })
        .collect()
}

/// Weekly RSI: resample, then run the identical oscillator math with the
/// window measured in weeks.
pub fn calculate_weekly_rsi(series: &[ClosePoint], period: usize) -> Vec<RsiPoint> {
    calculate_rsi(&resample_weekly(series), period)
}

/// Qualitative bucket for an oscillator reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalStrength {
    StrongOverbought,
    Overbought,
    WeakOverbought,
    Neutral,
    WeakOversold,
    Oversold,
    StrongOversold,
}

impl SignalStrength {
    pub fn from_rsi(rsi: Option<f64>) -> Self {
        let Some(value) = rsi else {
            return SignalStrength::Neutral;
        };
        if value >= 70.0 {
            SignalStrength::StrongOverbought
        } else if value >= 65.0 {
            SignalStrength::Overbought
        } else if value >= 55.0 {
            SignalStrength::WeakOverbought
        } else if value >= 45.0 {
            SignalStrength::Neutral
        } else if value >= 35.0 {
            SignalStrength::WeakOversold
        } else if value >= 30.0 {
            SignalStrength::Oversold
        } else {
            SignalStrength::StrongOversold
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SignalStrength::StrongOverbought => "strong overbought",
            SignalStrength::Overbought => "overbought",
            SignalStrength::WeakOverbought => "weak overbought",
            SignalStrength::Neutral => "neutral",
            SignalStrength::WeakOversold => "weak oversold",
            SignalStrength::Oversold => "oversold",
            SignalStrength::StrongOversold => "strong oversold",
        }
    }

    /// Position on a 0-100 gauge for display.
    pub fn gauge(self) -> u8 {
        match self {
            SignalStrength::StrongOverbought => 90,
            SignalStrength::Overbought => 75,
            SignalStrength::WeakOverbought => 60,
            SignalStrength::Neutral => 50,
            SignalStrength::WeakOversold => 40,
            SignalStrength::Oversold => 25,
            SignalStrength::StrongOversold => 10,
        }
    }
}
