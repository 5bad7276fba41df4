//! Trading modes and their buy/sell/holding thresholds.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::DivtraderError;

/// The risk profile in effect on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Safe,
    Aggressive,
}

/// Thresholds governing buy/sell decisions for one mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeParams {
    /// Profit target as a fraction of the average cost basis.
    pub sell_target: f64,
    /// Adverse day-over-day move required before a dip buy fires. Negative.
    pub buy_target: f64,
    /// Maximum trading days a position may be held before a forced exit.
    pub holding_days: i64,
}

impl Mode {
    pub fn params(self) -> ModeParams {
        match self {
            Mode::Safe => ModeParams {
                sell_target: 0.002,
                buy_target: -0.03,
                holding_days: 30,
            },
            Mode::Aggressive => ModeParams {
                sell_target: 0.025,
                buy_target: -0.05,
                holding_days: 7,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Safe => "safe",
            Mode::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode selection as configured for a run. `Auto` defers to the weekly
/// momentum resolver via a date-to-mode map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfiguredMode {
    Safe,
    Aggressive,
    Auto,
}

impl ConfiguredMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfiguredMode::Safe => "safe",
            ConfiguredMode::Aggressive => "aggressive",
            ConfiguredMode::Auto => "auto",
        }
    }
}

impl fmt::Display for ConfiguredMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfiguredMode {
    type Err = DivtraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "safe" => Ok(ConfiguredMode::Safe),
            "aggressive" => Ok(ConfiguredMode::Aggressive),
            "auto" => Ok(ConfiguredMode::Auto),
            other => Err(DivtraderError::ConfigInvalid {
                section: "simulation".to_string(),
                key: "mode".to_string(),
                reason: format!("unknown mode '{}'", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_params() {
        let p = Mode::Safe.params();
        assert!((p.sell_target - 0.002).abs() < f64::EPSILON);
        assert!((p.buy_target - (-0.03)).abs() < f64::EPSILON);
        assert_eq!(p.holding_days, 30);
    }

    #[test]
    fn aggressive_params() {
        let p = Mode::Aggressive.params();
        assert!((p.sell_target - 0.025).abs() < f64::EPSILON);
        assert!((p.buy_target - (-0.05)).abs() < f64::EPSILON);
        assert_eq!(p.holding_days, 7);
    }

    #[test]
    fn buy_targets_are_adverse() {
        assert!(Mode::Safe.params().buy_target < 0.0);
        assert!(Mode::Aggressive.params().buy_target < 0.0);
    }

    #[test]
    fn display_mode() {
        assert_eq!(Mode::Safe.to_string(), "safe");
        assert_eq!(Mode::Aggressive.to_string(), "aggressive");
    }

    #[test]
    fn parse_configured_mode() {
        assert_eq!("safe".parse::<ConfiguredMode>().unwrap(), ConfiguredMode::Safe);
        assert_eq!(
            "Aggressive".parse::<ConfiguredMode>().unwrap(),
            ConfiguredMode::Aggressive
        );
        assert_eq!(" auto ".parse::<ConfiguredMode>().unwrap(), ConfiguredMode::Auto);
    }

    #[test]
    fn parse_unknown_mode_fails() {
        let err = "turbo".parse::<ConfiguredMode>();
        assert!(matches!(
            err,
            Err(DivtraderError::ConfigInvalid { .. })
        ));
    }
}
