//! Per-division trade events.

use std::fmt;

/// One executed or proposed event for one division on one day. Each variant
/// carries exactly the fields that kind of event produces.
#[derive(Debug, Clone, PartialEq)]
pub enum DivisionAction {
    Buy {
        division: u32,
        quantity: i64,
        price: f64,
        limit_price: f64,
        amount: f64,
        commission: f64,
        reason: String,
    },
    Sell {
        division: u32,
        quantity: i64,
        price: f64,
        limit_price: f64,
        amount: f64,
        commission: f64,
        profit: f64,
        profit_rate: f64,
        trading_days_held: i64,
        reason: String,
    },
    StopLoss {
        division: u32,
        quantity: i64,
        price: f64,
        limit_price: f64,
        amount: f64,
        commission: f64,
        profit: f64,
        profit_rate: f64,
        trading_days_held: i64,
        reason: String,
    },
    Hold {
        division: u32,
        reason: String,
    },
}

impl DivisionAction {
    pub fn division(&self) -> u32 {
        match self {
            DivisionAction::Buy { division, .. }
            | DivisionAction::Sell { division, .. }
            | DivisionAction::StopLoss { division, .. }
            | DivisionAction::Hold { division, .. } => *division,
        }
    }

    pub fn quantity(&self) -> i64 {
        match self {
            DivisionAction::Buy { quantity, .. }
            | DivisionAction::Sell { quantity, .. }
            | DivisionAction::StopLoss { quantity, .. } => *quantity,
            DivisionAction::Hold { .. } => 0,
        }
    }

    pub fn price(&self) -> f64 {
        match self {
            DivisionAction::Buy { price, .. }
            | DivisionAction::Sell { price, .. }
            | DivisionAction::StopLoss { price, .. } => *price,
            DivisionAction::Hold { .. } => 0.0,
        }
    }

    pub fn commission(&self) -> f64 {
        match self {
            DivisionAction::Buy { commission, .. }
            | DivisionAction::Sell { commission, .. }
            | DivisionAction::StopLoss { commission, .. } => *commission,
            DivisionAction::Hold { .. } => 0.0,
        }
    }

    /// Realized profit; zero for buys and holds.
    pub fn profit(&self) -> f64 {
        match self {
            DivisionAction::Sell { profit, .. } | DivisionAction::StopLoss { profit, .. } => {
                *profit
            }
            _ => 0.0,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            DivisionAction::Buy { reason, .. }
            | DivisionAction::Sell { reason, .. }
            | DivisionAction::StopLoss { reason, .. }
            | DivisionAction::Hold { reason, .. } => reason,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DivisionAction::Buy { .. } => "BUY",
            DivisionAction::Sell { .. } => "SELL",
            DivisionAction::StopLoss { .. } => "STOP_LOSS",
            DivisionAction::Hold { .. } => "HOLD",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, DivisionAction::Buy { .. })
    }

    /// Sell-type actions: profit-target sells and forced stop-loss exits.
    pub fn is_sell_kind(&self) -> bool {
        matches!(
            self,
            DivisionAction::Sell { .. } | DivisionAction::StopLoss { .. }
        )
    }
}

impl fmt::Display for DivisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DivisionAction::Hold { division, reason } => {
                write!(f, "division {division} HOLD ({reason})")
            }
            other => write!(
                f,
                "division {} {} {} @ {:.2} ({})",
                other.division(),
                other.kind(),
                other.quantity(),
                other.price(),
                other.reason()
            ),
        }
    }
}
