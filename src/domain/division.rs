//! Per-division portfolio state and valuation.
//!
//! Each division runs as an independent sub-portfolio: it either holds only
//! cash or holds an open position, and moves between the two through buy and
//! sell executions only.

use chrono::NaiveDate;

use crate::domain::calendar::trading_days_between;
use crate::domain::mode::ModeParams;

/// Lifecycle of one division. Holdings and cost basis exist only while a
/// position is open, so holdings > 0 exactly when the division is holding.
#[derive(Debug, Clone, PartialEq)]
pub enum DivisionState {
    Empty {
        cash: f64,
    },
    Holding {
        cash: f64,
        holdings: i64,
        avg_price: f64,
        buy_date: NaiveDate,
        /// Cash spent plus commission; the basis for profit calculations.
        total_cost: f64,
    },
}

/// Derived per-day figures, recomputed before signal evaluation and again
/// after execution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DivisionValuation {
    pub current_value: f64,
    pub unrealized_pl: f64,
    pub unrealized_pl_rate: f64,
    pub buy_limit_price: f64,
    pub sell_limit_price: f64,
    pub trading_days_held: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DivisionPortfolio {
    /// 1-based division number.
    pub division: u32,
    pub state: DivisionState,
    pub valuation: DivisionValuation,
}

impl DivisionPortfolio {
    pub fn cash(&self) -> f64 {
        match &self.state {
            DivisionState::Empty { cash } => *cash,
            DivisionState::Holding { cash, .. } => *cash,
        }
    }

    pub fn holdings(&self) -> i64 {
        match &self.state {
            DivisionState::Empty { .. } => 0,
            DivisionState::Holding { holdings, .. } => *holdings,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, DivisionState::Empty { .. })
    }

    pub fn is_holding(&self) -> bool {
        matches!(self.state, DivisionState::Holding { .. })
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.holdings() as f64 * price
    }

    /// Cash plus holdings valued at `price`.
    pub fn total_value(&self, price: f64) -> f64 {
        self.cash() + self.market_value(price)
    }
}

/// Seed N empty divisions with an even share of the starting capital.
pub fn initialize_divisions(initial_capital: f64, divisions: u32) -> Vec<DivisionPortfolio> {
    let division_amount = initial_capital / divisions as f64;
    (1..=divisions)
        .map(|n| DivisionPortfolio {
            division: n,
            state: DivisionState::Empty {
                cash: division_amount,
            },
            valuation: DivisionValuation::default(),
        })
        .collect()
}

/// Recompute every division's derived figures for today.
///
/// Empty divisions get only the display buy-limit. Holding divisions get
/// market value, unrealized P/L against total cost, the sell-limit, and
/// trading days held.
pub fn update_valuations(
    divisions: &mut [DivisionPortfolio],
    today_close: f64,
    prev_close: f64,
    date: NaiveDate,
    params: &ModeParams,
) {
    let buy_limit_price = prev_close * (1.0 + params.buy_target);

    for division in divisions {
        division.valuation = match &division.state {
            DivisionState::Empty { .. } => DivisionValuation {
                buy_limit_price,
                ..DivisionValuation::default()
            },
            DivisionState::Holding {
                holdings,
                avg_price,
                buy_date,
                total_cost,
                ..
            } => {
                let current_value = *holdings as f64 * today_close;
                let unrealized_pl = current_value - total_cost;
                DivisionValuation {
                    current_value,
                    unrealized_pl,
                    unrealized_pl_rate: unrealized_pl / total_cost * 100.0,
                    buy_limit_price,
                    sell_limit_price: avg_price * (1.0 + params.sell_target),
                    trading_days_held: trading_days_between(*buy_date, date),
                }
            }
        };
    }
}

/// Pool all division capital at today's close and redistribute evenly.
///
/// Open positions are never disturbed: a holding division keeps its shares
/// and receives `max(0, new_amount - holding_value)` in cash, so a position
/// larger than the new target share leaves that division with no cash.
/// Returns the pooled total.
pub fn rebalance_divisions(divisions: &mut [DivisionPortfolio], close: f64) -> f64 {
    let pool: f64 = divisions.iter().map(|d| d.total_value(close)).sum();
    let new_amount = pool / divisions.len() as f64;

    for division in divisions.iter_mut() {
        division.state = match &division.state {
            DivisionState::Empty { .. } => DivisionState::Empty { cash: new_amount },
            DivisionState::Holding {
                holdings,
                avg_price,
                buy_date,
                total_cost,
                ..
            } => {
                let holding_value = *holdings as f64 * close;
                DivisionState::Holding {
                    cash: (new_amount - holding_value).max(0.0),
                    holdings: *holdings,
                    avg_price: *avg_price,
                    buy_date: *buy_date,
                    total_cost: *total_cost,
                }
            }
        };
    }
    pool
}
