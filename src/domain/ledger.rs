//! Per-day simulation output records.

use chrono::NaiveDate;

use crate::domain::action::DivisionAction;
use crate::domain::division::DivisionPortfolio;
use crate::domain::mode::Mode;

/// The immutable end-of-day snapshot emitted by the engine, one per
/// simulated trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyLedgerRecord {
    pub date: NaiveDate,
    pub close: f64,
    pub prev_close: f64,
    /// Day-over-day change, percent.
    pub change_rate: f64,
    pub mode: Mode,
    pub actions: Vec<DivisionAction>,
    /// Post-trade snapshot of every division.
    pub divisions: Vec<DivisionPortfolio>,
    pub total_buy_quantity: i64,
    pub total_sell_quantity: i64,
    /// |buys - sells| for the day.
    pub net_quantity: i64,
    pub daily_realized_pl: f64,
    pub total_cash: f64,
    pub total_holdings: i64,
    pub total_value: f64,
    pub total_assets: f64,
    /// Cumulative return on initial capital, percent.
    pub return_rate: f64,
    pub rebalanced: bool,
    /// Pooled total redistributed on a rebalance day.
    pub rebalance_amount: Option<f64>,
}

impl DailyLedgerRecord {
    /// Direction of the day's net flow.
    pub fn net_direction(&self) -> &'static str {
        if self.total_buy_quantity > self.total_sell_quantity {
            "NET_BUY"
        } else if self.total_sell_quantity > self.total_buy_quantity {
            "NET_SELL"
        } else {
            "HOLD"
        }
    }
}
