//! Run-level statistics over the daily ledger.

use crate::domain::ledger::DailyLedgerRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    pub days: usize,
    pub total_trades: usize,
    pub buy_trades: usize,
    pub sell_trades: usize,
    /// Fraction of sell-type trades closed at a profit, percent.
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub total_commission: f64,
    pub total_profit: f64,
    /// Final cumulative return, percent.
    pub final_return: f64,
    /// Worst peak-to-trough decline of total assets, as a fraction.
    pub max_drawdown: f64,
    pub rebalances: usize,
}

impl SimulationSummary {
    pub fn compute(records: &[DailyLedgerRecord]) -> Self {
        let mut buy_trades = 0usize;
        let mut sell_trades = 0usize;
        let mut wins = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut total_commission = 0.0_f64;
        let mut total_profit = 0.0_f64;

        for record in records {
            for action in &record.actions {
                total_commission += action.commission();
                if action.is_buy() {
                    buy_trades += 1;
                } else if action.is_sell_kind() {
                    sell_trades += 1;
                    let profit = action.profit();
                    total_profit += profit;
                    if profit > 0.0 {
                        wins += 1;
                        total_wins += profit;
                    } else {
                        total_losses += profit.abs();
                    }
                }
            }
        }

        let losses = sell_trades - wins;
        let win_rate = if sell_trades > 0 {
            wins as f64 / sell_trades as f64 * 100.0
        } else {
            0.0
        };
        let avg_win = if wins > 0 { total_wins / wins as f64 } else { 0.0 };
        let avg_loss = if losses > 0 {
            total_losses / losses as f64
        } else {
            0.0
        };

        let mut peak = f64::MIN;
        let mut max_drawdown = 0.0_f64;
        for record in records {
            if record.total_assets > peak {
                peak = record.total_assets;
            } else if peak > 0.0 {
                let drawdown = (peak - record.total_assets) / peak;
                if drawdown > max_drawdown {
                    max_drawdown = drawdown;
                }
            }
        }

        SimulationSummary {
            days: records.len(),
            total_trades: buy_trades + sell_trades,
            buy_trades,
            sell_trades,
            win_rate,
            avg_win,
            avg_loss,
            total_commission,
            total_profit,
            final_return: records.last().map(|r| r.return_rate).unwrap_or(0.0),
            max_drawdown,
            rebalances: records.iter().filter(|r| r.rebalanced).count(),
        }
    }
}
