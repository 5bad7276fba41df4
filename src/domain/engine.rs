//! Daily simulation engine.
//!
//! Each day runs through fixed stages: mode sync, valuation update,
//! rebalance check, per-division signal evaluation, netting, execution, and
//! ledger aggregation. All run state is threaded explicitly through
//! [`EngineState`]; the engine keeps nothing behind the caller's back, so a
//! replay of the same inputs produces an identical ledger.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::domain::action::DivisionAction;
use crate::domain::calendar::trading_days_between;
use crate::domain::division::{self, DivisionPortfolio, DivisionState};
use crate::domain::error::DivtraderError;
use crate::domain::fees;
use crate::domain::ledger::DailyLedgerRecord;
use crate::domain::mode::{ConfiguredMode, Mode, ModeParams};
use crate::domain::series::{self, ClosePoint};

/// Minimum division cash before a buy is even considered.
const MIN_BUY_CASH: f64 = 100.0;

/// Immutable parameters for one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub initial_capital: f64,
    pub divisions: u32,
    pub mode: ConfiguredMode,
    /// Rebalance every this many trading days from simulation start.
    pub rebalance_period: u32,
}

impl SimConfig {
    /// Fail fast on parameters that make a run meaningless.
    pub fn validate(&self) -> Result<(), DivtraderError> {
        if self.initial_capital <= 0.0 {
            return Err(DivtraderError::ConfigInvalid {
                section: "simulation".to_string(),
                key: "initial_capital".to_string(),
                reason: "initial_capital must be positive".to_string(),
            });
        }
        if self.divisions < 1 {
            return Err(DivtraderError::ConfigInvalid {
                section: "simulation".to_string(),
                key: "divisions".to_string(),
                reason: "divisions must be at least 1".to_string(),
            });
        }
        if self.rebalance_period < 1 {
            return Err(DivtraderError::ConfigInvalid {
                section: "simulation".to_string(),
                key: "rebalance_period".to_string(),
                reason: "rebalance_period must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// All state that persists from one day to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub divisions: Vec<DivisionPortfolio>,
    /// 0-based round-robin pointer selecting the division allowed to buy.
    pub next_division: u32,
    pub active_mode: Mode,
}

impl EngineState {
    pub fn new(config: &SimConfig) -> Self {
        EngineState {
            divisions: division::initialize_divisions(config.initial_capital, config.divisions),
            next_division: 0,
            active_mode: match config.mode {
                ConfiguredMode::Aggressive => Mode::Aggressive,
                ConfiguredMode::Safe | ConfiguredMode::Auto => Mode::Safe,
            },
        }
    }

    fn sync_mode(
        &mut self,
        config: &SimConfig,
        date: NaiveDate,
        mode_map: Option<&BTreeMap<NaiveDate, Mode>>,
    ) {
        match config.mode {
            ConfiguredMode::Safe => self.active_mode = Mode::Safe,
            ConfiguredMode::Aggressive => self.active_mode = Mode::Aggressive,
            // A date with no entry keeps the last mode in effect.
            ConfiguredMode::Auto => {
                if let Some(mode) = mode_map.and_then(|map| map.get(&date)) {
                    self.active_mode = *mode;
                }
            }
        }
    }
}

/// Propose a dip buy for an empty division. Eligibility (round-robin
/// pointer, one buy per day) is the caller's concern.
fn check_buy_signal(
    division: &DivisionPortfolio,
    today_close: f64,
    prev_close: f64,
    params: &ModeParams,
) -> Option<DivisionAction> {
    let DivisionState::Empty { cash } = &division.state else {
        return None;
    };
    let cash = *cash;

    if cash < MIN_BUY_CASH {
        return None;
    }

    let change = series::change_rate(today_close, prev_close);
    if change >= params.buy_target {
        return None;
    }

    // Order-book view only; the trigger is the change-rate test above.
    let limit_price = prev_close * (1.0 + params.buy_target);

    // LOC orders fill at the close.
    let mut quantity = (cash / today_close).floor() as i64;
    if quantity == 0 {
        return None;
    }

    let mut amount = quantity as f64 * today_close;
    let mut commission = fees::commission_for(amount);
    if cash < amount + commission {
        // Shave a share so the fill plus commission stays within cash.
        quantity -= 1;
        if quantity == 0 {
            return None;
        }
        amount = quantity as f64 * today_close;
        commission = fees::commission_for(amount);
        if cash < amount + commission {
            return None;
        }
    }

    Some(DivisionAction::Buy {
        division: division.division,
        quantity,
        price: today_close,
        limit_price,
        amount,
        commission,
        reason: format!(
            "buy: change {:.2}% < target {:.2}%",
            change * 100.0,
            params.buy_target * 100.0
        ),
    })
}

/// Propose an exit for a holding division. Stop-loss on holding-period
/// expiry takes priority over the profit target; the target sell fills at
/// the limit price, so upside past the target is not captured.
fn check_sell_signal(
    division: &DivisionPortfolio,
    today_close: f64,
    date: NaiveDate,
    params: &ModeParams,
) -> Option<DivisionAction> {
    let DivisionState::Holding {
        holdings,
        avg_price,
        buy_date,
        total_cost,
        ..
    } = &division.state
    else {
        return None;
    };
    let (holdings, avg_price, total_cost) = (*holdings, *avg_price, *total_cost);
    if holdings == 0 {
        return None;
    }

    let days_held = trading_days_between(*buy_date, date);

    if days_held >= params.holding_days {
        let amount = holdings as f64 * today_close;
        let commission = fees::commission_for(amount);
        let profit = amount - total_cost - commission;
        return Some(DivisionAction::StopLoss {
            division: division.division,
            quantity: holdings,
            price: today_close,
            limit_price: today_close,
            amount,
            commission,
            profit,
            profit_rate: profit / total_cost * 100.0,
            trading_days_held: days_held,
            reason: format!(
                "stop loss: held {} trading days >= {} day limit (market {:.2})",
                days_held, params.holding_days, today_close
            ),
        });
    }

    let limit_price = avg_price * (1.0 + params.sell_target);
    if today_close >= limit_price {
        let amount = holdings as f64 * limit_price;
        let commission = fees::commission_for(amount);
        let profit = amount - total_cost - commission;
        return Some(DivisionAction::Sell {
            division: division.division,
            quantity: holdings,
            price: limit_price,
            limit_price,
            amount,
            commission,
            profit,
            profit_rate: profit / total_cost * 100.0,
            trading_days_held: days_held,
            reason: format!(
                "LOC sell: close {:.2} >= limit {:.2} (+{:.1}%)",
                today_close,
                limit_price,
                params.sell_target * 100.0
            ),
        });
    }

    None
}

/// Result of netting one division's raw buy and sell signals.
struct NetOutcome {
    action: Option<DivisionAction>,
    execute_buy: bool,
    execute_sell: bool,
}

/// Offset opposite-direction signals on the same division.
///
/// A raw buy can only come from an empty division and a raw sell from a
/// holding one, so both signals are never live at once and only the
/// single-signal arms run. The quantity-offset arms are kept for a
/// partial-fill order model where a division could top up and unwind on the
/// same day.
fn net_signals(buy: Option<DivisionAction>, sell: Option<DivisionAction>) -> NetOutcome {
    match (buy, sell) {
        (None, None) => NetOutcome {
            action: None,
            execute_buy: false,
            execute_sell: false,
        },
        (Some(buy), None) => NetOutcome {
            action: Some(buy),
            execute_buy: true,
            execute_sell: false,
        },
        (None, Some(sell)) => NetOutcome {
            action: Some(sell),
            execute_buy: false,
            execute_sell: true,
        },
        (Some(buy), Some(sell)) => net_both(buy, sell),
    }
}

fn net_both(buy: DivisionAction, sell: DivisionAction) -> NetOutcome {
    let (division, buy_qty, buy_price, buy_limit) = match &buy {
        DivisionAction::Buy {
            division,
            quantity,
            price,
            limit_price,
            ..
        } => (*division, *quantity, *price, *limit_price),
        _ => {
            return NetOutcome {
                action: Some(buy),
                execute_buy: true,
                execute_sell: false,
            };
        }
    };
    let (sell_qty, sell_price, sell_profit, sell_profit_rate, sell_days, stop_loss) = match &sell {
        DivisionAction::Sell {
            quantity,
            price,
            profit,
            profit_rate,
            trading_days_held,
            ..
        } => (*quantity, *price, *profit, *profit_rate, *trading_days_held, false),
        DivisionAction::StopLoss {
            quantity,
            price,
            profit,
            profit_rate,
            trading_days_held,
            ..
        } => (*quantity, *price, *profit, *profit_rate, *trading_days_held, true),
        _ => {
            return NetOutcome {
                action: Some(buy),
                execute_buy: true,
                execute_sell: false,
            };
        }
    };

    if buy_qty > sell_qty {
        let net_qty = buy_qty - sell_qty;
        let amount = net_qty as f64 * buy_price;
        let commission = fees::commission_for(amount);
        NetOutcome {
            action: Some(DivisionAction::Buy {
                division,
                quantity: net_qty,
                price: buy_price,
                limit_price: buy_limit,
                amount,
                commission,
                reason: format!("netted: buy {buy_qty} - sell {sell_qty} = net buy {net_qty}"),
            }),
            execute_buy: true,
            // The old position is closed first, then the net quantity bought.
            execute_sell: true,
        }
    } else if sell_qty > buy_qty {
        let net_qty = sell_qty - buy_qty;
        let amount = net_qty as f64 * sell_price;
        let commission = fees::commission_for(amount);
        // Profit prorated over the shares actually sold.
        let profit = sell_profit / sell_qty as f64 * net_qty as f64 - commission;
        let profit_rate = sell_profit_rate * net_qty as f64 / sell_qty as f64;
        let reason = format!("netted: sell {sell_qty} - buy {buy_qty} = net sell {net_qty}");
        let action = if stop_loss {
            DivisionAction::StopLoss {
                division,
                quantity: net_qty,
                price: sell_price,
                limit_price: sell_price,
                amount,
                commission,
                profit,
                profit_rate,
                trading_days_held: sell_days,
                reason,
            }
        } else {
            DivisionAction::Sell {
                division,
                quantity: net_qty,
                price: sell_price,
                limit_price: sell_price,
                amount,
                commission,
                profit,
                profit_rate,
                trading_days_held: sell_days,
                reason,
            }
        };
        NetOutcome {
            action: Some(action),
            execute_buy: false,
            execute_sell: true,
        }
    } else {
        NetOutcome {
            action: Some(DivisionAction::Hold {
                division,
                reason: format!("netted: buy {buy_qty} = sell {sell_qty}, no trade"),
            }),
            execute_buy: false,
            execute_sell: false,
        }
    }
}

fn execute_buy(division: &mut DivisionPortfolio, action: &DivisionAction, date: NaiveDate) {
    let DivisionAction::Buy {
        quantity,
        price,
        amount,
        commission,
        ..
    } = action
    else {
        return;
    };
    division.state = DivisionState::Holding {
        cash: division.cash() - amount - commission,
        holdings: *quantity,
        avg_price: *price,
        buy_date: date,
        total_cost: amount + commission,
    };
}

fn execute_sell(division: &mut DivisionPortfolio, action: &DivisionAction) {
    let (amount, commission) = match action {
        DivisionAction::Sell {
            amount, commission, ..
        }
        | DivisionAction::StopLoss {
            amount, commission, ..
        } => (*amount, *commission),
        _ => return,
    };
    division.state = DivisionState::Empty {
        cash: division.cash() + amount - commission,
    };
}

/// Run one day through the engine stages and emit its ledger record.
pub fn process_day(
    mut state: EngineState,
    config: &SimConfig,
    date: NaiveDate,
    today_close: f64,
    prev_close: f64,
    day_index: usize,
    mode_map: Option<&BTreeMap<NaiveDate, Mode>>,
) -> (EngineState, DailyLedgerRecord) {
    state.sync_mode(config, date, mode_map);
    let params = state.active_mode.params();

    division::update_valuations(&mut state.divisions, today_close, prev_close, date, &params);

    let due = day_index > 0 && day_index % config.rebalance_period as usize == 0;
    let rebalance_amount = if due {
        let pool = division::rebalance_divisions(&mut state.divisions, today_close);
        division::update_valuations(&mut state.divisions, today_close, prev_close, date, &params);
        Some(pool)
    } else {
        None
    };

    let mut actions = Vec::new();
    let mut total_buy_quantity = 0i64;
    let mut total_sell_quantity = 0i64;
    let mut daily_realized_pl = 0.0;
    let mut bought_today = false;

    for i in 0..state.divisions.len() {
        let eligible = i as u32 == state.next_division && !bought_today;

        let sell_signal = check_sell_signal(&state.divisions[i], today_close, date, &params);
        let buy_signal = if eligible {
            check_buy_signal(&state.divisions[i], today_close, prev_close, &params)
        } else {
            None
        };

        let outcome = net_signals(buy_signal, sell_signal.clone());
        let Some(action) = outcome.action else {
            continue;
        };

        if outcome.execute_buy && outcome.execute_sell {
            // Net buy against an open position: unwind, then re-enter.
            if let Some(sell) = &sell_signal {
                execute_sell(&mut state.divisions[i], sell);
                total_sell_quantity += sell.quantity();
                daily_realized_pl += sell.profit();
            }
            execute_buy(&mut state.divisions[i], &action, date);
            total_buy_quantity += action.quantity();
            bought_today = true;
            state.next_division = (state.next_division + 1) % config.divisions;
        } else if outcome.execute_sell {
            total_sell_quantity += action.quantity();
            daily_realized_pl += action.profit();
            execute_sell(&mut state.divisions[i], &action);
        } else if outcome.execute_buy {
            total_buy_quantity += action.quantity();
            execute_buy(&mut state.divisions[i], &action, date);
            bought_today = true;
            state.next_division = (state.next_division + 1) % config.divisions;
        }

        actions.push(action);
    }

    // Refresh so the snapshot reflects post-trade state.
    division::update_valuations(&mut state.divisions, today_close, prev_close, date, &params);

    let total_cash: f64 = state.divisions.iter().map(|d| d.cash()).sum();
    let total_holdings: i64 = state.divisions.iter().map(|d| d.holdings()).sum();
    let total_value: f64 = state
        .divisions
        .iter()
        .map(|d| d.market_value(today_close))
        .sum();
    let total_assets = total_cash + total_value;

    let record = DailyLedgerRecord {
        date,
        close: today_close,
        prev_close,
        change_rate: series::change_rate(today_close, prev_close) * 100.0,
        mode: state.active_mode,
        actions,
        divisions: state.divisions.clone(),
        total_buy_quantity,
        total_sell_quantity,
        net_quantity: (total_buy_quantity - total_sell_quantity).abs(),
        daily_realized_pl,
        total_cash,
        total_holdings,
        total_value,
        total_assets,
        return_rate: (total_assets - config.initial_capital) / config.initial_capital * 100.0,
        rebalanced: rebalance_amount.is_some(),
        rebalance_amount,
    };

    (state, record)
}

/// Replay the whole series. A deterministic fold over the input: day `i+1`
/// depends only on day `i`'s post-trade state.
///
/// Day 0 uses its own close as the previous close, so its change rate is
/// zero. An empty series yields an empty ledger.
pub fn simulate(
    config: &SimConfig,
    series: &[ClosePoint],
    mode_map: Option<&BTreeMap<NaiveDate, Mode>>,
) -> Result<Vec<DailyLedgerRecord>, DivtraderError> {
    config.validate()?;

    let mut records = Vec::with_capacity(series.len());
    let mut state = EngineState::new(config);

    for (day_index, day) in series.iter().enumerate() {
        let prev_close = if day_index > 0 {
            series[day_index - 1].close
        } else {
            day.close
        };
        let (next_state, record) = process_day(
            state,
            config,
            day.date,
            day.close,
            prev_close,
            day_index,
            mode_map,
        );
        state = next_state;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::division::DivisionValuation;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config(capital: f64, divisions: u32, mode: ConfiguredMode) -> SimConfig {
        SimConfig {
            initial_capital: capital,
            divisions,
            mode,
            rebalance_period: 10,
        }
    }

    fn empty_division(division: u32, cash: f64) -> DivisionPortfolio {
        DivisionPortfolio {
            division,
            state: DivisionState::Empty { cash },
            valuation: DivisionValuation::default(),
        }
    }

    fn holding_division(
        division: u32,
        holdings: i64,
        avg_price: f64,
        buy_date: NaiveDate,
    ) -> DivisionPortfolio {
        let amount = holdings as f64 * avg_price;
        DivisionPortfolio {
            division,
            state: DivisionState::Holding {
                cash: 0.0,
                holdings,
                avg_price,
                buy_date,
                total_cost: amount + fees::commission_for(amount),
            },
            valuation: DivisionValuation::default(),
        }
    }

    mod config_validation {
        use super::*;

        #[test]
        fn valid_config_passes() {
            assert!(config(10_000.0, 5, ConfiguredMode::Safe).validate().is_ok());
        }

        #[test]
        fn zero_capital_rejected() {
            let err = config(0.0, 5, ConfiguredMode::Safe).validate();
            assert!(matches!(err, Err(DivtraderError::ConfigInvalid { .. })));
        }

        #[test]
        fn zero_divisions_rejected() {
            assert!(config(10_000.0, 0, ConfiguredMode::Safe).validate().is_err());
        }

        #[test]
        fn zero_rebalance_period_rejected() {
            let mut c = config(10_000.0, 5, ConfiguredMode::Safe);
            c.rebalance_period = 0;
            assert!(c.validate().is_err());
        }

        #[test]
        fn simulate_fails_fast_on_bad_config() {
            let result = simulate(&config(-1.0, 5, ConfiguredMode::Safe), &[], None);
            assert!(result.is_err());
        }
    }

    mod buy_signals {
        use super::*;

        #[test]
        fn dip_triggers_buy() {
            let division = empty_division(1, 10_000.0);
            let params = Mode::Safe.params();
            // 21.00 -> 20.00 is a -4.76% move
            let action = check_buy_signal(&division, 20.0, 21.0, &params);

            let Some(DivisionAction::Buy {
                quantity,
                price,
                limit_price,
                amount,
                ..
            }) = action
            else {
                panic!("expected a buy");
            };
            // floor(10000/20) = 500 would leave nothing for commission
            assert_eq!(quantity, 499);
            assert!((price - 20.0).abs() < f64::EPSILON);
            assert_relative_eq!(limit_price, 21.0 * 0.97, epsilon = 1e-9);
            assert_relative_eq!(amount, 499.0 * 20.0, epsilon = 1e-9);
        }

        #[test]
        fn flat_day_never_buys() {
            let division = empty_division(1, 10_000.0);
            let params = Mode::Safe.params();
            assert!(check_buy_signal(&division, 100.0, 100.0, &params).is_none());
        }

        #[test]
        fn small_dip_below_threshold_skipped() {
            let division = empty_division(1, 10_000.0);
            let params = Mode::Safe.params();
            // -2% is not adverse enough for safe mode
            assert!(check_buy_signal(&division, 98.0, 100.0, &params).is_none());
        }

        #[test]
        fn aggressive_needs_a_deeper_dip() {
            let division = empty_division(1, 10_000.0);
            let params = Mode::Aggressive.params();
            assert!(check_buy_signal(&division, 96.0, 100.0, &params).is_none());
            assert!(check_buy_signal(&division, 94.0, 100.0, &params).is_some());
        }

        #[test]
        fn cash_floor_blocks_buy() {
            let division = empty_division(1, 99.0);
            let params = Mode::Safe.params();
            assert!(check_buy_signal(&division, 20.0, 21.0, &params).is_none());
        }

        #[test]
        fn cash_below_one_share_blocks_buy() {
            let division = empty_division(1, 150.0);
            let params = Mode::Safe.params();
            assert!(check_buy_signal(&division, 200.0, 210.0, &params).is_none());
        }

        #[test]
        fn holding_division_never_buys() {
            let division = holding_division(1, 100, 20.0, date(2024, 1, 15));
            let params = Mode::Safe.params();
            assert!(check_buy_signal(&division, 19.0, 20.0, &params).is_none());
        }

        #[test]
        fn commission_fits_inside_remainder() {
            // 487 shares at 20.5 leaves plenty of slack for commission
            let division = empty_division(1, 10_000.0);
            let params = Mode::Safe.params();
            let action = check_buy_signal(&division, 20.5, 22.0, &params).unwrap();
            assert_eq!(action.quantity(), 487);
        }
    }

    mod sell_signals {
        use super::*;

        #[test]
        fn target_sell_fills_at_limit() {
            let division = holding_division(1, 499, 20.0, date(2024, 1, 15));
            let params = Mode::Safe.params();
            // limit = 20.04; close 20.05 clears it
            let action = check_sell_signal(&division, 20.05, date(2024, 1, 16), &params);

            let Some(DivisionAction::Sell { price, amount, .. }) = action else {
                panic!("expected a target sell");
            };
            assert_relative_eq!(price, 20.04, epsilon = 1e-9);
            assert_relative_eq!(amount, 499.0 * 20.04, epsilon = 1e-9);
        }

        #[test]
        fn below_target_no_sell() {
            let division = holding_division(1, 499, 20.0, date(2024, 1, 15));
            let params = Mode::Safe.params();
            assert!(
                check_sell_signal(&division, 20.03, date(2024, 1, 16), &params).is_none()
            );
        }

        #[test]
        fn stop_loss_fires_on_holding_limit() {
            // Bought Monday 2024-01-01; 7 aggressive trading days end Tuesday 2024-01-09
            let division = holding_division(1, 100, 20.0, date(2024, 1, 1));
            let params = Mode::Aggressive.params();

            assert!(
                check_sell_signal(&division, 18.0, date(2024, 1, 8), &params).is_none(),
                "6 trading days held, no stop yet"
            );

            let action = check_sell_signal(&division, 18.0, date(2024, 1, 9), &params);
            let Some(DivisionAction::StopLoss {
                price,
                profit,
                trading_days_held,
                ..
            }) = action
            else {
                panic!("expected a stop loss");
            };
            assert!((price - 18.0).abs() < f64::EPSILON);
            assert!(profit < 0.0);
            assert_eq!(trading_days_held, 7);
        }

        #[test]
        fn stop_loss_beats_target_when_both_hold() {
            // Past the holding limit AND above the profit target
            let division = holding_division(1, 100, 20.0, date(2024, 1, 1));
            let params = Mode::Aggressive.params();
            let action = check_sell_signal(&division, 21.0, date(2024, 2, 1), &params);
            assert!(matches!(action, Some(DivisionAction::StopLoss { .. })));
        }

        #[test]
        fn empty_division_never_sells() {
            let division = empty_division(1, 1_000.0);
            let params = Mode::Safe.params();
            assert!(check_sell_signal(&division, 100.0, date(2024, 1, 16), &params).is_none());
        }
    }

    mod netting {
        use super::*;

        fn buy_signal(quantity: i64, price: f64) -> DivisionAction {
            let amount = quantity as f64 * price;
            DivisionAction::Buy {
                division: 1,
                quantity,
                price,
                limit_price: price,
                amount,
                commission: fees::commission_for(amount),
                reason: "buy".to_string(),
            }
        }

        fn sell_signal(quantity: i64, price: f64, profit: f64) -> DivisionAction {
            let amount = quantity as f64 * price;
            DivisionAction::Sell {
                division: 1,
                quantity,
                price,
                limit_price: price,
                amount,
                commission: fees::commission_for(amount),
                profit,
                profit_rate: 1.0,
                trading_days_held: 3,
                reason: "sell".to_string(),
            }
        }

        #[test]
        fn buy_only_passes_through() {
            let outcome = net_signals(Some(buy_signal(100, 20.0)), None);
            assert!(outcome.execute_buy);
            assert!(!outcome.execute_sell);
            assert_eq!(outcome.action.unwrap().quantity(), 100);
        }

        #[test]
        fn sell_only_passes_through() {
            let outcome = net_signals(None, Some(sell_signal(100, 20.0, 50.0)));
            assert!(!outcome.execute_buy);
            assert!(outcome.execute_sell);
        }

        #[test]
        fn neither_is_a_no_op() {
            let outcome = net_signals(None, None);
            assert!(outcome.action.is_none());
        }

        #[test]
        fn net_buy_when_buy_exceeds_sell() {
            let outcome = net_signals(
                Some(buy_signal(150, 20.0)),
                Some(sell_signal(100, 20.0, 50.0)),
            );
            assert!(outcome.execute_buy);
            assert!(outcome.execute_sell, "old position closes first");
            let action = outcome.action.unwrap();
            assert!(action.is_buy());
            assert_eq!(action.quantity(), 50);
        }

        #[test]
        fn net_sell_prorates_profit() {
            let outcome = net_signals(
                Some(buy_signal(40, 20.0)),
                Some(sell_signal(100, 20.0, 50.0)),
            );
            assert!(!outcome.execute_buy);
            assert!(outcome.execute_sell);
            let action = outcome.action.unwrap();
            assert!(action.is_sell_kind());
            assert_eq!(action.quantity(), 60);
            // 50/100 per share * 60 shares, minus the net commission
            let expected = 50.0 / 100.0 * 60.0 - fees::commission_for(60.0 * 20.0);
            assert_relative_eq!(action.profit(), expected, epsilon = 1e-9);
        }

        #[test]
        fn equal_quantities_cancel() {
            let outcome = net_signals(
                Some(buy_signal(100, 20.0)),
                Some(sell_signal(100, 20.0, 50.0)),
            );
            assert!(!outcome.execute_buy);
            assert!(!outcome.execute_sell);
            let action = outcome.action.unwrap();
            assert_eq!(action.kind(), "HOLD");
        }

        #[test]
        fn net_sell_keeps_stop_loss_kind() {
            let stop = DivisionAction::StopLoss {
                division: 1,
                quantity: 100,
                price: 18.0,
                limit_price: 18.0,
                amount: 1_800.0,
                commission: fees::commission_for(1_800.0),
                profit: -200.0,
                profit_rate: -10.0,
                trading_days_held: 30,
                reason: "stop".to_string(),
            };
            let outcome = net_signals(Some(buy_signal(40, 18.0)), Some(stop));
            let action = outcome.action.unwrap();
            assert_eq!(action.kind(), "STOP_LOSS");
            assert_eq!(action.quantity(), 60);
        }
    }

    mod day_loop {
        use super::*;

        // Monday..Friday weekday run starting 2024-01-15
        fn week_series(closes: &[f64]) -> Vec<ClosePoint> {
            let start = date(2024, 1, 15);
            let mut out = Vec::new();
            let mut current = start;
            for &close in closes {
                while matches!(
                    chrono::Datelike::weekday(&current),
                    chrono::Weekday::Sat | chrono::Weekday::Sun
                ) {
                    current = current.succ_opt().unwrap();
                }
                out.push(ClosePoint::new(current, close));
                current = current.succ_opt().unwrap();
            }
            out
        }

        #[test]
        fn single_division_dip_buy_and_limit_sell() {
            let config = config(10_000.0, 1, ConfiguredMode::Safe);
            let series = week_series(&[21.0, 20.0, 20.05]);
            let records = simulate(&config, &series, None).unwrap();

            assert_eq!(records.len(), 3);
            assert!(records[0].actions.is_empty(), "day 0 change rate is zero");

            assert_eq!(records[1].actions.len(), 1);
            assert!(records[1].actions[0].is_buy());
            assert_eq!(records[1].total_buy_quantity, 499);
            assert!(records[1].divisions[0].is_holding());

            assert_eq!(records[2].actions.len(), 1);
            let sell = &records[2].actions[0];
            assert_eq!(sell.kind(), "SELL");
            assert_relative_eq!(sell.price(), 20.04, epsilon = 1e-9);
            assert!(records[2].divisions[0].is_empty());
            assert!(records[2].daily_realized_pl > 0.0);
        }

        #[test]
        fn pointer_advances_round_robin() {
            let config = config(10_000.0, 3, ConfiguredMode::Safe);
            // Two separate 4% dips
            let series = week_series(&[100.0, 96.0, 92.0, 92.0]);
            let records = simulate(&config, &series, None).unwrap();

            assert_eq!(records[1].actions.len(), 1);
            assert_eq!(records[1].actions[0].division(), 1);
            assert_eq!(records[2].actions.len(), 1);
            assert_eq!(records[2].actions[0].division(), 2);
            assert!(records[3].actions.is_empty());
        }

        #[test]
        fn one_buy_per_day_even_with_many_empty_divisions() {
            let config = config(10_000.0, 5, ConfiguredMode::Safe);
            let series = week_series(&[100.0, 95.0]);
            let records = simulate(&config, &series, None).unwrap();
            let buys: Vec<_> = records[1].actions.iter().filter(|a| a.is_buy()).collect();
            assert_eq!(buys.len(), 1);
        }

        #[test]
        fn pointer_on_holding_division_blocks_buying() {
            let config = config(10_000.0, 2, ConfiguredMode::Safe);
            // Division 1 buys on day 1; pointer moves to division 2, which
            // buys on day 2; pointer returns to division 1 (still holding),
            // so the dip on day 3 goes unused.
            let series = week_series(&[100.0, 96.0, 92.0, 88.0]);
            let records = simulate(&config, &series, None).unwrap();

            assert_eq!(records[1].actions[0].division(), 1);
            assert_eq!(records[2].actions[0].division(), 2);
            assert!(records[3].actions.is_empty());
        }

        #[test]
        fn rebalance_fires_on_schedule() {
            let mut cfg = config(10_000.0, 2, ConfiguredMode::Safe);
            cfg.rebalance_period = 3;
            let series = week_series(&[100.0; 8]);
            let records = simulate(&cfg, &series, None).unwrap();

            let flags: Vec<bool> = records.iter().map(|r| r.rebalanced).collect();
            assert_eq!(flags, vec![false, false, false, true, false, false, true, false]);
            assert!(records[3].rebalance_amount.is_some());
            assert_relative_eq!(records[3].rebalance_amount.unwrap(), 10_000.0, epsilon = 1e-9);
        }

        #[test]
        fn auto_mode_carries_forward_between_entries() {
            let config = config(10_000.0, 1, ConfiguredMode::Auto);
            let series = week_series(&[100.0, 100.0, 100.0, 100.0]);

            let mut map = BTreeMap::new();
            map.insert(series[1].date, Mode::Aggressive);

            let records = simulate(&config, &series, Some(&map)).unwrap();
            assert_eq!(records[0].mode, Mode::Safe);
            assert_eq!(records[1].mode, Mode::Aggressive);
            assert_eq!(records[2].mode, Mode::Aggressive, "no entry keeps the mode");
            assert_eq!(records[3].mode, Mode::Aggressive);
        }

        #[test]
        fn auto_mode_without_map_stays_safe() {
            let config = config(10_000.0, 1, ConfiguredMode::Auto);
            let series = week_series(&[100.0, 95.0]);
            let records = simulate(&config, &series, None).unwrap();
            assert!(records.iter().all(|r| r.mode == Mode::Safe));
        }

        #[test]
        fn empty_series_yields_empty_ledger() {
            let config = config(10_000.0, 5, ConfiguredMode::Safe);
            let records = simulate(&config, &[], None).unwrap();
            assert!(records.is_empty());
        }

        #[test]
        fn assets_match_cash_plus_holdings_every_day() {
            let config = config(10_000.0, 3, ConfiguredMode::Aggressive);
            let series = week_series(&[100.0, 94.0, 88.0, 90.0, 95.0, 89.0, 92.0, 96.0]);
            let records = simulate(&config, &series, None).unwrap();

            for record in &records {
                let cash: f64 = record.divisions.iter().map(|d| d.cash()).sum();
                let value: f64 = record
                    .divisions
                    .iter()
                    .map(|d| d.holdings() as f64 * record.close)
                    .sum();
                assert_relative_eq!(record.total_assets, cash + value, epsilon = 1e-9);
            }
        }
    }
}
