//! Paper order rules
//!
//! - buy/entry: EMA crossed up and ERI at or below its trailing median
//! - sell/exit: EMA crossed down and ERI at or above its trailing p90

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::risk::RiskAssessment;
use crate::signals::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// Simulated order; never sent anywhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub t: DateTime<Utc>,
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: Side,
    pub reason: String,
    pub qty: f64,
    pub notional: f64,
    pub price: f64,
    pub eri: f64,
    pub risk_budget: f64,
    pub horizon_days: f64,
}

impl Order {
    /// Identity used to drop duplicates across reruns
    pub fn key(&self) -> (DateTime<Utc>, &str, Side) {
        (self.t, self.symbol.as_str(), self.side)
    }
}

/// Orders triggered by the current signal and risk state
pub fn generate_orders(symbol: &str, signal: &Signal, risk: &RiskAssessment) -> Vec<Order> {
    let mut orders = Vec::new();

    let rule = if signal.crossed_up && risk.eri <= risk.percentiles.p50 {
        Some((
            OrderType::Entry,
            Side::Buy,
            format!("EMA cross up; ERI {:.3} <= p50 {:.3}", risk.eri, risk.percentiles.p50),
        ))
    } else if signal.crossed_down && risk.eri >= risk.percentiles.p90 {
        Some((
            OrderType::Exit,
            Side::Sell,
            format!("EMA cross down; ERI {:.3} >= p90 {:.3}", risk.eri, risk.percentiles.p90),
        ))
    } else {
        None
    };

    if let Some((order_type, side, reason)) = rule {
        match risk.size_hint {
            Some(size) => orders.push(Order {
                t: signal.ts,
                symbol: symbol.to_string(),
                order_type,
                side,
                reason,
                qty: size.qty,
                notional: size.notional,
                price: risk.spot,
                eri: risk.eri,
                risk_budget: risk.risk_budget,
                horizon_days: risk.horizon_days,
            }),
            None => tracing::warn!(symbol, ?side, "Order rule fired without a position size"),
        }
    }

    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScorerKind;
    use crate::risk::{position_size, EriEma, EriPercentiles};
    use crate::signals::Recommendation;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap()
    }

    fn signal(up: bool, down: bool) -> Signal {
        Signal {
            ts: ts(),
            recommendation: Recommendation::Hold,
            strength: 0.5,
            size_hint: 0.75,
            reason: String::new(),
            reasons: vec![],
            last_iv: 0.6,
            ema_fast: 0.6,
            ema_slow: 0.6,
            crossed_up: up,
            crossed_down: down,
            p10: 0.4,
            p90: 0.8,
        }
    }

    fn risk(eri: f64) -> RiskAssessment {
        RiskAssessment {
            t: ts(),
            spot: 100.0,
            iv: 0.6,
            sigma_daily: 0.6 / 365f64.sqrt(),
            eri,
            scorer: ScorerKind::SigmaDaily,
            percentiles: EriPercentiles {
                p10: 2.0,
                p50: 3.0,
                p90: 4.0,
            },
            ema: EriEma { fast: 3.0, slow: 3.0 },
            risk_budget: 1000.0,
            horizon_days: 7.0,
            size_hint: position_size(100.0, 0.6, 1000.0, 7.0),
        }
    }

    #[test]
    fn test_entry_rule() {
        let orders = generate_orders("BTC", &signal(true, false), &risk(3.0));
        assert_eq!(orders.len(), 1);

        let o = &orders[0];
        assert_eq!((o.order_type, o.side), (OrderType::Entry, Side::Buy));
        let size = position_size(100.0, 0.6, 1000.0, 7.0).unwrap();
        assert!((o.qty - 1000.0 / size.expected_move).abs() < 1e-12);
        assert_eq!(o.t, ts());

        assert!(generate_orders("BTC", &signal(true, false), &risk(3.1)).is_empty());
    }

    #[test]
    fn test_exit_rule() {
        let orders = generate_orders("ETH", &signal(false, true), &risk(4.0));
        assert_eq!(orders.len(), 1);
        assert_eq!((orders[0].order_type, orders[0].side), (OrderType::Exit, Side::Sell));

        assert!(generate_orders("ETH", &signal(false, true), &risk(3.9)).is_empty());
    }

    #[test]
    fn test_no_crossover_no_order() {
        assert!(generate_orders("BTC", &signal(false, false), &risk(1.0)).is_empty());
        assert!(generate_orders("BTC", &signal(false, false), &risk(9.0)).is_empty());
    }

    #[test]
    fn test_missing_size_skips_order() {
        let mut r = risk(1.0);
        r.size_hint = None;
        assert!(generate_orders("BTC", &signal(true, false), &r).is_empty());
    }

    #[test]
    fn test_order_serializes_type_field() {
        let orders = generate_orders("BTC", &signal(true, false), &risk(1.0));
        let json = serde_json::to_value(&orders[0]).unwrap();
        assert_eq!(json["type"], "entry");
        assert_eq!(json["side"], "buy");
    }
}
