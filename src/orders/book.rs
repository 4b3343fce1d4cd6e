//! Order histories
//!
//! Per-asset history in time order and a global cross-asset feed sorted
//! newest first. Both are bounded and persisted atomically.

use std::path::{Path, PathBuf};

use crate::config::OrderConfig;
use crate::core::CviResult;
use crate::store::json::{read_or_default, write_json};

use super::generator::Order;

pub const ASSET_ORDERS_FILE: &str = "orders.json";
pub const GLOBAL_ORDERS_FILE: &str = "orders_global.json";

/// Append new orders in time order, skipping duplicates, keeping the newest `cap`.
///
/// Returns the orders that were not already in the history.
pub fn append_asset_orders(history: &mut Vec<Order>, new: &[Order], cap: usize) -> Vec<Order> {
    let mut added = Vec::new();
    for order in new {
        if history.iter().any(|o| o.key() == order.key()) {
            continue;
        }
        history.push(order.clone());
        added.push(order.clone());
    }
    history.sort_by_key(|o| o.t);

    let cap = cap.max(1);
    if history.len() > cap {
        let excess = history.len() - cap;
        history.drain(..excess);
    }
    added
}

/// Merge into the global feed: newest first, duplicates dropped, at most `cap`
pub fn merge_global(feed: &mut Vec<Order>, new: &[Order], cap: usize) {
    for order in new {
        if !feed.iter().any(|o| o.key() == order.key()) {
            feed.push(order.clone());
        }
    }
    // Stable, so equal timestamps keep insertion order
    feed.sort_by(|a, b| b.t.cmp(&a.t));
    feed.truncate(cap.max(1));
}

/// File-backed order histories under one output root
#[derive(Debug, Clone)]
pub struct OrderBook {
    root: PathBuf,
    cfg: OrderConfig,
}

impl OrderBook {
    pub fn new(root: impl Into<PathBuf>, cfg: &OrderConfig) -> Self {
        Self {
            root: root.into(),
            cfg: cfg.clone(),
        }
    }

    pub fn asset_path(&self, symbol: &str) -> PathBuf {
        self.root.join(symbol).join(ASSET_ORDERS_FILE)
    }

    pub fn global_path(&self) -> PathBuf {
        self.root.join(GLOBAL_ORDERS_FILE)
    }

    pub fn read_asset(&self, symbol: &str) -> Vec<Order> {
        read_or_default(&self.asset_path(symbol))
    }

    pub fn read_global(&self) -> Vec<Order> {
        read_or_default(&self.global_path())
    }

    /// Record `orders` for `symbol` in both histories.
    ///
    /// The per-asset file is rewritten every run so it always exists.
    pub fn record(&self, symbol: &str, orders: &[Order]) -> CviResult<usize> {
        let mut history = self.read_asset(symbol);
        let added = append_asset_orders(&mut history, orders, self.cfg.per_asset_cap);
        write_json(&self.asset_path(symbol), &history)?;

        // Only orders new to this asset reach the global feed
        if !added.is_empty() || !self.global_path().exists() {
            let mut feed = self.read_global();
            merge_global(&mut feed, &added, self.cfg.global_cap);
            write_json(&self.global_path(), &feed)?;
        }

        if !added.is_empty() {
            tracing::info!(symbol, added = added.len(), "Paper orders recorded");
        }
        Ok(added.len())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::generator::{OrderType, Side};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempfile::tempdir;

    fn t(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    fn order(symbol: &str, h: i64) -> Order {
        Order {
            t: t(h),
            symbol: symbol.to_string(),
            order_type: OrderType::Entry,
            side: Side::Buy,
            reason: "test".into(),
            qty: 1.0,
            notional: 100.0,
            price: 100.0,
            eri: 3.0,
            risk_budget: 1000.0,
            horizon_days: 7.0,
        }
    }

    #[test]
    fn test_asset_history_bounded_and_deduped() {
        let mut history = Vec::new();
        for h in 0..6 {
            append_asset_orders(&mut history, &[order("BTC", h)], 4);
        }
        assert!(append_asset_orders(&mut history, &[order("BTC", 5)], 4).is_empty());

        assert_eq!(history.len(), 4);
        assert_eq!(history.first().unwrap().t, t(2));
        assert_eq!(history.last().unwrap().t, t(5));
    }

    #[test]
    fn test_global_feed_sorted_descending() {
        let mut feed = Vec::new();
        merge_global(&mut feed, &[order("BTC", 1), order("BTC", 5)], 3);
        merge_global(&mut feed, &[order("ETH", 3), order("ETH", 7)], 3);

        let times: Vec<_> = feed.iter().map(|o| o.t).collect();
        assert_eq!(times, vec![t(7), t(5), t(3)]);
    }

    #[test]
    fn test_record_persists_both() {
        let dir = tempdir().unwrap();
        let book = OrderBook::new(dir.path(), &OrderConfig::default());

        assert_eq!(book.record("BTC", &[order("BTC", 1)]).unwrap(), 1);
        assert_eq!(book.record("ETH", &[order("ETH", 2)]).unwrap(), 1);
        assert_eq!(book.record("ETH", &[]).unwrap(), 0);

        assert_eq!(book.read_asset("BTC").len(), 1);
        assert_eq!(book.read_asset("ETH").len(), 1);
        let global = book.read_global();
        assert_eq!(global.len(), 2);
        assert_eq!(global[0].symbol, "ETH");
    }

    #[test]
    fn test_known_orders_stay_out_of_global_feed() {
        let dir = tempdir().unwrap();
        let book = OrderBook::new(dir.path(), &OrderConfig::default());
        book.record("BTC", &[order("BTC", 1)]).unwrap();

        // Feed rebuilt from scratch; a rerun must not resurrect BTC t1
        std::fs::remove_file(book.global_path()).unwrap();
        assert_eq!(book.record("BTC", &[order("BTC", 1), order("BTC", 2)]).unwrap(), 1);

        let global = book.read_global();
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].t, t(2));
        assert_eq!(book.read_asset("BTC").len(), 2);
    }

    #[test]
    fn test_record_creates_empty_files() {
        let dir = tempdir().unwrap();
        let book = OrderBook::new(dir.path(), &OrderConfig::default());
        book.record("LINK", &[]).unwrap();

        assert!(book.asset_path("LINK").exists());
        assert!(book.global_path().exists());
        assert!(book.read_global().is_empty());
    }
}
