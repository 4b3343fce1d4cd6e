//! Paper orders
//!
//! - Entry/exit rules from signal crossovers and ERI bands
//! - Bounded per-asset and global order histories

pub mod book;
pub mod generator;

pub use book::{append_asset_orders, merge_global, OrderBook, ASSET_ORDERS_FILE, GLOBAL_ORDERS_FILE};
pub use generator::{generate_orders, Order, OrderType, Side};
