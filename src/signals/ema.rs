//! Exponential moving averages and crossovers

use serde::{Deserialize, Serialize};

/// EMA with smoothing factor `2 / (period + 1)`, seeded by the first value.
///
/// Output has the same length as the input.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    let k = 2.0 / (period.max(1) as f64 + 1.0);

    let mut out = Vec::with_capacity(values.len());
    let mut prev = first;
    out.push(prev);
    for &v in &values[1..] {
        prev += k * (v - prev);
        out.push(prev);
    }
    out
}

/// Last value of the EMA
pub fn ema_last(values: &[f64], period: usize) -> Option<f64> {
    ema(values, period).last().copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossover {
    pub index: usize,
    pub direction: CrossDirection,
}

/// Fast was at or below slow at `i - 1` and is above it at `i`
pub fn crossed_up(fast: &[f64], slow: &[f64], i: usize) -> bool {
    if i == 0 || i >= fast.len() || i >= slow.len() {
        return false;
    }
    fast[i - 1] <= slow[i - 1] && fast[i] > slow[i]
}

/// Fast was at or above slow at `i - 1` and is below it at `i`
pub fn crossed_down(fast: &[f64], slow: &[f64], i: usize) -> bool {
    if i == 0 || i >= fast.len() || i >= slow.len() {
        return false;
    }
    fast[i - 1] >= slow[i - 1] && fast[i] < slow[i]
}

/// Every crossover in the two series
pub fn crossovers(fast: &[f64], slow: &[f64]) -> Vec<Crossover> {
    let n = fast.len().min(slow.len());
    (1..n)
        .filter_map(|i| {
            if crossed_up(fast, slow, i) {
                Some(Crossover {
                    index: i,
                    direction: CrossDirection::Up,
                })
            } else if crossed_down(fast, slow, i) {
                Some(Crossover {
                    index: i,
                    direction: CrossDirection::Down,
                })
            } else {
                None
            }
        })
        .collect()
}
