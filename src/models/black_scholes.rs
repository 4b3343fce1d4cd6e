//! Black-Scholes Model
//!
//! Provides:
//! - European option pricing
//! - Vega (dV/dσ, per unit of vol)
//! - Implied volatility solver (Newton-Raphson with clamped domain)
//!
//! Crypto options carry no dividend yield, so the carry term is the
//! risk-free rate only.

use std::f64::consts::{PI, SQRT_2};

use statrs::function::erf::erfc;

use crate::core::{OptionType, MAX_IV, MIN_IV};

/// Newton-Raphson settings for the implied vol solver
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// Absolute pricing residual accepted as converged (price units)
    pub tolerance: f64,
    /// Iteration budget
    pub max_iter: usize,
    /// Vega below this aborts the solve
    pub vega_floor: f64,
    /// Volatility domain each iterate is clamped into
    pub min_vol: f64,
    pub max_vol: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            max_iter: 100,
            vega_floor: 1e-8,
            min_vol: MIN_IV,
            max_vol: MAX_IV,
        }
    }
}

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Black-Scholes d1 parameter
pub fn d1(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    ((spot / strike).ln() + (rate + 0.5 * vol * vol) * time) / (vol * time.sqrt())
}

/// Black-Scholes d2 parameter
pub fn d2(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    d1(spot, strike, rate, vol, time) - vol * time.sqrt()
}

/// Discount factor exp(-rT), shared by the pricer and put-call parity
pub fn discount(rate: f64, time: f64) -> f64 {
    (-rate * time).exp()
}

/// Black-Scholes European option price
pub fn price(
    spot: f64,
    strike: f64,
    rate: f64,
    vol: f64,
    time: f64,
    option_type: OptionType,
) -> f64 {
    let df = discount(rate, time);

    if time <= 0.0 {
        return option_type.intrinsic(spot, strike);
    }

    if vol <= 0.0 {
        // Zero vol = discounted intrinsic on the forward
        return df * option_type.intrinsic(spot / df, strike);
    }

    let d1 = d1(spot, strike, rate, vol, time);
    let d2 = d2(spot, strike, rate, vol, time);

    match option_type {
        OptionType::Call => spot * norm_cdf(d1) - strike * df * norm_cdf(d2),
        OptionType::Put => strike * df * norm_cdf(-d2) - spot * norm_cdf(-d1),
    }
}

/// Vega per unit of volatility (same for call and put)
pub fn vega(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> f64 {
    if time <= 0.0 || vol <= 0.0 {
        return 0.0;
    }
    let d1 = d1(spot, strike, rate, vol, time);
    spot * norm_pdf(d1) * time.sqrt()
}

/// Synthetic call price from a put via put-call parity: C = P + S - K·exp(-rT)
pub fn put_to_call(put_price: f64, spot: f64, strike: f64, rate: f64, time: f64) -> f64 {
    put_price + spot - strike * discount(rate, time)
}

/// Implied volatility with the default solver settings.
///
/// Returns `None` on invalid input, vega collapse or non-convergence.
pub fn implied_volatility(
    market_price: f64,
    spot: f64,
    strike: f64,
    time: f64,
    rate: f64,
    is_call: bool,
) -> Option<f64> {
    implied_volatility_with(
        market_price,
        spot,
        strike,
        time,
        rate,
        is_call,
        &SolverConfig::default(),
    )
}

/// Implied volatility via Newton-Raphson on the call formula.
///
/// Puts are converted to their synthetic call price first, using the same
/// discount factor as the pricer.
pub fn implied_volatility_with(
    market_price: f64,
    spot: f64,
    strike: f64,
    time: f64,
    rate: f64,
    is_call: bool,
    cfg: &SolverConfig,
) -> Option<f64> {
    let inputs = [market_price, spot, strike, time, rate];
    if inputs.iter().any(|x| !x.is_finite()) {
        return None;
    }
    if market_price <= 0.0 || spot <= 0.0 || strike <= 0.0 || time <= 0.0 {
        return None;
    }

    let call_price = if is_call {
        market_price
    } else {
        put_to_call(market_price, spot, strike, rate, time)
    };

    // No-arbitrage bounds for a call: intrinsic on the forward < C < S
    let df = discount(rate, time);
    let lower = (spot - strike * df).max(0.0);
    if call_price <= lower || call_price >= spot {
        return None;
    }

    let mut vol =
        initial_guess(call_price, spot, strike, rate, time).clamp(cfg.min_vol, cfg.max_vol);

    for _ in 0..cfg.max_iter {
        let diff = price(spot, strike, rate, vol, time, OptionType::Call) - call_price;

        if diff.abs() < cfg.tolerance {
            return Some(vol);
        }

        let v = vega(spot, strike, rate, vol, time);
        if !(v > cfg.vega_floor) {
            return None;
        }

        vol = (vol - diff / v).clamp(cfg.min_vol, cfg.max_vol);
    }

    None
}

/// Starting point for Newton.
///
/// Uses the inflection point sqrt(2|ln(F/K)|/T) away from the money, which
/// gives monotone convergence, and the Brenner-Subrahmanyam ATM approximation
/// near the money where the inflection point collapses to zero.
fn initial_guess(call_price: f64, spot: f64, strike: f64, rate: f64, time: f64) -> f64 {
    let log_fk = (spot / strike).ln() + rate * time;
    let inflection = (2.0 * log_fk.abs() / time).sqrt();
    if inflection > 0.05 {
        inflection
    } else {
        call_price / (0.4 * spot * time.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_norm_cdf() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-10);
        assert!((norm_cdf(1.96) - 0.975).abs() < 0.001);
        assert!((norm_cdf(-1.96) - 0.025).abs() < 0.001);
        assert!((norm_cdf(1.0) - 0.841_344_746).abs() < 1e-7);
    }

    #[test]
    fn test_bs_price() {
        // ATM call, 20% vol, 1 year, 5% rate
        let call_price = price(100.0, 100.0, 0.05, 0.20, 1.0, OptionType::Call);

        // Should be around 10.45 for these parameters
        assert!(call_price > 10.0 && call_price < 11.0);

        // Put-call parity check
        let put_price = price(100.0, 100.0, 0.05, 0.20, 1.0, OptionType::Put);
        let parity = call_price - put_price - (100.0 - 100.0 * discount(0.05, 1.0));
        assert!(parity.abs() < 1e-10);
    }

    #[test]
    fn test_vega_matches_finite_difference() {
        let h = 1e-5;
        let up = price(100.0, 105.0, 0.01, 0.60 + h, 0.25, OptionType::Call);
        let dn = price(100.0, 105.0, 0.01, 0.60 - h, 0.25, OptionType::Call);
        let fd = (up - dn) / (2.0 * h);
        assert!((vega(100.0, 105.0, 0.01, 0.60, 0.25) - fd).abs() < 1e-4);
    }

    #[test]
    fn test_implied_vol() {
        let market_price = price(100.0, 100.0, 0.05, 0.25, 0.5, OptionType::Call);
        let iv = implied_volatility(market_price, 100.0, 100.0, 0.5, 0.05, true).unwrap();

        assert!((iv - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_iv_put_via_parity() {
        // OTM put
        let market_price = price(100.0, 90.0, 0.03, 0.80, 0.1, OptionType::Put);
        let iv = implied_volatility(market_price, 100.0, 90.0, 0.1, 0.03, false).unwrap();

        assert!((iv - 0.80).abs() < 1e-3);
    }

    #[test]
    fn test_iv_rejects_invalid_inputs() {
        assert_eq!(implied_volatility(0.0, 100.0, 100.0, 0.5, 0.0, true), None);
        assert_eq!(implied_volatility(5.0, 100.0, 100.0, 0.0, 0.0, true), None);
        assert_eq!(implied_volatility(f64::NAN, 100.0, 100.0, 0.5, 0.0, true), None);
        // Above the spot: no volatility reproduces it
        assert_eq!(implied_volatility(150.0, 100.0, 100.0, 0.5, 0.0, true), None);
        // Below intrinsic
        assert_eq!(implied_volatility(1.0, 100.0, 80.0, 0.5, 0.0, true), None);
    }

    #[test]
    fn test_iv_vega_collapse_returns_none() {
        // Far OTM, tiny time: price barely above zero, vega vanishes
        let cfg = SolverConfig {
            vega_floor: 1e-3,
            ..SolverConfig::default()
        };
        let iv = implied_volatility_with(1e-9, 100.0, 400.0, 0.01, 0.0, true, &cfg);
        assert_eq!(iv, None);
    }

    proptest! {
        #[test]
        fn prop_round_trip_recovers_vol(
            spot in 50.0f64..5000.0,
            moneyness in 0.8f64..1.2,
            time in 0.05f64..2.0,
            rate in 0.0f64..0.05,
            sigma in 0.05f64..2.0,
            is_call in any::<bool>(),
        ) {
            let strike = spot * moneyness;
            // Only meaningful when the price is sensitive to vol
            prop_assume!(vega(spot, strike, rate, sigma, time) > 1.0);

            let option_type = if is_call { OptionType::Call } else { OptionType::Put };
            let p = price(spot, strike, rate, sigma, time, option_type);
            let iv = implied_volatility(p, spot, strike, time, rate, is_call);

            prop_assert!(iv.is_some());
            let iv = iv.unwrap();
            prop_assert!(iv.is_finite());
            prop_assert!((iv - sigma).abs() < 1e-3, "sigma={} iv={}", sigma, iv);
        }
    }
}
