//! Forecast scoring
//!
//! Matches an externally produced forecast log against realized next-day
//! returns from the feature table.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::features::FeatureRow;

pub const FORECAST_LOG_FILE: &str = "forecast_log.json";
pub const FORECAST_METRICS_FILE: &str = "forecast_metrics.json";

/// One logged forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub for_date: Option<NaiveDate>,
    #[serde(default, alias = "next_day_return_pred")]
    pub predicted_return: Option<f64>,
    #[serde(default)]
    pub prob_up: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    pub n: usize,
    pub mae: f64,
    pub rmse: f64,
    pub bias: f64,
    pub hit_rate: f64,
    pub brier: Option<f64>,
    pub last_eval_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Evaluation {
    Ok(ForecastMetrics),
    NoData,
    NoOverlap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub symbol: String,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

/// Sign with zero mapped to zero
fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Score `forecasts` against the realized targets in `features`
pub fn evaluate(features: &[FeatureRow], forecasts: &[ForecastEntry]) -> Evaluation {
    if features.is_empty() || forecasts.is_empty() {
        return Evaluation::NoData;
    }

    let realized: BTreeMap<NaiveDate, f64> = features
        .iter()
        .filter_map(|r| r.target_next_ret.filter(|y| y.is_finite()).map(|y| (r.date, y)))
        .collect();

    // (date, y, yhat, prob_up) in date order
    let mut rows: Vec<(NaiveDate, f64, f64, Option<f64>)> = forecasts
        .iter()
        .filter_map(|f| {
            let date = f.for_date?;
            let y = *realized.get(&date)?;
            let yhat = f.predicted_return.filter(|v| v.is_finite()).unwrap_or(0.0);
            Some((date, y, yhat, f.prob_up.filter(|p| p.is_finite())))
        })
        .collect();
    if rows.is_empty() {
        return Evaluation::NoOverlap;
    }
    rows.sort_by_key(|r| r.0);

    let n = rows.len() as f64;
    let errors: Vec<f64> = rows.iter().map(|(_, y, yhat, _)| yhat - y).collect();
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
    let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();
    let bias = errors.iter().sum::<f64>() / n;
    let hits = rows.iter().filter(|(_, y, yhat, _)| sign(*yhat) == sign(*y)).count();

    let brier = rows.iter().any(|r| r.3.is_some()).then(|| {
        rows.iter()
            .map(|(_, y, _, p)| {
                let outcome = if *y > 0.0 { 1.0 } else { 0.0 };
                (p.unwrap_or(0.5) - outcome).powi(2)
            })
            .sum::<f64>()
            / n
    });

    Evaluation::Ok(ForecastMetrics {
        n: rows.len(),
        mae,
        rmse,
        bias,
        hit_rate: hits as f64 / n,
        brier,
        last_eval_date: rows[rows.len() - 1].0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn d(i: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap() + Duration::days(i)
    }

    fn row(i: i64, target: Option<f64>) -> FeatureRow {
        FeatureRow {
            date: d(i),
            close: 100.0,
            spot_last: 100.0,
            iv: 0.5,
            rv7: 0.4,
            rv30: 0.45,
            mom7: 0.0,
            mom30: 0.0,
            rsi14: 50.0,
            iv_minus_rv30: 0.05,
            target_next_ret: target,
        }
    }

    fn entry(i: i64, pred: f64, prob_up: Option<f64>) -> ForecastEntry {
        ForecastEntry {
            for_date: Some(d(i)),
            predicted_return: Some(pred),
            prob_up,
        }
    }

    #[test]
    fn test_metrics() {
        let features = vec![row(0, Some(0.02)), row(1, Some(-0.01)), row(2, None)];
        let forecasts = vec![
            entry(1, 0.01, None),
            entry(0, 0.01, Some(0.8)),
            entry(2, 0.05, None),
            entry(9, 0.05, None),
        ];

        let Evaluation::Ok(m) = evaluate(&features, &forecasts) else {
            panic!("expected metrics");
        };
        assert_eq!(m.n, 2);
        // errors: -0.01 (day 0), +0.02 (day 1)
        assert!((m.mae - 0.015).abs() < 1e-12);
        assert!((m.bias - 0.005).abs() < 1e-12);
        assert!((m.rmse - (0.0005f64 / 2.0).sqrt()).abs() < 1e-12);
        assert_eq!(m.hit_rate, 0.5);
        // (0.8 - 1)^2 and (0.5 - 0)^2
        assert!((m.brier.unwrap() - (0.04 + 0.25) / 2.0).abs() < 1e-12);
        assert_eq!(m.last_eval_date, d(1));
    }

    #[test]
    fn test_statuses() {
        assert_eq!(evaluate(&[], &[entry(0, 0.1, None)]), Evaluation::NoData);
        assert_eq!(evaluate(&[row(0, Some(0.1))], &[]), Evaluation::NoData);
        assert_eq!(
            evaluate(&[row(0, Some(0.1))], &[entry(5, 0.1, None)]),
            Evaluation::NoOverlap
        );
    }

    #[test]
    fn test_log_parsing_and_report_shape() {
        let log = r#"[
            {"for_date": "2025-02-01", "next_day_return_pred": 0.01},
            {"for_date": null}
        ]"#;
        let entries: Vec<ForecastEntry> = serde_json::from_str(log).unwrap();
        assert_eq!(entries[0].predicted_return, Some(0.01));
        assert!(entries[1].for_date.is_none());

        let report = EvaluationReport {
            symbol: "BTC".into(),
            evaluation: Evaluation::NoOverlap,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "no_overlap");
        assert_eq!(json["symbol"], "BTC");
    }
}
