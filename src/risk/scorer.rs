//! Expected risk index (ERI) scorers
//!
//! Two definitions exist and they are not interchangeable:
//! - `SigmaDailyScorer`: ERI = 100 · iv / √365, comparable across assets
//! - `PercentileRankScorer`: percentile rank of the IV in its trailing
//!   history, rescaled so p10 maps to 0 and p90 maps to 100
//!
//! The engine uses exactly one, selected by configuration.

use crate::config::ScorerKind;
use crate::signals::stats::percentile_rank;

use super::sizing::sigma_daily;

/// Maps an IV, given the trailing IV history, to an ERI value
pub trait RiskScorer: Send + Sync {
    fn kind(&self) -> ScorerKind;

    /// `history` holds the trailing IVs, the current one included
    fn score(&self, iv: f64, history: &[f64]) -> Option<f64>;
}

pub struct SigmaDailyScorer;

impl RiskScorer for SigmaDailyScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::SigmaDaily
    }

    fn score(&self, iv: f64, _history: &[f64]) -> Option<f64> {
        sigma_daily(iv).map(|s| 100.0 * s)
    }
}

pub struct PercentileRankScorer {
    pub low: f64,
    pub high: f64,
}

impl Default for PercentileRankScorer {
    fn default() -> Self {
        Self {
            low: 10.0,
            high: 90.0,
        }
    }
}

impl RiskScorer for PercentileRankScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::PercentileRank
    }

    fn score(&self, iv: f64, history: &[f64]) -> Option<f64> {
        let rank = percentile_rank(history, iv)?;
        let span = self.high - self.low;
        if !(span > 0.0) {
            return None;
        }
        Some((100.0 * (rank - self.low) / span).clamp(0.0, 100.0))
    }
}

/// Scorer for the configured kind
pub fn scorer_for(kind: ScorerKind) -> Box<dyn RiskScorer> {
    match kind {
        ScorerKind::SigmaDaily => Box::new(SigmaDailyScorer),
        ScorerKind::PercentileRank => Box::new(PercentileRankScorer::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigma_daily_eri() {
        let eri = SigmaDailyScorer.score(0.73, &[]).unwrap();
        assert!((eri - 100.0 * 0.73 / 365f64.sqrt()).abs() < 1e-12);
        assert!(SigmaDailyScorer.score(f64::NAN, &[]).is_none());
        assert!(SigmaDailyScorer.score(-0.1, &[]).is_none());
    }

    #[test]
    fn test_percentile_rank_eri_range() {
        let history: Vec<f64> = (1..=100).map(|i| i as f64 / 100.0).collect();
        let scorer = PercentileRankScorer::default();

        assert_eq!(scorer.score(0.05, &history), Some(0.0));
        assert_eq!(scorer.score(0.50, &history), Some(50.0));
        assert_eq!(scorer.score(0.95, &history), Some(100.0));
        assert!(scorer.score(0.5, &[]).is_none());
    }

    #[test]
    fn test_scorer_for_kind() {
        assert_eq!(scorer_for(ScorerKind::SigmaDaily).kind(), ScorerKind::SigmaDaily);
        assert_eq!(scorer_for(ScorerKind::PercentileRank).kind(), ScorerKind::PercentileRank);
    }
}
