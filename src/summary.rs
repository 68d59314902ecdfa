//! Per-tier publication summary
//!
//! Condenses the threshold table into one recommended FPS per content tier.

use crate::corpus::Corpus;
use crate::record::{Derived, Tier};
use crate::stats;
use crate::threshold::ThresholdResult;

#[derive(Debug, Clone, PartialEq)]
pub struct TierSummary {
    pub tier: Tier,
    pub videos: usize,
    pub records: usize,
    pub avg_fps_90pct: Derived<f64>,
    pub avg_fps_diminishing: Derived<f64>,
}

impl TierSummary {
    /// Larger of the two average thresholds, rounded to a whole FPS (ties to even)
    pub fn recommended_fps(&self) -> Derived<f64> {
        match (self.avg_fps_90pct, self.avg_fps_diminishing) {
            (Derived::Computed(a), Derived::Computed(b)) => {
                Derived::Computed(a.max(b).round_ties_even())
            }
            _ => Derived::InsufficientData,
        }
    }
}

pub fn publication_summary(corpus: &Corpus, thresholds: &[ThresholdResult]) -> Vec<TierSummary> {
    Tier::ALL
        .iter()
        .map(|&tier| {
            let (plateau, diminishing): (Vec<f64>, Vec<f64>) = thresholds
                .iter()
                .filter(|t| t.tier == tier)
                .map(|t| (t.optimal_fps_90pct.value(), t.optimal_fps_diminishing.value()))
                .unzip();

            let records: Vec<_> = corpus.tier(tier).collect();
            let videos = records
                .iter()
                .map(|r| r.video_id.as_str())
                .collect::<std::collections::BTreeSet<_>>()
                .len();

            TierSummary {
                tier,
                videos,
                records: records.len(),
                avg_fps_90pct: stats::mean(&plateau).into(),
                avg_fps_diminishing: stats::mean(&diminishing).into(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Direction;
    use crate::record::{Fps, Metric};

    fn threshold(tier: Tier, p90: f64, dim: f64) -> ThresholdResult {
        ThresholdResult {
            tier,
            metric: Metric::SceneCount,
            direction: Direction::Increasing,
            optimal_fps_90pct: Fps(p90),
            optimal_fps_diminishing: Fps(dim),
            max_value: 1.0,
            min_value: 0.0,
            range: 1.0,
        }
    }

    #[test]
    fn test_recommended_is_rounded_max() {
        let thresholds = vec![
            threshold(Tier::Cinema, 24.0, 10.0),
            threshold(Tier::Cinema, 10.0, 60.0),
        ];
        let summary = publication_summary(&Corpus::default(), &thresholds);
        assert_eq!(summary.len(), 3);

        let cinema = &summary[0];
        assert_eq!(cinema.tier, Tier::Cinema);
        assert_eq!(cinema.avg_fps_90pct, Derived::Computed(17.0));
        assert_eq!(cinema.avg_fps_diminishing, Derived::Computed(35.0));
        assert_eq!(cinema.recommended_fps(), Derived::Computed(35.0));
    }

    #[test]
    fn test_recommended_rounds_half_to_even() {
        let thresholds = vec![
            threshold(Tier::WebUgc, 24.0, 10.0),
            threshold(Tier::WebUgc, 25.0, 10.0),
            threshold(Tier::Cinema, 10.0, 25.0),
            threshold(Tier::Cinema, 10.0, 26.0),
        ];
        let summary = publication_summary(&Corpus::default(), &thresholds);
        let web = summary.iter().find(|s| s.tier == Tier::WebUgc).unwrap();
        assert_eq!(web.avg_fps_90pct, Derived::Computed(24.5));
        assert_eq!(web.recommended_fps(), Derived::Computed(24.0));
        let cinema = summary.iter().find(|s| s.tier == Tier::Cinema).unwrap();
        assert_eq!(cinema.recommended_fps(), Derived::Computed(26.0));
    }

    #[test]
    fn test_tier_without_thresholds() {
        let summary = publication_summary(&Corpus::default(), &[]);
        assert!(summary
            .iter()
            .all(|s| s.recommended_fps() == Derived::InsufficientData && s.records == 0));
    }
}
