// Pairwise tier comparisons at the FPS checkpoints

use super::sample_at;
use super::statistics::{cohens_d, student_ttest};
use crate::corpus::Corpus;
use crate::record::{Fps, Metric, Tier};
use tracing::debug;

pub const PAIRWISE_METRICS: [Metric; 4] = [
    Metric::SceneCount,
    Metric::UniqueObjectCount,
    Metric::PersonCountMean,
    Metric::IntensityMean,
];

pub const TIER_PAIRS: [(Tier, Tier); 3] = [
    (Tier::Cinema, Tier::ProducedDigital),
    (Tier::Cinema, Tier::WebUgc),
    (Tier::ProducedDigital, Tier::WebUgc),
];

#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseRow {
    pub fps: Fps,
    pub metric: Metric,
    pub tier_a: Tier,
    pub tier_b: Tier,
    pub t_statistic: f64,
    pub p_value: f64,
    pub cohens_d: f64,
    pub significant: bool,
    /// mean(tier_a) - mean(tier_b)
    pub mean_diff: f64,
}

impl PairwiseRow {
    /// e.g. "cinema vs web_ugc"
    pub fn comparison(&self) -> String {
        format!("{} vs {}", self.tier_a, self.tier_b)
    }
}

pub fn pairwise_by_checkpoint(
    corpus: &Corpus,
    checkpoints: &[f64],
    metrics: &[Metric],
    alpha: f64,
) -> Vec<PairwiseRow> {
    let mut rows = Vec::new();

    for &checkpoint in checkpoints {
        let fps = Fps(checkpoint);
        for &metric in metrics {
            for (tier_a, tier_b) in TIER_PAIRS {
                let a = sample_at(corpus.tier(tier_a), fps, |r| Some(r.metric(metric)));
                let b = sample_at(corpus.tier(tier_b), fps, |r| Some(r.metric(metric)));

                match student_ttest(&a, &b) {
                    Ok(test) => rows.push(PairwiseRow {
                        fps,
                        metric,
                        tier_a,
                        tier_b,
                        t_statistic: test.statistic,
                        p_value: test.pvalue,
                        cohens_d: cohens_d(&a, &b),
                        significant: test.pvalue < alpha,
                        mean_diff: test.mean_diff(),
                    }),
                    Err(e) => debug!(
                        fps = %fps,
                        metric = %metric,
                        "{} vs {} skipped: {:#}",
                        tier_a,
                        tier_b,
                        e
                    ),
                }
            }
        }
    }

    rows
}
