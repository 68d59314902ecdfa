// Cross-tier one-way ANOVA at every sampled FPS level

use super::sample_at;
use super::statistics::{one_way_anova, EffectSize};
use crate::corpus::Corpus;
use crate::record::{Fps, Metric, Tier};
use tracing::debug;

pub const ANOVA_METRICS: [Metric; 6] = [
    Metric::SceneCount,
    Metric::UniqueObjectCount,
    Metric::PersonCountMean,
    Metric::IntensityMean,
    Metric::ChangeScoreMean,
    Metric::TemporalDensity,
];

#[derive(Debug, Clone, PartialEq)]
pub struct AnovaRow {
    pub fps: Fps,
    pub metric: Metric,
    pub f_statistic: f64,
    pub p_value: f64,
    pub eta_squared: f64,
    pub significant: bool,
    pub effect_size: EffectSize,
}

/// ANOVA across the content tiers for every (fps, metric)
///
/// Tiers with fewer than two observations at a level are left out; a level
/// with fewer than two remaining tiers emits no row.
pub fn anova_by_fps(corpus: &Corpus, metrics: &[Metric], alpha: f64) -> Vec<AnovaRow> {
    let mut rows = Vec::new();

    for fps in corpus.fps_levels() {
        for &metric in metrics {
            let groups: Vec<Vec<f64>> = Tier::ALL
                .iter()
                .map(|&tier| sample_at(corpus.tier(tier), fps, |r| Some(r.metric(metric))))
                .filter(|g| g.len() >= 2)
                .collect();

            if groups.len() < 2 {
                debug!(fps = %fps, metric = %metric, groups = groups.len(), "ANOVA skipped");
                continue;
            }

            match one_way_anova(&groups) {
                Ok(test) => rows.push(AnovaRow {
                    fps,
                    metric,
                    f_statistic: test.statistic,
                    p_value: test.pvalue,
                    eta_squared: test.eta_squared,
                    significant: test.pvalue < alpha,
                    effect_size: EffectSize::from_eta_squared(test.eta_squared),
                }),
                Err(e) => debug!(fps = %fps, metric = %metric, "ANOVA failed: {:#}", e),
            }
        }
    }

    rows
}
