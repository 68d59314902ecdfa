// Statistical comparison of content tiers and study types
//
// Three comparisons run over the materialized corpus at fixed FPS levels:
// - one-way ANOVA across the content tiers at every FPS level, with
//   eta-squared effect size
// - pairwise Student's t-tests between tier pairs at the FPS checkpoints,
//   with Cohen's d
// - core vs validation t-tests at the FPS checkpoints, raw and with count
//   metrics normalized by clip duration
//
// Implementation:
// - Uses aprender for the hypothesis tests (t-test, one-way ANOVA)
// - Uses crate::stats (f64) for means and deviations
// - A (level, metric) pair whose samples are too small, or whose test
//   fails, emits no row

mod anova;
mod pairwise;
mod statistics;
mod validation;

pub use anova::{anova_by_fps, AnovaRow, ANOVA_METRICS};
pub use pairwise::{pairwise_by_checkpoint, PairwiseRow, PAIRWISE_METRICS, TIER_PAIRS};
pub use statistics::{
    cohens_d, eta_squared, one_way_anova, student_ttest, AnovaTest, EffectSize, TwoSampleTest,
};
pub use validation::{
    compare_studies, ComparedValue, ValidationRow, NORMALIZED_VALIDATION_VALUES,
    RAW_VALIDATION_VALUES,
};

use crate::record::{Fps, SignalRecord};

/// Values of `extract` for the records sampled at `fps`; `None` values are dropped
fn sample_at<'a, I, F>(records: I, fps: Fps, extract: F) -> Vec<f64>
where
    I: IntoIterator<Item = &'a SignalRecord>,
    F: Fn(&SignalRecord) -> Option<f64>,
{
    records
        .into_iter()
        .filter(|r| r.fps == fps)
        .filter_map(extract)
        .filter(|v| v.is_finite())
        .collect()
}

#[cfg(test)]
mod tests;
