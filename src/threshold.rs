//! Threshold derivation engine
//!
//! For every (tier, metric) mean curve this derives two FPS thresholds:
//!
//! - **plateau**: the lowest FPS whose mean reaches `min + fraction ×
//!   (plateau − min)`, where the plateau is the mean at the reference FPS
//!   (60) or, failing that, at the highest sampled FPS
//! - **diminishing returns**: the first FPS whose relative change from the
//!   previous level falls below the stability tolerance
//!
//! Decreasing signals never get a percentage-of-plateau target: their
//! plateau threshold is the lowest sampled FPS.

use crate::aggregate::MeanCurve;
use crate::config::{AnalysisConfig, Direction};
use crate::corpus::Corpus;
use crate::record::{Fps, Metric, Tier};
use crate::stats;

/// Metrics reported in the threshold table
pub const THRESHOLD_METRICS: [Metric; 5] = [
    Metric::SceneCount,
    Metric::UniqueObjectCount,
    Metric::PersonCountMean,
    Metric::IntensityMean,
    Metric::ChangeScoreMean,
];

/// Derived thresholds of one (tier, metric) curve
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdResult {
    pub tier: Tier,
    pub metric: Metric,
    pub direction: Direction,
    pub optimal_fps_90pct: Fps,
    pub optimal_fps_diminishing: Fps,
    pub max_value: f64,
    pub min_value: f64,
    pub range: f64,
}

/// First FPS whose mean reaches `fraction` of the min..plateau range
///
/// Returns `fallback` when no level reaches the target and `None` for an
/// empty curve.
pub fn plateau_threshold(
    curve: &MeanCurve,
    fraction: f64,
    plateau_reference: Fps,
    fallback: Fps,
) -> Option<Fps> {
    let plateau = curve
        .value_at(plateau_reference)
        .or_else(|| curve.points().last().map(|(_, v)| *v))?;
    let min = curve.min_value()?;
    let target = min + fraction * (plateau - min);

    Some(
        curve
            .points()
            .iter()
            .find(|(_, value)| *value >= target)
            .map_or(fallback, |(fps, _)| *fps),
    )
}

/// First FPS at which the relative change from the previous level drops below `tolerance`
///
/// Defaults to the highest sampled FPS; `None` for an empty curve.
pub fn diminishing_threshold(curve: &MeanCurve, tolerance: f64) -> Option<Fps> {
    let highest = curve.highest_fps()?;
    Some(
        stats::first_stable_index(&curve.values(), tolerance)
            .map_or(highest, |i| curve.points()[i].0),
    )
}

/// Plateau threshold honouring the signal's direction
pub fn directional_threshold(
    curve: &MeanCurve,
    direction: Direction,
    fraction: f64,
    config: &AnalysisConfig,
) -> Option<Fps> {
    let reference = Fps(config.plateau_reference_fps);
    match direction {
        Direction::Increasing => plateau_threshold(curve, fraction, reference, reference),
        Direction::Decreasing => curve.lowest_fps(),
    }
}

/// Thresholds for a single curve; `None` below two FPS levels
pub fn derive_threshold(
    tier: Tier,
    metric: Metric,
    curve: &MeanCurve,
    config: &AnalysisConfig,
) -> Option<ThresholdResult> {
    if curve.len() < 2 {
        return None;
    }
    let lowest = curve.lowest_fps()?;
    let min_value = curve.min_value()?;
    let max_value = curve.max_value()?;
    let direction = config.direction(metric);

    let (optimal_fps_90pct, optimal_fps_diminishing) = if max_value == min_value {
        (lowest, lowest)
    } else {
        (
            directional_threshold(curve, direction, config.threshold_fraction, config)?,
            diminishing_threshold(curve, config.stability_tolerance)?,
        )
    };

    Some(ThresholdResult {
        tier,
        metric,
        direction,
        optimal_fps_90pct,
        optimal_fps_diminishing,
        max_value,
        min_value,
        range: max_value - min_value,
    })
}

/// Thresholds for every tier present in the corpus and every metric in `metrics`
pub fn derive_thresholds(
    corpus: &Corpus,
    metrics: &[Metric],
    config: &AnalysisConfig,
) -> Vec<ThresholdResult> {
    let mut results = Vec::new();
    for tier in Tier::ALL {
        for &metric in metrics {
            let curve = MeanCurve::from_records(corpus.tier(tier), metric);
            if let Some(result) = derive_threshold(tier, metric, &curve, config) {
                results.push(result);
            }
        }
    }
    results
}
