//! FPS aggregator
//!
//! Groups the corpus by (tier, fps) for mean/deviation tables and by
//! (tier, video) for per-video stability, and builds the FPS-ordered mean
//! curves the threshold engine consumes.

use crate::corpus::Corpus;
use crate::record::{Derived, Fps, Metric, SignalRecord, Tier};
use crate::stats;
use std::collections::BTreeMap;

/// Metrics averaged per (tier, fps) in the aggregate table
pub const AGGREGATE_METRICS: [Metric; 7] = [
    Metric::SceneCount,
    Metric::TransitionCount,
    Metric::PersonCountMean,
    Metric::UniqueObjectCount,
    Metric::ObjectsPerFrameMean,
    Metric::IntensityMean,
    Metric::CharacterConsistency,
];

/// Metrics whose within-group spread is reported alongside the means
pub const VARIANCE_METRICS: [Metric; 3] = [
    Metric::SceneCount,
    Metric::UniqueObjectCount,
    Metric::IntensityMean,
];

/// Metrics tracked by the per-video stability table
pub const STABILITY_METRICS: [Metric; 5] = [
    Metric::SceneCount,
    Metric::TransitionCount,
    Metric::UniqueObjectCount,
    Metric::PersonCountMean,
    Metric::IntensityMean,
];

/// Mean signal values of one (tier, fps) group
#[derive(Debug, Clone, PartialEq)]
pub struct FpsAggregate {
    pub tier: Tier,
    pub fps: Fps,
    /// Number of records in the group
    pub video_count: usize,
    pub frame_count_mean: f64,
    pub means: BTreeMap<Metric, f64>,
    /// Sample standard deviation; insufficient below two records
    pub stddevs: BTreeMap<Metric, Derived<f64>>,
}

/// Per-video, per-metric variability across FPS levels
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityRow {
    pub tier: Tier,
    pub video_id: String,
    pub metric: Metric,
    pub cv: f64,
    pub stable_fps: Fps,
    pub min_value: f64,
    pub max_value: f64,
}

/// Mean of one metric at every sampled FPS, ascending by FPS
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeanCurve {
    points: Vec<(Fps, f64)>,
}

impl MeanCurve {
    /// Build from arbitrary (fps, mean) points; sorted ascending
    pub fn from_points(mut points: Vec<(Fps, f64)>) -> Self {
        points.sort_by(|a, b| a.0.cmp(&b.0));
        Self { points }
    }

    /// Average `metric` per FPS level over `records`
    pub fn from_records<'a, I>(records: I, metric: Metric) -> Self
    where
        I: IntoIterator<Item = &'a SignalRecord>,
    {
        Self::from_values(records.into_iter().map(|r| (r.fps, r.metric(metric))))
    }

    /// Average arbitrary per-record values per FPS level
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (Fps, f64)>,
    {
        let mut by_fps: BTreeMap<Fps, Vec<f64>> = BTreeMap::new();
        for (fps, value) in values {
            by_fps.entry(fps).or_default().push(value);
        }
        let points = by_fps
            .into_iter()
            .filter_map(|(fps, values)| stats::mean(&values).map(|m| (fps, m)))
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[(Fps, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn value_at(&self, fps: Fps) -> Option<f64> {
        self.points.iter().find(|(f, _)| *f == fps).map(|(_, v)| *v)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    pub fn lowest_fps(&self) -> Option<Fps> {
        self.points.first().map(|(f, _)| *f)
    }

    pub fn highest_fps(&self) -> Option<Fps> {
        self.points.last().map(|(f, _)| *f)
    }

    pub fn min_value(&self) -> Option<f64> {
        stats::min(&self.values())
    }

    pub fn max_value(&self) -> Option<f64> {
        stats::max(&self.values())
    }
}

fn group_by_tier_fps(corpus: &Corpus) -> BTreeMap<(Tier, Fps), Vec<&SignalRecord>> {
    let mut groups: BTreeMap<(Tier, Fps), Vec<&SignalRecord>> = BTreeMap::new();
    for record in corpus.records() {
        groups.entry((record.tier, record.fps)).or_default().push(record);
    }
    groups
}

/// Per-(tier, fps) means of `means`, sample deviations of `stddevs`, and group sizes
pub fn aggregate_by_tier_fps(
    corpus: &Corpus,
    means: &[Metric],
    stddevs: &[Metric],
) -> Vec<FpsAggregate> {
    group_by_tier_fps(corpus)
        .into_iter()
        .map(|((tier, fps), records)| {
            let column = |metric: Metric| -> Vec<f64> {
                records.iter().map(|r| r.metric(metric)).collect()
            };
            let frame_counts: Vec<f64> = records.iter().map(|r| r.frame_count).collect();

            FpsAggregate {
                tier,
                fps,
                video_count: records.len(),
                frame_count_mean: stats::mean(&frame_counts).unwrap_or(0.0),
                means: means
                    .iter()
                    .map(|&m| (m, stats::mean(&column(m)).unwrap_or(0.0)))
                    .collect(),
                stddevs: stddevs
                    .iter()
                    .map(|&m| (m, stats::sample_stddev(&column(m)).into()))
                    .collect(),
            }
        })
        .collect()
}

/// Coefficient of variation and stabilisation FPS per (tier, video, metric)
///
/// Videos sampled at fewer than two FPS levels contribute no rows.
pub fn signal_stability(corpus: &Corpus, metrics: &[Metric], tolerance: f64) -> Vec<StabilityRow> {
    let mut videos: BTreeMap<(Tier, &str), Vec<&SignalRecord>> = BTreeMap::new();
    for record in corpus.records() {
        videos
            .entry((record.tier, record.video_id.as_str()))
            .or_default()
            .push(record);
    }

    let mut rows = Vec::new();
    for ((tier, video_id), mut records) in videos {
        if records.len() < 2 {
            continue;
        }
        records.sort_by(|a, b| a.fps.cmp(&b.fps));
        let fps_levels: Vec<Fps> = records.iter().map(|r| r.fps).collect();
        let Some(&highest) = fps_levels.last() else {
            continue;
        };

        for &metric in metrics {
            let values: Vec<f64> = records.iter().map(|r| r.metric(metric)).collect();
            let stable_fps = stats::first_stable_index(&values, tolerance)
                .map_or(highest, |i| fps_levels[i]);

            rows.push(StabilityRow {
                tier,
                video_id: video_id.to_string(),
                metric,
                cv: stats::coefficient_of_variation(&values),
                stable_fps,
                min_value: stats::min(&values).unwrap_or(0.0),
                max_value: stats::max(&values).unwrap_or(0.0),
            });
        }
    }
    rows
}
