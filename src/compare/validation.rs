// Core vs validation study comparison
//
// Validation clips run longer than core clips, so the normalized variant
// compares count metrics as per-second rates. A record without a positive
// duration has no rate and drops out of the normalized samples.

use super::sample_at;
use super::statistics::student_ttest;
use crate::corpus::Corpus;
use crate::record::{Fps, Metric, SignalRecord};
use std::fmt;
use tracing::debug;

/// A compared quantity: a metric as stored, or divided by clip duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparedValue {
    Raw(Metric),
    PerSecond(Metric),
}

impl ComparedValue {
    pub fn extract(self, record: &SignalRecord) -> Option<f64> {
        match self {
            ComparedValue::Raw(metric) => Some(record.metric(metric)),
            ComparedValue::PerSecond(metric) => record.per_second(metric),
        }
    }
}

impl fmt::Display for ComparedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparedValue::Raw(metric) => write!(f, "{}", metric),
            ComparedValue::PerSecond(metric) => write!(f, "{}_per_sec", metric),
        }
    }
}

pub const RAW_VALIDATION_VALUES: [ComparedValue; 4] = [
    ComparedValue::Raw(Metric::SceneCount),
    ComparedValue::Raw(Metric::UniqueObjectCount),
    ComparedValue::Raw(Metric::PersonCountMean),
    ComparedValue::Raw(Metric::IntensityMean),
];

/// Count metrics as rates; mean-valued metrics stay unnormalized
pub const NORMALIZED_VALIDATION_VALUES: [ComparedValue; 4] = [
    ComparedValue::PerSecond(Metric::SceneCount),
    ComparedValue::PerSecond(Metric::UniqueObjectCount),
    ComparedValue::Raw(Metric::PersonCountMean),
    ComparedValue::Raw(Metric::IntensityMean),
];

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRow {
    pub fps: Fps,
    pub value: ComparedValue,
    pub core_mean: f64,
    pub val_mean: f64,
    /// val_mean - core_mean
    pub difference: f64,
    /// Difference as a percentage of core_mean; 0.0 when core_mean is 0
    pub pct_diff: f64,
    pub t_statistic: f64,
    pub p_value: f64,
    pub significant: bool,
}

pub fn compare_studies(
    core: &Corpus,
    validation: &Corpus,
    checkpoints: &[f64],
    values: &[ComparedValue],
    alpha: f64,
) -> Vec<ValidationRow> {
    let mut rows = Vec::new();

    for &checkpoint in checkpoints {
        let fps = Fps(checkpoint);
        for &value in values {
            let core_sample = sample_at(core.records(), fps, |r| value.extract(r));
            let val_sample = sample_at(validation.records(), fps, |r| value.extract(r));

            let test = match student_ttest(&core_sample, &val_sample) {
                Ok(test) => test,
                Err(e) => {
                    debug!(fps = %fps, value = %value, "validation comparison skipped: {:#}", e);
                    continue;
                }
            };

            let (core_mean, val_mean) = (test.mean_a, test.mean_b);
            let difference = val_mean - core_mean;
            rows.push(ValidationRow {
                fps,
                value,
                core_mean,
                val_mean,
                difference,
                pct_diff: if core_mean != 0.0 {
                    difference / core_mean * 100.0
                } else {
                    0.0
                },
                t_statistic: test.statistic,
                p_value: test.pvalue,
                significant: test.pvalue < alpha,
            });
        }
    }

    rows
}
