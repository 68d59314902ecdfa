// Tests for tier and study comparisons
//
// Samples mimic per-clip signal counts: a few tens of scenes for 30s clips,
// four times as many for 120s validation clips.

use super::*;
use crate::corpus::Corpus;
use crate::record::{Fps, Metric, MetricValues, SignalRecord, StudyType, Tier};

fn record(tier: Tier, study_type: StudyType, fps: f64, duration: f64, scenes: f64) -> SignalRecord {
    let mut metrics = MetricValues::default();
    metrics.set(Metric::SceneCount, scenes);
    metrics.set(Metric::PersonCountMean, 1.5);
    SignalRecord {
        video_id: format!("{}-{}", tier, scenes),
        fps: Fps(fps),
        frame_count: fps * duration,
        duration,
        dataset: "ave".to_string(),
        tier,
        study_type,
        source_fps: 24.0,
        metrics,
    }
}

fn tier_records(tier: Tier, fps: f64, scenes: &[f64]) -> Vec<SignalRecord> {
    scenes
        .iter()
        .map(|&s| record(tier, StudyType::Core, fps, 30.0, s))
        .collect()
}

#[test]
fn test_identical_groups_not_significant() {
    let a = [10.0, 12.0, 11.0, 13.0, 10.0];
    let b = [10.0, 12.0, 11.0, 13.0, 10.0];
    let test = student_ttest(&a, &b).unwrap();
    assert!(test.pvalue > 0.05, "p-value {} should be > 0.05", test.pvalue);
    assert!(cohens_d(&a, &b).abs() < 1e-9);
}

#[test]
fn test_separated_groups_significant() {
    let a = [10.0, 12.0, 11.0, 13.0, 10.0];
    let b = [50.0, 52.0, 51.0, 53.0, 50.0];
    let test = student_ttest(&a, &b).unwrap();
    assert!(test.pvalue < 0.05);
    assert!(test.statistic < 0.0);
    assert!((test.mean_diff() - -40.0).abs() < 1e-3);
    assert!(cohens_d(&a, &b) < -10.0);
}

#[test]
fn test_ttest_requires_two_samples() {
    assert!(student_ttest(&[1.0], &[1.0, 2.0]).is_err());
    assert!(student_ttest(&[], &[]).is_err());
}

#[test]
fn test_cohens_d_zero_pooled_std() {
    assert_eq!(cohens_d(&[5.0, 5.0], &[7.0, 7.0]), 0.0);
}

#[test]
fn test_cohens_d_pooled_formula() {
    // population std of both = 1, pooled = sqrt((1*1 + 1*1) / 2) = 1
    let d = cohens_d(&[1.0, 3.0], &[3.0, 5.0]);
    assert!((d - -2.0).abs() < 1e-6);
}

#[test]
fn test_eta_squared() {
    // groups with no within-group spread: all variance is between groups
    let groups = vec![vec![1.0, 1.0], vec![3.0, 3.0]];
    assert!((eta_squared(&groups) - 1.0).abs() < 1e-9);

    let flat = vec![vec![2.0, 2.0], vec![2.0, 2.0]];
    assert_eq!(eta_squared(&flat), 0.0);
}

#[test]
fn test_effect_size_bands() {
    assert_eq!(EffectSize::from_eta_squared(0.20), EffectSize::Large);
    assert_eq!(EffectSize::from_eta_squared(0.14), EffectSize::Medium);
    assert_eq!(EffectSize::from_eta_squared(0.10), EffectSize::Medium);
    assert_eq!(EffectSize::from_eta_squared(0.06), EffectSize::Small);
    assert_eq!(EffectSize::Large.as_str(), "large");
}

#[test]
fn test_anova_across_tiers() {
    let mut records = tier_records(Tier::Cinema, 24.0, &[40.0, 42.0, 41.0, 43.0]);
    records.extend(tier_records(Tier::ProducedDigital, 24.0, &[20.0, 22.0, 21.0, 23.0]));
    records.extend(tier_records(Tier::WebUgc, 24.0, &[5.0, 6.0, 5.0, 7.0]));
    let corpus = Corpus::new(records);

    let rows = anova_by_fps(&corpus, &[Metric::SceneCount], 0.05);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.fps, Fps(24.0));
    assert!(row.significant);
    assert!(row.f_statistic > 1.0);
    assert!(row.eta_squared > 0.9);
    assert_eq!(row.effect_size, EffectSize::Large);
}

#[test]
fn test_anova_drops_small_groups() {
    let mut records = tier_records(Tier::Cinema, 10.0, &[40.0, 42.0, 41.0]);
    records.extend(tier_records(Tier::WebUgc, 10.0, &[5.0]));
    let corpus = Corpus::new(records);

    // only one tier left with >= 2 observations
    assert!(anova_by_fps(&corpus, &[Metric::SceneCount], 0.05).is_empty());
}

#[test]
fn test_pairwise_rows_and_skips() {
    let mut records = tier_records(Tier::Cinema, 24.0, &[40.0, 42.0, 41.0, 43.0]);
    records.extend(tier_records(Tier::WebUgc, 24.0, &[5.0, 6.0, 5.0, 7.0]));
    records.extend(tier_records(Tier::ProducedDigital, 24.0, &[20.0]));
    let corpus = Corpus::new(records);

    let rows = pairwise_by_checkpoint(&corpus, &[1.0, 24.0], &[Metric::SceneCount], 0.05);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.comparison(), "cinema vs web_ugc");
    assert!(row.significant);
    assert!(row.mean_diff > 30.0);
    assert!(row.cohens_d > 0.0);
}

#[test]
fn test_duration_normalization_rates() {
    // 15 scenes in 30s and 60 scenes in 120s are the same rate
    let core = record(Tier::Cinema, StudyType::Core, 24.0, 30.0, 15.0);
    let validation = record(Tier::Cinema, StudyType::Validation, 24.0, 120.0, 60.0);
    let per_sec = ComparedValue::PerSecond(Metric::SceneCount);
    assert_eq!(per_sec.extract(&core), Some(0.5));
    assert_eq!(per_sec.extract(&validation), Some(0.5));
    assert_eq!(per_sec.to_string(), "scene_count_per_sec");
    assert_eq!(ComparedValue::Raw(Metric::SceneCount).to_string(), "scene_count");
}

#[test]
fn test_validation_normalized_removes_duration_bias() {
    let core = Corpus::new(
        [14.0, 15.0, 16.0, 15.0]
            .iter()
            .map(|&s| record(Tier::Cinema, StudyType::Core, 24.0, 30.0, s))
            .collect(),
    );
    let validation = Corpus::new(
        [56.0, 60.0, 64.0, 60.0]
            .iter()
            .map(|&s| record(Tier::Cinema, StudyType::Validation, 24.0, 120.0, s))
            .collect(),
    );

    let raw = compare_studies(
        &core,
        &validation,
        &[24.0],
        &[ComparedValue::Raw(Metric::SceneCount)],
        0.05,
    );
    assert_eq!(raw.len(), 1);
    assert!(raw[0].significant);
    assert!((raw[0].difference - 45.0).abs() < 1e-3);
    assert!((raw[0].pct_diff - 300.0).abs() < 1e-2);

    let normalized = compare_studies(
        &core,
        &validation,
        &[24.0],
        &[ComparedValue::PerSecond(Metric::SceneCount)],
        0.05,
    );
    assert_eq!(normalized.len(), 1);
    assert!(!normalized[0].significant);
    assert!(normalized[0].difference.abs() < 1e-6);
}

#[test]
fn test_validation_excludes_zero_duration() {
    let core = Corpus::new(vec![
        record(Tier::Cinema, StudyType::Core, 24.0, 30.0, 15.0),
        record(Tier::Cinema, StudyType::Core, 24.0, 0.0, 15.0),
        record(Tier::Cinema, StudyType::Core, 24.0, 30.0, 18.0),
    ]);
    let validation = Corpus::new(vec![
        record(Tier::Cinema, StudyType::Validation, 24.0, 120.0, 60.0),
        record(Tier::Cinema, StudyType::Validation, 24.0, 0.0, 60.0),
    ]);

    // validation is left with a single rate sample
    let rows = compare_studies(
        &core,
        &validation,
        &[24.0],
        &[ComparedValue::PerSecond(Metric::SceneCount)],
        0.05,
    );
    assert!(rows.is_empty());
}

#[test]
fn test_validation_pct_diff_zero_core_mean() {
    let core = Corpus::new(vec![
        record(Tier::Cinema, StudyType::Core, 1.0, 30.0, 0.0),
        record(Tier::Cinema, StudyType::Core, 1.0, 30.0, 0.0),
        record(Tier::Cinema, StudyType::Core, 1.0, 30.0, 0.0),
    ]);
    let validation = Corpus::new(vec![
        record(Tier::Cinema, StudyType::Validation, 1.0, 120.0, 1.0),
        record(Tier::Cinema, StudyType::Validation, 1.0, 120.0, 2.0),
        record(Tier::Cinema, StudyType::Validation, 1.0, 120.0, 3.0),
    ]);
    let rows = compare_studies(
        &core,
        &validation,
        &[1.0],
        &[ComparedValue::Raw(Metric::SceneCount)],
        0.05,
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].pct_diff, 0.0);
}
