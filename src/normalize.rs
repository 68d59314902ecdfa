//! Record normalizer: raw nested signal JSON → canonical `SignalRecord`
//!
//! The upstream extractor writes one JSON object per (video, FPS) with six
//! optional signal sub-objects and a `metadata` object. Any sub-object or
//! field may be absent or `null`; absent metrics become 0.0 so every record
//! in the corpus is fully numeric. Records without identifying metadata are
//! rejected with a `SkipReason`.

use crate::record::{Fps, Metric, MetricValues, SignalRecord, StudyType, Tier};
use crate::stats;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Why a raw record was excluded from the corpus
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("missing metadata.tier")]
    MissingTier,

    #[error("missing metadata.dataset")]
    MissingDataset,

    #[error("missing video_id")]
    MissingVideoId,

    #[error("missing or non-positive fps")]
    InvalidFps,

    #[error("unknown tier '{0}'")]
    UnknownTier(String),

    #[error("unknown study type '{0}'")]
    UnknownStudyType(String),
}

impl SkipReason {
    /// Stable key for per-reason skip counters
    pub fn key(&self) -> &'static str {
        match self {
            SkipReason::MissingTier => "missing_tier",
            SkipReason::MissingDataset => "missing_dataset",
            SkipReason::MissingVideoId => "missing_video_id",
            SkipReason::InvalidFps => "invalid_fps",
            SkipReason::UnknownTier(_) => "unknown_tier",
            SkipReason::UnknownStudyType(_) => "unknown_study_type",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSceneSignals {
    pub scene_count: Option<f64>,
    pub transition_count: Option<f64>,
    pub scene_duration_mean: Option<f64>,
    pub scene_duration_std: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCharacterSignals {
    pub person_count_mean: Option<f64>,
    pub person_count_max: Option<f64>,
    pub character_consistency: Option<f64>,
    pub entry_exit_total: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawVisualSignals {
    pub unique_object_count: Option<f64>,
    pub persistent_object_count: Option<f64>,
    /// Object count of every sampled frame; `null` entries count as NaN
    pub objects_per_frame: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAtmosphereSignals {
    pub brightness_mean: Option<f64>,
    pub brightness_std: Option<f64>,
    pub contrast_mean: Option<f64>,
    pub dominant_colors: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawActionSignals {
    pub intensity_mean: Option<f64>,
    pub intensity_max: Option<f64>,
    pub peak_count: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTemporalSignals {
    pub change_score_mean: Option<f64>,
    pub temporal_density: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMetadata {
    pub tier: Option<String>,
    pub dataset: Option<String>,
    pub study_type: Option<String>,
    pub source_fps: Option<f64>,
}

/// One upstream measurement file, as written by the extractor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    /// String or numeric identifier
    pub video_id: Option<Value>,
    pub fps: Option<f64>,
    pub frame_count: Option<f64>,
    pub duration: Option<f64>,
    pub scene_signals: Option<RawSceneSignals>,
    pub character_signals: Option<RawCharacterSignals>,
    pub visual_signals: Option<RawVisualSignals>,
    pub atmosphere_signals: Option<RawAtmosphereSignals>,
    pub action_signals: Option<RawActionSignals>,
    pub temporal_signals: Option<RawTemporalSignals>,
    pub metadata: Option<RawMetadata>,
}

impl RawRecord {
    /// Fill a missing `metadata.dataset` / `metadata.tier` from the source directory
    ///
    /// Explicit values in the file always win.
    pub fn apply_source_defaults(&mut self, dataset: &str, tier: Tier) {
        let meta = self.metadata.get_or_insert_with(RawMetadata::default);
        if present(meta.dataset.as_deref()).is_none() {
            meta.dataset = Some(dataset.to_string());
        }
        if present(meta.tier.as_deref()).is_none() {
            meta.tier = Some(tier.as_str().to_string());
        }
    }
}

/// Parse one raw record from JSON bytes
pub fn parse_record(bytes: &[u8]) -> serde_json::Result<RawRecord> {
    serde_json::from_slice(bytes)
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn number(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn video_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Normalize one raw record into the canonical flat schema
///
/// Pure: the same input always yields the same output.
pub fn normalize(raw: &RawRecord) -> Result<SignalRecord, SkipReason> {
    let meta = raw.metadata.clone().unwrap_or_default();

    let tier_name = present(meta.tier.as_deref()).ok_or(SkipReason::MissingTier)?;
    let dataset = present(meta.dataset.as_deref()).ok_or(SkipReason::MissingDataset)?;
    let tier: Tier = tier_name
        .parse()
        .map_err(|_| SkipReason::UnknownTier(tier_name.to_string()))?;
    let study_type = match present(meta.study_type.as_deref()) {
        None => StudyType::Core,
        Some(name) => name
            .parse()
            .map_err(|_| SkipReason::UnknownStudyType(name.to_string()))?,
    };

    let video_id = video_id(raw.video_id.as_ref()).ok_or(SkipReason::MissingVideoId)?;
    let fps = raw
        .fps
        .filter(|f| f.is_finite() && *f > 0.0)
        .ok_or(SkipReason::InvalidFps)?;

    Ok(SignalRecord {
        video_id,
        fps: Fps(fps),
        frame_count: number(raw.frame_count),
        duration: number(raw.duration),
        dataset: dataset.to_string(),
        tier,
        study_type,
        source_fps: number(meta.source_fps),
        metrics: extract_metrics(raw),
    })
}

fn extract_metrics(raw: &RawRecord) -> MetricValues {
    let scene = raw.scene_signals.clone().unwrap_or_default();
    let character = raw.character_signals.clone().unwrap_or_default();
    let visual = raw.visual_signals.clone().unwrap_or_default();
    let atmosphere = raw.atmosphere_signals.clone().unwrap_or_default();
    let action = raw.action_signals.clone().unwrap_or_default();
    let temporal = raw.temporal_signals.clone().unwrap_or_default();

    let objects_per_frame: Vec<f64> = visual
        .objects_per_frame
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    let dominant_colors = atmosphere.dominant_colors.map_or(0, |c| c.len());

    let mut m = MetricValues::default();
    m.set(Metric::SceneCount, number(scene.scene_count));
    m.set(Metric::TransitionCount, number(scene.transition_count));
    m.set(Metric::SceneDurationMean, number(scene.scene_duration_mean));
    m.set(Metric::SceneDurationStd, number(scene.scene_duration_std));

    m.set(Metric::PersonCountMean, number(character.person_count_mean));
    m.set(Metric::PersonCountMax, number(character.person_count_max));
    m.set(Metric::CharacterConsistency, number(character.character_consistency));
    m.set(Metric::EntryExitTotal, number(character.entry_exit_total));

    m.set(Metric::UniqueObjectCount, number(visual.unique_object_count));
    m.set(Metric::PersistentObjectCount, number(visual.persistent_object_count));
    m.set(Metric::ObjectsPerFrameMean, stats::nan_mean(&objects_per_frame));

    m.set(Metric::BrightnessMean, number(atmosphere.brightness_mean));
    m.set(Metric::BrightnessStd, number(atmosphere.brightness_std));
    m.set(Metric::ContrastMean, number(atmosphere.contrast_mean));
    m.set(Metric::DominantColors, dominant_colors as f64);

    m.set(Metric::IntensityMean, number(action.intensity_mean));
    m.set(Metric::IntensityMax, number(action.intensity_max));
    m.set(Metric::PeakCount, number(action.peak_count));

    m.set(Metric::ChangeScoreMean, number(temporal.change_score_mean));
    m.set(Metric::TemporalDensity, number(temporal.temporal_density));
    m
}
