//! Canonical signal record data model
//!
//! One `SignalRecord` is one video measured at one sampled FPS. Records are
//! created once by the normalizer and never mutated afterwards; derived
//! values (per-second rates) are computed on demand instead of being written
//! back into the record.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a tier, study type or metric name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseNameError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseNameError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Production-quality category of the source video
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Cinema,
    ProducedDigital,
    WebUgc,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Cinema, Tier::ProducedDigital, Tier::WebUgc];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Cinema => "cinema",
            Tier::ProducedDigital => "produced_digital",
            Tier::WebUgc => "web_ugc",
        }
    }

    /// Title-cased label used in publication tables
    pub fn display_name(self) -> &'static str {
        match self {
            Tier::Cinema => "Cinema",
            Tier::ProducedDigital => "Produced Digital",
            Tier::WebUgc => "Web Ugc",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseNameError::new("tier", s))
    }
}

/// Which study a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyType {
    #[default]
    Core,
    Validation,
}

impl StudyType {
    pub fn as_str(self) -> &'static str {
        match self {
            StudyType::Core => "core",
            StudyType::Validation => "validation",
        }
    }
}

impl fmt::Display for StudyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyType {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "core" => Ok(StudyType::Core),
            "validation" => Ok(StudyType::Validation),
            other => Err(ParseNameError::new("study type", other)),
        }
    }
}

/// Sampling rate of a measurement
///
/// Wraps `f64` with a total order so FPS levels can key maps and be sorted.
#[derive(Debug, Clone, Copy)]
pub struct Fps(pub f64);

impl Fps {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Fps {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fps {}

impl PartialOrd for Fps {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fps {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Fps {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Fps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<f64> for Fps {
    fn from(value: f64) -> Self {
        Fps(value)
    }
}

/// Upstream extractor sub-object a metric is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalGroup {
    Scene,
    Character,
    Visual,
    Atmosphere,
    Action,
    Temporal,
}

/// Named numeric metric carried by every signal record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Metric {
    SceneCount,
    TransitionCount,
    SceneDurationMean,
    SceneDurationStd,
    PersonCountMean,
    PersonCountMax,
    CharacterConsistency,
    EntryExitTotal,
    UniqueObjectCount,
    PersistentObjectCount,
    ObjectsPerFrameMean,
    BrightnessMean,
    BrightnessStd,
    ContrastMean,
    DominantColors,
    IntensityMean,
    IntensityMax,
    PeakCount,
    ChangeScoreMean,
    TemporalDensity,
}

impl Metric {
    pub const COUNT: usize = 20;

    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::SceneCount,
        Metric::TransitionCount,
        Metric::SceneDurationMean,
        Metric::SceneDurationStd,
        Metric::PersonCountMean,
        Metric::PersonCountMax,
        Metric::CharacterConsistency,
        Metric::EntryExitTotal,
        Metric::UniqueObjectCount,
        Metric::PersistentObjectCount,
        Metric::ObjectsPerFrameMean,
        Metric::BrightnessMean,
        Metric::BrightnessStd,
        Metric::ContrastMean,
        Metric::DominantColors,
        Metric::IntensityMean,
        Metric::IntensityMax,
        Metric::PeakCount,
        Metric::ChangeScoreMean,
        Metric::TemporalDensity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::SceneCount => "scene_count",
            Metric::TransitionCount => "transition_count",
            Metric::SceneDurationMean => "scene_duration_mean",
            Metric::SceneDurationStd => "scene_duration_std",
            Metric::PersonCountMean => "person_count_mean",
            Metric::PersonCountMax => "person_count_max",
            Metric::CharacterConsistency => "character_consistency",
            Metric::EntryExitTotal => "entry_exit_total",
            Metric::UniqueObjectCount => "unique_object_count",
            Metric::PersistentObjectCount => "persistent_object_count",
            Metric::ObjectsPerFrameMean => "objects_per_frame_mean",
            Metric::BrightnessMean => "brightness_mean",
            Metric::BrightnessStd => "brightness_std",
            Metric::ContrastMean => "contrast_mean",
            Metric::DominantColors => "dominant_colors",
            Metric::IntensityMean => "intensity_mean",
            Metric::IntensityMax => "intensity_max",
            Metric::PeakCount => "peak_count",
            Metric::ChangeScoreMean => "change_score_mean",
            Metric::TemporalDensity => "temporal_density",
        }
    }

    pub fn group(self) -> SignalGroup {
        match self {
            Metric::SceneCount
            | Metric::TransitionCount
            | Metric::SceneDurationMean
            | Metric::SceneDurationStd => SignalGroup::Scene,
            Metric::PersonCountMean
            | Metric::PersonCountMax
            | Metric::CharacterConsistency
            | Metric::EntryExitTotal => SignalGroup::Character,
            Metric::UniqueObjectCount
            | Metric::PersistentObjectCount
            | Metric::ObjectsPerFrameMean => SignalGroup::Visual,
            Metric::BrightnessMean
            | Metric::BrightnessStd
            | Metric::ContrastMean
            | Metric::DominantColors => SignalGroup::Atmosphere,
            Metric::IntensityMean | Metric::IntensityMax | Metric::PeakCount => {
                SignalGroup::Action
            }
            Metric::ChangeScoreMean | Metric::TemporalDensity => SignalGroup::Temporal,
        }
    }

    /// Count-based metrics grow with clip length and are compared as rates
    pub fn is_count(self) -> bool {
        matches!(
            self,
            Metric::SceneCount | Metric::UniqueObjectCount | Metric::TransitionCount
        )
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ParseNameError::new("metric", s))
    }
}

impl TryFrom<String> for Metric {
    type Error = ParseNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for Metric {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Dense metric storage, always fully populated (absent inputs are 0.0)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricValues([f64; Metric::COUNT]);

impl MetricValues {
    pub fn get(&self, metric: Metric) -> f64 {
        self.0[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        self.0[metric.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

/// One measurement of one video at one sampled FPS
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub video_id: String,
    pub fps: Fps,
    pub frame_count: f64,
    /// Clip duration in seconds
    pub duration: f64,
    pub dataset: String,
    pub tier: Tier,
    pub study_type: StudyType,
    pub source_fps: f64,
    pub metrics: MetricValues,
}

impl SignalRecord {
    pub fn metric(&self, metric: Metric) -> f64 {
        self.metrics.get(metric)
    }

    /// Metric divided by clip duration; `None` when the duration is not positive
    pub fn per_second(&self, metric: Metric) -> Option<f64> {
        per_second(self.metric(metric), self.duration)
    }
}

/// Normalize a count by clip duration
pub fn per_second(value: f64, duration: f64) -> Option<f64> {
    (duration > 0.0).then(|| value / duration)
}

/// A derived value, or an explicit marker that the inputs could not support it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Derived<T> {
    Computed(T),
    InsufficientData,
}

impl<T> Derived<T> {
    pub fn computed(self) -> Option<T> {
        match self {
            Derived::Computed(v) => Some(v),
            Derived::InsufficientData => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Derived::Computed(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            Derived::Computed(_) => "computed",
            Derived::InsufficientData => "insufficient_data",
        }
    }
}

impl<T> From<Option<T>> for Derived<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Derived::InsufficientData, Derived::Computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_round_trip_names() {
        for tier in Tier::ALL {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        assert!("documentary".parse::<Tier>().is_err());
    }

    #[test]
    fn test_metric_names_are_unique_and_parse() {
        let mut names: Vec<_> = Metric::ALL.iter().map(|m| m.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Metric::COUNT);
        assert_eq!(
            "unique_object_count".parse::<Metric>().unwrap(),
            Metric::UniqueObjectCount
        );
    }

    #[test]
    fn test_metric_index_matches_all_order() {
        for (i, metric) in Metric::ALL.iter().enumerate() {
            assert_eq!(metric.index(), i);
        }
    }

    #[test]
    fn test_unknown_metric_error_message() {
        let err = "face_count".parse::<Metric>().unwrap_err();
        assert_eq!(err.to_string(), "unknown metric 'face_count'");
    }

    #[test]
    fn test_fps_ordering_and_equality() {
        let mut levels = vec![Fps(60.0), Fps(0.5), Fps(24.0), Fps(1.0)];
        levels.sort();
        assert_eq!(levels, vec![Fps(0.5), Fps(1.0), Fps(24.0), Fps(60.0)]);
        assert_eq!(Fps(24.0).to_string(), "24");
        assert_eq!(Fps(0.5).to_string(), "0.5");
    }

    #[test]
    fn test_per_second_rate() {
        assert_eq!(per_second(15.0, 30.0), Some(0.5));
        // Same rate over a 120s clip implies 60 raw events
        assert_eq!(0.5 * 120.0, 60.0);
        assert_eq!(per_second(60.0, 120.0), Some(0.5));
        assert_eq!(per_second(15.0, 0.0), None);
    }

    #[test]
    fn test_count_metrics() {
        let counts: Vec<_> = Metric::ALL.iter().filter(|m| m.is_count()).collect();
        assert_eq!(counts.len(), 3);
        assert!(!Metric::IntensityMean.is_count());
    }

    #[test]
    fn test_derived_status() {
        let computed: Derived<f64> = Some(24.0).into();
        let missing: Derived<f64> = None.into();
        assert_eq!(computed.status(), "computed");
        assert_eq!(missing.status(), "insufficient_data");
        assert_eq!(computed.computed(), Some(24.0));
        assert!(!missing.is_computed());
    }
}
