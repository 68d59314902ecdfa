//! Static analysis configuration
//!
//! Holds the dataset→tier lookup, the AD-tier requirement table, the list of
//! decreasing signals and the numeric constants of the threshold and
//! comparison stages. Loaded once from TOML and passed by reference; the
//! analysis code keeps no global state.

use crate::record::{Metric, Tier};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

const EMBEDDED_DEFAULT: &str = include_str!("../ad-tiers-default.toml");

/// Behaviour when an AD tier requires a signal the corpus does not carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MissingSignalPolicy {
    /// Exclude the signal from the max and emit a warning
    Warn,
    /// Abort tier mapping
    Error,
}

/// Behaviour for repeated (video_id, fps) keys within one study type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep every record; duplicates average together during aggregation
    Average,
    /// Keep the first record in sorted file order
    KeepFirst,
    /// Abort corpus building
    Error,
}

/// Whether a signal grows or shrinks as FPS rises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Increasing => "increasing",
            Direction::Decreasing => "decreasing",
        }
    }
}

/// Signal set and quality target of one audio-description product tier
///
/// # Example TOML
/// ```toml
/// [[ad_tier]]
/// name = "Compliance AD"
/// description = "Basic: scene boundaries, character presence, key objects"
/// required_signals = ["scene_count", "unique_object_count"]
/// quality_threshold = 0.80
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdTierRequirement {
    pub name: String,
    pub description: String,
    /// Signal names; kept as strings so unknown names reach the missing-signal policy
    pub required_signals: Vec<String>,
    /// Fraction of the min..plateau range each signal must reach
    pub quality_threshold: f64,
}

/// Complete analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub fps_checkpoints: Vec<f64>,
    pub plateau_reference_fps: f64,
    pub threshold_fraction: f64,
    pub stability_tolerance: f64,
    pub significance_level: f64,
    pub decreasing_signals: Vec<Metric>,
    pub missing_signal_policy: MissingSignalPolicy,
    pub duplicate_policy: DuplicatePolicy,
    /// Result directory relative to the input root → content tier
    pub tier_map: BTreeMap<String, Tier>,
    pub ad_tier: Vec<AdTierRequirement>,
}

impl AnalysisConfig {
    /// Configuration compiled into the binary from `ad-tiers-default.toml`
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(EMBEDDED_DEFAULT).context("Failed to parse embedded ad-tiers-default.toml")
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(content).context("Failed to parse TOML analysis configuration")?;
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.fps_checkpoints.is_empty() {
            return Err("fps_checkpoints must not be empty".to_string());
        }
        if let Some(bad) = self.fps_checkpoints.iter().find(|f| !(**f > 0.0)) {
            return Err(format!("fps_checkpoints must be positive, got {}", bad));
        }
        if !(self.plateau_reference_fps > 0.0) {
            return Err(format!(
                "plateau_reference_fps must be positive, got {}",
                self.plateau_reference_fps
            ));
        }
        if !(self.threshold_fraction > 0.0 && self.threshold_fraction <= 1.0) {
            return Err(format!(
                "threshold_fraction must be in (0, 1], got {}",
                self.threshold_fraction
            ));
        }
        if !(self.stability_tolerance > 0.0) {
            return Err(format!(
                "stability_tolerance must be positive, got {}",
                self.stability_tolerance
            ));
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            ));
        }
        if self.ad_tier.is_empty() {
            return Err("at least one [[ad_tier]] is required".to_string());
        }

        let mut seen = HashSet::new();
        for tier in &self.ad_tier {
            if !seen.insert(tier.name.as_str()) {
                return Err(format!("duplicate ad_tier '{}'", tier.name));
            }
            if !(tier.quality_threshold > 0.0 && tier.quality_threshold <= 1.0) {
                return Err(format!(
                    "ad_tier '{}': quality_threshold must be in (0, 1], got {}",
                    tier.name, tier.quality_threshold
                ));
            }
            if tier.required_signals.is_empty() {
                return Err(format!("ad_tier '{}' has no required_signals", tier.name));
            }
        }

        Ok(())
    }

    pub fn direction(&self, metric: Metric) -> Direction {
        if self.decreasing_signals.contains(&metric) {
            Direction::Decreasing
        } else {
            Direction::Increasing
        }
    }

    /// Resolve (dataset, tier) for a result file from its directory relative to the input root
    ///
    /// The longest `tier_map` key that is the directory itself or one of its
    /// ancestors wins, so `produced_digital/commercials` beats a bare
    /// `produced_digital` entry.
    pub fn lookup_dataset(&self, relative_dir: &str) -> Option<(&str, Tier)> {
        let relative_dir = relative_dir.trim_matches('/');
        self.tier_map
            .iter()
            .filter(|(key, _)| {
                relative_dir == key.as_str()
                    || relative_dir
                        .strip_prefix(key.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|(key, _)| key.len())
            .map(|(key, tier)| (key.as_str(), *tier))
    }
}
