//! AD tier mapping
//!
//! Maps every (AD tier, content tier) pair to the FPS that satisfies all of
//! the AD tier's required signals: each signal's plateau threshold is derived
//! at the AD tier's own quality threshold, and the required FPS is the
//! maximum across signals.

use crate::aggregate::MeanCurve;
use crate::config::{AdTierRequirement, AnalysisConfig, MissingSignalPolicy};
use crate::corpus::Corpus;
use crate::record::{Derived, Fps, Metric, Tier};
use crate::threshold::directional_threshold;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierMapError {
    #[error("AD tier '{ad_tier}' requires unknown signal '{signal}'")]
    UnknownSignal { ad_tier: String, signal: String },
}

/// Threshold FPS of one required signal for one content tier
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFps {
    pub metric: Metric,
    pub fps: Derived<Fps>,
}

/// One row of the AD tier mapping table
#[derive(Debug, Clone, PartialEq)]
pub struct TierMapping {
    pub ad_tier: String,
    pub content_tier: Tier,
    pub quality_threshold: f64,
    /// Insufficient when none of the required signals could be evaluated
    pub required_fps: Derived<Fps>,
    pub signals: Vec<SignalFps>,
}

impl TierMapping {
    /// Number of signals that contributed to the max
    pub fn signals_checked(&self) -> usize {
        self.signals.iter().filter(|s| s.fps.is_computed()).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TierMapOutput {
    pub rows: Vec<TierMapping>,
    pub warnings: Vec<String>,
}

/// Maximum of the per-signal thresholds; `None` for an empty set
pub fn required_fps<I>(signal_fps: I) -> Option<Fps>
where
    I: IntoIterator<Item = Fps>,
{
    signal_fps.into_iter().max()
}

/// Resolve an AD tier's signal names, applying the missing-signal policy to unknown ones
fn resolve_signals(
    requirement: &AdTierRequirement,
    policy: MissingSignalPolicy,
    warnings: &mut Vec<String>,
) -> Result<Vec<Metric>, TierMapError> {
    let mut metrics = Vec::with_capacity(requirement.required_signals.len());
    for name in &requirement.required_signals {
        match name.parse::<Metric>() {
            Ok(metric) => metrics.push(metric),
            Err(_) => match policy {
                MissingSignalPolicy::Warn => {
                    let message = format!(
                        "AD tier '{}' requires unknown signal '{}'; excluded from required FPS",
                        requirement.name, name
                    );
                    warn!("{}", message);
                    warnings.push(message);
                }
                MissingSignalPolicy::Error => {
                    return Err(TierMapError::UnknownSignal {
                        ad_tier: requirement.name.clone(),
                        signal: name.clone(),
                    });
                }
            },
        }
    }
    Ok(metrics)
}

/// Build the dense (AD tier × content tier) mapping table
pub fn map_ad_tiers(corpus: &Corpus, config: &AnalysisConfig) -> Result<TierMapOutput, TierMapError> {
    let mut output = TierMapOutput::default();

    for requirement in &config.ad_tier {
        let metrics = resolve_signals(requirement, config.missing_signal_policy, &mut output.warnings)?;

        for content_tier in Tier::ALL {
            let signals: Vec<SignalFps> = metrics
                .iter()
                .map(|&metric| {
                    let curve = MeanCurve::from_records(corpus.tier(content_tier), metric);
                    let fps = directional_threshold(
                        &curve,
                        config.direction(metric),
                        requirement.quality_threshold,
                        config,
                    );
                    SignalFps {
                        metric,
                        fps: fps.into(),
                    }
                })
                .collect();

            let required =
                required_fps(signals.iter().filter_map(|s| s.fps.computed())).into();
            if required == Derived::InsufficientData {
                let message = format!(
                    "no data to map '{}' for content tier {}",
                    requirement.name, content_tier
                );
                warn!("{}", message);
                output.warnings.push(message);
            }

            output.rows.push(TierMapping {
                ad_tier: requirement.name.clone(),
                content_tier,
                quality_threshold: requirement.quality_threshold,
                required_fps: required,
                signals,
            });
        }
    }

    Ok(output)
}
