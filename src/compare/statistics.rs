// Hypothesis tests and effect sizes
//
// Wraps aprender's t-test and one-way ANOVA over f32 samples; samples arrive
// as f64 from the corpus and results are widened back. Effect sizes are
// computed in f64 from the means and deviations in crate::stats.

use crate::stats;
use anyhow::Result;

/// Result of a two-sample Student's t-test
#[derive(Debug, Clone, PartialEq)]
pub struct TwoSampleTest {
    pub statistic: f64,
    /// Two-tailed p-value
    pub pvalue: f64,
    pub mean_a: f64,
    pub mean_b: f64,
}

impl TwoSampleTest {
    pub fn mean_diff(&self) -> f64 {
        self.mean_a - self.mean_b
    }
}

/// Result of a one-way ANOVA across k groups
#[derive(Debug, Clone, PartialEq)]
pub struct AnovaTest {
    pub statistic: f64,
    pub pvalue: f64,
    pub eta_squared: f64,
}

/// Eta-squared classification bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectSize {
    Small,
    Medium,
    Large,
}

impl EffectSize {
    /// > 0.14 large, > 0.06 medium, otherwise small
    pub fn from_eta_squared(eta_squared: f64) -> Self {
        if eta_squared > 0.14 {
            EffectSize::Large
        } else if eta_squared > 0.06 {
            EffectSize::Medium
        } else {
            EffectSize::Small
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EffectSize::Small => "small",
            EffectSize::Medium => "medium",
            EffectSize::Large => "large",
        }
    }
}

fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}

fn finite(value: f32, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(f64::from(value))
    } else {
        anyhow::bail!("{} is not finite", what)
    }
}

/// Independent two-sample t-test assuming equal variances
pub fn student_ttest(a: &[f64], b: &[f64]) -> Result<TwoSampleTest> {
    if a.len() < 2 || b.len() < 2 {
        anyhow::bail!("Need at least 2 samples per group for t-test");
    }

    let result = aprender::stats::hypothesis::ttest_ind(&to_f32(a), &to_f32(b), true)
        .map_err(|e| anyhow::anyhow!("Failed to compute t-test: {}", e))?;

    Ok(TwoSampleTest {
        statistic: finite(result.statistic, "t statistic")?,
        pvalue: finite(result.pvalue, "t-test p-value")?,
        mean_a: stats::mean(a).unwrap_or(0.0),
        mean_b: stats::mean(b).unwrap_or(0.0),
    })
}

/// One-way ANOVA with eta-squared effect size
pub fn one_way_anova(groups: &[Vec<f64>]) -> Result<AnovaTest> {
    if groups.len() < 2 {
        anyhow::bail!("Need at least 2 groups for ANOVA");
    }
    if groups.iter().any(|g| g.len() < 2) {
        anyhow::bail!("Need at least 2 samples per group for ANOVA");
    }

    let narrowed: Vec<Vec<f32>> = groups.iter().map(|g| to_f32(g)).collect();
    let result = aprender::stats::hypothesis::f_oneway(&narrowed)
        .map_err(|e| anyhow::anyhow!("Failed to compute ANOVA: {}", e))?;

    Ok(AnovaTest {
        statistic: finite(result.statistic, "F statistic")?,
        pvalue: finite(result.pvalue, "ANOVA p-value")?,
        eta_squared: eta_squared(groups),
    })
}

/// Between-group share of the total sum of squares; 0.0 without variance
pub fn eta_squared(groups: &[Vec<f64>]) -> f64 {
    let all: Vec<f64> = groups.iter().flatten().copied().collect();
    let Some(grand_mean) = stats::mean(&all) else {
        return 0.0;
    };

    let ss_between: f64 = groups
        .iter()
        .filter_map(|g| stats::mean(g).map(|m| g.len() as f64 * (m - grand_mean).powi(2)))
        .sum();
    let ss_total: f64 = all.iter().map(|v| (v - grand_mean).powi(2)).sum();

    if ss_total > 0.0 {
        ss_between / ss_total
    } else {
        0.0
    }
}

/// Cohen's d with pooled standard deviation; 0.0 when the pooled deviation is 0
///
/// The pooled deviation combines the groups' population deviations weighted
/// by n - 1.
pub fn cohens_d(a: &[f64], b: &[f64]) -> f64 {
    let (n_a, n_b) = (a.len() as f64, b.len() as f64);
    if n_a + n_b <= 2.0 {
        return 0.0;
    }
    let (Some(mean_a), Some(mean_b)) = (stats::mean(a), stats::mean(b)) else {
        return 0.0;
    };
    let std_a = stats::population_stddev(a).unwrap_or(0.0);
    let std_b = stats::population_stddev(b).unwrap_or(0.0);

    let pooled =
        (((n_a - 1.0) * std_a.powi(2) + (n_b - 1.0) * std_b.powi(2)) / (n_a + n_b - 2.0)).sqrt();
    if pooled > 0.0 {
        (mean_a - mean_b) / pooled
    } else {
        0.0
    }
}
