//! CSV output for the analysis tables
//!
//! Every artifact is a `CsvTable` built from the corresponding stage's rows.
//! Insufficient-data values render as empty cells.

use crate::aggregate::{FpsAggregate, StabilityRow};
use crate::compare::{AnovaRow, PairwiseRow, ValidationRow};
use crate::corpus::Corpus;
use crate::record::{Derived, Fps, Metric};
use crate::summary::TierSummary;
use crate::threshold::ThresholdResult;
use crate::tier_map::TierMapping;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Header plus pre-formatted rows
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new<S: Into<String>>(header: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn format_row(fields: &[String]) -> String {
        fields
            .iter()
            .map(|f| Self::escape_field(f))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(&Self::format_row(&self.header));
        output.push('\n');
        for row in &self.rows {
            output.push_str(&Self::format_row(row));
            output.push('\n');
        }
        output
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_csv())
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

fn num(value: f64) -> String {
    value.to_string()
}

fn derived(value: Derived<f64>) -> String {
    value.computed().map(num).unwrap_or_default()
}

/// Full corpus, one row per record
pub fn signals_table(corpus: &Corpus) -> CsvTable {
    let mut header = vec![
        "video_id",
        "fps",
        "frame_count",
        "duration",
        "dataset",
        "tier",
        "study_type",
        "source_fps",
    ];
    header.extend(Metric::ALL.iter().map(|m| m.name()));

    let mut table = CsvTable::new(header);
    for record in corpus.records() {
        let mut row = vec![
            record.video_id.clone(),
            record.fps.to_string(),
            num(record.frame_count),
            num(record.duration),
            record.dataset.clone(),
            record.tier.to_string(),
            record.study_type.to_string(),
            num(record.source_fps),
        ];
        row.extend(record.metrics.iter().map(|(_, v)| num(v)));
        table.add_row(row);
    }
    table
}

/// Per-(tier, fps) means, `<metric>_std` deviations and video counts
pub fn metrics_by_fps_table(rows: &[FpsAggregate], means: &[Metric], stddevs: &[Metric]) -> CsvTable {
    let mut header = vec!["tier".to_string(), "fps".to_string(), "frame_count".to_string()];
    header.extend(means.iter().map(|m| m.name().to_string()));
    header.extend(stddevs.iter().map(|m| format!("{}_std", m)));
    header.push("video_count".to_string());

    let mut table = CsvTable::new(header);
    for row in rows {
        let mut fields = vec![row.tier.to_string(), row.fps.to_string(), num(row.frame_count_mean)];
        fields.extend(
            means
                .iter()
                .map(|m| row.means.get(m).copied().map(num).unwrap_or_default()),
        );
        fields.extend(stddevs.iter().map(|m| {
            row.stddevs
                .get(m)
                .copied()
                .map(derived)
                .unwrap_or_default()
        }));
        fields.push(row.video_count.to_string());
        table.add_row(fields);
    }
    table
}

pub fn stability_table(rows: &[StabilityRow]) -> CsvTable {
    let mut table = CsvTable::new([
        "tier",
        "video_id",
        "metric",
        "cv",
        "stable_fps",
        "min_value",
        "max_value",
    ]);
    for row in rows {
        table.add_row(vec![
            row.tier.to_string(),
            row.video_id.clone(),
            row.metric.to_string(),
            num(row.cv),
            row.stable_fps.to_string(),
            num(row.min_value),
            num(row.max_value),
        ]);
    }
    table
}

pub fn thresholds_table(rows: &[ThresholdResult]) -> CsvTable {
    let mut table = CsvTable::new([
        "tier",
        "metric",
        "direction",
        "optimal_fps_90pct",
        "optimal_fps_diminishing",
        "max_value",
        "min_value",
        "range",
    ]);
    for row in rows {
        table.add_row(vec![
            row.tier.to_string(),
            row.metric.to_string(),
            row.direction.as_str().to_string(),
            row.optimal_fps_90pct.to_string(),
            row.optimal_fps_diminishing.to_string(),
            num(row.max_value),
            num(row.min_value),
            num(row.range),
        ]);
    }
    table
}

/// Dense AD tier table
///
/// An unmappable pair still gets a row: `required_fps` carries `fallback`
/// and `status` reads `insufficient_data`.
pub fn tier_mapping_table(rows: &[TierMapping], fallback: Fps) -> CsvTable {
    let mut table = CsvTable::new([
        "ad_tier",
        "content_tier",
        "required_fps",
        "threshold",
        "signals_checked",
        "signal_fps",
        "status",
    ]);
    for row in rows {
        let breakdown = row
            .signals
            .iter()
            .map(|s| match s.fps {
                Derived::Computed(fps) => format!("{}={}", s.metric, fps),
                Derived::InsufficientData => format!("{}=", s.metric),
            })
            .collect::<Vec<_>>()
            .join(";");

        table.add_row(vec![
            row.ad_tier.clone(),
            row.content_tier.to_string(),
            row.required_fps.computed().unwrap_or(fallback).to_string(),
            num(row.quality_threshold),
            row.signals_checked().to_string(),
            breakdown,
            row.required_fps.status().to_string(),
        ]);
    }
    table
}

pub fn anova_table(rows: &[AnovaRow]) -> CsvTable {
    let mut table = CsvTable::new([
        "fps",
        "metric",
        "f_statistic",
        "p_value",
        "eta_squared",
        "significant",
        "effect_size",
    ]);
    for row in rows {
        table.add_row(vec![
            row.fps.to_string(),
            row.metric.to_string(),
            num(row.f_statistic),
            num(row.p_value),
            num(row.eta_squared),
            row.significant.to_string(),
            row.effect_size.as_str().to_string(),
        ]);
    }
    table
}

pub fn pairwise_table(rows: &[PairwiseRow]) -> CsvTable {
    let mut table = CsvTable::new([
        "fps",
        "metric",
        "comparison",
        "t_statistic",
        "p_value",
        "cohens_d",
        "significant",
        "mean_diff",
    ]);
    for row in rows {
        table.add_row(vec![
            row.fps.to_string(),
            row.metric.to_string(),
            row.comparison(),
            num(row.t_statistic),
            num(row.p_value),
            num(row.cohens_d),
            row.significant.to_string(),
            num(row.mean_diff),
        ]);
    }
    table
}

pub fn validation_table(rows: &[ValidationRow]) -> CsvTable {
    let mut table = CsvTable::new([
        "fps",
        "metric",
        "core_mean",
        "val_mean",
        "difference",
        "pct_diff",
        "t_statistic",
        "p_value",
        "significant",
    ]);
    for row in rows {
        table.add_row(vec![
            row.fps.to_string(),
            row.value.to_string(),
            num(row.core_mean),
            num(row.val_mean),
            num(row.difference),
            num(row.pct_diff),
            num(row.t_statistic),
            num(row.p_value),
            row.significant.to_string(),
        ]);
    }
    table
}

pub fn publication_summary_table(rows: &[TierSummary]) -> CsvTable {
    let mut table = CsvTable::new([
        "Tier",
        "Videos",
        "Records",
        "Avg 90% Threshold FPS",
        "Avg Diminishing Returns FPS",
        "Recommended FPS",
    ]);
    for row in rows {
        let fixed = |value: Derived<f64>, places: usize| {
            value
                .computed()
                .map(|v| format!("{:.*}", places, v))
                .unwrap_or_default()
        };
        table.add_row(vec![
            row.tier.display_name().to_string(),
            row.videos.to_string(),
            row.records.to_string(),
            fixed(row.avg_fps_90pct, 1),
            fixed(row.avg_fps_diminishing, 1),
            fixed(row.recommended_fps(), 0),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Direction;
    use crate::record::{MetricValues, SignalRecord, StudyType, Tier};
    use crate::tier_map::SignalFps;
    use std::collections::BTreeMap;

    #[test]
    fn test_csv_escape_field_simple() {
        assert_eq!(CsvTable::escape_field("hello"), "hello");
    }

    #[test]
    fn test_csv_escape_field_with_comma() {
        assert_eq!(CsvTable::escape_field("hello,world"), "\"hello,world\"");
    }

    #[test]
    fn test_csv_escape_field_with_quote() {
        assert_eq!(CsvTable::escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_empty_table_has_header_only() {
        let table = thresholds_table(&[]);
        assert!(table.is_empty());
        assert_eq!(
            table.to_csv(),
            "tier,metric,direction,optimal_fps_90pct,optimal_fps_diminishing,max_value,min_value,range\n"
        );
    }

    #[test]
    fn test_thresholds_row() {
        let table = thresholds_table(&[ThresholdResult {
            tier: Tier::Cinema,
            metric: Metric::SceneCount,
            direction: Direction::Increasing,
            optimal_fps_90pct: Fps(24.0),
            optimal_fps_diminishing: Fps(60.0),
            max_value: 9.5,
            min_value: 2.0,
            range: 7.5,
        }]);
        let csv = table.to_csv();
        assert_eq!(csv.lines().nth(1), Some("cinema,scene_count,increasing,24,60,9.5,2,7.5"));
    }

    #[test]
    fn test_signals_table_columns() {
        let mut metrics = MetricValues::default();
        metrics.set(Metric::SceneCount, 4.0);
        let corpus = Corpus::new(vec![SignalRecord {
            video_id: "clip, one".to_string(),
            fps: Fps(2.5),
            frame_count: 75.0,
            duration: 30.0,
            dataset: "ave".to_string(),
            tier: Tier::Cinema,
            study_type: StudyType::Core,
            source_fps: 24.0,
            metrics,
        }]);
        let table = signals_table(&corpus);
        let csv = table.to_csv();
        let header: Vec<&str> = csv.lines().next().unwrap().split(',').collect();
        assert_eq!(header.len(), 8 + Metric::COUNT);
        assert!(csv.lines().nth(1).unwrap().starts_with("\"clip, one\",2.5,75,30,ave,cinema,core,24,4,"));
    }

    #[test]
    fn test_metrics_by_fps_insufficient_std_is_empty() {
        let row = FpsAggregate {
            tier: Tier::WebUgc,
            fps: Fps(1.0),
            video_count: 1,
            frame_count_mean: 30.0,
            means: BTreeMap::from([(Metric::SceneCount, 3.0)]),
            stddevs: BTreeMap::from([(Metric::SceneCount, Derived::InsufficientData)]),
        };
        let table = metrics_by_fps_table(&[row], &[Metric::SceneCount], &[Metric::SceneCount]);
        let csv = table.to_csv();
        assert_eq!(csv.lines().next(), Some("tier,fps,frame_count,scene_count,scene_count_std,video_count"));
        assert_eq!(csv.lines().nth(1), Some("web_ugc,1,30,3,,1"));
    }

    #[test]
    fn test_tier_mapping_fallback_and_breakdown() {
        let rows = vec![
            TierMapping {
                ad_tier: "Compliance AD".to_string(),
                content_tier: Tier::Cinema,
                quality_threshold: 0.8,
                required_fps: Derived::Computed(Fps(24.0)),
                signals: vec![
                    SignalFps { metric: Metric::SceneCount, fps: Derived::Computed(Fps(10.0)) },
                    SignalFps { metric: Metric::UniqueObjectCount, fps: Derived::Computed(Fps(24.0)) },
                ],
            },
            TierMapping {
                ad_tier: "Compliance AD".to_string(),
                content_tier: Tier::WebUgc,
                quality_threshold: 0.8,
                required_fps: Derived::InsufficientData,
                signals: vec![SignalFps { metric: Metric::SceneCount, fps: Derived::InsufficientData }],
            },
        ];
        let csv = tier_mapping_table(&rows, Fps(60.0)).to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[1],
            "Compliance AD,cinema,24,0.8,2,scene_count=10;unique_object_count=24,computed"
        );
        assert_eq!(lines[2], "Compliance AD,web_ugc,60,0.8,0,scene_count=,insufficient_data");
    }

    #[test]
    fn test_publication_summary_formatting() {
        let rows = vec![TierSummary {
            tier: Tier::ProducedDigital,
            videos: 3,
            records: 12,
            avg_fps_90pct: Derived::Computed(17.0),
            avg_fps_diminishing: Derived::Computed(34.6),
        }];
        let csv = publication_summary_table(&rows).to_csv();
        assert_eq!(csv.lines().nth(1), Some("Produced Digital,3,12,17.0,34.6,35"));
    }
}
