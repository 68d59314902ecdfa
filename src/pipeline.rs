//! Stage orchestration
//!
//! Builds the corpus, runs every analysis stage over it and writes each
//! table to the output directory. Artifacts are written independently: a
//! failed write is recorded in the run report and the remaining artifacts are
//! still attempted.

use crate::aggregate::{
    aggregate_by_tier_fps, signal_stability, AGGREGATE_METRICS, STABILITY_METRICS,
    VARIANCE_METRICS,
};
use crate::cli::OutputFormat;
use crate::compare::{
    anova_by_fps, compare_studies, pairwise_by_checkpoint, ANOVA_METRICS,
    NORMALIZED_VALIDATION_VALUES, PAIRWISE_METRICS, RAW_VALIDATION_VALUES,
};
use crate::config::AnalysisConfig;
use crate::corpus::build_corpus;
use crate::csv_output::{self, CsvTable};
use crate::json_output::{JsonArtifact, JsonOutput};
use crate::record::{Fps, StudyType};
use crate::summary::publication_summary;
use crate::threshold::{derive_thresholds, THRESHOLD_METRICS};
use crate::tier_map::map_ad_tiers;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Share of `--expect-files` below which a warning is raised
pub const EXPECTED_FILE_FRACTION: f64 = 0.9;

pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// Everything a pipeline run needs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub analysis: AnalysisConfig,
    pub format: OutputFormat,
    pub expect_files: Option<usize>,
}

impl PipelineConfig {
    fn progress(&self, message: impl AsRef<str>) {
        if matches!(self.format, OutputFormat::Text) {
            println!("{}", message.as_ref());
        }
    }
}

/// Warning text when fewer than 90% of the expected files were found
pub fn file_count_warning(discovered: usize, expected: usize) -> Option<String> {
    ((discovered as f64) < expected as f64 * EXPECTED_FILE_FRACTION).then(|| {
        format!(
            "discovered {} result files, expected about {} (below {:.0}%)",
            discovered,
            expected,
            EXPECTED_FILE_FRACTION * 100.0
        )
    })
}

struct ArtifactWriter<'a> {
    config: &'a PipelineConfig,
    report: &'a mut JsonOutput,
}

impl ArtifactWriter<'_> {
    fn record(&mut self, name: &str, rows: usize, outcome: Result<()>) {
        let path = self.config.output.join(name);
        let error = match outcome {
            Ok(()) => {
                info!(artifact = name, rows, "artifact written");
                self.config.progress(format!("Saved: {}", path.display()));
                None
            }
            Err(e) => {
                error!(artifact = name, "{:#}", e);
                Some(format!("{:#}", e))
            }
        };
        self.report.add_artifact(JsonArtifact {
            name: name.to_string(),
            path: path.display().to_string(),
            rows,
            written: error.is_none(),
            error,
        });
    }

    fn table(&mut self, name: &str, table: CsvTable) {
        let outcome = table.write_to(&self.config.output.join(name));
        self.record(name, table.len(), outcome);
    }

    /// Record a stage that could not produce its table
    fn failed(&mut self, name: &str, err: anyhow::Error) {
        self.record(name, 0, Err(err));
    }
}

/// Run every stage and write all artifacts
///
/// Fails only when the input tree or output directory is unusable; artifact
/// failures are reported through `JsonOutput::failed_artifacts`.
pub fn run(config: &PipelineConfig) -> Result<JsonOutput> {
    let analysis = &config.analysis;
    let mut report = JsonOutput::new(
        config.input.display().to_string(),
        config.output.display().to_string(),
    );

    fs::create_dir_all(&config.output).with_context(|| {
        format!("Failed to create output directory: {}", config.output.display())
    })?;

    config.progress(format!("Loading results from {}", config.input.display()));
    let build = build_corpus(&config.input, analysis, analysis.duplicate_policy)?;
    let corpus = build.corpus;
    config.progress(format!(
        "Discovered {} result files: {} records, {} skipped",
        build.report.files_discovered, build.report.records, build.report.skipped
    ));

    if let Some(message) = config
        .expect_files
        .and_then(|expected| file_count_warning(build.report.files_discovered, expected))
    {
        warn!("{}", message);
        report.add_warning(message);
    }
    if build.report.duplicate_keys > 0 {
        report.add_warning(format!(
            "{} duplicate (video_id, fps) keys ({:?} policy)",
            build.report.duplicate_keys, analysis.duplicate_policy
        ));
    }
    let summary = corpus.summary();
    info!(
        records = summary.records,
        videos = summary.videos,
        by_tier = ?summary.by_tier,
        by_dataset = ?summary.by_dataset,
        fps_levels = summary.by_fps.len(),
        "corpus built"
    );
    report.set_ingest(build.report, summary);

    let mut writer = ArtifactWriter {
        config,
        report: &mut report,
    };

    writer.table("signals.csv", csv_output::signals_table(&corpus));

    let aggregates = aggregate_by_tier_fps(&corpus, &AGGREGATE_METRICS, &VARIANCE_METRICS);
    writer.table(
        "metrics_by_fps.csv",
        csv_output::metrics_by_fps_table(&aggregates, &AGGREGATE_METRICS, &VARIANCE_METRICS),
    );

    let stability = signal_stability(&corpus, &STABILITY_METRICS, analysis.stability_tolerance);
    writer.table("signal_stability.csv", csv_output::stability_table(&stability));

    let thresholds = derive_thresholds(&corpus, &THRESHOLD_METRICS, analysis);
    writer.table("fps_thresholds.csv", csv_output::thresholds_table(&thresholds));
    info!(rows = thresholds.len(), "thresholds derived");

    let mut stage_warnings = Vec::new();
    match map_ad_tiers(&corpus, analysis) {
        Ok(mapping) => {
            stage_warnings.extend(mapping.warnings);
            writer.table(
                "ad_tier_fps_mapping.csv",
                csv_output::tier_mapping_table(&mapping.rows, Fps(analysis.plateau_reference_fps)),
            );
        }
        Err(e) => writer.failed("ad_tier_fps_mapping.csv", e.into()),
    }

    let alpha = analysis.significance_level;
    let anova = anova_by_fps(&corpus, &ANOVA_METRICS, alpha);
    writer.table("anova_results.csv", csv_output::anova_table(&anova));

    let pairwise =
        pairwise_by_checkpoint(&corpus, &analysis.fps_checkpoints, &PAIRWISE_METRICS, alpha);
    writer.table("pairwise_comparisons.csv", csv_output::pairwise_table(&pairwise));

    let core = corpus.study(StudyType::Core);
    let validation = corpus.study(StudyType::Validation);
    if validation.is_empty() {
        let message = "no validation records found; validation comparisons are empty".to_string();
        warn!("{}", message);
        stage_warnings.push(message);
    }
    let raw = compare_studies(
        &core,
        &validation,
        &analysis.fps_checkpoints,
        &RAW_VALIDATION_VALUES,
        alpha,
    );
    writer.table("validation_comparison.csv", csv_output::validation_table(&raw));
    let normalized = compare_studies(
        &core,
        &validation,
        &analysis.fps_checkpoints,
        &NORMALIZED_VALIDATION_VALUES,
        alpha,
    );
    writer.table(
        "validation_comparison_normalized.csv",
        csv_output::validation_table(&normalized),
    );

    let summary = publication_summary(&corpus, &thresholds);
    writer.table(
        "publication_summary.csv",
        csv_output::publication_summary_table(&summary),
    );

    for message in stage_warnings {
        report.add_warning(message);
    }

    let summary_path = config.output.join(RUN_SUMMARY_FILE);
    let outcome = report
        .to_json()
        .and_then(|json| {
            fs::write(&summary_path, json)
                .with_context(|| format!("Failed to write {}", summary_path.display()))
        });
    ArtifactWriter {
        config,
        report: &mut report,
    }
    .record(RUN_SUMMARY_FILE, 0, outcome);

    if matches!(config.format, OutputFormat::Text) {
        for warning in &report.warnings {
            println!("Warning: {}", warning);
        }
        let failed = report.failed_artifacts().count();
        println!(
            "Wrote {} of {} artifacts to {}",
            report.artifacts.len() - failed,
            report.artifacts.len(),
            config.output.display()
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_count_warning() {
        assert!(file_count_warning(89, 100).is_some());
        assert!(file_count_warning(90, 100).is_none());
        assert!(file_count_warning(120, 100).is_none());
        assert!(file_count_warning(0, 0).is_none());
    }

    fn write_record(root: &std::path::Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_run_writes_every_artifact() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        for (fps, scenes) in [(1, 2), (10, 8), (24, 9), (60, 9)] {
            write_record(
                input.path(),
                &format!("ave/clip_{}.json", fps),
                &format!(
                    r#"{{"video_id": "clip", "fps": {}, "duration": 30,
                        "scene_signals": {{"scene_count": {}}}}}"#,
                    fps, scenes
                ),
            );
        }
        write_record(input.path(), "ave/broken.json", "{not json");

        let config = PipelineConfig {
            input: input.path().to_path_buf(),
            output: output.path().join("analysis"),
            analysis: AnalysisConfig::embedded().unwrap(),
            format: OutputFormat::Json,
            expect_files: Some(10),
        };
        let report = run(&config).unwrap();

        assert_eq!(report.failed_artifacts().count(), 0);
        assert_eq!(report.artifacts.len(), 11);
        for artifact in &report.artifacts {
            assert!(
                config.output.join(&artifact.name).exists(),
                "{} missing",
                artifact.name
            );
        }

        let ingest = report.ingest.as_ref().unwrap();
        assert_eq!(ingest.files_discovered, 5);
        assert_eq!(ingest.records, 4);
        assert_eq!(ingest.skipped, 1);
        assert!(report.warnings.iter().any(|w| w.contains("expected about 10")));
        assert!(report.warnings.iter().any(|w| w.contains("no validation records")));

        let mapping = fs::read_to_string(config.output.join("ad_tier_fps_mapping.csv")).unwrap();
        assert_eq!(mapping.lines().count(), 10);
    }

    #[test]
    fn test_run_missing_input_is_fatal() {
        let output = TempDir::new().unwrap();
        let config = PipelineConfig {
            input: output.path().join("does-not-exist"),
            output: output.path().join("analysis"),
            analysis: AnalysisConfig::embedded().unwrap(),
            format: OutputFormat::Json,
            expect_files: None,
        };
        assert!(run(&config).is_err());
    }
}
