//! Corpus builder: discover, parse and normalize every result file
//!
//! Each JSON file under the input root is one (video, FPS) measurement.
//! Files are processed independently (in parallel); a file that cannot be
//! read, parsed or normalized is counted as a skip and never aborts the
//! batch. The resulting corpus is an immutable snapshot consumed by every
//! later stage.

use crate::config::{AnalysisConfig, DuplicatePolicy};
use crate::normalize::{normalize, parse_record, SkipReason};
use crate::record::{Fps, SignalRecord, StudyType, Tier};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Per-file ingestion failure (counted, never fatal)
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: invalid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{}: {reason}", .path.display())]
    Skipped { path: PathBuf, reason: SkipReason },
}

impl IngestError {
    pub fn key(&self) -> &'static str {
        match self {
            IngestError::Io { .. } => "io_error",
            IngestError::Json { .. } => "invalid_json",
            IngestError::Skipped { reason, .. } => reason.key(),
        }
    }
}

/// Corpus-level failures
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("duplicate record for video '{video_id}' at {fps} fps in {study_type} study")]
    DuplicateKey {
        study_type: StudyType,
        video_id: String,
        fps: Fps,
    },
}

/// Full collection of normalized signal records
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<SignalRecord>,
}

impl Corpus {
    pub fn new(records: Vec<SignalRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SignalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one study type as a new corpus
    pub fn study(&self, study_type: StudyType) -> Corpus {
        Corpus::new(
            self.records
                .iter()
                .filter(|r| r.study_type == study_type)
                .cloned()
                .collect(),
        )
    }

    pub fn tier(&self, tier: Tier) -> impl Iterator<Item = &SignalRecord> {
        self.records.iter().filter(move |r| r.tier == tier)
    }

    /// Distinct FPS levels, ascending
    pub fn fps_levels(&self) -> Vec<Fps> {
        self.records
            .iter()
            .map(|r| r.fps)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn unique_videos(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.video_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn summary(&self) -> CorpusSummary {
        let mut by_tier = BTreeMap::new();
        let mut by_dataset = BTreeMap::new();
        let mut by_fps: BTreeMap<Fps, usize> = BTreeMap::new();
        let mut by_study = BTreeMap::new();

        for record in &self.records {
            *by_tier.entry(record.tier.as_str().to_string()).or_insert(0) += 1;
            *by_dataset.entry(record.dataset.clone()).or_insert(0) += 1;
            *by_fps.entry(record.fps).or_insert(0) += 1;
            *by_study
                .entry(record.study_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        CorpusSummary {
            records: self.len(),
            videos: self.unique_videos(),
            by_tier,
            by_dataset,
            by_study,
            by_fps: by_fps
                .into_iter()
                .map(|(fps, records)| FpsCount {
                    fps: fps.value(),
                    records,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FpsCount {
    pub fps: f64,
    pub records: usize,
}

/// Record counts by tier, FPS level, dataset and study
#[derive(Debug, Clone, Serialize)]
pub struct CorpusSummary {
    pub records: usize,
    pub videos: usize,
    pub by_tier: BTreeMap<String, usize>,
    pub by_dataset: BTreeMap<String, usize>,
    pub by_study: BTreeMap<String, usize>,
    pub by_fps: Vec<FpsCount>,
}

/// Ingestion bookkeeping reported to the operator
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub files_discovered: usize,
    pub records: usize,
    pub skipped: usize,
    pub skipped_by_reason: BTreeMap<String, usize>,
    /// (study_type, video_id, fps) keys seen more than once
    pub duplicate_keys: usize,
    /// Records removed by the keep-first duplicate policy
    pub duplicates_dropped: usize,
}

/// Corpus plus the report of how it was built
#[derive(Debug)]
pub struct CorpusBuild {
    pub corpus: Corpus,
    pub report: IngestReport,
}

/// Recursively list `.json` files under `root`, sorted by path
///
/// Symlinked directories are skipped, so link cycles cannot recurse forever.
pub fn discover_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read result directory: {}", dir.display()))?;
        for entry in entries {
            let entry = entry
                .with_context(|| format!("Failed to list result directory: {}", dir.display()))?;
            let path = entry.path();
            // file_type does not follow symlinks; linked directories are not descended
            let file_type = entry
                .file_type()
                .with_context(|| format!("Failed to stat {}", path.display()))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Directory of `path` relative to `root`, `/`-separated
fn relative_dir(root: &Path, path: &Path) -> String {
    path.parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

/// Read, parse and normalize one result file
pub fn ingest_file(
    root: &Path,
    path: &Path,
    config: &AnalysisConfig,
) -> Result<SignalRecord, IngestError> {
    let bytes = fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut raw = parse_record(&bytes).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some((dataset, tier)) = config.lookup_dataset(&relative_dir(root, path)) {
        raw.apply_source_defaults(dataset, tier);
    }

    normalize(&raw).map_err(|reason| IngestError::Skipped {
        path: path.to_path_buf(),
        reason,
    })
}

/// Build the corpus from every result file under `root`
///
/// Only an unreadable root directory is fatal; per-file failures become skips.
/// `corpus.len() + report.skipped == report.files_discovered` unless the
/// keep-first duplicate policy dropped records.
pub fn build_corpus(
    root: &Path,
    config: &AnalysisConfig,
    duplicates: DuplicatePolicy,
) -> Result<CorpusBuild> {
    let files = discover_files(root)?;
    info!(files = files.len(), root = %root.display(), "discovered result files");

    let outcomes: Vec<Result<SignalRecord, IngestError>> = files
        .par_iter()
        .map(|path| ingest_file(root, path, config))
        .collect();

    let mut report = IngestReport {
        files_discovered: files.len(),
        ..Default::default()
    };
    let mut records = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        match outcome {
            Ok(record) => records.push(record),
            Err(err) => {
                debug!(error = %err, "skipped result file");
                report.skipped += 1;
                *report
                    .skipped_by_reason
                    .entry(err.key().to_string())
                    .or_insert(0) += 1;
            }
        }
    }

    let (records, duplicate_keys, dropped) = apply_duplicate_policy(records, duplicates)?;
    if duplicate_keys > 0 {
        warn!(
            duplicate_keys,
            dropped,
            policy = ?duplicates,
            "duplicate (video_id, fps) keys in corpus"
        );
    }

    report.records = records.len();
    report.duplicate_keys = duplicate_keys;
    report.duplicates_dropped = dropped;

    Ok(CorpusBuild {
        corpus: Corpus::new(records),
        report,
    })
}

/// Returns (records, duplicated key count, dropped record count)
pub fn apply_duplicate_policy(
    records: Vec<SignalRecord>,
    policy: DuplicatePolicy,
) -> Result<(Vec<SignalRecord>, usize, usize), CorpusError> {
    let mut seen: HashMap<(StudyType, String, Fps), usize> = HashMap::new();
    let mut kept = Vec::with_capacity(records.len());
    let mut dropped = 0;

    for record in records {
        let key = (record.study_type, record.video_id.clone(), record.fps);
        let count = seen.entry(key).or_insert(0);
        *count += 1;

        if *count > 1 {
            match policy {
                DuplicatePolicy::Average => kept.push(record),
                DuplicatePolicy::KeepFirst => dropped += 1,
                DuplicatePolicy::Error => {
                    return Err(CorpusError::DuplicateKey {
                        study_type: record.study_type,
                        video_id: record.video_id,
                        fps: record.fps,
                    })
                }
            }
        } else {
            kept.push(record);
        }
    }

    let duplicate_keys = seen.values().filter(|&&c| c > 1).count();
    Ok((kept, duplicate_keys, dropped))
}
