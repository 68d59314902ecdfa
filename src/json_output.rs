//! JSON run report
//!
//! Written as `run_summary.json` next to the tables, and printed to stdout
//! with `--format json`.

use crate::corpus::{CorpusSummary, IngestReport};
use serde::{Deserialize, Serialize};

/// Write outcome of one artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonArtifact {
    /// File name relative to the output directory
    pub name: String,
    pub path: String,
    /// Data rows (header excluded)
    pub rows: usize,
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Complete run report
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub version: String,
    pub input_root: String,
    pub output_dir: String,
    pub ingest: Option<IngestReport>,
    pub corpus: Option<CorpusSummary>,
    pub warnings: Vec<String>,
    pub artifacts: Vec<JsonArtifact>,
}

impl JsonOutput {
    pub fn new(input_root: impl Into<String>, output_dir: impl Into<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            input_root: input_root.into(),
            output_dir: output_dir.into(),
            ingest: None,
            corpus: None,
            warnings: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn set_ingest(&mut self, ingest: IngestReport, corpus: CorpusSummary) {
        self.ingest = Some(ingest);
        self.corpus = Some(corpus);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn add_artifact(&mut self, artifact: JsonArtifact) {
        self.artifacts.push(artifact);
    }

    /// Artifacts whose write failed
    pub fn failed_artifacts(&self) -> impl Iterator<Item = &JsonArtifact> {
        self.artifacts.iter().filter(|a| !a.written)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
