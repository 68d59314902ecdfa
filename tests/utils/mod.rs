// Integration test utilities
//
// Builds result-file trees in a TempDir shaped like the upstream extractor's
// output: <dataset dir>/<video>_<fps>fps.json

#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct ResultTree {
    pub dir: TempDir,
}

impl ResultTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("analysis")
    }

    /// Input root, separate from the output directory
    pub fn input(&self) -> PathBuf {
        self.dir.path().join("results")
    }

    pub fn write_json(&self, rel: &str, value: &Value) -> PathBuf {
        self.write_raw(rel, &serde_json::to_string_pretty(value).unwrap())
    }

    pub fn write_raw(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.input().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    /// One measurement file under `dataset_dir`, tier taken from the directory
    pub fn add_measurement(&self, dataset_dir: &str, video_id: &str, fps: f64, scene_count: f64) {
        let record = measurement(video_id, fps, 30.0, scene_count);
        self.write_json(&format!("{}/{}_{}fps.json", dataset_dir, video_id, fps), &record);
    }

    pub fn read_output(&self, name: &str) -> String {
        fs::read_to_string(self.output().join(name)).unwrap()
    }
}

/// A complete raw record with every signal group populated
pub fn measurement(video_id: &str, fps: f64, duration: f64, scene_count: f64) -> Value {
    json!({
        "video_id": video_id,
        "fps": fps,
        "frame_count": (fps * duration).round(),
        "duration": duration,
        "scene_signals": {
            "scene_count": scene_count,
            "transition_count": (scene_count - 1.0).max(0.0),
            "scene_duration_mean": duration / scene_count.max(1.0),
            "scene_duration_std": 1.5
        },
        "character_signals": {
            "person_count_mean": 1.2,
            "person_count_max": 3,
            "character_consistency": 0.8,
            "entry_exit_total": 4
        },
        "visual_signals": {
            "unique_object_count": scene_count * 2.0,
            "persistent_object_count": 2,
            "objects_per_frame": [2, 3, null, 4]
        },
        "atmosphere_signals": {
            "brightness_mean": 0.45,
            "brightness_std": 0.1,
            "contrast_mean": 0.6,
            "dominant_colors": [[12, 40, 80], [200, 180, 160]]
        },
        "action_signals": {
            "intensity_mean": 0.3,
            "intensity_max": 0.9,
            "peak_count": 2
        },
        "temporal_signals": {
            "change_score_mean": 0.2,
            "temporal_density": scene_count / duration
        },
        "metadata": {
            "source_fps": 24.0
        }
    })
}

/// Parse CSV text into rows of fields (no quoted fields expected)
pub fn csv_rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

/// Value of `column` in every data row
pub fn column(text: &str, column: &str) -> Vec<String> {
    let rows = csv_rows(text);
    let index = rows[0].iter().position(|h| h == column).unwrap();
    rows[1..].iter().map(|r| r[index].clone()).collect()
}
