use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Minimum confidence for a `bucket_dumping` to count as a passing.
    pub passing_min_confidence: f32,
    /// Minimum confidence for a `truck_full` to credit a ritase.
    pub ritase_min_confidence: f32,
    /// Detections below this never reach the counters.
    pub detection_threshold: f32,
    pub fps: f64,
    pub log_interval_frames: u64,
    /// Displayed cycle ids start here instead of 0.
    pub cycle_display_offset: u64,
    pub class_names: BTreeMap<i32, String>,
}

impl Default for Config {
    fn default() -> Self {
        let class_names = [
            (1, "bucket_digging"),
            (2, "bucket_dumping"),
            (3, "bucket_empty"),
            (4, "bucket_full"),
            (5, "truck_empty"),
            (6, "truck_full"),
        ]
        .into_iter()
        .map(|(id, name)| (id, name.to_string()))
        .collect();

        Self {
            passing_min_confidence: 0.8,
            ritase_min_confidence: 0.9,
            detection_threshold: 0.85,
            fps: 30.0,
            log_interval_frames: 200,
            cycle_display_offset: 1,
            class_names,
        }
    }
}

impl Config {
    /// Load from a JSON file. Missing fields fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: Config = serde_json::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("passing_min_confidence", self.passing_min_confidence),
            ("ritase_min_confidence", self.ritase_min_confidence),
            ("detection_threshold", self.detection_threshold),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        if self.log_interval_frames == 0 {
            return Err(Error::InvalidConfig(
                "log_interval_frames must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn class_name(&self, class_id: i32) -> Option<&str> {
        self.class_names.get(&class_id).map(String::as_str)
    }
}
