use serde::{Deserialize, Serialize};
use std::io::BufRead;

use crate::detection::TrackedDetection;
use crate::error::{Error, Result};

/// One tracked detection as written by the tracking stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionLog {
    pub tracker_id: u32,
    pub class_id: i32,
    pub confidence: f32,
}

/// All tracked detections of a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameLog {
    pub frame_index: u64,
    #[serde(default)]
    pub detections: Vec<DetectionLog>,
}

impl FrameLog {
    pub fn tracked_detections(&self) -> Vec<TrackedDetection> {
        self.detections
            .iter()
            .map(|det| {
                TrackedDetection::new(
                    det.tracker_id,
                    det.class_id,
                    self.frame_index,
                    det.confidence,
                )
            })
            .collect()
    }
}

/// Read a JSON-lines frame log, one `FrameLog` per non-blank line.
pub fn read_frame_logs<R: BufRead>(reader: R) -> Result<Vec<FrameLog>> {
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: FrameLog = serde_json::from_str(&line).map_err(|source| Error::FrameLog {
            line: index + 1,
            source,
        })?;
        frames.push(frame);
    }
    Ok(frames)
}
