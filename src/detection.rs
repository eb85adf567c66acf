use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Bucket scooping material. Ends an excavator's passing cycle.
pub const BUCKET_DIGGING: i32 = 1;
/// Bucket emptying into a truck. Starts a passing, closes the global ritase cycle.
pub const BUCKET_DUMPING: i32 = 2;
/// Truck variant without a full load.
pub const TRUCK_EMPTY: i32 = 5;
/// Loaded truck. The only class that can credit a ritase.
pub const TRUCK_FULL: i32 = 6;

/// Trucks are tracked separately from buckets.
pub fn is_truck_class(class_id: i32) -> bool {
    class_id == TRUCK_EMPTY || class_id == TRUCK_FULL
}

/// Identity of a detection for deduplication: one tracker on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DetectionId {
    pub tracker_id: u32,
    pub frame_index: u64,
}

impl fmt::Display for DetectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.tracker_id, self.frame_index)
    }
}

// Reports carry the id in its "{tracker}_{frame}" form.
impl Serialize for DetectionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single detection after the external tracker assigned it an id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedDetection {
    pub tracker_id: u32,
    pub class_id: i32,
    pub frame_index: u64,
    pub confidence: f32,
}

impl TrackedDetection {
    pub fn new(tracker_id: u32, class_id: i32, frame_index: u64, confidence: f32) -> Self {
        Self {
            tracker_id,
            class_id,
            frame_index,
            confidence,
        }
    }

    pub fn id(&self) -> DetectionId {
        DetectionId {
            tracker_id: self.tracker_id,
            frame_index: self.frame_index,
        }
    }

    pub fn is_truck(&self) -> bool {
        is_truck_class(self.class_id)
    }
}

/// Split a frame's detections into (buckets, trucks), keeping their order.
pub fn split_by_object(
    detections: &[TrackedDetection],
) -> (Vec<TrackedDetection>, Vec<TrackedDetection>) {
    detections.iter().partition(|det| !det.is_truck())
}
