use crate::detection::TrackedDetection;

/// Contract shared by the passing and ritase counters.
///
/// The frame driver talks to both counters through this trait, so every
/// counter must provide a reset even when its depth differs.
pub trait CycleCounter {
    /// Feed one detection. Returns true when it credited a new event.
    fn process_detection(&mut self, detection: &TrackedDetection) -> bool;

    /// Reset the running counts at the start of a new hauling cycle.
    fn reset_counters(&mut self);

    /// Count for one tracker, or the grand total when `tracker_id` is None.
    fn count(&self, tracker_id: Option<u32>) -> u32;
}
