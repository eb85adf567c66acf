use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::counter::CycleCounter;
use crate::detection::{DetectionId, TrackedDetection, BUCKET_DUMPING};

/// A qualifying dump detection kept in an excavator's cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DumpCandidate {
    pub dump_id: DetectionId,
    pub frame_index: u64,
    pub confidence: f32,
}

/// Per-excavator state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExcavatorState {
    pub passing_count: u32,
    /// Highest-confidence dump of the current cycle. None arms the next passing.
    pub best_dump: Option<DumpCandidate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassingStatistics {
    pub total_passing: u32,
    pub excavators: BTreeMap<u32, ExcavatorState>,
}

/// Counts bucket dump cycles per excavator.
///
/// A cycle credits exactly one passing: the first qualifying `bucket_dumping`
/// detection. Later dumps in the same cycle may replace the best candidate
/// when more confident but never add to the count. The cycle ends when the
/// driver calls [`PassingCounter::end_cycle`] on a `bucket_digging` detection.
#[derive(Debug)]
pub struct PassingCounter {
    excavators: BTreeMap<u32, ExcavatorState>,
    counted_dumps: HashSet<DetectionId>,
    min_confidence: f32,
    total_passing: u32,
    active_cycle: HashMap<u32, Vec<DumpCandidate>>,
}

impl PassingCounter {
    pub fn new(min_confidence: f32) -> Self {
        info!(min_confidence, "passing counter initialized");
        Self {
            excavators: BTreeMap::new(),
            counted_dumps: HashSet::new(),
            min_confidence,
            total_passing: 0,
            active_cycle: HashMap::new(),
        }
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Close the excavator's current cycle so its next qualifying dump counts.
    pub fn end_cycle(&mut self, tracker_id: u32) {
        let Some(detections) = self.active_cycle.get_mut(&tracker_id) else {
            return;
        };
        detections.clear();

        if let Some(excavator) = self.excavators.get_mut(&tracker_id) {
            excavator.best_dump = None;
        }
        debug!(excavator = tracker_id, "passing cycle ended");
    }

    /// Zero every count and forget all seen dumps.
    ///
    /// This is deeper than the ritase counter's reset, which keeps its seen
    /// set and cycle numbering. Previously counted identities can be counted
    /// again after this call. Whether the two depths should match is still
    /// open with the site operators.
    pub fn reset_all_counters(&mut self) {
        for excavator in self.excavators.values_mut() {
            excavator.passing_count = 0;
            excavator.best_dump = None;
        }
        self.total_passing = 0;
        self.active_cycle.clear();
        self.counted_dumps.clear();

        info!("passing counters reset");
    }

    pub fn statistics(&self) -> PassingStatistics {
        PassingStatistics {
            total_passing: self.total_passing,
            excavators: self.excavators.clone(),
        }
    }

    pub fn passing_count(&self, tracker_id: Option<u32>) -> u32 {
        match tracker_id {
            None => self.total_passing,
            Some(id) => self
                .excavators
                .get(&id)
                .map_or(0, |excavator| excavator.passing_count),
        }
    }

    pub fn excavator(&self, tracker_id: u32) -> Option<&ExcavatorState> {
        self.excavators.get(&tracker_id)
    }

    /// Number of accepted dumps in the excavator's open cycle.
    pub fn active_cycle_len(&self, tracker_id: u32) -> usize {
        self.active_cycle.get(&tracker_id).map_or(0, Vec::len)
    }
}

impl CycleCounter for PassingCounter {
    fn process_detection(&mut self, detection: &TrackedDetection) -> bool {
        let tracker_id = detection.tracker_id;
        let excavator = self.excavators.entry(tracker_id).or_insert_with(|| {
            debug!(excavator = tracker_id, "excavator registered");
            ExcavatorState::default()
        });

        if detection.class_id != BUCKET_DUMPING {
            return false;
        }

        let dump_id = detection.id();
        // Negated so a NaN confidence is rejected too
        let below_threshold = !(detection.confidence >= self.min_confidence);
        if self.counted_dumps.contains(&dump_id) || below_threshold {
            return false;
        }

        let candidate = DumpCandidate {
            dump_id,
            frame_index: detection.frame_index,
            confidence: detection.confidence,
        };
        self.active_cycle
            .entry(tracker_id)
            .or_default()
            .push(candidate);

        let mut is_new_passing = false;
        let is_better = excavator
            .best_dump
            .map_or(true, |best| detection.confidence > best.confidence);

        if is_better {
            let previous = excavator.best_dump.replace(candidate);
            if previous.is_none() {
                excavator.passing_count += 1;
                self.total_passing += 1;
                is_new_passing = true;
                debug!(
                    excavator = tracker_id,
                    frame = detection.frame_index,
                    confidence = detection.confidence,
                    "passing counted"
                );
            } else {
                debug!(
                    excavator = tracker_id,
                    frame = detection.frame_index,
                    confidence = detection.confidence,
                    "best dump improved"
                );
            }
        }

        self.counted_dumps.insert(dump_id);
        is_new_passing
    }

    fn reset_counters(&mut self) {
        self.reset_all_counters();
    }

    fn count(&self, tracker_id: Option<u32>) -> u32 {
        self.passing_count(tracker_id)
    }
}
