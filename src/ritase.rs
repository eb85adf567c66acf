use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::counter::CycleCounter;
use crate::detection::{is_truck_class, DetectionId, TrackedDetection, BUCKET_DUMPING, TRUCK_FULL};
use crate::utils::{ratio, round_to};

/// A `truck_full` detection credited to a truck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FullCandidate {
    pub full_truck_id: DetectionId,
    pub frame_index: u64,
    pub confidence: f32,
    pub cycle_number: u64,
}

/// The detection currently holding the global cycle's ritase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleBest {
    pub tracker_id: u32,
    pub frame_index: u64,
    pub confidence: f32,
    pub cycle_number: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    AcceptedAsPrimary,
    BetterCandidate,
    Rejected,
}

/// Trail entry for every `truck_full` that contended in the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateRecord {
    pub tracker_id: u32,
    pub frame_index: u64,
    pub confidence: f32,
    pub status: CandidateStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TruckState {
    pub ritase_count: u32,
    pub best_full: Option<FullCandidate>,
    pub last_cycle_frame: Option<u64>,
    /// None until a cycle was closed for this truck.
    pub last_cycle_number: Option<u64>,
}

#[derive(Debug, Clone, Default)]
struct GlobalCycle {
    has_ritase: bool,
    best_in_cycle: Option<CycleBest>,
    cycle_number: u64,
    candidates: Vec<CandidateRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RitaseStatistics {
    pub total_ritase: u32,
    pub total_truck_full_detections: u64,
    pub cycles_completed: u64,
    pub current_cycle_number: u64,
    pub current_cycle_has_ritase: bool,
    pub prevented_false_multiple: u64,
    pub cycle_candidates_count: usize,
    pub active_trucks: usize,
    pub trucks: BTreeMap<u32, TruckState>,
}

/// Live view of the open global cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleStatus {
    pub current_cycle_number: u64,
    pub current_cycle_has_ritase: bool,
    pub best_in_cycle: Option<CycleBest>,
    pub candidates: Vec<CandidateRecord>,
    pub active_detections: BTreeMap<u32, usize>,
    pub prevented_false_multiple_total: u64,
    pub cycles_completed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleOverview {
    pub cycle_number: u64,
    pub has_ritase: bool,
    pub active_trucks: usize,
    pub total_ritase: u32,
    pub cycles_completed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductiveTruck {
    pub tracker_id: u32,
    pub ritase_count: u32,
    pub best_confidence: f32,
    pub last_frame: u64,
    pub last_cycle_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryFigures {
    pub total_ritase: u32,
    pub total_active_trucks: usize,
    pub average_ritase_per_truck: f64,
    pub total_truck_full_detections: u64,
    pub efficiency_ratio: f64,
    pub prevented_false_multiple: u64,
    pub false_multiple_prevention_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RitaseSummary {
    pub summary: SummaryFigures,
    pub productive_trucks: Vec<ProductiveTruck>,
    pub statistics: RitaseStatistics,
}

/// Counts truck load cycles under a single global cycle.
///
/// At most one ritase is credited per global cycle, whichever truck shows
/// the first qualifying `truck_full`. Later, more confident `truck_full`
/// detections move the credit to their truck without changing the total.
/// Any `bucket_dumping` detection closes the global cycle.
#[derive(Debug)]
pub struct RitaseCounter {
    trucks: BTreeMap<u32, TruckState>,
    counted_fulls: HashSet<DetectionId>,
    min_confidence: f32,
    total_ritase: u32,
    active_cycle: HashMap<u32, Vec<FullCandidate>>,
    cycles_completed: u64,
    truck_full_detections: u64,
    prevented_duplicates: u64,
    cycle: GlobalCycle,
}

impl RitaseCounter {
    pub fn new(min_confidence: f32) -> Self {
        info!(min_confidence, "ritase counter initialized");
        Self::empty(min_confidence)
    }

    fn empty(min_confidence: f32) -> Self {
        Self {
            trucks: BTreeMap::new(),
            counted_fulls: HashSet::new(),
            min_confidence,
            total_ritase: 0,
            active_cycle: HashMap::new(),
            cycles_completed: 0,
            truck_full_detections: 0,
            prevented_duplicates: 0,
            cycle: GlobalCycle::default(),
        }
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    pub fn cycle_number(&self) -> u64 {
        self.cycle.cycle_number
    }

    pub fn has_ritase(&self) -> bool {
        self.cycle.has_ritase
    }

    pub fn best_in_cycle(&self) -> Option<CycleBest> {
        self.cycle.best_in_cycle
    }

    pub fn truck(&self, tracker_id: u32) -> Option<&TruckState> {
        self.trucks.get(&tracker_id)
    }

    pub fn ritase_count(&self, tracker_id: Option<u32>) -> u32 {
        match tracker_id {
            None => self.total_ritase,
            Some(id) => self.trucks.get(&id).map_or(0, |truck| truck.ritase_count),
        }
    }

    fn process_truck_full(&mut self, detection: &TrackedDetection) -> bool {
        self.truck_full_detections += 1;

        if self.cycle.has_ritase {
            self.contend_for_best(detection);
            return false;
        }

        let full_id = detection.id();
        let below_threshold = !(detection.confidence >= self.min_confidence);
        if self.counted_fulls.contains(&full_id) || below_threshold {
            return false;
        }

        let cycle_number = self.cycle.cycle_number;
        let candidate = FullCandidate {
            full_truck_id: full_id,
            frame_index: detection.frame_index,
            confidence: detection.confidence,
            cycle_number,
        };
        self.active_cycle
            .entry(detection.tracker_id)
            .or_default()
            .push(candidate);

        self.cycle.has_ritase = true;
        self.cycle.best_in_cycle = Some(CycleBest {
            tracker_id: detection.tracker_id,
            frame_index: detection.frame_index,
            confidence: detection.confidence,
            cycle_number,
        });

        let truck = self.trucks.entry(detection.tracker_id).or_default();
        truck.ritase_count += 1;
        truck.best_full = Some(candidate);

        // Only path that moves the total
        self.total_ritase += 1;

        self.cycle.candidates.push(CandidateRecord {
            tracker_id: detection.tracker_id,
            frame_index: detection.frame_index,
            confidence: detection.confidence,
            status: CandidateStatus::AcceptedAsPrimary,
        });
        self.counted_fulls.insert(full_id);

        debug!(
            truck = detection.tracker_id,
            frame = detection.frame_index,
            confidence = detection.confidence,
            cycle = cycle_number,
            "ritase counted"
        );
        true
    }

    /// A cycle that already has its ritase: the credit follows the best detection.
    fn contend_for_best(&mut self, detection: &TrackedDetection) {
        let cycle_number = self.cycle.cycle_number;
        let is_better = self
            .cycle
            .best_in_cycle
            .map_or(true, |best| detection.confidence > best.confidence);

        if is_better {
            let previous = self.cycle.best_in_cycle.replace(CycleBest {
                tracker_id: detection.tracker_id,
                frame_index: detection.frame_index,
                confidence: detection.confidence,
                cycle_number,
            });

            if let Some(previous) = previous {
                if let Some(old_truck) = self.trucks.get_mut(&previous.tracker_id) {
                    old_truck.ritase_count = old_truck.ritase_count.saturating_sub(1);
                }
            }

            let truck = self.trucks.entry(detection.tracker_id).or_default();
            truck.ritase_count += 1;
            truck.best_full = Some(FullCandidate {
                full_truck_id: detection.id(),
                frame_index: detection.frame_index,
                confidence: detection.confidence,
                cycle_number,
            });

            debug!(
                truck = detection.tracker_id,
                frame = detection.frame_index,
                confidence = detection.confidence,
                cycle = cycle_number,
                previous_confidence = ?previous.map(|p| p.confidence),
                "ritase moved to better candidate"
            );
        }

        self.cycle.candidates.push(CandidateRecord {
            tracker_id: detection.tracker_id,
            frame_index: detection.frame_index,
            confidence: detection.confidence,
            status: if is_better {
                CandidateStatus::BetterCandidate
            } else {
                CandidateStatus::Rejected
            },
        });

        self.prevented_duplicates += 1;
        debug!(
            truck = detection.tracker_id,
            frame = detection.frame_index,
            prevented = self.prevented_duplicates,
            "duplicate ritase prevented"
        );
    }

    /// Close one truck's open detections. Counts are left untouched.
    fn close_truck_cycle(&mut self, tracker_id: u32) {
        let Some(detections) = self.active_cycle.get_mut(&tracker_id) else {
            return;
        };
        detections.clear();

        if let Some(truck) = self.trucks.get_mut(&tracker_id) {
            truck.best_full = None;
            truck.last_cycle_frame = None;
            truck.last_cycle_number = Some(self.cycle.cycle_number);
        }
        debug!(truck = tracker_id, "truck cycle closed");
    }

    /// Triggered by any `bucket_dumping` detection.
    fn close_global_cycle(&mut self) {
        let mut closing: Vec<u32> = self
            .active_cycle
            .iter()
            .filter(|(_, detections)| !detections.is_empty())
            .map(|(tracker_id, _)| *tracker_id)
            .collect();
        closing.sort_unstable();

        for tracker_id in &closing {
            self.close_truck_cycle(*tracker_id);
        }

        if closing.is_empty() && !self.cycle.has_ritase {
            debug!(cycle = self.cycle.cycle_number, "bucket dumping with no open cycle");
            return;
        }

        self.cycles_completed += 1;

        if let (true, Some(best)) = (self.cycle.has_ritase, self.cycle.best_in_cycle) {
            debug!(
                affected = ?closing,
                truck = best.tracker_id,
                confidence = best.confidence,
                frame = best.frame_index,
                candidates = self.cycle.candidates.len(),
                prevented = self.prevented_duplicates,
                "global cycle closed by bucket dumping"
            );
        }

        self.cycle.has_ritase = false;
        self.cycle.best_in_cycle = None;
        self.cycle.candidates.clear();
        self.cycle.cycle_number += 1;

        debug!(cycle = self.cycle.cycle_number, "global cycle reset");
    }

    /// Force a truck's cycle closed without waiting for a bucket dump.
    pub fn manual_close(&mut self, tracker_id: u32, frame_index: u64) {
        if !self.trucks.contains_key(&tracker_id) {
            return;
        }
        self.close_truck_cycle(tracker_id);

        let cycle_number = self.cycle.cycle_number;
        if let Some(truck) = self.trucks.get_mut(&tracker_id) {
            truck.last_cycle_frame = Some(frame_index);
            truck.last_cycle_number = Some(cycle_number);
        }
        info!(truck = tracker_id, frame = frame_index, "truck cycle closed manually");
    }

    /// Back to the state of a freshly constructed counter.
    pub fn reset_statistics(&mut self) {
        *self = Self::empty(self.min_confidence);
        info!("ritase statistics reset, including global cycle state");
    }

    fn active_trucks(&self) -> usize {
        self.trucks
            .values()
            .filter(|truck| truck.ritase_count > 0)
            .count()
    }

    pub fn statistics(&self) -> RitaseStatistics {
        RitaseStatistics {
            total_ritase: self.total_ritase,
            total_truck_full_detections: self.truck_full_detections,
            cycles_completed: self.cycles_completed,
            current_cycle_number: self.cycle.cycle_number,
            current_cycle_has_ritase: self.cycle.has_ritase,
            prevented_false_multiple: self.prevented_duplicates,
            cycle_candidates_count: self.cycle.candidates.len(),
            active_trucks: self.active_trucks(),
            trucks: self.trucks.clone(),
        }
    }

    pub fn cycle_status(&self) -> CycleStatus {
        CycleStatus {
            current_cycle_number: self.cycle.cycle_number,
            current_cycle_has_ritase: self.cycle.has_ritase,
            best_in_cycle: self.cycle.best_in_cycle,
            candidates: self.cycle.candidates.clone(),
            active_detections: self
                .active_cycle
                .iter()
                .filter(|(_, detections)| !detections.is_empty())
                .map(|(tracker_id, detections)| (*tracker_id, detections.len()))
                .collect(),
            prevented_false_multiple_total: self.prevented_duplicates,
            cycles_completed: self.cycles_completed,
        }
    }

    pub fn cycle_overview(&self) -> CycleOverview {
        CycleOverview {
            cycle_number: self.cycle.cycle_number,
            has_ritase: self.cycle.has_ritase,
            active_trucks: self.active_trucks(),
            total_ritase: self.total_ritase,
            cycles_completed: self.cycles_completed,
        }
    }

    /// Trucks with at least one ritase, most productive first.
    pub fn productive_trucks(&self) -> Vec<ProductiveTruck> {
        let mut productive: Vec<ProductiveTruck> = self
            .trucks
            .iter()
            .filter(|(_, truck)| truck.ritase_count > 0)
            .map(|(tracker_id, truck)| ProductiveTruck {
                tracker_id: *tracker_id,
                ritase_count: truck.ritase_count,
                best_confidence: truck.best_full.map_or(0.0, |best| best.confidence),
                last_frame: truck.best_full.map_or(0, |best| best.frame_index),
                last_cycle_number: truck.last_cycle_number,
            })
            .collect();

        // Stable sort keeps tracker id order among equal counts
        productive.sort_by_key(|truck| Reverse(truck.ritase_count));
        productive
    }

    pub fn export_summary(&self) -> RitaseSummary {
        let statistics = self.statistics();
        let total = u64::from(statistics.total_ritase);
        let detections = statistics.total_truck_full_detections;

        RitaseSummary {
            summary: SummaryFigures {
                total_ritase: statistics.total_ritase,
                total_active_trucks: statistics.active_trucks,
                average_ritase_per_truck: round_to(
                    ratio(total, statistics.active_trucks as u64),
                    2,
                ),
                total_truck_full_detections: detections,
                efficiency_ratio: round_to(ratio(total, detections), 4),
                prevented_false_multiple: statistics.prevented_false_multiple,
                false_multiple_prevention_rate: round_to(
                    ratio(statistics.prevented_false_multiple, detections),
                    4,
                ),
            },
            productive_trucks: self.productive_trucks(),
            statistics,
        }
    }
}

impl CycleCounter for RitaseCounter {
    fn process_detection(&mut self, detection: &TrackedDetection) -> bool {
        if is_truck_class(detection.class_id) && !self.trucks.contains_key(&detection.tracker_id) {
            self.trucks.insert(detection.tracker_id, TruckState::default());
            debug!(truck = detection.tracker_id, "truck registered");
        }

        match detection.class_id {
            TRUCK_FULL => self.process_truck_full(detection),
            BUCKET_DUMPING => {
                self.close_global_cycle();
                false
            }
            _ => false,
        }
    }

    /// Zero the ritase counts only.
    ///
    /// Unlike the passing counter's full reset, the seen set, cycle numbering,
    /// completed cycles and the open cycle's best candidate survive. The two
    /// depths differ in the deployed system as well; keep them until someone
    /// on site confirms which one is intended.
    fn reset_counters(&mut self) {
        self.total_ritase = 0;
        for truck in self.trucks.values_mut() {
            truck.ritase_count = 0;
            truck.best_full = None;
        }
        info!("ritase counters reset for new cycle");
    }

    fn count(&self, tracker_id: Option<u32>) -> u32 {
        self.ritase_count(tracker_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::TRUCK_EMPTY;
    use approx::assert_relative_eq;

    fn full(tracker_id: u32, frame_index: u64, confidence: f32) -> TrackedDetection {
        TrackedDetection::new(tracker_id, TRUCK_FULL, frame_index, confidence)
    }

    fn bucket_dump(tracker_id: u32, frame_index: u64) -> TrackedDetection {
        TrackedDetection::new(tracker_id, BUCKET_DUMPING, frame_index, 0.9)
    }

    #[test]
    fn test_first_full_credits_ritase() {
        let mut counter = RitaseCounter::new(0.9);
        assert!(counter.process_detection(&full(100, 50, 0.95)));

        assert_eq!(counter.ritase_count(None), 1);
        assert_eq!(counter.ritase_count(Some(100)), 1);
        assert!(counter.has_ritase());
        let best = counter.best_in_cycle().unwrap();
        assert_eq!(best.tracker_id, 100);
        assert_eq!(best.cycle_number, 0);
    }

    #[test]
    fn test_below_threshold_is_not_credited() {
        let mut counter = RitaseCounter::new(0.9);
        assert!(!counter.process_detection(&full(100, 50, 0.85)));

        assert_eq!(counter.ritase_count(None), 0);
        assert!(!counter.has_ritase());
        assert_eq!(counter.statistics().total_truck_full_detections, 1);
        assert!(counter.cycle_status().candidates.is_empty());
    }

    #[test]
    fn test_nan_confidence_is_not_credited() {
        let mut counter = RitaseCounter::new(0.9);
        assert!(!counter.process_detection(&full(100, 50, f32::NAN)));

        assert_eq!(counter.ritase_count(None), 0);
        assert!(!counter.has_ritase());
        assert!(counter.best_in_cycle().is_none());

        assert!(counter.process_detection(&full(100, 51, 0.95)));
        assert_eq!(counter.ritase_count(Some(100)), 1);
    }

    #[test]
    fn test_swap_moves_credit_between_trucks() {
        let mut counter = RitaseCounter::new(0.9);
        assert!(counter.process_detection(&full(1, 10, 0.91)));
        assert!(!counter.process_detection(&full(2, 11, 0.97)));

        assert_eq!(counter.ritase_count(Some(1)), 0);
        assert_eq!(counter.ritase_count(Some(2)), 1);
        assert_eq!(counter.ritase_count(None), 1);
        assert_eq!(counter.best_in_cycle().unwrap().tracker_id, 2);

        // Weaker candidate is recorded but changes nothing
        assert!(!counter.process_detection(&full(1, 12, 0.93)));
        assert_eq!(counter.ritase_count(Some(1)), 0);
        assert_eq!(counter.ritase_count(Some(2)), 1);

        let status = counter.cycle_status();
        let trail: Vec<CandidateStatus> = status.candidates.iter().map(|c| c.status).collect();
        assert_eq!(
            trail,
            vec![
                CandidateStatus::AcceptedAsPrimary,
                CandidateStatus::BetterCandidate,
                CandidateStatus::Rejected,
            ]
        );
        assert_eq!(status.prevented_false_multiple_total, 2);
    }

    #[test]
    fn test_cycle_sum_stays_one_across_swaps() {
        let mut counter = RitaseCounter::new(0.5);
        let confidences = [0.6, 0.7, 0.65, 0.8, 0.9];
        for (i, conf) in confidences.iter().enumerate() {
            counter.process_detection(&full(i as u32 % 3, i as u64, *conf));
            let sum: u32 = counter.statistics().trucks.values().map(|t| t.ritase_count).sum();
            assert_eq!(sum, 1);
        }
        assert_eq!(counter.ritase_count(None), 1);
    }

    #[test]
    fn test_swap_within_same_truck_keeps_count() {
        let mut counter = RitaseCounter::new(0.5);
        counter.process_detection(&full(7, 1, 0.6));
        counter.process_detection(&full(7, 2, 0.9));

        assert_eq!(counter.ritase_count(Some(7)), 1);
        assert_eq!(counter.truck(7).unwrap().best_full.unwrap().frame_index, 2);
    }

    #[test]
    fn test_swap_after_reset_clamps_at_zero() {
        let mut counter = RitaseCounter::new(0.5);
        counter.process_detection(&full(1, 1, 0.6));
        counter.reset_counters();

        // Cycle still has its ritase, so this is a swap against a zeroed owner
        assert!(!counter.process_detection(&full(2, 2, 0.9)));
        assert_eq!(counter.ritase_count(Some(1)), 0);
        assert_eq!(counter.ritase_count(Some(2)), 1);
        assert_eq!(counter.ritase_count(None), 0);
    }

    #[test]
    fn test_bucket_dumping_closes_cycle() {
        let mut counter = RitaseCounter::new(0.9);
        counter.process_detection(&full(100, 50, 0.95));
        assert!(!counter.process_detection(&bucket_dump(200, 60)));

        assert_eq!(counter.cycle_number(), 1);
        assert!(!counter.has_ritase());
        assert!(counter.best_in_cycle().is_none());

        let truck = counter.truck(100).unwrap();
        assert_eq!(truck.last_cycle_number, Some(0));
        assert!(truck.best_full.is_none());
        assert_eq!(truck.ritase_count, 1);
        assert_eq!(counter.statistics().cycles_completed, 1);
        assert!(counter.cycle_status().candidates.is_empty());
    }

    #[test]
    fn test_close_without_activity_is_noop() {
        let mut counter = RitaseCounter::new(0.9);
        counter.process_detection(&bucket_dump(200, 1));
        counter.close_global_cycle();

        assert_eq!(counter.cycle_number(), 0);
        assert_eq!(counter.statistics().cycles_completed, 0);
        // Bucket trackers are not registered as trucks
        assert!(counter.truck(200).is_none());
    }

    #[test]
    fn test_same_identity_rejected_in_later_cycle() {
        let mut counter = RitaseCounter::new(0.5);
        assert!(counter.process_detection(&full(1, 10, 0.9)));
        counter.process_detection(&bucket_dump(9, 11));

        assert!(!counter.process_detection(&full(1, 10, 0.9)));
        assert_eq!(counter.ritase_count(None), 1);
        assert!(!counter.has_ritase());
    }

    #[test]
    fn test_reset_counters_preserves_cycle_numbering() {
        let mut counter = RitaseCounter::new(0.5);
        counter.process_detection(&full(1, 10, 0.9));
        counter.process_detection(&bucket_dump(9, 11));
        counter.process_detection(&full(1, 12, 0.9));

        counter.reset_counters();
        assert_eq!(counter.ritase_count(None), 0);
        assert_eq!(counter.ritase_count(Some(1)), 0);
        assert!(counter.truck(1).unwrap().best_full.is_none());
        assert_eq!(counter.cycle_number(), 1);
        assert_eq!(counter.statistics().cycles_completed, 1);
        assert!(counter.has_ritase());

        // Seen identities survive the reset
        counter.process_detection(&bucket_dump(9, 13));
        assert!(!counter.process_detection(&full(1, 12, 0.9)));
    }

    #[test]
    fn test_reset_statistics_restores_fresh_state() {
        let mut counter = RitaseCounter::new(0.5);
        counter.process_detection(&full(1, 10, 0.9));
        counter.process_detection(&bucket_dump(9, 11));

        counter.reset_statistics();
        assert_eq!(counter.cycle_number(), 0);
        assert!(counter.truck(1).is_none());
        assert_eq!(counter.statistics().total_truck_full_detections, 0);
        assert_relative_eq!(counter.min_confidence(), 0.5);
        assert!(counter.process_detection(&full(1, 10, 0.9)));
    }

    #[test]
    fn test_manual_close_stamps_truck() {
        let mut counter = RitaseCounter::new(0.5);
        counter.process_detection(&full(3, 40, 0.9));
        counter.manual_close(3, 44);

        let truck = counter.truck(3).unwrap();
        assert_eq!(truck.last_cycle_frame, Some(44));
        assert_eq!(truck.last_cycle_number, Some(0));
        assert!(truck.best_full.is_none());
        assert!(counter.cycle_status().active_detections.is_empty());
        // The global cycle is still open
        assert!(counter.has_ritase());

        counter.manual_close(99, 50);
        assert!(counter.truck(99).is_none());
    }

    #[test]
    fn test_productive_trucks_sorted() {
        let mut counter = RitaseCounter::new(0.5);
        let mut frame = 0;
        for tracker_id in [5, 2, 2, 8, 2, 8] {
            frame += 1;
            counter.process_detection(&full(tracker_id, frame, 0.9));
            frame += 1;
            counter.process_detection(&bucket_dump(50, frame));
        }
        counter.process_detection(&TrackedDetection::new(11, TRUCK_EMPTY, frame + 1, 0.9));

        let productive = counter.productive_trucks();
        let order: Vec<(u32, u32)> = productive
            .iter()
            .map(|t| (t.tracker_id, t.ritase_count))
            .collect();
        assert_eq!(order, vec![(2, 3), (8, 2), (5, 1)]);
        assert_eq!(productive[0].last_cycle_number, Some(4));
    }

    #[test]
    fn test_export_summary_ratios() {
        let mut counter = RitaseCounter::new(0.9);
        counter.process_detection(&full(1, 1, 0.95));
        counter.process_detection(&full(2, 2, 0.92));
        counter.process_detection(&full(2, 3, 0.5));
        counter.process_detection(&bucket_dump(50, 4));
        counter.process_detection(&full(2, 5, 0.96));

        let summary = counter.export_summary();
        assert_eq!(summary.summary.total_ritase, 2);
        assert_eq!(summary.summary.total_active_trucks, 2);
        assert_relative_eq!(summary.summary.average_ritase_per_truck, 1.0);
        assert_eq!(summary.summary.total_truck_full_detections, 4);
        assert_relative_eq!(summary.summary.efficiency_ratio, 0.5);
        assert_eq!(summary.summary.prevented_false_multiple, 2);
        assert_relative_eq!(summary.summary.false_multiple_prevention_rate, 0.5);
        assert_eq!(summary.productive_trucks.len(), 2);
    }

    #[test]
    fn test_empty_summary_has_zero_ratios() {
        let counter = RitaseCounter::new(0.9);
        let summary = counter.export_summary();
        assert_relative_eq!(summary.summary.average_ritase_per_truck, 0.0);
        assert_relative_eq!(summary.summary.efficiency_ratio, 0.0);
        assert!(summary.productive_trucks.is_empty());
    }
}
