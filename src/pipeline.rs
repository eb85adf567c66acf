use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::config::Config;
use crate::counter::CycleCounter;
use crate::detection::{split_by_object, TrackedDetection, BUCKET_DIGGING};
use crate::passing::{PassingCounter, PassingStatistics};
use crate::ritase::{RitaseCounter, RitaseSummary};
use crate::utils::{frame_to_seconds, round_to};

/// Steps applied to every frame, in this order.
///
/// Digging must end passing cycles before any dump of the same frame is
/// counted, and trucks are counted before bucket dumps can close the
/// global ritase cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    EndPassingCycles,
    CountTrucks,
    CountBuckets,
}

impl FramePhase {
    pub const ORDER: [FramePhase; 3] = [
        FramePhase::EndPassingCycles,
        FramePhase::CountTrucks,
        FramePhase::CountBuckets,
    ];
}

/// A credited passing or ritase, as listed in reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountEvent {
    pub number: u32,
    pub frame_index: u64,
    pub seconds: f64,
    pub confidence: f64,
    pub tracker_id: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameStats {
    pub total_frames: u64,
    pub truck_detections: u64,
    /// Bucket detections per class name.
    pub bucket_classes: BTreeMap<String, u64>,
    pub passing_detections: u32,
    pub ritase_detections: u32,
}

/// Overlay state: the displayed cycle id and whether its ritase is shown.
///
/// The display offset only shifts `display_cycle`. Hiding the ritase is
/// decided on raw cycle numbers, so it behaves the same for any offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleIndicator {
    pub display_cycle: u64,
    pub ritase_shown: bool,
    #[serde(skip)]
    last_cycle: u64,
}

impl CycleIndicator {
    fn ritase_credited(&mut self, cycle_number: u64) {
        self.ritase_shown = true;
        self.last_cycle = cycle_number;
    }

    fn refresh(&mut self, cycle_number: u64, offset: u64) {
        self.display_cycle = cycle_number + offset;
        // Hide the ritase once its cycle is over
        if cycle_number > self.last_cycle {
            self.ritase_shown = false;
            self.last_cycle = cycle_number;
        }
    }
}

/// What changed while processing one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    pub new_passings: Vec<CountEvent>,
    pub new_ritase: Vec<CountEvent>,
    pub total_passing: u32,
    pub indicator: CycleIndicator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub stats: FrameStats,
    pub passing: PassingStatistics,
    pub ritase: RitaseSummary,
    pub passing_events: Vec<CountEvent>,
    pub ritase_events: Vec<CountEvent>,
    pub final_display_cycle: u64,
}

/// Drives both counters frame by frame.
pub struct CountingPipeline {
    config: Config,
    passing: PassingCounter,
    ritase: RitaseCounter,
    stats: FrameStats,
    passing_events: Vec<CountEvent>,
    ritase_events: Vec<CountEvent>,
    indicator: CycleIndicator,
}

impl CountingPipeline {
    pub fn new(config: Config) -> Self {
        let passing = PassingCounter::new(config.passing_min_confidence);
        let ritase = RitaseCounter::new(config.ritase_min_confidence);
        let indicator = CycleIndicator {
            display_cycle: config.cycle_display_offset,
            ..CycleIndicator::default()
        };
        Self {
            config,
            passing,
            ritase,
            stats: FrameStats::default(),
            passing_events: Vec::new(),
            ritase_events: Vec::new(),
            indicator,
        }
    }

    /// Feed every tracked detection of one frame.
    ///
    /// The frame index passed here wins over the one stored in each detection.
    pub fn process_frame(
        &mut self,
        frame_index: u64,
        detections: &[TrackedDetection],
    ) -> FrameOutcome {
        self.stats.total_frames += 1;

        if frame_index.checked_rem(self.config.log_interval_frames) == Some(0) {
            info!(
                frame = frame_index,
                passing = self.passing.passing_count(None),
                ritase = self.ritase.ritase_count(None),
                "progress"
            );
        }

        let threshold = self.config.detection_threshold;
        let kept: Vec<TrackedDetection> = detections
            .iter()
            .filter(|det| det.confidence >= threshold)
            .map(|det| TrackedDetection {
                frame_index,
                ..*det
            })
            .collect();
        let (buckets, trucks) = split_by_object(&kept);
        self.record_stats(&buckets, &trucks);

        let mut outcome = FrameOutcome::default();
        for phase in FramePhase::ORDER {
            match phase {
                FramePhase::EndPassingCycles => self.end_passing_cycles(&buckets),
                FramePhase::CountTrucks => self.count_trucks(&trucks, &mut outcome),
                FramePhase::CountBuckets => self.count_buckets(&buckets, &mut outcome),
            }
        }

        self.indicator
            .refresh(self.ritase.cycle_number(), self.config.cycle_display_offset);
        outcome.total_passing = self.passing.passing_count(None);
        outcome.indicator = self.indicator;
        outcome
    }

    fn record_stats(&mut self, buckets: &[TrackedDetection], trucks: &[TrackedDetection]) {
        self.stats.truck_detections += trucks.len() as u64;
        for det in buckets {
            if let Some(name) = self.config.class_name(det.class_id) {
                *self
                    .stats
                    .bucket_classes
                    .entry(name.to_string())
                    .or_insert(0) += 1;
            }
        }
    }

    fn end_passing_cycles(&mut self, buckets: &[TrackedDetection]) {
        for det in buckets.iter().filter(|det| det.class_id == BUCKET_DIGGING) {
            self.passing.end_cycle(det.tracker_id);
        }
    }

    fn count_trucks(&mut self, trucks: &[TrackedDetection], outcome: &mut FrameOutcome) {
        for det in trucks {
            if !self.ritase.process_detection(det) {
                continue;
            }
            self.stats.ritase_detections += 1;
            let event = self.make_event(self.stats.ritase_detections, det);
            info!(
                frame = event.frame_index,
                seconds = event.seconds,
                truck = det.tracker_id,
                "RITASE #{}",
                event.number
            );
            self.ritase_events.push(event);
            outcome.new_ritase.push(event);

            self.indicator.ritase_credited(self.ritase.cycle_number());
            self.restart_hauling_cycle();
        }
    }

    fn count_buckets(&mut self, buckets: &[TrackedDetection], outcome: &mut FrameOutcome) {
        for det in buckets {
            // Carries bucket_dumping, the global ritase cycle close
            self.ritase.process_detection(det);

            if !self.passing.process_detection(det) {
                continue;
            }
            self.stats.passing_detections += 1;
            let event = self.make_event(self.stats.passing_detections, det);
            info!(
                frame = event.frame_index,
                seconds = event.seconds,
                excavator = det.tracker_id,
                "PASSING #{}",
                event.number
            );
            self.passing_events.push(event);
            outcome.new_passings.push(event);
        }
    }

    /// A new ritase starts a new hauling cycle: the passing series restarts.
    fn restart_hauling_cycle(&mut self) {
        info!("passing counters reset after new ritase");
        self.passing.reset_counters();
        self.ritase.reset_counters();
    }

    fn make_event(&self, number: u32, det: &TrackedDetection) -> CountEvent {
        CountEvent {
            number,
            frame_index: det.frame_index,
            seconds: round_to(frame_to_seconds(det.frame_index, self.config.fps), 2),
            confidence: round_to(f64::from(det.confidence), 4),
            tracker_id: det.tracker_id,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn passing(&self) -> &PassingCounter {
        &self.passing
    }

    pub fn ritase(&self) -> &RitaseCounter {
        &self.ritase
    }

    /// Administrative access, e.g. to close a stalled truck cycle.
    pub fn ritase_mut(&mut self) -> &mut RitaseCounter {
        &mut self.ritase
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn passing_events(&self) -> &[CountEvent] {
        &self.passing_events
    }

    pub fn ritase_events(&self) -> &[CountEvent] {
        &self.ritase_events
    }

    pub fn indicator(&self) -> CycleIndicator {
        self.indicator
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            stats: self.stats.clone(),
            passing: self.passing.statistics(),
            ritase: self.ritase.export_summary(),
            passing_events: self.passing_events.clone(),
            ritase_events: self.ritase_events.clone(),
            final_display_cycle: self.indicator.display_cycle,
        }
    }
}
