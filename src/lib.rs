pub mod config;
pub mod counter;
pub mod detection;
pub mod error;
pub mod passing;
pub mod pipeline;
pub mod replay;
pub mod ritase;
pub mod utils;

// Re-export main types
pub use crate::config::Config;
pub use crate::counter::CycleCounter;
pub use crate::detection::{DetectionId, TrackedDetection};
pub use crate::error::{Error, Result};
pub use crate::passing::PassingCounter;
pub use crate::pipeline::{CountingPipeline, FrameOutcome, RunReport};
pub use crate::ritase::RitaseCounter;
