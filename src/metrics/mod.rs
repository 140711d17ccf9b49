//! Metrics module for workout totals, zones and running paces.

pub mod calculator;
pub mod pace;
pub mod zones;

pub use calculator::{
    format_duration, summarize, total_distance, total_duration, training_stress_score,
    SegmentLabel, WorkoutSummary,
};
pub use pace::{estimate_running_times, PaceIndex, RaceTimes};
pub use zones::Zone;
