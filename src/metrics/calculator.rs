//! Derived workout metrics.
//!
//! Pure functions over a workout snapshot: totals, training stress, pace
//! speeds and the per-segment labels the editor shows under each block.

use serde::{Deserialize, Serialize};

use crate::metrics::pace::{speed_for_pace, PaceIndex};
use crate::workouts::types::{AthleteProfile, Block, Segment, SportType, Workout};

/// Seconds-at-FTP that make one TSS point (3600 s / 100).
const TSS_SECONDS_PER_POINT: f64 = 36.0;

/// Totals shown in the editor footer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub duration_seconds: u32,
    pub distance_meters: u32,
    pub tss: f64,
}

/// Compute all footer totals at once.
pub fn summarize(workout: &Workout) -> WorkoutSummary {
    WorkoutSummary {
        duration_seconds: total_duration(workout),
        distance_meters: total_distance(workout),
        tss: training_stress_score(workout, workout.athlete.ftp_watts),
    }
}

/// Sum of segment durations; interval blocks count `repeat × (on + off)`.
pub fn total_duration(workout: &Workout) -> u32 {
    workout
        .segments
        .iter()
        .fold(0u32, |total, segment| total.saturating_add(segment.duration_seconds()))
}

/// Sum of segment lengths. Only meaningful for run workouts.
pub fn total_distance(workout: &Workout) -> u32 {
    workout
        .segments
        .iter()
        .fold(0u32, |total, segment| total.saturating_add(segment.length_meters()))
}

/// Intensity-weighted seconds of one segment: `∫ power(t)² dt`.
///
/// Ramps integrate their linear profile, free rides carry no target and
/// contribute nothing.
pub fn segment_stress(segment: &Segment) -> f64 {
    match segment.block {
        Block::Steady {
            duration_seconds,
            power,
            ..
        } => duration_seconds as f64 * power * power,
        Block::Ramp {
            duration_seconds,
            start_power,
            end_power,
            ..
        } => {
            let mean_square = (start_power * start_power
                + start_power * end_power
                + end_power * end_power)
                / 3.0;
            duration_seconds as f64 * mean_square
        }
        Block::Intervals {
            repeat,
            on_duration_seconds,
            off_duration_seconds,
            on_power,
            off_power,
            ..
        } => {
            let pair = on_duration_seconds as f64 * on_power * on_power
                + off_duration_seconds as f64 * off_power * off_power;
            repeat as f64 * pair
        }
        Block::FreeRide { .. } => 0.0,
    }
}

/// Training Stress Score: `Σ(duration_s × power²) / 36`.
///
/// Powers are already fractions of FTP; a zero FTP yields 0.
pub fn training_stress_score(workout: &Workout, ftp_watts: u16) -> f64 {
    if ftp_watts == 0 {
        return 0.0;
    }

    let weighted: f64 = workout.segments.iter().map(segment_stress).sum();
    weighted / TSS_SECONDS_PER_POINT
}

/// Speed in m/s of the athlete's personal best at `pace`, 0 when unknown.
pub fn pace_to_speed(workout: &Workout, pace: PaceIndex) -> f64 {
    speed_for_pace(&workout.athlete, pace)
}

/// Seconds needed to run a distance at `power` × reference pace speed.
fn run_seconds(length_meters: u32, speed: f64, power: f64) -> f64 {
    let effective = speed * power;
    if effective > 0.0 {
        length_meters as f64 / effective
    } else {
        0.0
    }
}

/// Estimated time to complete a run segment, 0 when the pace is unknown.
pub fn estimated_run_duration(segment: &Segment, athlete: &AthleteProfile) -> u32 {
    let speed = speed_for_pace(athlete, segment.pace);
    let seconds = match segment.block {
        Block::Steady {
            length_meters,
            power,
            ..
        } => run_seconds(length_meters, speed, power),
        Block::Ramp {
            length_meters,
            start_power,
            end_power,
            ..
        } => run_seconds(length_meters, speed, (start_power + end_power) / 2.0),
        Block::Intervals {
            repeat,
            on_length_meters,
            off_length_meters,
            on_power,
            off_power,
            ..
        } => {
            repeat as f64
                * (run_seconds(on_length_meters, speed, on_power)
                    + run_seconds(off_length_meters, speed, off_power))
        }
        Block::FreeRide { duration_seconds } => duration_seconds as f64,
    };
    seconds.round() as u32
}

/// Estimated total time of a run workout.
pub fn estimated_run_workout_duration(workout: &Workout) -> u32 {
    workout
        .segments
        .iter()
        .map(|segment| estimated_run_duration(segment, &workout.athlete))
        .sum()
}

/// Format seconds as `hh:mm:ss`, or `mm:ss` under an hour.
pub fn format_duration(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Watts for a fraction of FTP.
pub fn power_watts(power: f64, ftp_watts: u16) -> u16 {
    (power * ftp_watts as f64).round().max(0.0) as u16
}

/// Display text for one segment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentLabel {
    /// Segment duration (`mm:ss`), estimated from pace in run mode
    pub duration: String,
    /// Distance text, run mode only
    pub distance: Option<String>,
    /// Absolute power text, bike mode only
    pub power: Option<String>,
    /// Relative intensity text (% FTP, W/kg, or % of reference pace)
    pub intensity: Option<String>,
}

impl SegmentLabel {
    /// Build the label for `segment` in the context of `workout`.
    pub fn new(segment: &Segment, workout: &Workout) -> Self {
        let athlete = &workout.athlete;
        let ftp = athlete.ftp_watts;
        let percent = |power: f64| (power * 100.0).round() as i64;

        match workout.sport_type {
            SportType::Bike => {
                let duration = format_duration(segment.duration_seconds());
                let (power, intensity) = match segment.block {
                    Block::Steady { power, .. } => {
                        let watts = power_watts(power, ftp);
                        let per_kg = if athlete.weight_kg > 0.0 {
                            format!("{:.1}W/Kg · ", watts as f32 / athlete.weight_kg)
                        } else {
                            String::new()
                        };
                        (
                            Some(format!("{}W", watts)),
                            Some(format!("{}{}% FTP", per_kg, percent(power))),
                        )
                    }
                    Block::Ramp {
                        start_power,
                        end_power,
                        ..
                    } => (
                        Some(format!(
                            "{}W - {}W",
                            power_watts(start_power, ftp),
                            power_watts(end_power, ftp)
                        )),
                        Some(format!(
                            "{}% FTP - {}% FTP",
                            percent(start_power),
                            percent(end_power)
                        )),
                    ),
                    Block::Intervals {
                        repeat,
                        on_power,
                        off_power,
                        ..
                    } => (
                        Some(format!(
                            "{}x {}W / {}W",
                            repeat,
                            power_watts(on_power, ftp),
                            power_watts(off_power, ftp)
                        )),
                        Some(format!(
                            "{}% FTP / {}% FTP",
                            percent(on_power),
                            percent(off_power)
                        )),
                    ),
                    Block::FreeRide { .. } => (None, None),
                };
                Self {
                    duration,
                    distance: None,
                    power,
                    intensity,
                }
            }
            SportType::Run => {
                let duration = format_duration(estimated_run_duration(segment, athlete));
                let pace = segment.pace.label();
                let intensity = match segment.block {
                    Block::Steady { power, .. } => {
                        Some(format!("{}% {} pace", percent(power), pace))
                    }
                    Block::Ramp {
                        start_power,
                        end_power,
                        ..
                    } => Some(format!(
                        "{}% to {}% {} pace",
                        percent(start_power),
                        percent(end_power),
                        pace
                    )),
                    Block::Intervals {
                        on_power,
                        off_power,
                        ..
                    } => Some(format!(
                        "{}% / {}% {} pace",
                        percent(on_power),
                        percent(off_power),
                        pace
                    )),
                    Block::FreeRide { .. } => None,
                };
                let distance = match segment.block {
                    Block::FreeRide { .. } => None,
                    _ => Some(format!("{} m", segment.length_meters())),
                };
                Self {
                    duration,
                    distance,
                    power: None,
                    intensity,
                }
            }
        }
    }
}
