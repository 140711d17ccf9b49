//! Edit operations on a workout.
//!
//! Operations addressing a segment or annotation by id are silent no-ops when
//! the id is unknown: the editor deselects after deletes, so stale ids are
//! expected and not an error.

use chrono::Utc;
use uuid::Uuid;

use crate::metrics::pace::{estimate_running_times, PaceIndex};
use crate::metrics::zones::{Zone, MIN_POWER};
use crate::workouts::types::{
    Annotation, AthleteProfile, Block, IntervalsParams, RampParams, Segment, SportType,
    SteadyParams, Workout, WorkoutTag,
};

/// Smallest bike segment duration in seconds.
pub const MIN_DURATION_SECONDS: u32 = 5;
/// Run-mode length step and floor in meters.
pub const LENGTH_STEP_METERS: u32 = 200;
/// Power of a new Z1 steady segment.
pub const Z1_DEFAULT_POWER: f64 = 0.5;

/// Direction to move a segment on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Towards the start of the workout
    Earlier,
    /// Towards the end of the workout
    Later,
}

/// Outcome of an annotation delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationDeletion {
    Deleted,
    /// The annotation has text; ask the user and retry with `confirmed`
    NeedsConfirmation,
    NotFound,
}

/// Apply `delta` to `value`. Decreases stop at `floor`, and a value already
/// below the floor is never raised by a decrease.
fn step_clamped(value: u32, delta: i64, floor: u32) -> u32 {
    let target = value as i64 + delta;
    if delta < 0 {
        target.max(floor.min(value) as i64) as u32
    } else {
        target.min(u32::MAX as i64) as u32
    }
}

fn round_power(power: f64) -> f64 {
    (power * 1000.0).round() / 1000.0
}

impl Workout {
    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn segment_mut(&mut self, id: Uuid) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|segment| segment.id == id)
    }

    /// Append an already built segment.
    pub fn push_segment(&mut self, segment: Segment) -> Uuid {
        let id = segment.id;
        tracing::debug!(segment = %id, kind = %segment.kind(), "Adding segment");
        self.segments.push(segment);
        self.touch();
        id
    }

    pub fn add_steady(&mut self, params: SteadyParams) -> Uuid {
        self.push_segment(params.into_segment())
    }

    /// Append a default steady segment for `zone`.
    ///
    /// Z1 starts at 50% FTP; the other zones start at their floor.
    pub fn add_steady_in_zone(&mut self, zone: Zone) -> Uuid {
        let power = match zone {
            Zone::Z1 => Z1_DEFAULT_POWER,
            _ => zone.min(),
        };
        self.add_steady(SteadyParams::new(power))
    }

    pub fn add_ramp(&mut self, params: RampParams) -> Uuid {
        self.push_segment(params.into_segment())
    }

    pub fn add_intervals(&mut self, params: IntervalsParams) -> Uuid {
        self.push_segment(params.into_segment())
    }

    pub fn add_free_ride(&mut self, duration_seconds: u32) -> Uuid {
        self.push_segment(Segment::new(
            Block::FreeRide { duration_seconds },
            0,
            PaceIndex::OneMile,
        ))
    }

    /// Remove a segment. Returns whether anything was removed.
    pub fn remove_segment(&mut self, id: Uuid) -> bool {
        let before = self.segments.len();
        self.segments.retain(|segment| segment.id != id);
        let removed = self.segments.len() != before;
        if removed {
            tracing::debug!(segment = %id, "Removed segment");
            self.touch();
        }
        removed
    }

    /// Swap a segment with its neighbour. No-op at either end.
    pub fn move_segment(&mut self, id: Uuid, direction: MoveDirection) {
        let Some(index) = self.segments.iter().position(|segment| segment.id == id) else {
            return;
        };

        let target = match direction {
            MoveDirection::Earlier if index > 0 => index - 1,
            MoveDirection::Later if index + 1 < self.segments.len() => index + 1,
            _ => return,
        };

        self.segments.swap(index, target);
        self.touch();
    }

    /// Append a copy of a segment at the end of the workout.
    pub fn duplicate_segment(&mut self, id: Uuid) -> Option<Uuid> {
        let copy = self.segment(id)?.duplicate();
        Some(self.push_segment(copy))
    }

    /// Lengthen or shorten a segment.
    ///
    /// Bike workouts change the duration by `delta` seconds (floor 5 s); run
    /// workouts move the length by one 200 m step in the direction of
    /// `delta` (floor 200 m). Interval blocks adjust their "on" part.
    pub fn adjust_duration(&mut self, id: Uuid, delta: i32) {
        let sport = self.sport_type;
        let Some(segment) = self.segment_mut(id) else {
            return;
        };

        match sport {
            SportType::Bike => {
                let delta = delta as i64;
                match &mut segment.block {
                    Block::Steady {
                        duration_seconds, ..
                    }
                    | Block::Ramp {
                        duration_seconds, ..
                    }
                    | Block::FreeRide { duration_seconds } => {
                        *duration_seconds =
                            step_clamped(*duration_seconds, delta, MIN_DURATION_SECONDS);
                    }
                    Block::Intervals {
                        on_duration_seconds,
                        ..
                    } => {
                        *on_duration_seconds =
                            step_clamped(*on_duration_seconds, delta, MIN_DURATION_SECONDS);
                    }
                }
            }
            SportType::Run => {
                let delta = LENGTH_STEP_METERS as i64 * delta.signum() as i64;
                match &mut segment.block {
                    Block::Steady { length_meters, .. } | Block::Ramp { length_meters, .. } => {
                        *length_meters = step_clamped(*length_meters, delta, LENGTH_STEP_METERS);
                    }
                    Block::Intervals {
                        on_length_meters, ..
                    } => {
                        *on_length_meters =
                            step_clamped(*on_length_meters, delta, LENGTH_STEP_METERS);
                    }
                    Block::FreeRide { .. } => return,
                }
            }
        }
        self.touch();
    }

    /// Change a steady segment's power by whole watts at the current FTP.
    ///
    /// The result is rounded to three decimals and never drops below the Z1
    /// floor. Other segment shapes are left alone.
    pub fn adjust_power(&mut self, id: Uuid, delta_watts: i32) {
        let ftp = self.athlete.ftp_watts;
        if ftp == 0 {
            return;
        }
        let Some(segment) = self.segment_mut(id) else {
            return;
        };

        if let Block::Steady { power, .. } = &mut segment.block {
            let target = round_power(*power + delta_watts as f64 / ftp as f64);
            *power = if delta_watts < 0 {
                target.max(MIN_POWER.min(*power))
            } else {
                target
            };
            self.touch();
        }
    }

    pub fn set_cadence(&mut self, id: Uuid, cadence: u16) {
        if let Some(segment) = self.segment_mut(id) {
            segment.cadence = cadence;
            self.touch();
        }
    }

    pub fn set_pace(&mut self, id: Uuid, pace: PaceIndex) {
        if let Some(segment) = self.segment_mut(id) {
            segment.pace = pace;
            self.touch();
        }
    }

    /// Add a text cue at `position` (seconds for bike, meters for run).
    pub fn add_annotation(&mut self, text: impl Into<String>, position: u32) -> Uuid {
        let annotation = Annotation::new(text, position, self.sport_type);
        let id = annotation.id;
        self.annotations.push(annotation);
        self.touch();
        id
    }

    pub fn edit_annotation(&mut self, id: Uuid, text: impl Into<String>, position: u32) {
        let sport = self.sport_type;
        if let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == id) {
            annotation.text = text.into();
            annotation.set_position(position, sport);
            self.touch();
        }
    }

    /// Delete a text cue. Non-empty cues need `confirmed` to be set.
    pub fn delete_annotation(&mut self, id: Uuid, confirmed: bool) -> AnnotationDeletion {
        let Some(annotation) = self.annotation(id) else {
            return AnnotationDeletion::NotFound;
        };

        if !annotation.text.is_empty() && !confirmed {
            return AnnotationDeletion::NeedsConfirmation;
        }

        self.annotations.retain(|a| a.id != id);
        self.touch();
        AnnotationDeletion::Deleted
    }

    pub fn set_sport_type(&mut self, sport: SportType) {
        if self.sport_type != sport {
            tracing::debug!(%sport, "Changing sport type");
            self.sport_type = sport;
            self.touch();
        }
    }

    /// Select a tag, or deselect it when already selected.
    pub fn toggle_tag(&mut self, tag: WorkoutTag) {
        if let Some(index) = self.tags.iter().position(|t| *t == tag) {
            self.tags.remove(index);
        } else {
            self.tags.push(tag);
        }
        self.touch();
    }

    pub fn set_ftp(&mut self, ftp: u16) -> Result<(), &'static str> {
        if !AthleteProfile::validate_ftp(ftp) {
            return Err("FTP must be between 50 and 600 watts");
        }
        self.athlete.ftp_watts = ftp;
        self.touch();
        Ok(())
    }

    pub fn set_weight(&mut self, weight_kg: f32) -> Result<(), &'static str> {
        if !AthleteProfile::validate_weight(weight_kg) {
            return Err("Weight must be between 30 and 200 kg");
        }
        self.athlete.weight_kg = weight_kg;
        self.touch();
        Ok(())
    }

    pub fn set_race_time(&mut self, pace: PaceIndex, seconds: Option<u32>) {
        self.athlete.race_times.set(pace, seconds);
        self.touch();
    }

    /// Fill in missing personal bests from the ones entered.
    pub fn estimate_race_times(&mut self) {
        self.athlete.race_times = estimate_running_times(&self.athlete.race_times);
        self.touch();
    }

    /// Drop all segments and annotations, keeping metadata.
    pub fn clear_content(&mut self) {
        self.segments.clear();
        self.annotations.clear();
        self.touch();
    }

    /// Start over with a blank workout under a new id.
    ///
    /// Athlete parameters and sport type carry over.
    pub fn reset(&mut self) {
        let athlete = self.athlete.clone();
        let sport = self.sport_type;
        *self = Workout::new(athlete);
        self.sport_type = sport;
        tracing::info!(workout = %self.id, "Started new workout");
    }
}
