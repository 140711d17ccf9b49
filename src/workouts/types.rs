//! Workout types and enums.
//!
//! A workout is an ordered list of [`Segment`]s plus timed [`Annotation`]s.
//! Each segment is one of four block shapes; the shape decides which fields
//! exist, so serialization and metrics match exhaustively on [`Block`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::metrics::pace::{PaceIndex, RaceTimes};

/// Default duration of a new steady or ramp segment.
pub const DEFAULT_SEGMENT_SECONDS: u32 = 300;
/// Default duration of a new free ride segment.
pub const DEFAULT_FREE_RIDE_SECONDS: u32 = 600;
/// Default length of a new steady segment in run mode.
pub const DEFAULT_STEADY_METERS: u32 = 200;
/// Default length of a new ramp segment in run mode.
pub const DEFAULT_RAMP_METERS: u32 = 1000;

/// Sport a workout is written for.
///
/// Bike workouts are measured in time, run workouts in distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SportType {
    #[default]
    Bike,
    Run,
}

impl SportType {
    /// Value written to the `sportType` element.
    pub fn as_str(&self) -> &'static str {
        match self {
            SportType::Bike => "bike",
            SportType::Run => "run",
        }
    }

    /// Parse the `sportType` element value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bike" => Some(SportType::Bike),
            "run" => Some(SportType::Run),
            _ => None,
        }
    }
}

impl std::fmt::Display for SportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tags a workout can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorkoutTag {
    Recovery,
    Intervals,
    #[serde(rename = "FTP")]
    Ftp,
    #[serde(rename = "TT")]
    Tt,
}

impl WorkoutTag {
    /// The full tag vocabulary, in display order.
    pub const ALL: [WorkoutTag; 4] = [
        WorkoutTag::Recovery,
        WorkoutTag::Intervals,
        WorkoutTag::Ftp,
        WorkoutTag::Tt,
    ];

    /// Name as written in `<tag name="..."/>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutTag::Recovery => "Recovery",
            WorkoutTag::Intervals => "Intervals",
            WorkoutTag::Ftp => "FTP",
            WorkoutTag::Tt => "TT",
        }
    }

    /// Look up a tag by name. Unknown names are not part of the vocabulary.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for WorkoutTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type of workout segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    /// Constant power
    Steady,
    /// Linear power change
    Ramp,
    /// Repeating on/off blocks
    Intervals,
    /// No power target
    FreeRide,
}

impl std::fmt::Display for SegmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentType::Steady => write!(f, "Steady State"),
            SegmentType::Ramp => write!(f, "Ramp"),
            SegmentType::Intervals => write!(f, "Intervals"),
            SegmentType::FreeRide => write!(f, "Free Ride"),
        }
    }
}

/// Shape of a segment with the fields that shape needs.
///
/// Power values are fractions of FTP (1.0 = 100% FTP). Durations are used in
/// bike mode, lengths in run mode; both are kept so switching sport type
/// does not lose either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Steady {
        duration_seconds: u32,
        length_meters: u32,
        power: f64,
    },
    Ramp {
        duration_seconds: u32,
        length_meters: u32,
        start_power: f64,
        end_power: f64,
    },
    Intervals {
        repeat: u32,
        on_duration_seconds: u32,
        off_duration_seconds: u32,
        on_length_meters: u32,
        off_length_meters: u32,
        on_power: f64,
        off_power: f64,
    },
    FreeRide {
        duration_seconds: u32,
    },
}

/// A single segment within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Stable identifier used for selection and ordering
    pub id: Uuid,
    /// Target cadence in RPM, 0 when unset
    pub cadence: u16,
    /// Reference pace for run workouts
    pub pace: PaceIndex,
    /// Shape-specific fields
    pub block: Block,
}

impl Segment {
    /// Wrap a block in a segment with a fresh id.
    pub fn new(block: Block, cadence: u16, pace: PaceIndex) -> Self {
        Self {
            id: Uuid::new_v4(),
            cadence,
            pace,
            block,
        }
    }

    /// Segment kind derived from the block shape.
    pub fn kind(&self) -> SegmentType {
        match self.block {
            Block::Steady { .. } => SegmentType::Steady,
            Block::Ramp { .. } => SegmentType::Ramp,
            Block::Intervals { .. } => SegmentType::Intervals,
            Block::FreeRide { .. } => SegmentType::FreeRide,
        }
    }

    /// Total time covered by the segment.
    pub fn duration_seconds(&self) -> u32 {
        match self.block {
            Block::Steady {
                duration_seconds, ..
            }
            | Block::Ramp {
                duration_seconds, ..
            }
            | Block::FreeRide { duration_seconds } => duration_seconds,
            Block::Intervals {
                repeat,
                on_duration_seconds,
                off_duration_seconds,
                ..
            } => repeat.saturating_mul(on_duration_seconds.saturating_add(off_duration_seconds)),
        }
    }

    /// Total distance covered by the segment. Free rides carry no length.
    pub fn length_meters(&self) -> u32 {
        match self.block {
            Block::Steady { length_meters, .. } | Block::Ramp { length_meters, .. } => {
                length_meters
            }
            Block::Intervals {
                repeat,
                on_length_meters,
                off_length_meters,
                ..
            } => repeat.saturating_mul(on_length_meters.saturating_add(off_length_meters)),
            Block::FreeRide { .. } => 0,
        }
    }

    /// Authoritative extent of the segment for the given sport.
    pub fn span(&self, sport: SportType) -> u32 {
        match sport {
            SportType::Bike => self.duration_seconds(),
            SportType::Run => self.length_meters(),
        }
    }

    /// Copy of this segment under a new id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }
}

/// Parameters for a new steady segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteadyParams {
    pub power: f64,
    pub duration_seconds: u32,
    pub cadence: u16,
    pub pace: PaceIndex,
    pub length_meters: u32,
}

impl SteadyParams {
    /// Steady effort at `power` with the default 300 s / 200 m extent.
    pub fn new(power: f64) -> Self {
        Self {
            power,
            duration_seconds: DEFAULT_SEGMENT_SECONDS,
            cadence: 0,
            pace: PaceIndex::OneMile,
            length_meters: DEFAULT_STEADY_METERS,
        }
    }

    pub fn into_segment(self) -> Segment {
        Segment::new(
            Block::Steady {
                duration_seconds: self.duration_seconds,
                length_meters: self.length_meters,
                power: self.power,
            },
            self.cadence,
            self.pace,
        )
    }
}

/// Parameters for a new ramp segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampParams {
    pub start_power: f64,
    pub end_power: f64,
    pub duration_seconds: u32,
    pub pace: PaceIndex,
    pub length_meters: u32,
}

impl RampParams {
    /// Ramp from `start_power` to `end_power` over 300 s / 1000 m.
    pub fn new(start_power: f64, end_power: f64) -> Self {
        Self {
            start_power,
            end_power,
            duration_seconds: DEFAULT_SEGMENT_SECONDS,
            pace: PaceIndex::OneMile,
            length_meters: DEFAULT_RAMP_METERS,
        }
    }

    pub fn into_segment(self) -> Segment {
        Segment::new(
            Block::Ramp {
                duration_seconds: self.duration_seconds,
                length_meters: self.length_meters,
                start_power: self.start_power,
                end_power: self.end_power,
            },
            0,
            self.pace,
        )
    }
}

/// Parameters for a new interval block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalsParams {
    pub repeat: u32,
    pub on_duration_seconds: u32,
    pub off_duration_seconds: u32,
    pub on_power: f64,
    pub off_power: f64,
    pub cadence: u16,
    pub pace: PaceIndex,
    pub on_length_meters: u32,
    pub off_length_meters: u32,
}

impl Default for IntervalsParams {
    /// Three repeats of 30 s at 100% and 120 s at 50%.
    fn default() -> Self {
        Self {
            repeat: 3,
            on_duration_seconds: 30,
            off_duration_seconds: 120,
            on_power: 1.0,
            off_power: 0.5,
            cadence: 0,
            pace: PaceIndex::OneMile,
            on_length_meters: 200,
            off_length_meters: 200,
        }
    }
}

impl IntervalsParams {
    pub fn into_segment(self) -> Segment {
        Segment::new(
            Block::Intervals {
                repeat: self.repeat,
                on_duration_seconds: self.on_duration_seconds,
                off_duration_seconds: self.off_duration_seconds,
                on_length_meters: self.on_length_meters,
                off_length_meters: self.off_length_meters,
                on_power: self.on_power,
                off_power: self.off_power,
            },
            self.cadence,
            self.pace,
        )
    }
}

/// A text cue shown to the athlete at a point in the workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: Uuid,
    pub text: String,
    /// Position in bike workouts
    pub time_seconds: u32,
    /// Position in run workouts
    pub distance_meters: u32,
}

impl Annotation {
    /// Create an annotation at `position` in the units of `sport`.
    pub fn new(text: impl Into<String>, position: u32, sport: SportType) -> Self {
        let mut annotation = Self {
            id: Uuid::new_v4(),
            text: text.into(),
            time_seconds: 0,
            distance_meters: 0,
        };
        annotation.set_position(position, sport);
        annotation
    }

    /// Position in the units of `sport`.
    pub fn position(&self, sport: SportType) -> u32 {
        match sport {
            SportType::Bike => self.time_seconds,
            SportType::Run => self.distance_meters,
        }
    }

    pub fn set_position(&mut self, position: u32, sport: SportType) {
        match sport {
            SportType::Bike => self.time_seconds = position,
            SportType::Run => self.distance_meters = position,
        }
    }
}

/// Athlete parameters the editor converts relative targets with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    /// Functional Threshold Power in watts
    pub ftp_watts: u16,
    /// Weight in kilograms
    pub weight_kg: f32,
    /// Personal-best race times, used by run workouts
    pub race_times: RaceTimes,
}

impl Default for AthleteProfile {
    fn default() -> Self {
        Self {
            ftp_watts: 200,
            weight_kg: 75.0,
            race_times: RaceTimes::default(),
        }
    }
}

impl AthleteProfile {
    /// Validate FTP value (50-600 watts).
    pub fn validate_ftp(ftp: u16) -> bool {
        (50..=600).contains(&ftp)
    }

    /// Validate weight value (30-200 kg).
    pub fn validate_weight(weight: f32) -> bool {
        (30.0..=200.0).contains(&weight)
    }
}

/// A structured training workout being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    /// Identifier, also the exported file stem
    pub id: String,
    pub name: String,
    pub description: String,
    pub author: String,
    pub sport_type: SportType,
    /// Selected tags, in selection order without duplicates
    pub tags: Vec<WorkoutTag>,
    /// Ordered list of segments
    pub segments: Vec<Segment>,
    pub annotations: Vec<Annotation>,
    pub athlete: AthleteProfile,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for Workout {
    fn default() -> Self {
        Self::new(AthleteProfile::default())
    }
}

impl Workout {
    /// Create an empty workout with a fresh id.
    pub fn new(athlete: AthleteProfile) -> Self {
        Self {
            id: generate_workout_id(),
            name: String::new(),
            description: String::new(),
            author: String::new(),
            sport_type: SportType::Bike,
            tags: Vec::new(),
            segments: Vec::new(),
            annotations: Vec::new(),
            athlete,
            updated_at: Utc::now(),
        }
    }

    /// File name used for downloads and object storage.
    pub fn file_name(&self) -> String {
        format!("{}.zwo", self.id)
    }

    pub fn segment(&self, id: Uuid) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.id == id)
    }

    pub fn annotation(&self, id: Uuid) -> Option<&Annotation> {
        self.annotations.iter().find(|annotation| annotation.id == id)
    }
}

/// Generate a short opaque workout id.
pub fn generate_workout_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

/// Errors during workout file parsing.
#[derive(Debug, Error)]
pub enum WorkoutParseError {
    /// Invalid XML structure
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// Document root is not `workout_file`
    #[error("Unexpected root element: {0}")]
    UnexpectedRoot(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid field value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// IO error reading file
    #[error("IO error: {0}")]
    IoError(String),
}

/// Errors during workout file generation.
#[derive(Debug, Error)]
pub enum WorkoutExportError {
    /// XML generation error
    #[error("XML error: {0}")]
    XmlError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
