//! Workout model, edit operations and .zwo file support.

pub mod editor;
pub mod parser_zwo;
pub mod types;
pub mod writer_zwo;

pub use editor::{AnnotationDeletion, MoveDirection};
pub use parser_zwo::{parse_zwo, parse_zwo_file, WorkoutFile};
pub use types::{
    Annotation, AthleteProfile, Block, IntervalsParams, RampParams, Segment, SegmentType,
    SportType, SteadyParams, Workout, WorkoutExportError, WorkoutParseError, WorkoutTag,
};
pub use writer_zwo::{write_zwo, write_zwo_to_file};
