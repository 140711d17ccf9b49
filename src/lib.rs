//! Workout Editor - structured interval workout authoring
//!
//! Core of a workout editor: the segment model and its edit operations,
//! `.zwo` XML serialization in both directions, training metrics and
//! running pace estimation, plus the editor session that persists state and
//! talks to storage collaborators.

pub mod integrations;
pub mod logging;
pub mod metrics;
pub mod session;
pub mod storage;
pub mod workouts;

// Re-export commonly used types
pub use metrics::calculator::{training_stress_score, WorkoutSummary};
pub use session::EditorSession;
pub use storage::config::EditorConfig;
pub use workouts::parser_zwo::parse_zwo;
pub use workouts::types::{Segment, SportType, Workout};
pub use workouts::writer_zwo::write_zwo;
