//! Database schema definitions for the workout store.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Workouts table
CREATE TABLE IF NOT EXISTS workouts (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    author TEXT NOT NULL,
    sport_type TEXT NOT NULL DEFAULT 'bike',
    tags_json TEXT NOT NULL,
    segments_json TEXT NOT NULL,
    annotations_json TEXT NOT NULL,
    athlete_json TEXT NOT NULL,
    total_duration_seconds INTEGER NOT NULL,
    total_distance_meters INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

-- Per-user workout index
CREATE TABLE IF NOT EXISTS user_workouts (
    user_id TEXT NOT NULL,
    workout_id TEXT NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (user_id, workout_id)
);

CREATE INDEX IF NOT EXISTS idx_workouts_owner ON workouts(owner_id);
CREATE INDEX IF NOT EXISTS idx_user_workouts_user ON user_workouts(user_id, updated_at);
"#;

/// Schema version tracking table
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;
