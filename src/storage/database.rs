//! Workout store using rusqlite.
//!
//! Each workout is one row with its segments, annotations and athlete
//! parameters as JSON columns. A second table indexes workouts per user so
//! an account can list what it saved.

use crate::integrations::{CurrentUser, SyncError, WorkoutBackend};
use crate::metrics::calculator::{total_distance, total_duration};
use crate::storage::schema::{CURRENT_VERSION, SCHEMA, SCHEMA_VERSION_TABLE};
use crate::workouts::types::{SportType, Workout};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// SQLite-backed workout store.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct SqliteWorkoutStore {
    conn: Arc<Mutex<Connection>>,
}

/// Entry of a user's workout list.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutListing {
    pub id: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

impl SqliteWorkoutStore {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize()?;

        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.initialize()?;

        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn
            .lock()
            .map_err(|_| DatabaseError::ConnectionFailed("connection lock poisoned".to_string()))
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<(), DatabaseError> {
        let conn = self.lock()?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        conn.execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let current_version = Self::schema_version(&conn)?;
        if current_version < CURRENT_VERSION {
            Self::migrate(&conn, current_version)?;
        }

        Ok(())
    }

    fn schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
        let result: SqliteResult<i32> = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        );

        match result {
            Ok(version) => Ok(version),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Get the current schema version.
    pub fn get_schema_version(&self) -> Result<i32, DatabaseError> {
        let conn = self.lock()?;
        Self::schema_version(&conn)
    }

    fn migrate(conn: &Connection, from_version: i32) -> Result<(), DatabaseError> {
        if from_version < 1 {
            conn.execute_batch(SCHEMA)
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
                [CURRENT_VERSION],
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

            tracing::info!("Database migrated to version {}", CURRENT_VERSION);
        }

        Ok(())
    }

    /// Insert or replace a workout and link it to `owner_id`.
    pub fn upsert_workout(&self, owner_id: &str, workout: &Workout) -> Result<(), DatabaseError> {
        let tags_json = to_json(&workout.tags, "tags")?;
        let segments_json = to_json(&workout.segments, "segments")?;
        let annotations_json = to_json(&workout.annotations, "annotations")?;
        let athlete_json = to_json(&workout.athlete, "athlete")?;
        let updated_at = workout.updated_at.to_rfc3339();

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tx.execute(
            "INSERT INTO workouts (id, owner_id, name, description, author, sport_type,
             tags_json, segments_json, annotations_json, athlete_json,
             total_duration_seconds, total_distance_meters, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                author = excluded.author,
                sport_type = excluded.sport_type,
                tags_json = excluded.tags_json,
                segments_json = excluded.segments_json,
                annotations_json = excluded.annotations_json,
                athlete_json = excluded.athlete_json,
                total_duration_seconds = excluded.total_duration_seconds,
                total_distance_meters = excluded.total_distance_meters,
                updated_at = excluded.updated_at",
            params![
                workout.id,
                owner_id,
                workout.name,
                workout.description,
                workout.author,
                workout.sport_type.as_str(),
                tags_json,
                segments_json,
                annotations_json,
                athlete_json,
                total_duration(workout),
                total_distance(workout),
                updated_at,
            ],
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        tx.execute(
            "INSERT INTO user_workouts (user_id, workout_id, name, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, workout_id) DO UPDATE SET
                name = excluded.name,
                updated_at = excluded.updated_at",
            params![owner_id, workout.id, workout.name, updated_at],
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tracing::debug!(workout = %workout.id, owner = owner_id, "Stored workout");
        Ok(())
    }

    /// Get a workout by ID.
    pub fn get_workout(&self, id: &str) -> Result<Option<Workout>, DatabaseError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, description, author, sport_type, tags_json, segments_json,
                 annotations_json, athlete_json, updated_at FROM workouts WHERE id = ?1",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let result = stmt.query_row(params![id], |row| {
            Ok(WorkoutRow {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                author: row.get(3)?,
                sport_type: row.get(4)?,
                tags_json: row.get(5)?,
                segments_json: row.get(6)?,
                annotations_json: row.get(7)?,
                athlete_json: row.get(8)?,
                updated_at: row.get(9)?,
            })
        });

        match result {
            Ok(row) => Ok(Some(row.into_workout()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Workouts linked to a user, most recently saved first.
    pub fn list_user_workouts(&self, user_id: &str) -> Result<Vec<WorkoutListing>, DatabaseError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT workout_id, name, updated_at FROM user_workouts
                 WHERE user_id = ?1 ORDER BY updated_at DESC",
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let mut listings = Vec::new();
        for row in rows {
            let (id, name, updated_at) = row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
            listings.push(WorkoutListing {
                id,
                name,
                updated_at: parse_timestamp(&updated_at)?,
            });
        }

        Ok(listings)
    }

    /// Delete a workout and every user link to it.
    ///
    /// Only the owner may delete; other users get `NotFound`.
    pub fn delete_workout(&self, owner_id: &str, id: &str) -> Result<(), DatabaseError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        let rows = tx
            .execute(
                "DELETE FROM workouts WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if rows == 0 {
            return Err(DatabaseError::NotFound(id.to_string()));
        }

        tx.execute(
            "DELETE FROM user_workouts WHERE workout_id = ?1",
            params![id],
        )
        .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tracing::debug!(workout = id, "Deleted workout");
        Ok(())
    }

    /// Count all stored workouts.
    pub fn count_workouts(&self) -> Result<usize, DatabaseError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM workouts", [], |row| row.get(0))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(count as usize)
    }
}

impl WorkoutBackend for SqliteWorkoutStore {
    async fn persist_workout(&self, user: &CurrentUser, workout: &Workout) -> Result<(), SyncError> {
        let store = self.clone();
        let owner = user.uid.clone();
        let workout = workout.clone();
        run_blocking(move || store.upsert_workout(&owner, &workout)).await
    }

    async fn delete_workout(&self, user: &CurrentUser, id: &str) -> Result<(), SyncError> {
        let store = self.clone();
        let owner = user.uid.clone();
        let workout_id = id.to_string();
        run_blocking(move || SqliteWorkoutStore::delete_workout(&store, &owner, &workout_id)).await
    }

    async fn load_workout(&self, id: &str) -> Result<Option<Workout>, SyncError> {
        let store = self.clone();
        let id = id.to_string();
        run_blocking(move || store.get_workout(&id)).await
    }
}

/// Run a blocking database call off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, SyncError>
where
    F: FnOnce() -> Result<T, DatabaseError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SyncError::BackendError(format!("Database task failed: {}", e)))?
        .map_err(|e| match e {
            DatabaseError::NotFound(what) => SyncError::NotFound(what),
            other => SyncError::from(other),
        })
}

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> Result<String, DatabaseError> {
    serde_json::to_string(value)
        .map_err(|e| DatabaseError::SerializationError(format!("Invalid {}: {}", what, e)))
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str, what: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(json)
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid {} JSON: {}", what, e)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid date: {}", e)))
}

/// Intermediate struct for reading workout rows from database.
struct WorkoutRow {
    id: String,
    name: String,
    description: String,
    author: String,
    sport_type: String,
    tags_json: String,
    segments_json: String,
    annotations_json: String,
    athlete_json: String,
    updated_at: String,
}

impl WorkoutRow {
    fn into_workout(self) -> Result<Workout, DatabaseError> {
        let sport_type = SportType::parse(&self.sport_type).ok_or_else(|| {
            DatabaseError::DeserializationError(format!("Invalid sport type: {}", self.sport_type))
        })?;

        Ok(Workout {
            id: self.id,
            name: self.name,
            description: self.description,
            author: self.author,
            sport_type,
            tags: from_json(&self.tags_json, "tags")?,
            segments: from_json(&self.segments_json, "segments")?,
            annotations: from_json(&self.annotations_json, "annotations")?,
            athlete: from_json(&self.athlete_json, "athlete")?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}
