//! Editor session.
//!
//! Owns the one workout being edited. Every mutation goes through
//! [`EditorSession::edit`] (or a session operation built on it), after which
//! the full working state is written to the key-value store so a restart can
//! pick up where the user left off. Remote operations report failures both
//! as an error and as a status message for the UI; local state is never
//! rolled back.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::integrations::{CurrentUser, FileStorage, HttpFileStorage, SyncError, WorkoutBackend};
use crate::metrics::calculator::{summarize, WorkoutSummary};
use crate::metrics::pace::{format_race_time, parse_race_time, PaceIndex};
use crate::storage::config::{get_data_dir, EditorConfig};
use crate::storage::database::SqliteWorkoutStore;
use crate::storage::kv_store::{FileStore, KeyValueStore, StoreError};
use crate::workouts::parser_zwo::parse_zwo;
use crate::workouts::types::{
    Annotation, AthleteProfile, Segment, SportType, Workout, WorkoutExportError,
    WorkoutParseError, WorkoutTag,
};
use crate::workouts::writer_zwo::write_zwo;

/// Keys the session state is stored under.
pub mod keys {
    pub const ID: &str = "id";
    pub const CURRENT_WORKOUT: &str = "currentWorkout";
    pub const INSTRUCTIONS: &str = "instructions";
    pub const FTP: &str = "ftp";
    pub const WEIGHT: &str = "weight";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const AUTHOR: &str = "author";
    pub const TAGS: &str = "tags";
    pub const SPORT_TYPE: &str = "sportType";
    pub const ONE_MILE_TIME: &str = "oneMileTime";
    pub const FIVE_KM_TIME: &str = "fiveKmTime";
    pub const TEN_KM_TIME: &str = "tenKmTime";
    pub const HALF_MARATHON_TIME: &str = "halfMarathonTime";
    pub const MARATHON_TIME: &str = "marathonTime";
}

/// Store key holding the personal best for `pace`.
fn race_time_key(pace: PaceIndex) -> &'static str {
    match pace {
        PaceIndex::OneMile => keys::ONE_MILE_TIME,
        PaceIndex::FiveKm => keys::FIVE_KM_TIME,
        PaceIndex::TenKm => keys::TEN_KM_TIME,
        PaceIndex::HalfMarathon => keys::HALF_MARATHON_TIME,
        PaceIndex::Marathon => keys::MARATHON_TIME,
    }
}

/// Kind of status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Loading,
    Error,
    Info,
}

/// Transient message for the UI to show until dismissed or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// A serialized workout ready to hand to the user as a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutDownload {
    pub file_name: String,
    pub xml: String,
}

/// Where a save ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Signed in: stored in the backend and uploaded to object storage
    Uploaded { file_name: String },
    /// Signed out: nothing left the process, the file is returned instead
    Local(WorkoutDownload),
}

/// Session operation errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Export failed: {0}")]
    Export(#[from] WorkoutExportError),

    #[error("Import failed: {0}")]
    Parse(#[from] WorkoutParseError),

    #[error("Remote storage failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Session cache failed: {0}")]
    Store(#[from] StoreError),
}

/// The editor's single-writer session over one workout.
pub struct EditorSession<S: KeyValueStore> {
    workout: Workout,
    store: S,
    user: Option<CurrentUser>,
    status: Option<StatusMessage>,
}

impl<S: KeyValueStore> EditorSession<S> {
    /// Restore the last session from `store`.
    ///
    /// Missing keys fall back to a blank workout with `athlete` defaults;
    /// unreadable values are logged and skipped. The restored state is
    /// written back immediately so a freshly generated id sticks.
    pub fn restore(store: S, athlete: AthleteProfile) -> Self {
        let mut workout = Workout::new(athlete);
        let read = |key: &str| match store.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(key, error = %e, "Cannot read session value");
                None
            }
        };

        if let Some(id) = read(keys::ID) {
            workout.id = id;
        }
        if let Some(segments) = read(keys::CURRENT_WORKOUT)
            .and_then(|v| decode::<Vec<Segment>>(keys::CURRENT_WORKOUT, &v))
        {
            workout.segments = segments;
        }
        if let Some(annotations) = read(keys::INSTRUCTIONS)
            .and_then(|v| decode::<Vec<Annotation>>(keys::INSTRUCTIONS, &v))
        {
            workout.annotations = annotations;
        }
        if let Some(tags) =
            read(keys::TAGS).and_then(|v| decode::<Vec<WorkoutTag>>(keys::TAGS, &v))
        {
            workout.tags = tags;
        }
        if let Some(name) = read(keys::NAME) {
            workout.name = name;
        }
        if let Some(description) = read(keys::DESCRIPTION) {
            workout.description = description;
        }
        if let Some(author) = read(keys::AUTHOR) {
            workout.author = author;
        }
        if let Some(sport) = read(keys::SPORT_TYPE).and_then(|v| SportType::parse(&v)) {
            workout.sport_type = sport;
        }
        match read(keys::FTP).map(|v| v.trim().parse::<u16>()) {
            Some(Ok(ftp)) if AthleteProfile::validate_ftp(ftp) => workout.athlete.ftp_watts = ftp,
            Some(_) => tracing::warn!("Ignoring invalid stored FTP"),
            None => {}
        }
        match read(keys::WEIGHT).map(|v| v.trim().parse::<f32>()) {
            Some(Ok(weight)) if AthleteProfile::validate_weight(weight) => {
                workout.athlete.weight_kg = weight
            }
            Some(_) => tracing::warn!("Ignoring invalid stored weight"),
            None => {}
        }
        for pace in PaceIndex::ALL {
            if let Some(seconds) = read(race_time_key(pace)).and_then(|v| parse_race_time(&v)) {
                workout.athlete.race_times.set(pace, Some(seconds));
            }
        }

        tracing::debug!(
            workout = %workout.id,
            segments = workout.segments.len(),
            "Restored editor session"
        );

        let mut session = Self {
            workout,
            store,
            user: None,
            status: None,
        };
        session.persist();
        session
    }

    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    /// Sign in or out. Affects where [`save`](Self::save) sends the workout.
    pub fn set_user(&mut self, user: Option<CurrentUser>) {
        self.user = user;
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(StatusMessage::new(kind, text));
    }

    pub fn dismiss_status(&mut self) {
        self.status = None;
    }

    /// Footer totals for the current workout.
    pub fn summary(&self) -> WorkoutSummary {
        summarize(&self.workout)
    }

    /// Apply a mutation and persist the result.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Workout) -> R) -> R {
        let result = f(&mut self.workout);
        self.persist();
        result
    }

    /// Blank workout under a new id, keeping athlete and sport type.
    pub fn new_workout(&mut self) {
        self.edit(Workout::reset);
    }

    /// Write every session key. Failures are logged and shown, never fatal.
    fn persist(&mut self) {
        if let Err(e) = self.try_persist() {
            tracing::error!(error = %e, "Cannot write session cache");
            self.set_status(StatusKind::Error, "Cannot store workout locally");
        }
    }

    /// Write every session key, reporting failures.
    pub fn try_persist(&mut self) -> Result<(), StoreError> {
        let entries = self.entries()?;
        self.store.set_many(&entries)
    }

    fn entries(&self) -> Result<Vec<(&'static str, String)>, StoreError> {
        let workout = &self.workout;
        let mut entries = vec![
            (keys::ID, workout.id.clone()),
            (keys::CURRENT_WORKOUT, encode(&workout.segments)?),
            (keys::INSTRUCTIONS, encode(&workout.annotations)?),
            (keys::FTP, workout.athlete.ftp_watts.to_string()),
            (keys::WEIGHT, workout.athlete.weight_kg.to_string()),
            (keys::NAME, workout.name.clone()),
            (keys::DESCRIPTION, workout.description.clone()),
            (keys::AUTHOR, workout.author.clone()),
            (keys::TAGS, encode(&workout.tags)?),
            (keys::SPORT_TYPE, workout.sport_type.as_str().to_string()),
        ];
        for pace in PaceIndex::ALL {
            let value = workout
                .athlete
                .race_times
                .get(pace)
                .map(format_race_time)
                .unwrap_or_default();
            entries.push((race_time_key(pace), value));
        }
        Ok(entries)
    }

    /// The workout as a `{id}.zwo` file.
    pub fn download(&self) -> Result<WorkoutDownload, WorkoutExportError> {
        Ok(WorkoutDownload {
            file_name: self.workout.file_name(),
            xml: write_zwo(&self.workout)?,
        })
    }

    /// Save the workout.
    ///
    /// Signed in, the record goes to `backend` and the file to `files`.
    /// Signed out, the file is returned for a local download.
    pub async fn save<B, F>(&mut self, backend: &B, files: &F) -> Result<SaveOutcome, SessionError>
    where
        B: WorkoutBackend,
        F: FileStorage,
    {
        let download = match self.download() {
            Ok(download) => download,
            Err(e) => {
                tracing::error!(error = %e, "Cannot serialize workout");
                self.set_status(StatusKind::Error, "Cannot save this");
                return Err(e.into());
            }
        };

        let Some(user) = self.user.clone() else {
            tracing::info!(file = %download.file_name, "Saving workout locally");
            return Ok(SaveOutcome::Local(download));
        };

        self.set_status(StatusKind::Loading, "Saving...");
        let result = async {
            backend.persist_workout(&user, &self.workout).await?;
            files
                .upload_workout_file(&self.workout.id, &download.xml)
                .await
        }
        .await;

        match result {
            Ok(()) => {
                tracing::info!(workout = %self.workout.id, user = %user.uid, "Saved workout");
                self.dismiss_status();
                Ok(SaveOutcome::Uploaded {
                    file_name: download.file_name,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot save workout");
                self.set_status(StatusKind::Error, "Cannot save this");
                Err(e.into())
            }
        }
    }

    /// Delete the workout remotely and start a new one.
    pub async fn delete<B: WorkoutBackend>(&mut self, backend: &B) -> Result<(), SessionError> {
        let Some(user) = self.user.clone() else {
            return Err(SyncError::NotSignedIn.into());
        };

        if let Err(e) = backend.delete_workout(&user, &self.workout.id).await {
            tracing::error!(error = %e, workout = %self.workout.id, "Cannot delete workout");
            self.set_status(StatusKind::Error, "Cannot delete workout");
            return Err(e.into());
        }

        tracing::info!(workout = %self.workout.id, "Deleted workout");
        self.new_workout();
        Ok(())
    }

    /// Open the workout `id`, as when the editor starts on that id.
    ///
    /// A saved record replaces the local content. Without one, the local
    /// copy is kept when `id` is the cached workout; any other id starts a
    /// blank workout under that id. Returns whether a saved record was found.
    pub async fn open_workout<B: WorkoutBackend>(
        &mut self,
        backend: &B,
        id: &str,
    ) -> Result<bool, SessionError> {
        self.set_status(StatusKind::Loading, "Loading..");

        let record = match backend.load_workout(id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, id, "Cannot load workout");
                self.set_status(StatusKind::Error, "Cannot load workout");
                return Err(e.into());
            }
        };

        let found = record.is_some();
        match record {
            Some(saved) => {
                tracing::info!(workout = id, "Opened saved workout");
                self.edit(|workout| {
                    workout.id = id.to_string();
                    workout.name = saved.name;
                    workout.description = saved.description;
                    workout.author = saved.author;
                    workout.sport_type = saved.sport_type;
                    workout.tags = saved.tags;
                    workout.segments = saved.segments;
                    workout.annotations = saved.annotations;
                    workout.updated_at = saved.updated_at;
                });
            }
            None if self.workout.id == id => {
                tracing::debug!(workout = id, "No saved record, keeping local copy");
            }
            None => {
                tracing::debug!(workout = id, "No saved record, starting new workout");
                self.edit(|workout| {
                    workout.reset();
                    workout.id = id.to_string();
                });
            }
        }

        self.dismiss_status();
        Ok(found)
    }

    /// Load a published workout file by id, replacing the current content.
    ///
    /// Fetch and parse both happen before anything changes, so a failure
    /// leaves the workout as it was.
    pub async fn import_remote<F: FileStorage>(
        &mut self,
        files: &F,
        id: &str,
    ) -> Result<(), SessionError> {
        self.set_status(StatusKind::Loading, "Loading workout...");

        let xml = match files.fetch_workout_file(id).await {
            Ok(xml) => xml,
            Err(e) => {
                tracing::error!(error = %e, id, "Cannot fetch workout file");
                self.set_status(StatusKind::Error, "Cannot load workout");
                return Err(e.into());
            }
        };

        let parsed = match parse_zwo(&xml) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, id, "Cannot parse workout file");
                self.set_status(StatusKind::Error, "Cannot read workout file");
                return Err(e.into());
            }
        };

        self.edit(|workout| {
            workout.id = id.to_string();
            parsed.apply_to(workout);
        });
        self.dismiss_status();
        tracing::info!(workout = id, "Imported workout");
        Ok(())
    }

    /// Import a user-supplied .zwo document as a new workout.
    ///
    /// The document becomes a new workout under a fresh id and is uploaded
    /// under that id. The local import stands even when the upload fails.
    pub async fn import_file<F: FileStorage>(
        &mut self,
        files: &F,
        xml: &str,
    ) -> Result<(), SessionError> {
        let parsed = match parse_zwo(xml) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot parse uploaded workout file");
                self.set_status(StatusKind::Error, "Cannot read workout file");
                return Err(e.into());
            }
        };

        self.edit(|workout| {
            workout.reset();
            parsed.apply_to(workout);
        });

        self.set_status(StatusKind::Loading, "Uploading...");
        match files.upload_workout_file(&self.workout.id, xml).await {
            Ok(()) => {
                tracing::info!(workout = %self.workout.id, "Imported workout file");
                self.dismiss_status();
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot upload workout file");
                self.set_status(StatusKind::Error, "Cannot upload workout file");
                Err(e.into())
            }
        }
    }
}

impl EditorSession<FileStore> {
    /// Restore the session from the cache file named in `config`.
    pub fn open(config: &EditorConfig) -> anyhow::Result<Self> {
        Self::open_in(config, &get_data_dir())
    }

    /// Like [`open`](Self::open) with relative paths resolved against `data_dir`.
    pub fn open_in(config: &EditorConfig, data_dir: &Path) -> anyhow::Result<Self> {
        let path = config.session_path_in(data_dir);
        let store = FileStore::open(&path)
            .with_context(|| format!("Failed to open session cache at {}", path.display()))?;
        Ok(Self::restore(store, config.athlete_profile()))
    }
}

/// Remote collaborators built from configuration.
pub struct Collaborators {
    pub backend: SqliteWorkoutStore,
    pub files: HttpFileStorage,
}

impl Collaborators {
    pub fn open(config: &EditorConfig) -> anyhow::Result<Self> {
        Self::open_in(config, &get_data_dir())
    }

    pub fn open_in(config: &EditorConfig, data_dir: &Path) -> anyhow::Result<Self> {
        let path = config.database_path_in(data_dir);
        let backend = SqliteWorkoutStore::open(&path)
            .with_context(|| format!("Failed to open workout database at {}", path.display()))?;
        let files = HttpFileStorage::new(&config.remote).context("Failed to create HTTP client")?;
        tracing::info!(database = %path.display(), "Opened workout storage");
        Ok(Self { backend, files })
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::SerializationError(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(key: &str, value: &str) -> Option<T> {
    match serde_json::from_str(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring unreadable session value");
            None
        }
    }
}
