//! Integration tests for the SQLite backend, session cache and config.

use crate::mock_remote::MockFiles;
use workout_editor::integrations::{CurrentUser, SyncError, WorkoutBackend};
use workout_editor::session::{Collaborators, SaveOutcome};
use workout_editor::storage::config::{load_config_from, save_config_to};
use workout_editor::storage::{EditorConfig, FileStore, SqliteWorkoutStore};
use workout_editor::workouts::{AthleteProfile, IntervalsParams, SteadyParams, Workout};
use workout_editor::EditorSession;

fn sample_workout() -> Workout {
    let mut workout = Workout::default();
    workout.name = "Stored".to_string();
    workout.add_steady(SteadyParams::new(0.7));
    workout.add_intervals(IntervalsParams::default());
    workout.add_annotation("Go", 320);
    workout
}

#[tokio::test]
async fn test_sqlite_backend_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteWorkoutStore::open(&dir.path().join("workouts.db")).unwrap();
    let user = CurrentUser::new("rider");
    let workout = sample_workout();

    store.persist_workout(&user, &workout).await.unwrap();

    let loaded = store.load_workout(&workout.id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "Stored");
    assert_eq!(loaded.segments, workout.segments);
    assert_eq!(loaded.annotations, workout.annotations);
    assert_eq!(loaded.athlete, workout.athlete);

    let listings = store.list_user_workouts("rider").unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].id, workout.id);
}

#[tokio::test]
async fn test_sqlite_backend_delete_checks_owner() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteWorkoutStore::open(&dir.path().join("workouts.db")).unwrap();
    let owner = CurrentUser::new("owner");
    let workout = sample_workout();
    store.persist_workout(&owner, &workout).await.unwrap();

    let result = WorkoutBackend::delete_workout(&store, &CurrentUser::new("other"), &workout.id).await;
    assert!(matches!(result, Err(SyncError::NotFound(_))));
    assert_eq!(store.count_workouts().unwrap(), 1);

    WorkoutBackend::delete_workout(&store, &owner, &workout.id)
        .await
        .unwrap();
    assert!(store.load_workout(&workout.id).await.unwrap().is_none());
    assert!(store.list_user_workouts("owner").unwrap().is_empty());
}

#[test]
fn test_sqlite_reopen_keeps_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workouts.db");
    let workout = sample_workout();

    {
        let store = SqliteWorkoutStore::open(&path).unwrap();
        store.upsert_workout("rider", &workout).unwrap();
    }

    let store = SqliteWorkoutStore::open(&path).unwrap();
    assert_eq!(store.get_schema_version().unwrap(), 1);
    assert!(store.get_workout(&workout.id).unwrap().is_some());
}

#[tokio::test]
async fn test_session_saves_into_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let backend = SqliteWorkoutStore::open(&dir.path().join("workouts.db")).unwrap();
    let files = MockFiles::new();

    let store = FileStore::open(dir.path().join("session.json")).unwrap();
    let mut session = EditorSession::restore(store, AthleteProfile::default());
    session.edit(|w| w.add_steady(SteadyParams::new(0.9)));
    session.set_user(Some(CurrentUser::new("rider")));

    let outcome = session.save(&backend, &files).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Uploaded { .. }));

    let stored = backend.get_workout(&session.workout().id).unwrap().unwrap();
    assert_eq!(stored.segments, session.workout().segments);
}

#[test]
fn test_file_store_restores_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache").join("session.json");

    let (id, segments) = {
        let store = FileStore::open(&path).unwrap();
        let mut session = EditorSession::restore(store, AthleteProfile::default());
        session.edit(|w| {
            w.name = "Persisted".to_string();
            w.add_steady(SteadyParams::new(0.65));
            w.set_ftp(265).unwrap();
        });
        (session.workout().id.clone(), session.workout().segments.clone())
    };

    let store = FileStore::open(&path).unwrap();
    let session = EditorSession::restore(store, AthleteProfile::default());
    let workout = session.workout();
    assert_eq!(workout.id, id);
    assert_eq!(workout.name, "Persisted");
    assert_eq!(workout.segments, segments);
    assert_eq!(workout.athlete.ftp_watts, 265);
}

#[test]
fn test_corrupt_session_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(FileStore::open(&path).is_err());
}

#[test]
fn test_config_drives_session_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = EditorConfig::default();
    config.athlete.ftp_watts = 310;
    save_config_to(&config, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    let store = FileStore::open(loaded.session_path_in(dir.path())).unwrap();
    let session = EditorSession::restore(store, loaded.athlete_profile());
    assert_eq!(session.workout().athlete.ftp_watts, 310);
}

#[test]
fn test_open_from_config_in_data_dir() {
    workout_editor::logging::init_tracing("warn");
    let dir = tempfile::tempdir().unwrap();
    let config = EditorConfig::default();

    let collaborators = Collaborators::open_in(&config, dir.path()).unwrap();
    assert_eq!(collaborators.backend.count_workouts().unwrap(), 0);
    assert!(dir.path().join("workouts.db").exists());

    let session = EditorSession::open_in(&config, dir.path()).unwrap();
    assert_eq!(session.store().path(), dir.path().join("session.json"));
    assert!(session.store().path().exists());
}
