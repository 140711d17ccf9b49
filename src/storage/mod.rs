//! Storage module for configuration, session cache and the workout database.

pub mod config;
pub mod database;
pub mod kv_store;
pub mod schema;

pub use config::{EditorConfig, RemoteSettings};
pub use database::{DatabaseError, SqliteWorkoutStore};
pub use kv_store::{FileStore, KeyValueStore, MemoryStore, StoreError};
