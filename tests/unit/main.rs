//! Unit test modules.

mod editor_test;
mod metrics_test;
mod workout_file_test;
