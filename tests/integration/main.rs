//! Integration test modules.

mod storage_test;
