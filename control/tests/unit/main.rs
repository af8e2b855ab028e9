//! Unit tests for salt-control
//!
//! These tests use mocked dependencies and run fast without network I/O.

mod helpers;
mod settings_store;
