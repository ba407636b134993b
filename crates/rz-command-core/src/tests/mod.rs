//! Test module for rz-command-core
//!
//! This module contains tests for:
//! - Candidate registration and id handling
//! - Filtering, ordering, capping and the prefix cache
//! - Selection traversal and the index/value binding
//! - Row rendering and the row cache
//! - Remote fetching, debounce and request sequencing
//! - Configuration loading
//! - End-to-end palette behavior

// Fixture closures unwrap poisoned mutexes freely
#![allow(clippy::missing_panics_doc)]

mod config_tests;
mod palette_tests;
