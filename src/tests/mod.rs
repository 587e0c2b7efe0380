// src/tests/mod.rs

//! Tests for _clexlib_.
//!
//! Tests are placed at `src/tests/`, inside the `clexlib`. This is a
//! reasonable trade-off of separation and access: tests placed at top-level
//! path `tests/` do not have crate-internal visibility, which these tests
//! occasionally need.

pub mod common;

pub mod blockscanner_tests;
pub mod field_tests;
pub mod transcriptprocessor_tests;
