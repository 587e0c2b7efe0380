// src/readers/mod.rs

//! The `readers` modules navigate and interpret a loaded
//! [`Transcript`]: cursor positioning, command-block partitioning,
//! source-script recovery, and sectioned field extraction.
//!
//! [`Transcript`]: crate::data::transcript::Transcript

pub mod blockscanner;
pub mod fieldextractor;
pub mod helpers;
pub mod linecursor;
pub mod summary;
pub mod transcriptprocessor;
