// src/lib.rs

//! Core library of _CHARMM Log Extractor_, a parser of CHARMM molecular
//! dynamics run logs ("transcripts").
//!
//! A transcript interleaves echoed input commands (`CHARMM>` prompt lines)
//! with solver output. This library partitions the transcript into command
//! blocks (`MINI`, `DYNA`, `ENER`, `GETE`), parses the file operations each
//! block performed, resolves `@` substitution parameters (falling back to
//! the run's source command script found among sibling files), and extracts
//! typed field tuples from the solver's tables and namelists, gated by each
//! run's output step schedule.
//!
//! The intended entry point is a
//! [`TranscriptProcessor`](crate::readers::transcriptprocessor::TranscriptProcessor)
//! feeding a [`FieldSink`](crate::data::field::FieldSink):
//!
//! ```text
//! let mut recorder = FieldRecorder::new();
//! let mut processor = TranscriptProcessor::new(&path)?;
//! let summary = processor.process(&mut recorder)?;
//! ```
//!
//! The major modules:
//!
//! - [`data::transcript`] the immutable line store
//! - [`readers::linecursor`] repositionable, replayable line traversal
//! - [`data::commandblock`] command blocks, file operations, `@` parameters
//! - [`readers::blockscanner`] the block partition and source-script search
//! - [`data::triggers`] the declarative trigger-rule tables
//! - [`data::stepschedule`] output scheduling derived from control namelists
//! - [`readers::fieldextractor`] the per-block field-tuple extraction
//! - [`readers::transcriptprocessor`] the staged driver
//!
//! [`data::transcript`]: crate::data::transcript
//! [`readers::linecursor`]: crate::readers::linecursor
//! [`data::commandblock`]: crate::data::commandblock
//! [`readers::blockscanner`]: crate::readers::blockscanner
//! [`data::triggers`]: crate::data::triggers
//! [`data::stepschedule`]: crate::data::stepschedule
//! [`readers::fieldextractor`]: crate::readers::fieldextractor
//! [`readers::transcriptprocessor`]: crate::readers::transcriptprocessor

pub mod common;
pub mod data;
pub mod debug;
pub mod readers;
#[cfg(test)]
pub mod tests;
