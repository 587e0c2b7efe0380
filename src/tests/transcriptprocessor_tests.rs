// src/tests/transcriptprocessor_tests.rs

#![allow(non_snake_case)]

use crate::data::field::FieldRecorder;
use crate::data::transcript::Transcript;
use crate::debug::helpers::{create_file_in_dir, create_temp_dir, create_temp_file, ntf_fpath};
use crate::readers::transcriptprocessor::{ProcessingStage, TranscriptProcessor};
use crate::tests::common::{
    SCRIPT_MATCHING,
    TRANSCRIPT_MINI,
    TRANSCRIPT_SYMBOLIC,
    TRANSCRIPT_SYMBOLIC_NO_ECHO,
};

use std::io::ErrorKind;

// ─────────────────────────────────────────────────────────────────────────────────────────────────

#[test]
fn test_process_MINI_summary() {
    let mut processor =
        TranscriptProcessor::from_transcript(Transcript::from_text(TRANSCRIPT_MINI));
    assert_eq!(ProcessingStage::Stage0ValidFileCheck, processor.processingstage());
    assert!(processor.scan().is_none());
    let mut recorder = FieldRecorder::new();
    let summary = processor
        .process(&mut recorder)
        .unwrap();
    assert_eq!(ProcessingStage::Stage4Summary, processor.processingstage());
    assert_eq!(18, summary.lines);
    assert_eq!(2, summary.blocks);
    assert_eq!(1, summary.blocks_mini);
    assert_eq!(0, summary.blocks_dyna);
    // OPEN, READ, MINI, WRIT
    assert_eq!(4, summary.commands);
    assert_eq!(0, summary.commands_suppressed);
    assert_eq!(3, summary.file_ops);
    assert_eq!(3, summary.units_resolved);
    assert_eq!(0, summary.units_unresolved);
    assert_eq!(0, summary.parameters);
    // in-memory transcripts have no sibling files to search
    assert!(summary.source_script.is_none());
    assert_eq!(29, summary.extract.tuples_emitted);
    assert_eq!(29, recorder.tuples.len());
    // the completed scan remains inspectable
    let scan = processor.scan().unwrap();
    assert_eq!(2, scan.blocks.len());
    assert_eq!(1, scan.block_at_line(10).unwrap().index);
}

#[test]
fn test_process_symbolic_units_resolved_by_echoes() {
    let mut processor =
        TranscriptProcessor::from_transcript(Transcript::from_text(TRANSCRIPT_SYMBOLIC));
    let mut recorder = FieldRecorder::new();
    let summary = processor
        .process(&mut recorder)
        .unwrap();
    assert_eq!(2, summary.parameters);
    assert_eq!(2, summary.file_ops);
    assert_eq!(2, summary.units_resolved);
    assert_eq!(0, summary.units_unresolved);
}

#[test]
fn test_process_symbolic_units_pending_without_echoes() {
    // no `Parameter:` echoes and no script to mine; `@f.psf` stays pending
    let mut processor =
        TranscriptProcessor::from_transcript(Transcript::from_text(TRANSCRIPT_SYMBOLIC_NO_ECHO));
    let mut recorder = FieldRecorder::new();
    let summary = processor
        .process(&mut recorder)
        .unwrap();
    assert_eq!(0, summary.parameters);
    assert_eq!(1, summary.units_resolved);
    assert_eq!(1, summary.units_unresolved);
}

#[test]
fn test_process_end_to_end_with_source_script() {
    let tempdir = create_temp_dir();
    let log_fpath = create_file_in_dir(
        TRANSCRIPT_SYMBOLIC_NO_ECHO.as_bytes(),
        "run.out",
        &tempdir,
    );
    let script_fpath = create_file_in_dir(
        SCRIPT_MATCHING.as_bytes(),
        "run.inp",
        &tempdir,
    );
    let mut processor = TranscriptProcessor::new(&log_fpath).unwrap();
    let mut recorder = FieldRecorder::new();
    let summary = processor
        .process(&mut recorder)
        .unwrap();
    assert_eq!(Some(script_fpath), summary.source_script);
    assert!(summary.source_script_score.unwrap() > 0.99);
    // `set f mol` mined from the script resolves `@f.psf`
    assert_eq!(1, summary.parameters);
    assert_eq!(2, summary.units_resolved);
    assert_eq!(0, summary.units_unresolved);
    assert_eq!(3, summary.blocks);
    assert_eq!(1, summary.blocks_mini);
    assert_eq!(1, summary.blocks_ener);
    // NSTEP and NPRINT from the truncated MINI namelist
    assert_eq!(2, summary.extract.tuples_emitted);
}

#[test]
#[should_panic]
fn test_process_stages_are_forward_only() {
    let mut processor =
        TranscriptProcessor::from_transcript(Transcript::from_text(TRANSCRIPT_MINI));
    let mut recorder = FieldRecorder::new();
    processor
        .process(&mut recorder)
        .unwrap();
    // a second run would rewind the stage ordering
    let _ = processor.process(&mut recorder);
}

#[test]
fn test_binary_file_refused() {
    let ntf = create_temp_file("CORD\x00\x00\x00\x01 binary trajectory data");
    let err = TranscriptProcessor::new(&ntf_fpath(&ntf)).unwrap_err();
    assert_eq!(ErrorKind::InvalidData, err.kind());
}

#[test]
fn test_missing_file_propagates_io_error() {
    let path = String::from("/nonexistent/charmm/run.out");
    assert!(TranscriptProcessor::new(&path).is_err());
}

#[test]
fn test_summary_display() {
    let mut processor =
        TranscriptProcessor::from_transcript(Transcript::from_text(TRANSCRIPT_MINI));
    let mut recorder = FieldRecorder::new();
    let summary = processor
        .process(&mut recorder)
        .unwrap();
    let rendered = format!("{}", summary);
    assert!(rendered.contains("blocks             2"));
    assert!(rendered.contains("tuples emitted     29"));
    assert!(rendered.contains("source script      (none)"));
}
