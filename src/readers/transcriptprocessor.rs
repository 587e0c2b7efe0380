// src/readers/transcriptprocessor.rs

//! Implements a [`TranscriptProcessor`], the staged driver tying the whole
//! parse together: validity probe, block scan, source-script resolution,
//! per-block field extraction, summary.
//!
//! The processor is the intended entry point of the crate:
//!
//! ```text
//! let mut recorder = FieldRecorder::new();
//! let mut processor = TranscriptProcessor::new(&path)?;
//! let summary = processor.process(&mut recorder)?;
//! ```

use crate::common::{Count, FPath};
use crate::data::commandblock::{BlockKind, UnitRef};
use crate::data::field::FieldSink;
use crate::data::transcript::Transcript;
use crate::readers::blockscanner::{BlockScan, BlockScanner};
use crate::readers::fieldextractor::{ExtractStats, FieldExtractor};
use crate::readers::helpers::{fpath_to_path, is_file_binary};
use crate::readers::summary::Summary;

use std::fmt;
use std::io::{Error, ErrorKind, Result};

use ::more_asserts::debug_assert_lt;
use ::si_trace_print::{defn, defo, defx};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ProcessingStage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The processing stages of one transcript, in order of operation.
/// Stages only move forward; the ordering derives follow declaration
/// order.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum ProcessingStage {
    /// Does the file exist and look like a text run log at all?
    Stage0ValidFileCheck,
    /// Partition into command blocks, parse file operations.
    Stage1BlockScan,
    /// Hunt for the run's source command script among sibling files.
    Stage2SourceResolve,
    /// Replay each block and extract field tuples.
    Stage3ExtractFields,
    /// Gather counters.
    Stage4Summary,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TranscriptProcessor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Owns one loaded [`Transcript`] and drives it through the
/// [`ProcessingStage`]s.
pub struct TranscriptProcessor {
    transcript: Transcript,
    stage: ProcessingStage,
    scan: Option<BlockScan>,
}

// manual impl; the completed scan would dominate the derive
impl fmt::Debug for TranscriptProcessor {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("TranscriptProcessor")
            .field("transcript", &self.transcript)
            .field("stage", &self.stage)
            .finish()
    }
}

impl TranscriptProcessor {
    /// Stage 0: probe and load the transcript at `path`.
    ///
    /// A binary file is refused with [`ErrorKind::InvalidData`]; an
    /// unreadable one propagates the underlying [`std::io::Error`].
    pub fn new(path: &FPath) -> Result<TranscriptProcessor> {
        defn!("({:?})", path);
        if is_file_binary(fpath_to_path(path))? {
            defx!("binary file");
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("not a text transcript {:?}", path),
            ));
        }
        let transcript = Transcript::load(path)?;
        defx!("{:?}", transcript);

        Ok(TranscriptProcessor {
            transcript,
            stage: ProcessingStage::Stage0ValidFileCheck,
            scan: None,
        })
    }

    /// A processor over an in-memory transcript. Skips the file probe and
    /// disables the source-script search (no parent directory). Used by
    /// tests.
    pub fn from_transcript(transcript: Transcript) -> TranscriptProcessor {
        TranscriptProcessor {
            transcript,
            stage: ProcessingStage::Stage0ValidFileCheck,
            scan: None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn processingstage(&self) -> ProcessingStage {
        self.stage
    }

    /// The completed block scan; `None` before [`process`] ran.
    ///
    /// [`process`]: TranscriptProcessor::process
    pub fn scan(&self) -> Option<&BlockScan> {
        self.scan.as_ref()
    }

    /// Advance to `stage`; stage transitions are forward-only, so running
    /// [`process`] a second time on the same processor is a programming
    /// error.
    ///
    /// [`process`]: TranscriptProcessor::process
    fn stage_advance(
        &mut self,
        stage: ProcessingStage,
    ) {
        debug_assert_lt!(self.stage, stage);
        self.stage = stage;
    }

    /// Stages 1 through 4: scan, resolve, extract into `sink`, summarize.
    pub fn process(
        &mut self,
        sink: &mut dyn FieldSink,
    ) -> Result<Summary> {
        defn!("({:?})", self.transcript);

        self.stage_advance(ProcessingStage::Stage1BlockScan);
        let mut scan = BlockScanner::new(&self.transcript).scan();

        self.stage_advance(ProcessingStage::Stage2SourceResolve);
        if !self.transcript.path().is_empty() {
            BlockScanner::new(&self.transcript).resolve_source_script(&mut scan)?;
        }

        self.stage_advance(ProcessingStage::Stage3ExtractFields);
        let extractor = FieldExtractor::new(&self.transcript);
        let mut extract = ExtractStats::default();
        for block in scan.blocks.iter() {
            let stats = extractor.extract_block(block, sink);
            defo!("block {} {:?}", block.index, stats);
            extract.merge(&stats);
        }

        self.stage_advance(ProcessingStage::Stage4Summary);
        let summary = self.summarize(&scan, extract);
        self.scan = Some(scan);
        defx!();

        Ok(summary)
    }

    fn summarize(
        &self,
        scan: &BlockScan,
        extract: ExtractStats,
    ) -> Summary {
        let mut summary = Summary {
            path: self.transcript.path().clone(),
            lines: self.transcript.line_count() as Count,
            blocks: scan.blocks.len() as Count,
            commands: scan.commands.len() as Count,
            commands_suppressed: scan.commands_suppressed,
            parameters: scan.parameters.len() as Count,
            source_script: scan
                .source_script
                .as_ref()
                .map(|s| s.path.clone()),
            source_script_score: scan
                .source_script
                .as_ref()
                .map(|s| s.score),
            extract,
            ..Summary::default()
        };
        for block in scan.blocks.iter() {
            match block.kind {
                BlockKind::Setup => {}
                BlockKind::Mini => summary.blocks_mini += 1,
                BlockKind::Dyna => summary.blocks_dyna += 1,
                BlockKind::Ener => summary.blocks_ener += 1,
                BlockKind::Gete => summary.blocks_gete += 1,
            }
            for op in block.file_ops.iter() {
                summary.file_ops += 1;
                let unit_concrete = match &op.unit {
                    None => true,
                    Some(unit) => matches!(
                        scan.parameters.resolve_unit(unit),
                        UnitRef::Literal(_)
                    ),
                };
                let path_concrete = op.path.is_none()
                    || op
                        .resolved_path(&scan.parameters)
                        .is_some();
                if unit_concrete && path_concrete {
                    summary.units_resolved += 1;
                } else {
                    summary.units_unresolved += 1;
                }
            }
        }

        summary
    }
}
