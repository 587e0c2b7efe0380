// src/readers/summary.rs

//! Implements a [`Summary`] of one processed transcript: counters gathered
//! across the scan and extraction stages, printable for diagnostics.

use crate::common::{Count, FPath};
use crate::readers::fieldextractor::ExtractStats;

use std::fmt;

/// Accumulated statistics of processing one transcript.
#[derive(Clone, Debug, Default)]
pub struct Summary {
    /// Path of the processed transcript.
    pub path: FPath,
    /// `Count` of transcript lines.
    pub lines: Count,
    /// `Count` of command blocks, the `Setup` block included.
    pub blocks: Count,
    pub blocks_mini: Count,
    pub blocks_dyna: Count,
    pub blocks_ener: Count,
    pub blocks_gete: Count,
    /// Unsuppressed command echoes.
    pub commands: Count,
    /// Command echoes suppressed inside streamed sub-scripts.
    pub commands_suppressed: Count,
    /// Parsed file operations across all blocks.
    pub file_ops: Count,
    /// File operations whose path resolved to a concrete file name.
    pub units_resolved: Count,
    /// File operations left with a pending `@` reference.
    pub units_unresolved: Count,
    /// Declared substitution parameters.
    pub parameters: Count,
    /// The located source command script, if any, and its match score.
    pub source_script: Option<FPath>,
    pub source_script_score: Option<f64>,
    /// Field-extraction counters, merged across blocks.
    pub extract: ExtractStats,
}

impl fmt::Display for Summary {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "Summary of {:?}:", self.path)?;
        writeln!(f, "   lines              {}", self.lines)?;
        writeln!(
            f,
            "   blocks             {} (MINI {} DYNA {} ENER {} GETE {})",
            self.blocks, self.blocks_mini, self.blocks_dyna, self.blocks_ener, self.blocks_gete,
        )?;
        writeln!(
            f,
            "   commands           {} (suppressed {})",
            self.commands, self.commands_suppressed,
        )?;
        writeln!(
            f,
            "   file operations    {} (resolved {} unresolved {})",
            self.file_ops, self.units_resolved, self.units_unresolved,
        )?;
        writeln!(f, "   parameters         {}", self.parameters)?;
        match (&self.source_script, self.source_script_score) {
            (Some(path), Some(score)) => {
                writeln!(f, "   source script      {:?} (score {:.2})", path, score)?;
            }
            _ => {
                writeln!(f, "   source script      (none)")?;
            }
        }
        writeln!(
            f,
            "   tuples emitted     {} (suppressed {})",
            self.extract.tuples_emitted, self.extract.tuples_suppressed,
        )?;
        writeln!(f, "   values malformed   {}", self.extract.values_malformed)?;
        write!(f, "   sections discarded {}", self.extract.sections_discarded)
    }
}
