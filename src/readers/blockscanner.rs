// src/readers/blockscanner.rs

//! Implements a [`BlockScanner`], the forward pass partitioning a
//! [`Transcript`] into [`CommandBlock`]s.
//!
//! A CHARMM run log echoes each executed command on a `CHARMM>` prompt line.
//! The scanner walks the transcript once and:
//!
//! - opens a new block at every echoed top-level command keyword
//!   (`MINI`, `DYNA`, `ENER`, `GETE`), attributing all lines up to the next
//!   such keyword (or end of transcript) to that block;
//! - parses `OPEN`/`READ`/`WRIT`/`PRIN` echoes into [`FileOperation`]s
//!   attached to the enclosing block;
//! - collects `PARAMETER <name> <- "<value>"` substitution echoes into a
//!   [`ParameterTable`];
//! - suppresses command echoes replayed from streamed sub-scripts, bracketed
//!   by `INPUT STREAM SWITCHING` / `RETURNING TO INPUT STREAM` notices.
//!
//! A separate fallback pass, [`BlockScanner::resolve_source_script`], hunts
//! the run's original command script among the transcript's sibling files
//! when echoed commands carry unresolved `@` parameter references. A
//! candidate is accepted when at least [`SOURCE_SCRIPT_ACCEPT`] of the
//! transcript's distinct echoed commands appear in it verbatim.
//!
//! [`Transcript`]: crate::data::transcript::Transcript
//! [`CommandBlock`]: crate::data::commandblock::CommandBlock
//! [`FileOperation`]: crate::data::commandblock::FileOperation
//! [`ParameterTable`]: crate::data::commandblock::ParameterTable

use crate::common::{Count, FPath, LineIndex, ResultNext};
use crate::data::commandblock::{
    BlockKind,
    CommandBlock,
    CommandKind,
    FileOpKind,
    FileOperation,
    ParameterTable,
    UnitRef,
};
use crate::data::transcript::Transcript;
use crate::readers::helpers::{fpath_to_path, is_file_binary, list_sibling_files};
use crate::readers::linecursor::LineCursor;

use std::fs::File;
use std::io::{BufRead, BufReader, Result};

use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// constants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The interactive command prompt CHARMM prefixes to echoed commands.
pub const COMMAND_PROMPT: &str = "CHARMM>";

/// Notice that command echoes now replay a streamed sub-script
/// (`STRE` command). Echoes are suppressed until [`STREAM_RETURN`].
pub const STREAM_SWITCH: &str = "INPUT STREAM SWITCHING";

/// Notice that the main input stream resumed.
pub const STREAM_RETURN: &str = "RETURNING TO INPUT STREAM";

/// Minimum fraction of distinct echoed commands a candidate file must
/// contain to be accepted as the run's source script.
pub const SOURCE_SCRIPT_ACCEPT: f64 = 0.80;

/// At most this many lines of a candidate file are examined.
pub const SOURCE_SCRIPT_LINE_CAP: usize = 50000;

/// Leading keywords of echoed commands that participate in source-script
/// matching. Anything else (titles, `SET` arithmetic, miscellany) is too
/// generic to discriminate between scripts.
const COMMAND_FRAGMENT_PREFIXES: [&str; 17] = [
    "READ", "COOR", "WRIT", "OPEN", "MINI", "DYNA", "ENER", "GETE", "UPDA", "IC", "EDIT", "PRIN",
    "STOP", "END", "HBON", "GENE", "STRE",
];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EchoedCommand, SourceScript, BlockScan
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One unsuppressed `CHARMM>` echo: line position and whitespace-normalized
/// command text (prompt stripped).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EchoedCommand {
    pub line_index: LineIndex,
    pub text: String,
    pub kind: Option<CommandKind>,
}

/// A located source command script and its match score.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceScript {
    pub path: FPath,
    /// Fraction of distinct echoed commands found in the file,
    /// `>=` [`SOURCE_SCRIPT_ACCEPT`].
    pub score: f64,
}

/// Everything the forward pass produced.
#[derive(Debug, Default)]
pub struct BlockScan {
    /// The block partition; covers every transcript line exactly once.
    /// Block `0` is always present (`Setup`), possibly empty.
    pub blocks: Vec<CommandBlock>,
    /// Unsuppressed command echoes, in transcript order.
    pub commands: Vec<EchoedCommand>,
    /// Substitution parameters declared so far.
    pub parameters: ParameterTable,
    /// Set by [`BlockScanner::resolve_source_script`].
    pub source_script: Option<SourceScript>,
    /// `Count` of command echoes suppressed inside streamed sub-scripts.
    pub commands_suppressed: Count,
}

impl BlockScan {
    /// The block containing line `index`. Blocks partition the transcript,
    /// so exactly one matches any in-range line.
    pub fn block_at_line(
        &self,
        index: LineIndex,
    ) -> Option<&CommandBlock> {
        self.blocks
            .iter()
            .find(|b| b.line_beg <= index && index < b.line_end)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BlockScanner
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Forward scanner over one [`Transcript`]. Stateless between calls; all
/// results travel in the returned [`BlockScan`].
///
/// [`Transcript`]: crate::data::transcript::Transcript
pub struct BlockScanner<'a> {
    transcript: &'a Transcript,
}

/// `"CHARMM> read psf  unit  10"` → `"read psf unit 10"`, or `None` when
/// the prompt is absent.
fn strip_prompt(line: &str) -> Option<String> {
    let at = line.find(COMMAND_PROMPT)?;
    let command = &line[at + COMMAND_PROMPT.len()..];

    Some(
        command
            .split_whitespace()
            .collect::<Vec<&str>>()
            .join(" "),
    )
}

/// Parse a `PARAMETER <name> <- "<value>"` substitution echo.
fn parse_parameter_echo(line: &str) -> Option<(String, String)> {
    if !line.to_ascii_uppercase().contains("PARAMETER") {
        return None;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    // PARAMETER <name> <- "<value>"
    if tokens.len() < 4 || tokens[2] != "<-" {
        return None;
    }
    let name = tokens[1].trim_end_matches(':');
    let value = tokens[3].trim_matches('"');

    Some((name.to_string(), value.to_string()))
}

/// Is `command` (normalized, uppercased by the caller) one of the keyword
/// fragments worth matching against candidate scripts?
fn is_command_fragment(command_upper: &str) -> bool {
    COMMAND_FRAGMENT_PREFIXES
        .iter()
        .any(|prefix| command_upper.starts_with(prefix))
}

/// Is this a consecutive repeat of an `OPEN ... UNIT @x` echo?
///
/// CHARMM echoes an `OPEN` with an unsubstituted unit parameter once per
/// substitution attempt; the repeats carry no new information.
fn is_duplicate_open(
    command: &str,
    previous: Option<&str>,
) -> bool {
    let Some(previous) = previous else {
        return false;
    };
    if command != previous {
        return false;
    }
    let upper = command.to_ascii_uppercase();
    if !upper.starts_with("OPEN") || !upper.contains("UNIT") {
        return false;
    }
    let tokens: Vec<&str> = command.split_whitespace().collect();
    tokens
        .iter()
        .position(|t| t.to_ascii_uppercase().starts_with("UNIT"))
        .and_then(|at| tokens.get(at + 1))
        .is_some_and(|unit| unit.contains('@'))
}

impl<'a> BlockScanner<'a> {
    pub fn new(transcript: &'a Transcript) -> BlockScanner<'a> {
        defñ!("{:?}", transcript);
        BlockScanner { transcript }
    }

    /// The forward pass. Infallible: an unrecognized line is ordinary
    /// solver output belonging to the enclosing block.
    pub fn scan(&self) -> BlockScan {
        defn!();
        let mut scan = BlockScan::default();
        let mut cursor = LineCursor::new(self.transcript);
        // suppression of echoes replayed from streamed sub-scripts
        let mut stream_depth: usize = 0;
        let mut sequence: usize = 0;
        let mut previous_command: Option<String> = None;
        let mut block = CommandBlock {
            index: 0,
            kind: BlockKind::Setup,
            line_beg: 0,
            line_end: 0,
            file_ops: Vec::new(),
        };
        while let ResultNext::Found((index, line)) = cursor.next_line() {
            if line.contains(STREAM_SWITCH) {
                stream_depth += 1;
                defo!("stream switch at line {}, depth {}", index, stream_depth);
                continue;
            }
            if line.contains(STREAM_RETURN) {
                stream_depth = stream_depth.saturating_sub(1);
                defo!("stream return at line {}, depth {}", index, stream_depth);
                continue;
            }
            if let Some((name, value)) = parse_parameter_echo(line) {
                defo!("parameter {} = {:?}", name, value);
                scan.parameters.declare(&name, &value);
                continue;
            }
            let Some(command) = strip_prompt(line) else {
                continue;
            };
            if stream_depth > 0 {
                scan.commands_suppressed += 1;
                continue;
            }
            let kind = CommandKind::classify(&command);
            scan.commands.push(EchoedCommand {
                line_index: index,
                text: command.clone(),
                kind,
            });
            let Some(kind) = kind else {
                previous_command = Some(command);
                continue;
            };
            if kind.opens_block() {
                // close the running block at this echo and open the next
                block.line_end = index;
                let next_index = block.index + 1;
                scan.blocks.push(block);
                block = CommandBlock {
                    index: next_index,
                    kind: match kind {
                        CommandKind::Mini => BlockKind::Mini,
                        CommandKind::Dyna => BlockKind::Dyna,
                        CommandKind::Ener => BlockKind::Ener,
                        _ => BlockKind::Gete,
                    },
                    line_beg: index,
                    line_end: index,
                    file_ops: Vec::new(),
                };
            } else if !is_duplicate_open(&command, previous_command.as_deref()) {
                if let Some(op) = parse_file_op(&command, kind, sequence, block.index) {
                    defo!("file op at line {}: {:?}", index, op);
                    block.file_ops.push(op);
                    sequence += 1;
                }
            }
            previous_command = Some(command);
        }
        block.line_end = self.transcript.line_count();
        scan.blocks.push(block);
        defx!(
            "{} blocks, {} commands, {} suppressed",
            scan.blocks.len(),
            scan.commands.len(),
            scan.commands_suppressed,
        );

        scan
    }

    /// Distinct echoed commands worth matching against candidate scripts,
    /// first-seen order.
    fn command_fragments(
        &self,
        scan: &BlockScan,
    ) -> Vec<String> {
        let mut fragments: Vec<String> = Vec::new();
        for echoed in scan.commands.iter() {
            if !is_command_fragment(&echoed.text.to_ascii_uppercase()) {
                continue;
            }
            if !fragments.contains(&echoed.text) {
                fragments.push(echoed.text.clone());
            }
        }

        fragments
    }

    /// The source-script fallback: search the transcript's sibling files for
    /// the command script that produced this run, then re-scan it for `SET`
    /// parameter declarations and literal file-operation commands the
    /// transcript itself never echoed.
    ///
    /// Only I/O failures are errors. Finding no script at all leaves
    /// `scan.source_script` as `None`; symbolic unit references then simply
    /// stay unresolved.
    pub fn resolve_source_script(
        &self,
        scan: &mut BlockScan,
    ) -> Result<()> {
        defn!();
        let fragments = self.command_fragments(scan);
        if fragments.is_empty() {
            defx!("no command fragments; nothing to match");
            return Ok(());
        }
        let Some(dir) = self.transcript.parent_dir() else {
            defx!("no parent directory");
            return Ok(());
        };
        let mut best: Option<SourceScript> = None;
        for candidate in list_sibling_files(&dir, self.transcript.path())? {
            if is_file_binary(fpath_to_path(&candidate))? {
                continue;
            }
            let lines = read_candidate_lines(&candidate)?;
            let matched = fragments
                .iter()
                .filter(|fragment| lines.iter().any(|l| l.contains(fragment.as_str())))
                .count();
            let score = matched as f64 / fragments.len() as f64;
            defo!("candidate {:?} score {:.2}", candidate, score);
            if score < SOURCE_SCRIPT_ACCEPT {
                continue;
            }
            // ties keep the earlier candidate; names are sorted, so the
            // outcome is deterministic
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(SourceScript {
                    path: candidate,
                    score,
                });
            }
        }
        if let Some(ref script) = best {
            defo!("accepted {:?}", script);
            self.rescan_source_script(&script.path, scan)?;
        }
        scan.source_script = best;
        defx!();

        Ok(())
    }

    /// Re-walk the accepted script with the block-partitioning algorithm,
    /// this time over literal command text instead of echoes.
    ///
    /// `SET <name> <value>` declarations feed the parameter table, and
    /// `OPEN`/`READ`/`WRIT`/`PRIN` commands become corrected
    /// [`FileOperation`]s that replace the transcript-echoed ones of the
    /// corresponding block. The script records commands the transcript
    /// never echoed (pruned or redirected output, streamed sub-scripts),
    /// so its records are the higher-fidelity set.
    fn rescan_source_script(
        &self,
        path: &FPath,
        scan: &mut BlockScan,
    ) -> Result<()> {
        defn!("({:?})", path);
        let lines = script_logical_lines(&read_candidate_lines(path)?);
        // block 0 is the setup block, same as the transcript scan
        let mut block_ops: Vec<Vec<FileOperation>> = vec![Vec::new()];
        let mut sequence: usize = 0;
        for line in lines.iter() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() >= 3 && tokens[0].eq_ignore_ascii_case("SET") {
                // `set in  = mol.psf` and `set in mol.psf` both occur
                let value = if tokens[2] == "=" {
                    match tokens.get(3) {
                        Some(v) => v,
                        None => continue,
                    }
                } else {
                    tokens[2]
                };
                defo!("set {} = {:?}", tokens[1], value);
                scan.parameters.declare(tokens[1], value);
                continue;
            }
            let Some(kind) = CommandKind::classify(line) else {
                continue;
            };
            if kind.opens_block() {
                block_ops.push(Vec::new());
                continue;
            }
            let block_index = block_ops.len() - 1;
            if let Some(op) = parse_file_op(line, kind, sequence, block_index) {
                defo!("script file op {:?}", op);
                block_ops[block_index].push(op);
                sequence += 1;
            }
        }
        // replace echo-derived operations block by block; a script shorter
        // than the transcript (run continued interactively) leaves the
        // trailing blocks on their echoes
        for (index, ops) in block_ops.into_iter().enumerate() {
            let Some(block) = scan.blocks.get_mut(index) else {
                break;
            };
            block.file_ops = ops;
        }
        defx!();

        Ok(())
    }
}

/// Join CHARMM continuation lines (trailing `-`) into logical commands.
fn script_logical_lines(lines: &[String]) -> Vec<String> {
    let mut logical: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;
    for line in lines.iter() {
        let trimmed = line.trim_end();
        let (piece, continues) = match trimmed.strip_suffix('-') {
            Some(head) => (head, true),
            None => (trimmed, false),
        };
        let joined = match pending.take() {
            Some(mut head) => {
                head.push(' ');
                head.push_str(piece.trim_start());
                head
            }
            None => piece.to_string(),
        };
        if continues {
            pending = Some(joined);
        } else {
            logical.push(joined);
        }
    }
    if let Some(tail) = pending {
        logical.push(tail);
    }

    logical
}

/// Parse one non-block-opening command echo into a [`FileOperation`].
fn parse_file_op(
    command: &str,
    kind: CommandKind,
    sequence: usize,
    block_index: usize,
) -> Option<FileOperation> {
    let tokens: Vec<&str> = command.split_whitespace().collect();
    let token_upper = |i: usize| -> String {
        let mut t = tokens
            .get(i)
            .map(|t| t.to_ascii_uppercase())
            .unwrap_or_default();
        t.truncate(4);
        t
    };
    let find_value = |keyword: &str| -> Option<&str> {
        tokens
            .iter()
            .position(|t| t.to_ascii_uppercase().starts_with(keyword))
            .and_then(|at| tokens.get(at + 1))
            .copied()
    };
    let unit: Option<UnitRef> = find_value("UNIT").map(UnitRef::from_token);
    let path: Option<FPath> = find_value("NAME").map(String::from);
    let op_kind: FileOpKind = match kind {
        CommandKind::Open => {
            if tokens
                .iter()
                .any(|t| t.to_ascii_uppercase().starts_with("WRIT"))
            {
                FileOpKind::OpenWrite
            } else {
                FileOpKind::OpenRead
            }
        }
        CommandKind::Read => FileOpKind::Read,
        CommandKind::Write => FileOpKind::Write,
        CommandKind::Print => {
            if token_upper(1) != "COOR" {
                return None;
            }
            FileOpKind::PrintCoor
        }
        // MINI/DYNA/ENER/GETE/CRYS carry no file operation
        _ => return None,
    };
    let target: Option<String> = match op_kind {
        FileOpKind::Read | FileOpKind::Write => {
            let t = token_upper(1);
            (!t.is_empty()).then_some(t)
        }
        _ => None,
    };

    Some(FileOperation {
        kind: op_kind,
        sequence,
        unit,
        path,
        target,
        block_index,
    })
}

/// The leading [`SOURCE_SCRIPT_LINE_CAP`] lines of a candidate file.
fn read_candidate_lines(path: &FPath) -> Result<Vec<String>> {
    let file = File::open(fpath_to_path(path))?;
    let reader = BufReader::new(file);
    let mut lines: Vec<String> = Vec::new();
    for line in reader.lines().take(SOURCE_SCRIPT_LINE_CAP) {
        lines.push(line?);
    }

    Ok(lines)
}
