// src/data/commandblock.rs

//! Data for one reconstructed _Command Block_: a contiguous line range of a
//! [`Transcript`] corresponding to one top-level CHARMM command invocation
//! (a minimization run, a dynamics run, an energy evaluation), along with
//! the auxiliary file operations (`OPEN`, `READ`, `WRITE`, `PRINT COOR`)
//! echoed within that range.
//!
//! Created by the [`BlockScanner`]; consumed read-only by the
//! [`FieldExtractor`].
//!
//! [`Transcript`]: crate::data::transcript::Transcript
//! [`BlockScanner`]: crate::readers::blockscanner::BlockScanner
//! [`FieldExtractor`]: crate::readers::fieldextractor::FieldExtractor

use crate::common::{FPath, LineIndex};

use std::collections::HashMap;
use std::fmt;

use ::lazy_static::lazy_static;
use ::regex::Regex;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CommandKind, BlockKind
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Classification of one echoed CHARMM command line by its leading keyword.
///
/// CHARMM truncates keywords to four significant characters, so
/// classification tests the four-character prefix of the first token.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandKind {
    /// `MINI` minimization run; opens a new block
    Mini,
    /// `DYNA` dynamics run; opens a new block
    Dyna,
    /// `ENER` energy evaluation; opens a new block
    Ener,
    /// `GETE` energy retrieval; opens a new block
    Gete,
    /// `CRYS` crystal definition
    Crys,
    /// `OPEN ... UNIT ... NAME ...`
    Open,
    /// `READ ...`
    Read,
    /// `WRIT ...`
    Write,
    /// `PRIN ...`
    Print,
}

impl CommandKind {
    /// Classify a command line (already stripped of any `CHARMM>` prompt).
    /// Returns `None` for unrecognized or comment (`!`) lines.
    pub fn classify(command: &str) -> Option<CommandKind> {
        let token = command
            .split_whitespace()
            .next()?;
        if token.starts_with('!') {
            return None;
        }
        let mut prefix = token.to_ascii_uppercase();
        prefix.truncate(4);
        match prefix.as_str() {
            "MINI" => Some(CommandKind::Mini),
            "DYNA" => Some(CommandKind::Dyna),
            "ENER" => Some(CommandKind::Ener),
            "GETE" => Some(CommandKind::Gete),
            "CRYS" => Some(CommandKind::Crys),
            "OPEN" => Some(CommandKind::Open),
            "READ" => Some(CommandKind::Read),
            "WRIT" => Some(CommandKind::Write),
            "PRIN" => Some(CommandKind::Print),
            _ => None,
        }
    }

    /// Does this command keyword close the current block and open a new one?
    #[inline(always)]
    pub const fn opens_block(&self) -> bool {
        matches!(
            self,
            CommandKind::Mini | CommandKind::Dyna | CommandKind::Ener | CommandKind::Gete
        )
    }
}

/// Kind of a [`CommandBlock`].
///
/// `Setup` is the notional initial block holding every line before the first
/// top-level command keyword (topology reads, coordinate reads, etc.).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockKind {
    Setup,
    Mini,
    Dyna,
    Ener,
    Gete,
}

impl fmt::Display for BlockKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            BlockKind::Setup => write!(f, "SETUP"),
            BlockKind::Mini => write!(f, "MINI"),
            BlockKind::Dyna => write!(f, "DYNA"),
            BlockKind::Ener => write!(f, "ENER"),
            BlockKind::Gete => write!(f, "GETE"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UnitRef, ParameterTable
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A CHARMM logical I/O unit reference.
///
/// Command scripts frequently name units with substitution parameters
/// (`OPEN UNIT @1 ...`); the transcript may or may not echo the substituted
/// literal. A `Symbolic` reference stays pending until a
/// [`ParameterTable`] declaration resolves it; that never causes a scan
/// failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UnitRef {
    /// A literal unit number, e.g. `UNIT 10`
    Literal(i64),
    /// An unsubstituted parameter reference, e.g. `UNIT @1`
    Symbolic(String),
}

lazy_static! {
    /// `@` followed by a parameter name (`@1`, `@IN`, ...).
    static ref PARAMETER_REF_RE: Regex = Regex::new(r"@\{?([A-Za-z0-9_]+)\}?").unwrap();
}

impl UnitRef {
    /// Parse a unit token from a command line.
    pub fn from_token(token: &str) -> UnitRef {
        if token.contains('@') {
            return UnitRef::Symbolic(token.to_string());
        }
        match token.parse::<i64>() {
            Ok(unit) => UnitRef::Literal(unit),
            Err(_) => UnitRef::Symbolic(token.to_string()),
        }
    }

    /// Does this reference designate unit number `unit`?
    ///
    /// A `Symbolic` reference matches loosely: each `@name` is treated as a
    /// digit-class wildcard, mirroring how ambiguous unit echoes must be
    /// matched against concrete numbers.
    pub fn matches_unit(
        &self,
        unit: i64,
    ) -> bool {
        match self {
            UnitRef::Literal(u) => *u == unit,
            UnitRef::Symbolic(s) => {
                let pattern = format!(
                    "^{}$",
                    PARAMETER_REF_RE
                        .replace_all(s, "[0-9]+")
                );
                match Regex::new(&pattern) {
                    Ok(re) => re.is_match(&unit.to_string()),
                    Err(_) => false,
                }
            }
        }
    }
}

impl fmt::Display for UnitRef {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            UnitRef::Literal(u) => write!(f, "{}", u),
            UnitRef::Symbolic(s) => write!(f, "{}", s),
        }
    }
}

/// Substitution parameters declared during a run, collected from
/// `PARAMETER <name> <- "<value>"` lines (and `SET` commands in a located
/// source script).
///
/// Populated progressively during the block scan; a [`FileOperation`] whose
/// tokens reference a parameter not yet declared stays unresolved and is
/// re-resolved at read time, once the table has caught up.
#[derive(Debug, Default)]
pub struct ParameterTable {
    map: HashMap<String, String>,
}

impl ParameterTable {
    pub fn new() -> ParameterTable {
        ParameterTable {
            map: HashMap::new(),
        }
    }

    /// Declare parameter `name` (without the `@` sigil) to have `value`.
    /// Later declarations shadow earlier ones.
    pub fn declare(
        &mut self,
        name: &str,
        value: &str,
    ) {
        self.map
            .insert(name.to_ascii_uppercase(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Substitute every resolvable `@name` reference in `text`.
    /// Unresolved references are left in place.
    pub fn substitute(
        &self,
        text: &str,
    ) -> String {
        PARAMETER_REF_RE
            .replace_all(text, |caps: &regex::Captures| {
                let name = caps[1].to_ascii_uppercase();
                match self.map.get(&name) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Substitute parameters in a [`UnitRef`], possibly concretizing it.
    pub fn resolve_unit(
        &self,
        unit: &UnitRef,
    ) -> UnitRef {
        match unit {
            UnitRef::Literal(_) => unit.clone(),
            UnitRef::Symbolic(s) => UnitRef::from_token(&self.substitute(s)),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FileOperation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Kind of an auxiliary file operation within a command block.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FileOpKind {
    /// `OPEN ... READ ... UNIT n NAME path`
    OpenRead,
    /// `OPEN ... WRITE ... UNIT n NAME path`
    OpenWrite,
    /// `READ ... UNIT n`
    Read,
    /// `WRIT ... UNIT n`
    Write,
    /// `PRIN COOR ...` (coordinates to the output stream, no unit)
    PrintCoor,
}

impl fmt::Display for FileOpKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            FileOpKind::OpenRead => write!(f, "open_read"),
            FileOpKind::OpenWrite => write!(f, "open_write"),
            FileOpKind::Read => write!(f, "read"),
            FileOpKind::Write => write!(f, "write"),
            FileOpKind::PrintCoor => write!(f, "print_coor"),
        }
    }
}

/// A structured note of one `OPEN`/`READ`/`WRITE`/`PRINT` action referencing
/// a logical unit and, if resolved, a concrete file path.
#[derive(Clone, Debug, PartialEq)]
pub struct FileOperation {
    pub kind: FileOpKind,
    /// Sequence number of the originating command within the whole scan.
    pub sequence: usize,
    /// Referenced logical unit. `PRIN COOR` has none.
    pub unit: Option<UnitRef>,
    /// Target path as echoed/declared, possibly containing `@` references.
    pub path: Option<FPath>,
    /// What is being read or written (`PSF`, `PARA`, `COOR`, `SEQ`, ...),
    /// four-character normalized.
    pub target: Option<String>,
    /// Index of the owning [`CommandBlock`].
    pub block_index: usize,
}

impl FileOperation {
    /// The concrete path of this operation, re-resolved against the current
    /// `parameters` table. `None` when a parameter reference never resolved
    /// ([`UnresolvedUnitReference`] is not an error; the record is simply
    /// omitted from any output requiring a concrete path).
    ///
    /// [`UnresolvedUnitReference`]: crate::readers::summary::Summary#structfield.units_unresolved
    pub fn resolved_path(
        &self,
        parameters: &ParameterTable,
    ) -> Option<FPath> {
        let path = self.path.as_ref()?;
        let substituted = parameters.substitute(path);
        if substituted.contains('@') {
            // still pending
            return None;
        }

        Some(substituted)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CommandBlock
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One contiguous line range of the transcript, bounded by a top-level
/// command keyword occurrence and the next one (or end of transcript).
///
/// Blocks are never mutated after the scan completes. Command blocks
/// partition the transcript without gaps or overlaps; every line belongs to
/// exactly one block.
#[derive(Clone, Debug)]
pub struct CommandBlock {
    pub index: usize,
    pub kind: BlockKind,
    /// First line of the block.
    pub line_beg: LineIndex,
    /// One past the last line of the block.
    pub line_end: LineIndex,
    /// File operations echoed within this block, in command order.
    pub file_ops: Vec<FileOperation>,
}

impl CommandBlock {
    /// `Count` of lines covered by this block.
    #[inline(always)]
    pub fn line_count(&self) -> usize {
        self.line_end - self.line_beg
    }

    /// File operations of `kind`, as (sequence, unit, path) views.
    pub fn ops_of_kind(
        &self,
        kind: FileOpKind,
    ) -> Vec<&FileOperation> {
        self.file_ops
            .iter()
            .filter(|op| op.kind == kind)
            .collect()
    }

    /// The most recent `OPEN` (read or write) in this block matching `unit`.
    /// Used to resolve a `READ ... UNIT n` against a prior
    /// `OPEN ... UNIT n NAME path`.
    pub fn find_open_for_unit(
        &self,
        unit: i64,
    ) -> Option<&FileOperation> {
        self.file_ops
            .iter()
            .rev()
            .filter(|op| matches!(op.kind, FileOpKind::OpenRead | FileOpKind::OpenWrite))
            .find(|op| {
                op.unit
                    .as_ref()
                    .is_some_and(|u| u.matches_unit(unit))
            })
    }
}
