// src/data/triggers.rs

//! The _Pattern Trigger Table_: declarative rules mapping regular-expression
//! triggers to the kind of record that follows (tabular header, tabular data
//! row, namelist-style keyword block, single terminal value) and to the
//! fields that should be extracted from it.
//!
//! Rules are declared with the [`TRIG!`] macro into per-command-family
//! `static` tables ([`MINI_RULES`], [`DYNA_RULES`], [`ENER_RULES`]) and
//! compiled once into [`regex::Regex`] instances behind `lazy_static`.
//! Matching is ordered, first-match-wins. A rule's _stop_ and _quit_
//! conditions are distinct: stop finalizes a well-formed record at an
//! expected section boundary; quit abandons the accumulation because a
//! higher-priority trigger interrupted it.
//!
//! Rules are read-only at runtime; the only mutable companion state (the
//! per-block header-column caches) lives in the extractor's `ParseContext`.

use crate::data::commandblock::BlockKind;
use crate::data::field::ValueType;
use crate::data::stepschedule::OutputChannel;

use std::fmt;

use ::lazy_static::lazy_static;
use ::regex::Regex;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TriggerRule
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What kind of record follows a rule's start trigger.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TriggerKind {
    /// `KEY value` keyword blocks spanning one or more lines
    /// (`CHARMM> DYNA NSTEP 1000 NPRINT 100 ...`).
    Namelist,
    /// A table header line; its whitespace-split tokens become the column
    /// map saved under [`TriggerRule::header_save`].
    TabularHeader,
    /// A single table data row (`MINI> 1 ...`); tokens pair positionally
    /// with the column map saved under [`TriggerRule::header_use`].
    TabularRow,
    /// A line whose presence alone carries the value
    /// (`> Minimization exiting with ...`).
    SingleValue,
}

/// One expected field: name and declared value type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub vtype: ValueType,
}

/// One declarative trigger rule.
pub struct TriggerRule {
    /// Rule identifier, for logging and header-cache keys.
    pub name: &'static str,
    /// Logical section tag stamped onto emitted tuples.
    pub section: &'static str,
    pub kind: TriggerKind,
    /// Start pattern; a match transitions the extractor to `Accumulating`
    /// (or emits immediately for `TabularRow`/`SingleValue`).
    pub start_pattern: &'static str,
    /// Finalize the pending accumulation.
    pub stop_pattern: &'static str,
    /// Abandon the pending accumulation.
    pub quit_pattern: &'static str,
    /// Recognized fields (`Namelist`), or the single emitted field
    /// (`SingleValue`). Empty for tabular rules, whose fields come from the
    /// header-column cache.
    pub fields: &'static [FieldSpec],
    /// `false` compiles the patterns with `(?i)`.
    pub case_sensitive: bool,
    /// Step-schedule channel gating emitted tuples.
    pub channel: OutputChannel,
    /// Literal rewrite applied to a line before whitespace splitting, so
    /// multi-word row tags align with single-token data tags
    /// (`"MINI MIN:"` → `"MINI-MIN:"`).
    pub line_filter: Option<(&'static str, &'static str)>,
    /// `TabularHeader`: cache key under which the column map is saved.
    pub header_save: Option<&'static str>,
    /// `TabularRow`: cache key of the column map to read.
    pub header_use: Option<&'static str>,
    /// Header column name whose row token advances the running step counter
    /// (`Cycle`, `Step`, `Eval#`).
    pub step_column: Option<&'static str>,
    /// Fixed raw token emitted by a `SingleValue` rule.
    pub emit_raw: Option<&'static str>,
}

impl fmt::Debug for TriggerRule {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("TriggerRule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("start_pattern", &self.start_pattern)
            .finish()
    }
}

/// A start/stop/quit pattern that can never match any line.
/// An empty character class; the crate has no look-around so `(?!)`
/// is unavailable.
pub const NEVER: &str = r"[^\s\S]";

/// Declare a [`TriggerRule`] more easily.
macro_rules! TRIG {
    (
        $name:literal,
        $section:literal,
        $kind:expr,
        $start:literal,
        $stop:expr,
        $quit:expr,
        $fields:expr,
        $case_sensitive:literal,
        $channel:expr,
        $line_filter:expr,
        $header_save:expr,
        $header_use:expr,
        $step_column:expr,
        $emit_raw:expr,
    ) => {
        TriggerRule {
            name: $name,
            section: $section,
            kind: $kind,
            start_pattern: $start,
            stop_pattern: $stop,
            quit_pattern: $quit,
            fields: $fields,
            case_sensitive: $case_sensitive,
            channel: $channel,
            line_filter: $line_filter,
            header_save: $header_save,
            header_use: $header_use,
            step_column: $step_column,
            emit_raw: $emit_raw,
        }
    };
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// field lists
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Recognized `MINI` control keywords.
pub const MINI_CONTROL_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "NSTEP", vtype: ValueType::Int },
    FieldSpec { name: "NPRINT", vtype: ValueType::Int },
    FieldSpec { name: "INBFRQ", vtype: ValueType::Int },
    FieldSpec { name: "TOLGRD", vtype: ValueType::Float },
    FieldSpec { name: "TOLENR", vtype: ValueType::Float },
    FieldSpec { name: "TOLSTP", vtype: ValueType::Float },
];

/// Recognized `DYNA` control keywords.
pub const DYNA_CONTROL_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "NSTEP", vtype: ValueType::Int },
    FieldSpec { name: "NPRINT", vtype: ValueType::Int },
    FieldSpec { name: "NSAVC", vtype: ValueType::Int },
    FieldSpec { name: "NSAVV", vtype: ValueType::Int },
    FieldSpec { name: "NSAVF", vtype: ValueType::Int },
    FieldSpec { name: "IHTFRQ", vtype: ValueType::Int },
    FieldSpec { name: "IEQFRQ", vtype: ValueType::Int },
    FieldSpec { name: "NTRFRQ", vtype: ValueType::Int },
    FieldSpec { name: "FIRSTT", vtype: ValueType::Float },
    FieldSpec { name: "FINALT", vtype: ValueType::Float },
    FieldSpec { name: "TEMINC", vtype: ValueType::Float },
];

/// Recognized `ENER`/`GETE` control keywords.
pub const ENER_CONTROL_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "INBFRQ", vtype: ValueType::Int },
    FieldSpec { name: "CUTNB", vtype: ValueType::Float },
    FieldSpec { name: "CTOFNB", vtype: ValueType::Float },
    FieldSpec { name: "CTONNB", vtype: ValueType::Float },
    FieldSpec { name: "EPS", vtype: ValueType::Float },
];

const MINI_STATUS_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "geometry_optimization_converged",
    vtype: ValueType::Bool,
}];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// builtin rule tables
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Rules applied within a `MINI` command block, in match priority order.
pub static MINI_RULES: &[TriggerRule] = &[
    TRIG!(
        "mini_control",
        "mini_control",
        TriggerKind::Namelist,
        r"^\s*CHARMM>\s*MINI",
        r"^\s*MINI\s+MIN:\s+Cycle",
        r"^\s*CHARMM>\s*(?:MINI|DYNA|ENER|GETE)",
        MINI_CONTROL_FIELDS,
        false,
        OutputChannel::Control,
        None,
        None,
        None,
        None,
        None,
    ),
    TRIG!(
        "mini_cycle_header",
        "mini_cycle",
        TriggerKind::TabularHeader,
        r"^\s*MINI\s+MIN:\s+Cycle",
        r"^\s*(?:MINI>|MINI\s+(?:INTERN|EXTERN)|----------)",
        r"^\s*(?:CONJUG|STEEPD|NRAPH|ABNER|CHARMM)>",
        &[],
        false,
        OutputChannel::Log,
        Some(("MINI MIN:", "MINI-MIN:")),
        Some("mini_cycle"),
        None,
        Some("Cycle"),
        None,
    ),
    TRIG!(
        "mini_intern_header",
        "mini_intern",
        TriggerKind::TabularHeader,
        r"^\s*MINI\s+INTERN:",
        r"^\s*(?:MINI>|MINI\s+EXTERN|----------)",
        r"^\s*(?:CONJUG|STEEPD|NRAPH|ABNER|CHARMM)>",
        &[],
        false,
        OutputChannel::Log,
        Some(("MINI INTERN:", "MINI-INTERN:")),
        Some("mini_intern"),
        None,
        None,
        None,
    ),
    TRIG!(
        "mini_extern_header",
        "mini_extern",
        TriggerKind::TabularHeader,
        r"^\s*MINI\s+EXTERN:",
        r"^\s*(?:MINI>|MINI\s+INTERN|----------)",
        r"^\s*(?:CONJUG|STEEPD|NRAPH|ABNER|CHARMM)>",
        &[],
        false,
        OutputChannel::Log,
        Some(("MINI EXTERN:", "MINI-EXTERN:")),
        Some("mini_extern"),
        None,
        None,
        None,
    ),
    TRIG!(
        "mini_intern_row",
        "mini_intern",
        TriggerKind::TabularRow,
        r"^\s*MINI\s+INTERN>",
        NEVER,
        NEVER,
        &[],
        false,
        OutputChannel::Log,
        Some(("MINI INTERN>", "MINI-INTERN>")),
        None,
        Some("mini_intern"),
        None,
        None,
    ),
    TRIG!(
        "mini_extern_row",
        "mini_extern",
        TriggerKind::TabularRow,
        r"^\s*MINI\s+EXTERN>",
        NEVER,
        NEVER,
        &[],
        false,
        OutputChannel::Log,
        Some(("MINI EXTERN>", "MINI-EXTERN>")),
        None,
        Some("mini_extern"),
        None,
        None,
    ),
    TRIG!(
        "mini_cycle_row",
        "mini_cycle",
        TriggerKind::TabularRow,
        r"^\s*MINI>",
        NEVER,
        NEVER,
        &[],
        false,
        OutputChannel::Log,
        None,
        None,
        Some("mini_cycle"),
        Some("Cycle"),
        None,
    ),
    TRIG!(
        "mini_status",
        "mini_status",
        TriggerKind::SingleValue,
        r"^\s*>?\s*Minimization\s+exiting\s+with",
        NEVER,
        NEVER,
        MINI_STATUS_FIELDS,
        false,
        OutputChannel::Control,
        None,
        None,
        None,
        None,
        Some("T"),
    ),
];

/// Rules applied within a `DYNA` command block, in match priority order.
pub static DYNA_RULES: &[TriggerRule] = &[
    TRIG!(
        "dyna_control",
        "dyna_control",
        TriggerKind::Namelist,
        r"^\s*CHARMM>\s*DYNA",
        r"^\s*DYNA\s+DYN:\s+Step",
        r"^\s*CHARMM>\s*(?:MINI|DYNA|ENER|GETE)",
        DYNA_CONTROL_FIELDS,
        false,
        OutputChannel::Control,
        None,
        None,
        None,
        None,
        None,
    ),
    TRIG!(
        "dyna_step_header",
        "dyna_step",
        TriggerKind::TabularHeader,
        r"^\s*DYNA\s+DYN:\s+Step",
        r"^\s*(?:DYNA>|DYNA\s+(?:PROP|INTERN|EXTERN|PRESS):|----------)",
        r"^\s*CHARMM>",
        &[],
        false,
        OutputChannel::Log,
        Some(("DYNA DYN:", "DYNA-DYN:")),
        Some("dyna_step"),
        None,
        Some("Step"),
        None,
    ),
    TRIG!(
        "dyna_prop_header",
        "dyna_prop",
        TriggerKind::TabularHeader,
        r"^\s*DYNA\s+PROP:",
        r"^\s*(?:DYNA>|DYNA\s+(?:INTERN|EXTERN|PRESS):|----------)",
        r"^\s*CHARMM>",
        &[],
        false,
        OutputChannel::Log,
        Some(("DYNA PROP:", "DYNA-PROP:")),
        Some("dyna_prop"),
        None,
        None,
        None,
    ),
    TRIG!(
        "dyna_intern_header",
        "dyna_intern",
        TriggerKind::TabularHeader,
        r"^\s*DYNA\s+INTERN:",
        r"^\s*(?:DYNA>|DYNA\s+(?:PROP|EXTERN|PRESS):|----------)",
        r"^\s*CHARMM>",
        &[],
        false,
        OutputChannel::Log,
        Some(("DYNA INTERN:", "DYNA-INTERN:")),
        Some("dyna_intern"),
        None,
        None,
        None,
    ),
    TRIG!(
        "dyna_extern_header",
        "dyna_extern",
        TriggerKind::TabularHeader,
        r"^\s*DYNA\s+EXTERN:",
        r"^\s*(?:DYNA>|DYNA\s+(?:PROP|INTERN|PRESS):|----------)",
        r"^\s*CHARMM>",
        &[],
        false,
        OutputChannel::Log,
        Some(("DYNA EXTERN:", "DYNA-EXTERN:")),
        Some("dyna_extern"),
        None,
        None,
        None,
    ),
    TRIG!(
        "dyna_press_header",
        "dyna_press",
        TriggerKind::TabularHeader,
        r"^\s*DYNA\s+PRESS:",
        r"^\s*(?:DYNA>|DYNA\s+(?:PROP|INTERN|EXTERN):|----------)",
        r"^\s*CHARMM>",
        &[],
        false,
        OutputChannel::Log,
        Some(("DYNA PRESS:", "DYNA-PRESS:")),
        Some("dyna_press"),
        None,
        None,
        None,
    ),
    TRIG!(
        "dyna_prop_row",
        "dyna_prop",
        TriggerKind::TabularRow,
        r"^\s*DYNA\s+PROP>",
        NEVER,
        NEVER,
        &[],
        false,
        OutputChannel::Log,
        Some(("DYNA PROP>", "DYNA-PROP>")),
        None,
        Some("dyna_prop"),
        None,
        None,
    ),
    TRIG!(
        "dyna_intern_row",
        "dyna_intern",
        TriggerKind::TabularRow,
        r"^\s*DYNA\s+INTERN>",
        NEVER,
        NEVER,
        &[],
        false,
        OutputChannel::Log,
        Some(("DYNA INTERN>", "DYNA-INTERN>")),
        None,
        Some("dyna_intern"),
        None,
        None,
    ),
    TRIG!(
        "dyna_extern_row",
        "dyna_extern",
        TriggerKind::TabularRow,
        r"^\s*DYNA\s+EXTERN>",
        NEVER,
        NEVER,
        &[],
        false,
        OutputChannel::Log,
        Some(("DYNA EXTERN>", "DYNA-EXTERN>")),
        None,
        Some("dyna_extern"),
        None,
        None,
    ),
    TRIG!(
        "dyna_press_row",
        "dyna_press",
        TriggerKind::TabularRow,
        r"^\s*DYNA\s+PRESS>",
        NEVER,
        NEVER,
        &[],
        false,
        OutputChannel::Log,
        Some(("DYNA PRESS>", "DYNA-PRESS>")),
        None,
        Some("dyna_press"),
        None,
        None,
    ),
    TRIG!(
        "dyna_step_row",
        "dyna_step",
        TriggerKind::TabularRow,
        r"^\s*DYNA>",
        NEVER,
        NEVER,
        &[],
        false,
        OutputChannel::Log,
        None,
        None,
        Some("dyna_step"),
        Some("Step"),
        None,
    ),
];

/// Rules applied within an `ENER`/`GETE` command block, in match priority
/// order. Unlike the `MINI`/`DYNA` families these match case sensitively;
/// the energy module's echoes are strictly upper case and a relaxed match
/// would collide with user titles.
pub static ENER_RULES: &[TriggerRule] = &[
    TRIG!(
        "ener_control",
        "ener_control",
        TriggerKind::Namelist,
        r"^\s*CHARMM>\s*(?:ENER|GETE)",
        r"^\s*ENER\s+ENR:\s*Eval#",
        r"^\s*CHARMM>\s*(?:MINI|DYNA|ENER|GETE)",
        ENER_CONTROL_FIELDS,
        true,
        OutputChannel::Control,
        None,
        None,
        None,
        None,
        None,
    ),
    TRIG!(
        "ener_eval_header",
        "ener_eval",
        TriggerKind::TabularHeader,
        r"^\s*ENER\s+ENR:\s*Eval#",
        r"^\s*(?:ENER>|ENER\s+(?:INTERN|EXTERN)|----------)",
        r"^\s*CHARMM>",
        &[],
        true,
        OutputChannel::Log,
        Some(("ENER ENR:", "ENER-ENR:")),
        Some("ener_eval"),
        None,
        Some("Eval#"),
        None,
    ),
    TRIG!(
        "ener_intern_header",
        "ener_intern",
        TriggerKind::TabularHeader,
        r"^\s*ENER\s+INTERN:",
        r"^\s*(?:ENER>|ENER\s+EXTERN|----------)",
        r"^\s*CHARMM>",
        &[],
        true,
        OutputChannel::Log,
        Some(("ENER INTERN:", "ENER-INTERN:")),
        Some("ener_intern"),
        None,
        None,
        None,
    ),
    TRIG!(
        "ener_extern_header",
        "ener_extern",
        TriggerKind::TabularHeader,
        r"^\s*ENER\s+EXTERN:",
        r"^\s*(?:ENER>|ENER\s+INTERN|----------)",
        r"^\s*CHARMM>",
        &[],
        true,
        OutputChannel::Log,
        Some(("ENER EXTERN:", "ENER-EXTERN:")),
        Some("ener_extern"),
        None,
        None,
        None,
    ),
    TRIG!(
        "ener_intern_row",
        "ener_intern",
        TriggerKind::TabularRow,
        r"^\s*ENER\s+INTERN>",
        NEVER,
        NEVER,
        &[],
        true,
        OutputChannel::Log,
        Some(("ENER INTERN>", "ENER-INTERN>")),
        None,
        Some("ener_intern"),
        None,
        None,
    ),
    TRIG!(
        "ener_extern_row",
        "ener_extern",
        TriggerKind::TabularRow,
        r"^\s*ENER\s+EXTERN>",
        NEVER,
        NEVER,
        &[],
        true,
        OutputChannel::Log,
        Some(("ENER EXTERN>", "ENER-EXTERN>")),
        None,
        Some("ener_extern"),
        None,
        None,
    ),
    TRIG!(
        "ener_eval_row",
        "ener_eval",
        TriggerKind::TabularRow,
        r"^\s*ENER>",
        NEVER,
        NEVER,
        &[],
        true,
        OutputChannel::Log,
        None,
        None,
        Some("ener_eval"),
        Some("Eval#"),
        None,
    ),
];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CompiledRule
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A [`TriggerRule`] with its three patterns compiled.
pub struct CompiledRule {
    pub rule: &'static TriggerRule,
    start: Regex,
    stop: Regex,
    quit: Regex,
}

fn compile_pattern(
    pattern: &str,
    case_sensitive: bool,
) -> Regex {
    let pattern_cased: String;
    let pattern_: &str = if case_sensitive {
        pattern
    } else {
        pattern_cased = format!("(?i){}", pattern);
        pattern_cased.as_str()
    };
    // builtin patterns are compile-time constants; a bad one is a
    // programming error
    Regex::new(pattern_).unwrap()
}

impl CompiledRule {
    fn new(rule: &'static TriggerRule) -> CompiledRule {
        CompiledRule {
            rule,
            start: compile_pattern(rule.start_pattern, rule.case_sensitive),
            stop: compile_pattern(rule.stop_pattern, rule.case_sensitive),
            quit: compile_pattern(rule.quit_pattern, rule.case_sensitive),
        }
    }

    #[inline(always)]
    pub fn is_start_line(
        &self,
        line: &str,
    ) -> bool {
        self.start.is_match(line)
    }

    /// Should the current accumulation for this rule be finalized?
    #[inline(always)]
    pub fn is_stop_line(
        &self,
        line: &str,
    ) -> bool {
        self.stop.is_match(line)
    }

    /// Should the current accumulation for this rule be abandoned?
    #[inline(always)]
    pub fn is_quit_line(
        &self,
        line: &str,
    ) -> bool {
        self.quit.is_match(line)
    }
}

// manual impl; the compiled `Regex` fields are noise
impl fmt::Debug for CompiledRule {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("rule", &self.rule.name)
            .finish()
    }
}

lazy_static! {
    /// Compiled [`MINI_RULES`].
    pub static ref MINI_RULES_COMPILED: Vec<CompiledRule> = MINI_RULES
        .iter()
        .map(CompiledRule::new)
        .collect();
    /// Compiled [`DYNA_RULES`].
    pub static ref DYNA_RULES_COMPILED: Vec<CompiledRule> = DYNA_RULES
        .iter()
        .map(CompiledRule::new)
        .collect();
    /// Compiled [`ENER_RULES`].
    pub static ref ENER_RULES_COMPILED: Vec<CompiledRule> = ENER_RULES
        .iter()
        .map(CompiledRule::new)
        .collect();
}

/// The compiled rule set for one block kind. `Setup` blocks have no rules;
/// their lines carry file operations only.
pub fn rules_for_block(kind: BlockKind) -> &'static [CompiledRule] {
    match kind {
        BlockKind::Setup => &[],
        BlockKind::Mini => &MINI_RULES_COMPILED,
        BlockKind::Dyna => &DYNA_RULES_COMPILED,
        BlockKind::Ener | BlockKind::Gete => &ENER_RULES_COMPILED,
    }
}

/// First rule in `rules` whose start pattern matches `line`, or `None`.
/// Matching is ordered, first-match-wins.
pub fn match_rule<'a>(
    line: &str,
    rules: &'a [CompiledRule],
) -> Option<&'a CompiledRule> {
    rules
        .iter()
        .find(|crule| crule.is_start_line(line))
}
