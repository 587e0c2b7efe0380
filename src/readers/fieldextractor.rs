// src/readers/fieldextractor.rs

//! Implements a [`FieldExtractor`], the per-block pass turning trigger-rule
//! matches into [`FieldTuple`]s.
//!
//! The extractor replays one [`CommandBlock`]'s line range with a bounded
//! [`LineCursor`] and drives a two-state machine per the block's rule table:
//!
//! - `Idle`: every line is tested against the rule table's start patterns,
//!   first-match-wins. Single-line rules (`TabularRow`, `SingleValue`) emit
//!   immediately; multi-line rules (`Namelist`, `TabularHeader`) begin an
//!   accumulation.
//! - `Accumulating`: lines are buffered until the owning rule's _stop_
//!   pattern finalizes the record or its _quit_ pattern abandons it. The
//!   boundary line is not consumed; it is re-dispatched, because a stop line
//!   is usually the next record's start line.
//!
//! An accumulation still pending at the end of the block is finalized, so a
//! transcript truncated by a crashed run keeps its last record.
//!
//! Emitted tuples pass through the block's [`StepSchedule`]: a data row
//! whose step is not in scope for the rule's output channel is suppressed,
//! not an error.
//!
//! [`FieldTuple`]: crate::data::field::FieldTuple
//! [`CommandBlock`]: crate::data::commandblock::CommandBlock
//! [`LineCursor`]: crate::readers::linecursor::LineCursor
//! [`StepSchedule`]: crate::data::stepschedule::StepSchedule

use crate::common::{Count, StepIndex, STEP_UNSET};
use crate::data::commandblock::{BlockKind, CommandBlock};
use crate::data::field::{FieldSink, FieldTuple, Value, ValueType};
use crate::data::stepschedule::StepSchedule;
use crate::data::transcript::Transcript;
use crate::data::triggers::{
    match_rule,
    rules_for_block,
    CompiledRule,
    TriggerKind,
};
use crate::readers::linecursor::LineCursor;

use std::collections::HashMap;

use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ExtractStats
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Counters of one block extraction, merged into the run [`Summary`].
///
/// [`Summary`]: crate::readers::summary::Summary
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExtractStats {
    pub tuples_emitted: Count,
    /// Tuples whose step was out of schedule scope for their channel.
    pub tuples_suppressed: Count,
    /// Tokens that failed to parse under their declared type.
    pub values_malformed: Count,
    /// Accumulations abandoned by a quit trigger, and data rows arriving
    /// before any header cached their column names.
    pub sections_discarded: Count,
}

impl ExtractStats {
    pub fn merge(
        &mut self,
        other: &ExtractStats,
    ) {
        self.tuples_emitted += other.tuples_emitted;
        self.tuples_suppressed += other.tuples_suppressed;
        self.values_malformed += other.values_malformed;
        self.sections_discarded += other.sections_discarded;
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ParseContext
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Recognized control parameters of a `MINI`/`DYNA` command, gathered while
/// finalizing its control namelist.
#[derive(Debug, Default)]
struct ControlParams {
    nstep: Option<StepIndex>,
    nprint: Option<StepIndex>,
    nsavc: Option<StepIndex>,
    nsavv: Option<StepIndex>,
    nsavf: Option<StepIndex>,
}

impl ControlParams {
    fn note(
        &mut self,
        name: &str,
        value: &Value,
    ) {
        let Value::Int(v) = value else {
            return;
        };
        match name {
            "NSTEP" => self.nstep = Some(*v),
            "NPRINT" => self.nprint = Some(*v),
            "NSAVC" => self.nsavc = Some(*v),
            "NSAVV" => self.nsavv = Some(*v),
            "NSAVF" => self.nsavf = Some(*v),
            _ => {}
        }
    }
}

/// Mutable state of one block extraction.
struct ParseContext {
    block_index: usize,
    block_kind: BlockKind,
    /// Column-name caches keyed by the header rules' save keys.
    /// Never survives the block; a later block's identical table gets its
    /// own header.
    header_columns: HashMap<&'static str, Vec<String>>,
    /// Running step counter; starts "before the zeroth step" and follows
    /// the step column of each data row.
    current_step: StepIndex,
    schedule: StepSchedule,
    stats: ExtractStats,
}

/// A pending multi-line accumulation.
struct Accumulation {
    rule: &'static CompiledRule,
    lines: Vec<String>,
}

enum ExtractState {
    Idle,
    Accumulating(Accumulation),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FieldExtractor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-block field extraction over one [`Transcript`].
pub struct FieldExtractor<'a> {
    transcript: &'a Transcript,
}

/// Does an uppercased namelist token select `field_name`?
///
/// CHARMM keywords are significant to four characters, so a token of at
/// least four characters selects any field it prefixes.
fn token_selects_field(
    token_upper: &str,
    field_name: &str,
) -> bool {
    token_upper == field_name
        || (token_upper.len() >= 4 && field_name.starts_with(token_upper))
}

/// Apply the rule's literal line filter, then split on whitespace.
fn filtered_tokens(
    rule: &CompiledRule,
    line: &str,
) -> Vec<String> {
    let filtered: String = match rule.rule.line_filter {
        Some((from, to)) => line.replace(from, to),
        None => line.to_string(),
    };

    filtered
        .split_whitespace()
        .map(String::from)
        .collect()
}

impl<'a> FieldExtractor<'a> {
    pub fn new(transcript: &'a Transcript) -> FieldExtractor<'a> {
        defñ!("{:?}", transcript);
        FieldExtractor { transcript }
    }

    /// Extract every rule-matched record within `block`, forwarding tuples
    /// to `sink`. Infallible: malformed content downgrades to `Value::Null`
    /// or a discard counter, never an error.
    pub fn extract_block(
        &self,
        block: &CommandBlock,
        sink: &mut dyn FieldSink,
    ) -> ExtractStats {
        defn!("block {} {} lines {}..{}", block.index, block.kind, block.line_beg, block.line_end);
        let rules = rules_for_block(block.kind);
        if rules.is_empty() {
            // Setup blocks carry file operations only
            defx!("no rules for {}", block.kind);
            return ExtractStats::default();
        }
        let mut context = ParseContext {
            block_index: block.index,
            block_kind: block.kind,
            header_columns: HashMap::new(),
            current_step: STEP_UNSET,
            schedule: match block.kind {
                BlockKind::Ener | BlockKind::Gete => StepSchedule::single_point(),
                _ => StepSchedule::default(),
            },
            stats: ExtractStats::default(),
        };
        let mut cursor = LineCursor::over(self.transcript, block.line_beg..block.line_end);
        let mut state = ExtractState::Idle;
        loop {
            let Some(line) = cursor.peek(0) else {
                break;
            };
            let consumed: bool = match state {
                ExtractState::Idle => {
                    if let Some(crule) = match_rule(line, rules) {
                        match crule.rule.kind {
                            TriggerKind::TabularRow => {
                                self.emit_row(crule, line, &mut context, sink);
                            }
                            TriggerKind::SingleValue => {
                                self.emit_single(crule, line, &mut context, sink);
                            }
                            TriggerKind::Namelist | TriggerKind::TabularHeader => {
                                defo!("start {} at line {}", crule.rule.name, cursor.index());
                                state = ExtractState::Accumulating(Accumulation {
                                    rule: crule,
                                    lines: vec![line.to_string()],
                                });
                            }
                        }
                    }
                    true
                }
                ExtractState::Accumulating(ref mut acc) => {
                    if acc.rule.is_quit_line(line) {
                        defo!("quit {} at line {}", acc.rule.rule.name, cursor.index());
                        context.stats.sections_discarded += 1;
                        state = ExtractState::Idle;
                        // re-dispatch the quit line
                        false
                    } else if acc.rule.is_stop_line(line) {
                        defo!("stop {} at line {}", acc.rule.rule.name, cursor.index());
                        let acc = match std::mem::replace(&mut state, ExtractState::Idle) {
                            ExtractState::Accumulating(acc) => acc,
                            ExtractState::Idle => unreachable!(),
                        };
                        self.finalize(&acc, &mut context, sink);
                        // re-dispatch the stop line
                        false
                    } else {
                        acc.lines.push(line.to_string());
                        true
                    }
                }
            };
            if consumed {
                let _ = cursor.next_line();
            }
        }
        // a truncated transcript keeps its pending record
        if let ExtractState::Accumulating(acc) = state {
            defo!("finalize pending {} at end of block", acc.rule.rule.name);
            self.finalize(&acc, &mut context, sink);
        }
        defx!("{:?}", context.stats);

        context.stats
    }

    /// Finalize a multi-line accumulation: parse a namelist's keyword/value
    /// pairs, or cache a table header's column names.
    fn finalize(
        &self,
        acc: &Accumulation,
        context: &mut ParseContext,
        sink: &mut dyn FieldSink,
    ) {
        match acc.rule.rule.kind {
            TriggerKind::Namelist => self.finalize_namelist(acc, context, sink),
            TriggerKind::TabularHeader => self.finalize_header(acc, context),
            // single-line kinds never accumulate
            TriggerKind::TabularRow | TriggerKind::SingleValue => unreachable!(),
        }
    }

    fn finalize_namelist(
        &self,
        acc: &Accumulation,
        context: &mut ParseContext,
        sink: &mut dyn FieldSink,
    ) {
        let rule = acc.rule;
        // `NSTEP 1000` in a command echo and `NSTEP  =  1000` in the
        // parameter summary lines both occur; drop the `=` so the value
        // always follows its keyword
        let tokens: Vec<String> = acc
            .lines
            .iter()
            .flat_map(|l| l.split_whitespace())
            .filter(|t| *t != "=")
            .map(String::from)
            .collect();
        let mut control = ControlParams::default();
        // the command echo precedes any summary repeat; first wins
        let mut seen: Vec<&'static str> = Vec::new();
        for (at, token) in tokens.iter().enumerate() {
            let token_upper = token.to_ascii_uppercase();
            let Some(field) = rule
                .rule
                .fields
                .iter()
                .find(|f| token_selects_field(&token_upper, f.name))
            else {
                continue;
            };
            if seen.contains(&field.name) {
                continue;
            }
            seen.push(field.name);
            let Some(raw) = tokens.get(at + 1) else {
                continue;
            };
            let value = Value::parse_token(raw, field.vtype);
            if value.is_null() {
                context.stats.values_malformed += 1;
            }
            control.note(field.name, &value);
            self.emit(
                FieldTuple {
                    name: field.name.to_string(),
                    value,
                    raw: raw.clone(),
                    step: context.current_step,
                    block_index: context.block_index,
                    section: rule.rule.section,
                },
                rule,
                context,
                sink,
            );
        }
        if let Some(nstep) = control.nstep {
            // a minimizer without NPRINT prints at cycles of its own
            // choosing; leave the log channel ungated
            if context.block_kind == BlockKind::Mini && control.nprint.is_none() {
                return;
            }
            context.schedule = StepSchedule::from_control(
                nstep,
                control.nprint,
                control.nsavc,
                control.nsavv,
                control.nsavf,
            );
        }
    }

    fn finalize_header(
        &self,
        acc: &Accumulation,
        context: &mut ParseContext,
    ) {
        let rule = acc.rule;
        let Some(save_key) = rule.rule.header_save else {
            return;
        };
        // the header proper is the start line; any further buffered lines
        // are separators
        let Some(header_line) = acc.lines.first() else {
            return;
        };
        let columns = filtered_tokens(rule, header_line);
        defo!("header {:?} columns {:?}", save_key, columns);
        context
            .header_columns
            .insert(save_key, columns);
    }

    /// Emit one table data row, pairing its tokens positionally with the
    /// cached header columns. Token `0` is the row tag and carries no value.
    fn emit_row(
        &self,
        rule: &'static CompiledRule,
        line: &str,
        context: &mut ParseContext,
        sink: &mut dyn FieldSink,
    ) {
        let Some(use_key) = rule.rule.header_use else {
            return;
        };
        let Some(columns) = context.header_columns.get(use_key).cloned() else {
            // data row before any header; nothing to name its columns
            defo!("orphan row for {:?}", use_key);
            context.stats.sections_discarded += 1;
            return;
        };
        let tokens = filtered_tokens(rule, line);
        // the step column advances the running counter before scoping
        if let Some(step_name) = rule.rule.step_column {
            for (at, column) in columns.iter().enumerate() {
                if column != step_name {
                    continue;
                }
                if let Some(Ok(step)) = tokens.get(at).map(|t| t.parse::<StepIndex>()) {
                    context.current_step = step;
                }
            }
        }
        for (at, raw) in tokens.iter().enumerate().skip(1) {
            let Some(name) = columns.get(at) else {
                break;
            };
            let vtype = if Some(name.as_str()) == rule.rule.step_column {
                ValueType::Int
            } else {
                ValueType::Float
            };
            let value = Value::parse_token(raw, vtype);
            if value.is_null() {
                context.stats.values_malformed += 1;
            }
            self.emit(
                FieldTuple {
                    name: name.clone(),
                    value,
                    raw: raw.clone(),
                    step: context.current_step,
                    block_index: context.block_index,
                    section: rule.rule.section,
                },
                rule,
                context,
                sink,
            );
        }
    }

    /// Emit the fixed field of a `SingleValue` rule.
    fn emit_single(
        &self,
        rule: &'static CompiledRule,
        _line: &str,
        context: &mut ParseContext,
        sink: &mut dyn FieldSink,
    ) {
        let Some(field) = rule.rule.fields.first() else {
            return;
        };
        let raw = rule.rule.emit_raw.unwrap_or("T");
        let value = Value::parse_token(raw, field.vtype);
        self.emit(
            FieldTuple {
                name: field.name.to_string(),
                value,
                raw: raw.to_string(),
                step: context.current_step,
                block_index: context.block_index,
                section: rule.rule.section,
            },
            rule,
            context,
            sink,
        );
    }

    /// Schedule-gate and forward one tuple.
    fn emit(
        &self,
        tuple: FieldTuple,
        rule: &CompiledRule,
        context: &mut ParseContext,
        sink: &mut dyn FieldSink,
    ) {
        if !context
            .schedule
            .in_scope(rule.rule.channel, tuple.step)
        {
            defo!("suppress {} at step {}", tuple.name, tuple.step);
            context.stats.tuples_suppressed += 1;
            return;
        }
        context.stats.tuples_emitted += 1;
        sink.accept(tuple);
    }
}
