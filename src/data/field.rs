// src/data/field.rs

//! A [`FieldTuple`] is one extracted `(name, value, step, section)` record
//! destined for the external metadata sink, and [`FieldSink`] is that sink's
//! seam.
//!
//! The core has no knowledge of the collaborating sink's storage format
//! (JSON document, database row, ...); it only forwards tuples.

use crate::common::StepIndex;

use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Value
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Declared type of a field value. Carried by each trigger rule's field
/// descriptor; drives token parsing in the extractor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueType {
    Int,
    Float,
    Bool,
    Text,
}

/// A parsed field value.
///
/// `Null` records a token that failed to parse under its declared type
/// ("MalformedFieldValue"); sibling fields in the same record are
/// unaffected.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl Value {
    /// Parse `token` under the declared `vtype`.
    ///
    /// Fortran-style `D` exponents (`1.5D+02`) are normalized to `E` before
    /// float parsing. An unparseable token yields `Value::Null`, never an
    /// error.
    pub fn parse_token(
        token: &str,
        vtype: ValueType,
    ) -> Value {
        match vtype {
            ValueType::Int => match token.parse::<i64>() {
                Ok(v) => Value::Int(v),
                Err(_) => Value::Null,
            },
            ValueType::Float => {
                let normalized = token
                    .replace('D', "E")
                    .replace('d', "e");
                match normalized.parse::<f64>() {
                    Ok(v) => Value::Float(v),
                    Err(_) => Value::Null,
                }
            }
            ValueType::Bool => match token.to_ascii_uppercase().as_str() {
                "T" | "TRUE" | "YES" | "ON" => Value::Bool(true),
                "F" | "FALSE" | "NO" | "OFF" => Value::Bool(false),
                _ => Value::Null,
            },
            ValueType::Text => Value::Text(token.to_string()),
        }
    }

    #[inline(always)]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Null => write!(f, "null"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FieldTuple
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One extracted field record.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldTuple {
    /// Field name, e.g. `ENERgy`, `NSTEP`, `geometry_optimization_converged`.
    pub name: String,
    /// Parsed value; `Value::Null` when the raw token was malformed.
    pub value: Value,
    /// Raw textual token as matched.
    pub raw: String,
    /// Running step counter at emission time.
    pub step: StepIndex,
    /// Index of the owning command block.
    pub block_index: usize,
    /// Owning logical section, e.g. `mini_cycle`, `dyna_control`.
    pub section: &'static str,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FieldSink
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// External metadata-recording collaborator seam.
pub trait FieldSink {
    fn accept(
        &mut self,
        tuple: FieldTuple,
    );
}

/// A `FieldSink` collecting tuples in memory. The crate's only builtin sink;
/// also the workhorse of the tests.
#[derive(Debug, Default)]
pub struct FieldRecorder {
    pub tuples: Vec<FieldTuple>,
}

impl FieldRecorder {
    pub fn new() -> FieldRecorder {
        FieldRecorder {
            tuples: Vec::new(),
        }
    }

    /// All collected tuples named `name`.
    pub fn named(
        &self,
        name: &str,
    ) -> Vec<&FieldTuple> {
        self.tuples
            .iter()
            .filter(|t| t.name == name)
            .collect()
    }

    /// All collected tuples owned by block `block_index`.
    pub fn for_block(
        &self,
        block_index: usize,
    ) -> Vec<&FieldTuple> {
        self.tuples
            .iter()
            .filter(|t| t.block_index == block_index)
            .collect()
    }
}

impl FieldSink for FieldRecorder {
    fn accept(
        &mut self,
        tuple: FieldTuple,
    ) {
        self.tuples.push(tuple);
    }
}
