// src/tests/field_tests.rs

#![allow(non_snake_case)]

use crate::common::STEP_UNSET;
use crate::data::field::{
    FieldRecorder,
    FieldSink,
    FieldTuple,
    Value,
    ValueType,
};

extern crate test_case;
use test_case::test_case;

// ─────────────────────────────────────────────────────────────────────────────────────────────────

#[test_case("100", Value::Int(100); "int")]
#[test_case("-3", Value::Int(-3); "int negative")]
#[test_case("1.5", Value::Null; "int rejects float")]
#[test_case("", Value::Null; "int empty")]
fn test_Value_parse_int(
    token: &str,
    expect: Value,
) {
    assert_eq!(expect, Value::parse_token(token, ValueType::Int));
}

#[test_case("86.50920", Value::Float(86.5092); "plain")]
#[test_case("-44.45289", Value::Float(-44.45289); "negative")]
#[test_case("1.5D+02", Value::Float(150.0); "fortran exponent upper D")]
#[test_case("2.5d-01", Value::Float(0.25); "fortran exponent lower d")]
#[test_case("1.0E-03", Value::Float(0.001); "E exponent")]
#[test_case("********", Value::Null; "field overflow")]
#[test_case("N/A", Value::Null; "not a number")]
fn test_Value_parse_float(
    token: &str,
    expect: Value,
) {
    assert_eq!(expect, Value::parse_token(token, ValueType::Float));
}

#[test_case("T", Value::Bool(true); "T")]
#[test_case("TRUE", Value::Bool(true); "TRUE word")]
#[test_case("yes", Value::Bool(true); "yes")]
#[test_case("F", Value::Bool(false); "F")]
#[test_case("off", Value::Bool(false); "off")]
#[test_case("2", Value::Null; "numeric is not a bool")]
fn test_Value_parse_bool(
    token: &str,
    expect: Value,
) {
    assert_eq!(expect, Value::parse_token(token, ValueType::Bool));
}

#[test]
fn test_Value_parse_text() {
    assert_eq!(
        Value::Text(String::from("mol.psf")),
        Value::parse_token("mol.psf", ValueType::Text)
    );
}

#[test]
fn test_Value_is_null() {
    assert!(Value::Null.is_null());
    assert!(!Value::Int(0).is_null());
    assert!(!Value::Float(0.0).is_null());
}

// ─────────────────────────────────────────────────────────────────────────────────────────────────

fn tuple(
    name: &str,
    value: Value,
    block_index: usize,
) -> FieldTuple {
    FieldTuple {
        name: String::from(name),
        value,
        raw: String::new(),
        step: STEP_UNSET,
        block_index,
        section: "test",
    }
}

#[test]
fn test_FieldRecorder() {
    let mut recorder = FieldRecorder::new();
    recorder.accept(tuple("NSTEP", Value::Int(10), 1));
    recorder.accept(tuple("ENERgy", Value::Float(86.5), 1));
    recorder.accept(tuple("NSTEP", Value::Int(20), 2));
    assert_eq!(3, recorder.tuples.len());
    assert_eq!(2, recorder.named("NSTEP").len());
    assert_eq!(1, recorder.named("ENERgy").len());
    assert_eq!(0, recorder.named("GRMS").len());
    assert_eq!(2, recorder.for_block(1).len());
    assert_eq!(1, recorder.for_block(2).len());
}
