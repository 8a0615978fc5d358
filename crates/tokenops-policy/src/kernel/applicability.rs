//! Evaluation of [`Applicability`] expressions against a [`FactBag`].
//!
//! Text comparisons are ASCII case-insensitive. A comparison whose operand
//! has the wrong shape for the fact (a list operator on a scalar fact, a
//! non-string value against a text fact, `is_true` on a non-boolean)
//! evaluates to `false` and leaves a note; evaluation never fails.

use serde_json::Value;

use tokenops_core::{Applicability, Fact};

use super::facts::{FactBag, FactValue};

/// Result of evaluating one expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub matched: bool,
    /// Type-mismatch notes, in evaluation order.
    pub notes: Vec<String>,
}

pub fn evaluate(expr: &Applicability, facts: &FactBag) -> Outcome {
    let mut notes = Vec::new();
    let matched = eval(expr, facts, &mut notes);
    Outcome { matched, notes }
}

fn eval(expr: &Applicability, facts: &FactBag, notes: &mut Vec<String>) -> bool {
    match expr {
        Applicability::Always => true,
        Applicability::All(items) => items.iter().all(|e| eval(e, facts, notes)),
        Applicability::Any(items) => items.iter().any(|e| eval(e, facts, notes)),
        Applicability::Not(inner) => !eval(inner, facts, notes),
        Applicability::Equals { fact, value } => {
            scalar_in("equals", *fact, std::slice::from_ref(value), facts, notes)
        }
        Applicability::OneOf { fact, values } => scalar_in("one_of", *fact, values, facts, notes),
        Applicability::Includes { fact, value } => {
            list_meets("includes", *fact, std::slice::from_ref(value), facts, notes)
        }
        Applicability::Intersects { fact, values } => {
            list_meets("intersects", *fact, values, facts, notes)
        }
        Applicability::IsTrue { fact } => match facts.value(*fact) {
            FactValue::Bool(b) => b,
            FactValue::Missing => false,
            other => mismatch(notes, *fact, other, "is_true"),
        },
    }
}

fn mismatch(notes: &mut Vec<String>, fact: Fact, value: FactValue<'_>, op: &str) -> bool {
    notes.push(format!(
        "type mismatch: {op} cannot compare {fact} ({} fact)",
        value.shape()
    ));
    false
}

fn text_eq(fact_text: &str, value: &Value) -> Option<bool> {
    value.as_str().map(|v| v.eq_ignore_ascii_case(fact_text))
}

/// `equals` / `one_of`: the scalar fact equals one of `values`.
fn scalar_in(
    op: &str,
    fact: Fact,
    values: &[Value],
    facts: &FactBag,
    notes: &mut Vec<String>,
) -> bool {
    match facts.value(fact) {
        FactValue::Missing => false,
        FactValue::Text(text) => {
            let mut matched = false;
            for value in values {
                match text_eq(text, value) {
                    Some(eq) => matched |= eq,
                    None => {
                        notes.push(format!(
                            "type mismatch: {op} compares text fact {fact} with {value}"
                        ));
                    }
                }
            }
            matched
        }
        FactValue::Bool(b) => {
            let mut matched = false;
            for value in values {
                match value.as_bool() {
                    Some(v) => matched |= v == b,
                    None => {
                        notes.push(format!(
                            "type mismatch: {op} compares boolean fact {fact} with {value}"
                        ));
                    }
                }
            }
            matched
        }
        list @ FactValue::List(_) => mismatch(notes, fact, list, op),
    }
}

/// `includes` / `intersects`: the list fact contains any of `values`.
fn list_meets(
    op: &str,
    fact: Fact,
    values: &[Value],
    facts: &FactBag,
    notes: &mut Vec<String>,
) -> bool {
    match facts.value(fact) {
        FactValue::List(items) => {
            let mut matched = false;
            for value in values {
                if value.as_str().is_none() {
                    notes.push(format!(
                        "type mismatch: {op} compares list fact {fact} with {value}"
                    ));
                    continue;
                }
                matched |= items.iter().any(|item| text_eq(item, value) == Some(true));
            }
            matched
        }
        FactValue::Missing => false,
        scalar => mismatch(notes, fact, scalar, op),
    }
}
