//! Predicate compilation and evaluation
//!
//! Compiles an ordered criteria list against a resource schema into an
//! executable predicate over documents. Literal coercion to each field's
//! declared type happens here, so predicates are rebuilt per request.
//!
//! A document field that is missing, null, or of the wrong runtime type
//! never matches a criteria, negated forms included.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::schema::{FieldDef, FieldType, ResourceSchema};

use super::criteria::{Criteria, CriteriaFunction};
use super::errors::{FilterError, FilterResult};

/// A literal coerced to its field's declared type
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(DateTime<FixedOffset>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// One compiled test; all tests AND together
#[derive(Debug, Clone)]
enum Test {
    Compare {
        field: String,
        op: CompareOp,
        value: Literal,
    },
    Pattern {
        field: String,
        pattern: String,
        negated: bool,
    },
    Membership {
        field: String,
        values: Vec<Literal>,
        negated: bool,
    },
    Range {
        field: String,
        low: Literal,
        high: Literal,
    },
}

/// Executable predicate over documents
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    tests: Vec<Test>,
}

impl Predicate {
    /// Whether a document satisfies every compiled criteria
    pub fn matches(&self, doc: &Value) -> bool {
        self.tests.iter().all(|test| test.matches(doc))
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

/// Compile criteria against a resource schema.
pub fn compile(criteria: &[Criteria], schema: &ResourceSchema) -> FilterResult<Predicate> {
    let mut tests = Vec::with_capacity(criteria.len());

    for criterion in criteria {
        let field = schema.field(&criterion.field).ok_or_else(|| {
            FilterError::UnknownProperty {
                property: criterion.field.clone(),
                resource: schema.name.clone(),
            }
        })?;

        tests.push(compile_one(criterion, field)?);
    }

    Ok(Predicate { tests })
}

fn compile_one(criterion: &Criteria, field: &FieldDef) -> FilterResult<Test> {
    let name = criterion.field.clone();

    match criterion.function {
        CriteriaFunction::Eq => compare(name, CompareOp::Eq, field, &criterion.value),
        CriteriaFunction::Lt => compare(name, CompareOp::Lt, field, &criterion.value),
        CriteriaFunction::Le => compare(name, CompareOp::Le, field, &criterion.value),
        CriteriaFunction::Gt => compare(name, CompareOp::Gt, field, &criterion.value),
        CriteriaFunction::Ge => compare(name, CompareOp::Ge, field, &criterion.value),

        CriteriaFunction::Like | CriteriaFunction::NotLike => {
            if !matches!(field.field_type, FieldType::Str | FieldType::Id) {
                return Err(FilterError::invalid(format!(
                    "pattern comparison on non-string field '{}'",
                    field.name
                )));
            }
            Ok(Test::Pattern {
                field: name,
                pattern: criterion.value.clone(),
                negated: criterion.function == CriteriaFunction::NotLike,
            })
        }

        CriteriaFunction::In | CriteriaFunction::NotIn => {
            let values = criterion
                .value
                .split(',')
                .map(|item| coerce(field, item))
                .collect::<FilterResult<Vec<_>>>()?;
            Ok(Test::Membership {
                field: name,
                values,
                negated: criterion.function == CriteriaFunction::NotIn,
            })
        }

        CriteriaFunction::Between => {
            let bounds: Vec<&str> = criterion.value.split(',').collect();
            let [low, high] = bounds.as_slice() else {
                return Err(FilterError::invalid(format!(
                    "between takes exactly two values, got {}",
                    bounds.len()
                )));
            };
            Ok(Test::Range {
                field: name,
                low: coerce(field, low)?,
                high: coerce(field, high)?,
            })
        }
    }
}

fn compare(
    field_name: String,
    op: CompareOp,
    field: &FieldDef,
    raw: &str,
) -> FilterResult<Test> {
    Ok(Test::Compare {
        field: field_name,
        op,
        value: coerce(field, raw)?,
    })
}

/// Coerce a raw literal to the field's declared type.
fn coerce(field: &FieldDef, raw: &str) -> FilterResult<Literal> {
    let fail = || {
        FilterError::invalid(format!(
            "cannot coerce '{raw}' to {} for field '{}'",
            field.field_type.name(),
            field.name
        ))
    };

    match &field.field_type {
        FieldType::Id | FieldType::Str => Ok(Literal::Str(raw.to_string())),
        FieldType::Int => raw.parse().map(Literal::Int).map_err(|_| fail()),
        FieldType::Float => raw.parse().map(Literal::Float).map_err(|_| fail()),
        FieldType::Bool => match raw {
            "true" => Ok(Literal::Bool(true)),
            "false" => Ok(Literal::Bool(false)),
            _ => Err(fail()),
        },
        FieldType::Datetime => DateTime::parse_from_rfc3339(raw)
            .map(Literal::DateTime)
            .map_err(|_| fail()),
        FieldType::Relation { .. } => Err(FilterError::invalid(format!(
            "relation field '{}' cannot be filtered",
            field.name
        ))),
    }
}

impl Test {
    fn matches(&self, doc: &Value) -> bool {
        match self {
            Test::Compare { field, op, value } => doc_cmp(doc.get(field.as_str()), value)
                .map(|ordering| op.accepts(ordering))
                .unwrap_or(false),

            Test::Pattern {
                field,
                pattern,
                negated,
            } => doc
                .get(field.as_str())
                .and_then(Value::as_str)
                .map(|s| {
                    let hit = wildcard_match(
                        &s.chars().collect::<Vec<_>>(),
                        &pattern.chars().collect::<Vec<_>>(),
                    );
                    hit != *negated
                })
                .unwrap_or(false),

            Test::Membership {
                field,
                values,
                negated,
            } => {
                let present = doc.get(field.as_str());
                if present.map(Value::is_null).unwrap_or(true) {
                    return false;
                }
                let member = values
                    .iter()
                    .any(|v| doc_cmp(present, v) == Some(Ordering::Equal));
                member != *negated
            }

            Test::Range { field, low, high } => {
                let value = doc.get(field.as_str());
                let above = doc_cmp(value, low)
                    .map(|o| o != Ordering::Less)
                    .unwrap_or(false);
                let below = doc_cmp(value, high)
                    .map(|o| o != Ordering::Greater)
                    .unwrap_or(false);
                above && below
            }
        }
    }
}

/// Order a document value against a coerced literal; `None` when the field
/// is missing, null, or of a different runtime type.
fn doc_cmp(value: Option<&Value>, literal: &Literal) -> Option<Ordering> {
    let value = value?;
    match literal {
        Literal::Str(s) => value.as_str().map(|v| v.cmp(s.as_str())),
        Literal::Int(i) => value.as_i64().map(|v| v.cmp(i)),
        Literal::Float(f) => value.as_f64().and_then(|v| v.partial_cmp(f)),
        Literal::Bool(b) => value.as_bool().map(|v| v.cmp(b)),
        Literal::DateTime(dt) => value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|v| v.cmp(dt)),
    }
}

/// `%` matches any sequence, `_` matches one character.
fn wildcard_match(value: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => value.is_empty(),
        Some(('%', rest)) => (0..=value.len()).any(|i| wildcard_match(&value[i..], rest)),
        Some(('_', rest)) => !value.is_empty() && wildcard_match(&value[1..], rest),
        Some((c, rest)) => value.first() == Some(c) && wildcard_match(&value[1..], rest),
    }
}
