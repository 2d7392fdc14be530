//! Filter expression parser
//!
//! Grammar: clauses joined by `;`, each clause `field OP value`.
//!
//! | OP | function | value |
//! |---|---|---|
//! | `=` | Eq | scalar |
//! | `<` `<=` `>` `>=` | Lt Le Gt Ge | scalar |
//! | `=like=` / `=notlike=` | Like / NotLike | pattern scalar |
//! | `=in=` / `=notin=` | In / NotIn | `(v1,v2,...)` |
//! | `=between=` | Between | `(lo,hi)` |
//!
//! Scalars and list items may be double-quoted (`\"` and `\\` escapes) or
//! bare tokens. An empty or whitespace-only expression yields no criteria.

use super::criteria::{Criteria, CriteriaFunction};
use super::errors::{FilterError, FilterResult};

/// Named operators, matched before the bare `=`
const NAMED_OPS: &[(&str, CriteriaFunction)] = &[
    ("=like=", CriteriaFunction::Like),
    ("=notlike=", CriteriaFunction::NotLike),
    ("=in=", CriteriaFunction::In),
    ("=notin=", CriteriaFunction::NotIn),
    ("=between=", CriteriaFunction::Between),
];

/// Parse a filter expression into its ordered criteria.
pub fn parse(expression: &str) -> FilterResult<Vec<Criteria>> {
    split_clauses(expression)?
        .into_iter()
        .map(parse_clause)
        .collect()
}

/// Split an expression on `;`, honoring quoted sections.
fn split_clauses(expression: &str) -> FilterResult<Vec<&str>> {
    let mut clauses = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in expression.char_indices() {
        match c {
            '\\' if in_quotes && !escaped => escaped = true,
            '"' if !escaped => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                push_clause(&mut clauses, &expression[start..i]);
                start = i + 1;
                escaped = false;
            }
            _ => escaped = false,
        }
    }

    if in_quotes {
        return Err(FilterError::invalid("unterminated quoted value"));
    }
    push_clause(&mut clauses, &expression[start..]);
    Ok(clauses)
}

fn push_clause<'a>(clauses: &mut Vec<&'a str>, raw: &'a str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        clauses.push(trimmed);
    }
}

fn parse_clause(clause: &str) -> FilterResult<Criteria> {
    let field_end = clause
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(clause.len());
    let field = &clause[..field_end];
    if field.is_empty() {
        return Err(FilterError::invalid(format!(
            "expected a field name in clause '{clause}'"
        )));
    }

    let rest = clause[field_end..].trim_start();
    let (function, rest) = parse_operator(rest, clause)?;
    let rest = rest.trim_start();

    let value = if function.takes_list() {
        parse_list(rest, function)?
    } else {
        parse_scalar(rest)?
    };

    Ok(Criteria::new(field, function, value))
}

fn parse_operator<'a>(
    rest: &'a str,
    clause: &str,
) -> FilterResult<(CriteriaFunction, &'a str)> {
    for (token, function) in NAMED_OPS {
        if let Some(remainder) = rest.strip_prefix(token) {
            return Ok((*function, remainder));
        }
    }

    for (token, function) in [
        ("<=", CriteriaFunction::Le),
        (">=", CriteriaFunction::Ge),
        ("<", CriteriaFunction::Lt),
        (">", CriteriaFunction::Gt),
        ("=", CriteriaFunction::Eq),
    ] {
        if let Some(remainder) = rest.strip_prefix(token) {
            return Ok((function, remainder));
        }
    }

    Err(FilterError::invalid(format!(
        "expected an operator in clause '{clause}'"
    )))
}

/// Parse a scalar value: quoted (with escapes) or a bare token.
fn parse_scalar(raw: &str) -> FilterResult<String> {
    if let Some(inner) = raw.strip_prefix('"') {
        let (value, remainder) = read_quoted(inner)?;
        if !remainder.trim().is_empty() {
            return Err(FilterError::invalid(format!(
                "unexpected trailing input '{}'",
                remainder.trim()
            )));
        }
        return Ok(value);
    }

    let bare = raw.trim();
    if bare.is_empty() {
        return Err(FilterError::invalid("expected a value"));
    }
    if bare.contains('"') {
        return Err(FilterError::invalid(format!(
            "misquoted value '{bare}'"
        )));
    }
    Ok(bare.to_string())
}

/// Read the body of a quoted value; returns the value and what follows the
/// closing quote.
fn read_quoted(inner: &str) -> FilterResult<(String, &str)> {
    let mut value = String::new();
    let mut escaped = false;

    for (i, c) in inner.char_indices() {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Ok((value, &inner[i + 1..]));
        } else {
            value.push(c);
        }
    }

    Err(FilterError::invalid("unterminated quoted value"))
}

/// Parse a parenthesized value list into a comma-delimited string.
fn parse_list(raw: &str, function: CriteriaFunction) -> FilterResult<String> {
    let inner = raw
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| {
            FilterError::invalid(format!(
                "{} takes a parenthesized value list",
                function.as_str()
            ))
        })?;

    let mut items = Vec::new();
    for item in split_list_items(inner) {
        items.push(parse_scalar(item.trim())?);
    }

    match function {
        CriteriaFunction::Between if items.len() != 2 => Err(FilterError::invalid(format!(
            "between takes exactly two values, got {}",
            items.len()
        ))),
        _ if items.is_empty() => Err(FilterError::invalid(format!(
            "{} takes at least one value",
            function.as_str()
        ))),
        _ => Ok(items.join(",")),
    }
}

/// Split list items on commas outside quotes.
fn split_list_items(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in inner.char_indices() {
        match c {
            '\\' if in_quotes && !escaped => escaped = true,
            '"' if !escaped => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                items.push(&inner[start..i]);
                start = i + 1;
                escaped = false;
            }
            _ => escaped = false,
        }
    }
    items.push(&inner[start..]);
    items
}
