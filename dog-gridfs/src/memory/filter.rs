use std::cmp::Ordering;

use regex::RegexBuilder;
use serde_json::Value;

use crate::{Document, GridFsError, GridFsResult};

/// Evaluate a native filter document against a record document
pub(crate) fn matches(doc: &Value, filter: &Document) -> GridFsResult<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => all_match(doc, condition)?,
            "$or" => any_match(doc, condition)?,
            "$nor" => !any_match(doc, condition)?,
            op if op.starts_with('$') => {
                return Err(GridFsError::invalid(format!(
                    "Unsupported top-level operator `{}`",
                    op
                )))
            }
            path => eval_condition(lookup(doc, path), condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn all_match(doc: &Value, condition: &Value) -> GridFsResult<bool> {
    for clause in clauses(condition)? {
        if !matches(doc, clause)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_match(doc: &Value, condition: &Value) -> GridFsResult<bool> {
    for clause in clauses(condition)? {
        if matches(doc, clause)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Resolve a dotted path inside a document
pub(crate) fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| current.get(segment))
}

/// Total order across JSON values; missing sorts with null
pub(crate) fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

fn clauses(condition: &Value) -> GridFsResult<Vec<&Document>> {
    let items = condition
        .as_array()
        .ok_or_else(|| GridFsError::invalid("Logical operators expect an array of documents"))?;
    items
        .iter()
        .map(|item| {
            item.as_object()
                .ok_or_else(|| GridFsError::invalid("Logical operators expect an array of documents"))
        })
        .collect()
}

fn operator_document(condition: &Value) -> Option<&Document> {
    match condition {
        Value::Object(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => Some(ops),
        _ => None,
    }
}

fn eval_condition(value: Option<&Value>, condition: &Value) -> GridFsResult<bool> {
    let Some(ops) = operator_document(condition) else {
        return Ok(equals(value, condition));
    };
    let options = ops.get("$options").and_then(Value::as_str).unwrap_or("");

    for (op, argument) in ops {
        let matched = match op.as_str() {
            "$eq" => equals(value, argument),
            "$ne" => !equals(value, argument),
            "$gt" => ordered(value, argument, |o| o == Ordering::Greater),
            "$gte" => ordered(value, argument, |o| o != Ordering::Less),
            "$lt" => ordered(value, argument, |o| o == Ordering::Less),
            "$lte" => ordered(value, argument, |o| o != Ordering::Greater),
            "$in" => members(argument)?.iter().any(|candidate| equals(value, candidate)),
            "$nin" => !members(argument)?.iter().any(|candidate| equals(value, candidate)),
            "$exists" => value.is_some() == argument.as_bool().unwrap_or(true),
            "$regex" => regex_match(value, argument, options)?,
            "$options" => true,
            other => {
                return Err(GridFsError::invalid(format!(
                    "Unsupported query operator `{}`",
                    other
                )))
            }
        };

        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn equals(value: Option<&Value>, expected: &Value) -> bool {
    match value {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| scalar_equals(item, expected))
        }
        Some(actual) => scalar_equals(actual, expected),
    }
}

fn scalar_equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

fn ordered(value: Option<&Value>, argument: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    match value {
        Some(actual) if type_rank(actual) == type_rank(argument) => {
            accept(compare(Some(actual), Some(argument)))
        }
        _ => false,
    }
}

fn members(argument: &Value) -> GridFsResult<&Vec<Value>> {
    argument
        .as_array()
        .ok_or_else(|| GridFsError::invalid("$in/$nin expect an array"))
}

fn regex_match(value: Option<&Value>, argument: &Value, options: &str) -> GridFsResult<bool> {
    let expression = argument
        .as_str()
        .ok_or_else(|| GridFsError::invalid("$regex expects a string"))?;

    let regex = RegexBuilder::new(expression)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .dot_matches_new_line(options.contains('s'))
        .ignore_whitespace(options.contains('x'))
        .build()
        .map_err(GridFsError::storage)?;

    Ok(match value {
        Some(Value::String(s)) => regex.is_match(s),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .any(|s| regex.is_match(s)),
        _ => false,
    })
}
