// Expression Evaluation Helpers
//
// Value-level semantics of the query operators. The engine walks the AST and
// hands already evaluated operands to the functions below.

use std::cmp::Ordering;

use crate::catalog::value::DataValue;
use crate::query::executor::result::{QueryError, QueryResult};
use crate::query::parser::ast::{LogicalOperator, Operator};

/// Apply a binary operator to two evaluated operands.
///
/// Arithmetic and ordering comparisons require numbers; a null operand makes
/// the result null. Equality is defined for every pair of values of the same
/// type, and two nulls are equal.
pub fn evaluate_binary(op: Operator, left: &DataValue, right: &DataValue) -> QueryResult<DataValue> {
    match op {
        Operator::Equals => Ok(DataValue::Boolean(values_equal_strict(left, right)?)),
        Operator::NotEquals => Ok(DataValue::Boolean(!values_equal_strict(left, right)?)),
        _ => {
            if left.is_null() || right.is_null() {
                return Ok(DataValue::Null);
            }
            let (l, r) = numeric_operands(op, left, right)?;
            evaluate_numeric(op, l, r)
        }
    }
}

fn numeric_operands(op: Operator, left: &DataValue, right: &DataValue) -> QueryResult<(f64, f64)> {
    match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => Err(QueryError::TypeMismatch(format!(
            "operator {} expects numbers, got {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn evaluate_numeric(op: Operator, l: f64, r: f64) -> QueryResult<DataValue> {
    let value = match op {
        Operator::Plus => DataValue::Number(l + r),
        Operator::Minus => DataValue::Number(l - r),
        Operator::Multiply => DataValue::Number(l * r),
        Operator::Divide => {
            if r == 0.0 {
                return Err(QueryError::DivisionByZero);
            }
            DataValue::Number(l / r)
        }
        Operator::Modulo => {
            if r == 0.0 {
                return Err(QueryError::DivisionByZero);
            }
            DataValue::Number(l % r)
        }
        Operator::LessThan => DataValue::Boolean(l < r),
        Operator::GreaterThan => DataValue::Boolean(l > r),
        Operator::LessEquals => DataValue::Boolean(l <= r),
        Operator::GreaterEquals => DataValue::Boolean(l >= r),
        Operator::Equals => DataValue::Boolean(l == r),
        Operator::NotEquals => DataValue::Boolean(l != r),
    };
    Ok(value)
}

/// Equality used by `=` and `<>`: values of different non-null types can't
/// be compared
pub fn values_equal_strict(left: &DataValue, right: &DataValue) -> QueryResult<bool> {
    match (left, right) {
        (DataValue::Null, DataValue::Null) => Ok(true),
        (DataValue::Null, _) | (_, DataValue::Null) => Ok(false),
        (DataValue::Number(a), DataValue::Number(b)) => Ok(a == b),
        (DataValue::Text(a), DataValue::Text(b)) => Ok(a == b),
        (DataValue::Boolean(a), DataValue::Boolean(b)) => Ok(a == b),
        _ => Err(QueryError::TypeMismatch(format!(
            "can't compare {} with {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Membership equality used by `in`: mismatched types are simply unequal
pub fn values_equal(left: &DataValue, right: &DataValue) -> bool {
    values_equal_strict(left, right).unwrap_or(false)
}

/// Order two values of the same type. Nulls have no order.
pub fn compare_values(left: &DataValue, right: &DataValue) -> QueryResult<Option<Ordering>> {
    match (left, right) {
        (DataValue::Null, _) | (_, DataValue::Null) => Ok(None),
        (DataValue::Number(a), DataValue::Number(b)) => Ok(a.partial_cmp(b)),
        (DataValue::Text(a), DataValue::Text(b)) => Ok(Some(a.cmp(b))),
        _ => Err(QueryError::TypeMismatch(format!(
            "can't order {} against {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// `value between low and high`, both bounds inclusive
pub fn evaluate_between(value: &DataValue, low: &DataValue, high: &DataValue) -> QueryResult<DataValue> {
    let above = compare_values(value, low)?;
    let below = compare_values(value, high)?;

    match (above, below) {
        (Some(above), Some(below)) => Ok(DataValue::Boolean(above != Ordering::Less && below != Ordering::Greater)),
        _ => Ok(DataValue::Null),
    }
}

/// Truth value of a boolean operand; null is unknown
pub fn truth_value(value: &DataValue) -> QueryResult<Option<bool>> {
    match value {
        DataValue::Boolean(b) => Ok(Some(*b)),
        DataValue::Null => Ok(None),
        other => Err(QueryError::TypeMismatch(format!(
            "expected a boolean condition, got {} {}",
            other.type_name(),
            other
        ))),
    }
}

/// Truth value of a condition. Null counts as false.
pub fn is_truthy(value: &DataValue) -> QueryResult<bool> {
    Ok(truth_value(value)?.unwrap_or(false))
}

/// The result of `and`/`or` when the left operand alone decides it
pub fn short_circuit(op: LogicalOperator, left: Option<bool>) -> Option<bool> {
    match (op, left) {
        (LogicalOperator::And, Some(false)) => Some(false),
        (LogicalOperator::Or, Some(true)) => Some(true),
        _ => None,
    }
}

/// Three-valued `and`/`or`: an unknown operand makes the result unknown
/// unless the other operand decides it
pub fn evaluate_logical(op: LogicalOperator, left: Option<bool>, right: Option<bool>) -> DataValue {
    let result = match op {
        LogicalOperator::And => match (left, right) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        LogicalOperator::Or => match (left, right) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
    };
    result.map_or(DataValue::Null, DataValue::Boolean)
}

pub fn evaluate_not(value: &DataValue) -> QueryResult<DataValue> {
    match value {
        DataValue::Boolean(b) => Ok(DataValue::Boolean(!b)),
        DataValue::Null => Ok(DataValue::Null),
        other => Err(QueryError::TypeMismatch(format!("'not' expects a boolean, got {}", other.type_name()))),
    }
}

pub fn evaluate_negate(value: &DataValue) -> QueryResult<DataValue> {
    match value {
        DataValue::Number(n) => Ok(DataValue::Number(-n)),
        DataValue::Null => Ok(DataValue::Null),
        other => Err(QueryError::TypeMismatch(format!("'-' expects a number, got {}", other.type_name()))),
    }
}

/// `value like pattern`: `%` matches any run of characters, `_` exactly one
pub fn evaluate_like(value: &DataValue, pattern: &DataValue, case_insensitive: bool) -> QueryResult<DataValue> {
    match (value, pattern) {
        (DataValue::Null, _) | (_, DataValue::Null) => Ok(DataValue::Null),
        (DataValue::Text(value), DataValue::Text(pattern)) => {
            if case_insensitive {
                Ok(DataValue::Boolean(like_matches(&value.to_lowercase(), &pattern.to_lowercase())))
            } else {
                Ok(DataValue::Boolean(like_matches(value, pattern)))
            }
        }
        _ => Err(QueryError::TypeMismatch(format!(
            "'like' expects text operands, got {} and {}",
            value.type_name(),
            pattern.type_name()
        ))),
    }
}

/// Wildcard match with backtracking over the last `%`
pub fn like_matches(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut v, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        if p < pattern.len() && (pattern[p] == '_' || (pattern[p] != '%' && pattern[p] == value[v])) {
            v += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, v));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            v = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}
