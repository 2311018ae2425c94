use std::cmp::Ordering;

use crate::errors::{JsonPathError, Result};
use crate::eval::ExprValue;

/// Equality between scalar values. Values of different types are never
/// equal; within one type the comparison is exact (IEEE-754 for
/// numbers, codepoint-wise for strings).
pub(crate) fn equals(a: &ExprValue<'_>, b: &ExprValue<'_>) -> bool {
    match (a, b) {
        (ExprValue::Number(x), ExprValue::Number(y)) => x == y,
        (ExprValue::Str(x), ExprValue::Str(y)) => x == y,
        (ExprValue::Bool(x), ExprValue::Bool(y)) => x == y,
        (ExprValue::Null, ExprValue::Null) => true,
        _ => false,
    }
}

/// Three-way ordering for `<` `<=` `>` `>=`. Only numbers order against
/// numbers and strings against strings; anything else is a type error.
pub(crate) fn order(a: &ExprValue<'_>, b: &ExprValue<'_>) -> Result<Ordering> {
    match (a, b) {
        (ExprValue::Number(x), ExprValue::Number(y)) => x.partial_cmp(y).ok_or_else(|| {
            JsonPathError::eval(format!("numbers {x} and {y} are not comparable"))
        }),
        (ExprValue::Str(x), ExprValue::Str(y)) => Ok(x.cmp(y)),
        _ => Err(JsonPathError::eval(format!(
            "cannot order {} against {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}
