//! Arithmetic operations: plus, minus
//!
//! Value-level folds over at least one evaluated argument. Both operands of
//! each fold step must be value-bearing atoms of the same kind: two ints
//! add or subtract, two strings concatenate under `plus`. The intermediate
//! result becomes the left operand of the next step.

use super::{deliver, stage_all, take_evaled};
use crate::cont::Continuation;
use crate::error::{EvalError, ARITY_AT_LEAST_ONE};
use crate::eval::StepOutcome;
use crate::value::Value;

pub fn plus(cur: &Continuation) -> StepOutcome {
    fold(cur, "plus", true)
}

/// A single operand is not negated; the fold simply has nothing to subtract
pub fn minus(cur: &Continuation) -> StepOutcome {
    fold(cur, "minus", false)
}

fn fold(cur: &Continuation, function: &'static str, is_plus: bool) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    if values.is_empty() {
        return Err(EvalError::arity_error(function, ARITY_AT_LEAST_ONE, 0));
    }

    let mut acc = values[0].clone();
    for operand in &values[1..] {
        acc = apply(function, is_plus, acc, operand)?;
    }
    deliver(cur, acc)
}

fn apply(function: &'static str, is_plus: bool, left: Value, right: &Value) -> Result<Value, EvalError> {
    match (&left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(if is_plus {
            a.wrapping_add(*b)
        } else {
            a.wrapping_sub(*b)
        })),
        (Value::Str(a), Value::Str(b)) if is_plus => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::Int(_), other) | (Value::Str(_), other) => Err(EvalError::type_error(
            function,
            "an operand of the same kind",
            other,
        )),
        (other, _) => Err(EvalError::type_error(function, "int or string", other)),
    }
}
