//! Pair operations: cons, first, rest, set_first, set_rest, last
//!
//! The pair is the sole compound structure. Cells are mutable and shared:
//! `set_first`/`set_rest` mutate in place, aliasing is observable, and a
//! cell may be made to point back into its own chain.

use super::{deliver, expect_arity, stage_all, take_evaled};
use crate::cont::Continuation;
use crate::error::{EvalError, ARITY_ONE, ARITY_TWO};
use crate::eval::StepOutcome;
use crate::value::{PairRef, Value};

/// Builds a fresh pair from two evaluated arguments
pub fn cons(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("cons", ARITY_TWO, &values, 2)?;
    deliver(cur, Value::pair(values[0].clone(), values[1].clone()))
}

pub fn first(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("first", ARITY_ONE, &values, 1)?;
    let cell = require_pair("first", &values[0])?;
    let value = cell.borrow().first.clone();
    deliver(cur, value)
}

pub fn rest(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("rest", ARITY_ONE, &values, 1)?;
    let cell = require_pair("rest", &values[0])?;
    let value = cell.borrow().rest.clone();
    deliver(cur, value)
}

/// Mutates the first field in place and produces the pair itself
pub fn set_first(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("set_first", ARITY_TWO, &values, 2)?;
    let cell = require_pair("set_first", &values[0])?;
    cell.borrow_mut().first = values[1].clone();
    deliver(cur, values[0].clone())
}

/// Mutates the rest field in place and produces the pair itself
pub fn set_rest(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("set_rest", ARITY_TWO, &values, 2)?;
    let cell = require_pair("set_rest", &values[0])?;
    cell.borrow_mut().rest = values[1].clone();
    deliver(cur, values[0].clone())
}

/// Walks to the end of a pair chain: the final element of a proper list, or
/// the dotted tail of an improper one
pub fn last(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("last", ARITY_ONE, &values, 1)?;

    let mut cursor = values[0].clone();
    loop {
        match cursor {
            Value::Pair(cell) => {
                let (first, rest) = {
                    let c = cell.borrow();
                    (c.first.clone(), c.rest.clone())
                };
                match rest {
                    Value::Pair(_) => cursor = rest,
                    Value::Nil => return deliver(cur, first),
                    tail => return deliver(cur, tail),
                }
            }
            other => return deliver(cur, other),
        }
    }
}

fn require_pair(function: &'static str, value: &Value) -> Result<PairRef, EvalError> {
    match value {
        Value::Pair(cell) => Ok(cell.clone()),
        other => Err(EvalError::type_error(function, "pair", other)),
    }
}
