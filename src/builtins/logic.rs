//! Boolean and comparison operations: not, and, or, eq?, gt?
//!
//! The boolean operations count only `true` as true; every other value is
//! false to them. `and` and `or` are NOT short-circuiting: all arguments are
//! evaluated before the result is formed, so side effects and errors in
//! later arguments always happen.

use super::{deliver, expect_arity, stage_all, take_evaled};
use crate::cont::Continuation;
use crate::error::{EvalError, ARITY_ONE, ARITY_TWO};
use crate::eval::StepOutcome;
use crate::value::Value;

fn truth(flag: bool) -> Value {
    if flag {
        Value::True
    } else {
        Value::False
    }
}

/// `true` only for the `true` singleton itself. This is deliberately
/// asymmetric with `if`, where nil is also false.
fn is_true(value: &Value) -> bool {
    matches!(value, Value::True)
}

pub fn not(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("not", ARITY_ONE, &values, 1)?;
    deliver(cur, truth(!is_true(&values[0])))
}

pub fn and(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    deliver(cur, truth(values.iter().all(is_true)))
}

pub fn or(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    deliver(cur, truth(values.iter().any(is_true)))
}

/// Structural equality: recursive over pairs, by value for value-bearing
/// atoms, by tag for singletons
pub fn eq_p(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("eq?", ARITY_TWO, &values, 2)?;
    deliver(cur, truth(values[0] == values[1]))
}

/// Ordering is defined only between two value-bearing atoms of the same kind
pub fn gt_p(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("gt?", ARITY_TWO, &values, 2)?;
    match values[0].partial_gt(&values[1]) {
        Some(flag) => deliver(cur, truth(flag)),
        None => Err(EvalError::type_error(
            "gt?",
            "two value atoms of the same kind",
            &values[1],
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trampoline::Interpreter;

    #[test]
    fn test_eq() {
        let interp = Interpreter::new();
        assert_eq!(interp.eval_source("(eq? 1 1)").unwrap(), Value::True);
        assert_eq!(interp.eval_source("(eq? 1 2)").unwrap(), Value::False);
        assert_eq!(
            interp.eval_source("(eq? '(1 (2)) '(1 (2)))").unwrap(),
            Value::True
        );
        assert_eq!(interp.eval_source("(eq? nil false)").unwrap(), Value::False);
        assert_eq!(
            interp.eval_source("(eq? \"a\" \"a\")").unwrap(),
            Value::True
        );
    }

    #[test]
    fn test_gt() {
        let interp = Interpreter::new();
        assert_eq!(interp.eval_source("(gt? 2 1)").unwrap(), Value::True);
        assert_eq!(interp.eval_source("(gt? 1 2)").unwrap(), Value::False);
        assert_eq!(
            interp.eval_source("(gt? \"b\" \"a\")").unwrap(),
            Value::True
        );
    }

    #[test]
    fn test_gt_rejects_mixed_kinds() {
        let interp = Interpreter::new();
        assert!(matches!(
            interp.eval_source("(gt? 1 \"a\")").unwrap_err(),
            EvalError::Type { .. }
        ));
        assert!(matches!(
            interp.eval_source("(gt? nil nil)").unwrap_err(),
            EvalError::Type { .. }
        ));
    }

    #[test]
    fn test_not_is_strict_about_true() {
        let interp = Interpreter::new();
        assert_eq!(interp.eval_source("(not true)").unwrap(), Value::False);
        assert_eq!(interp.eval_source("(not false)").unwrap(), Value::True);
        // Asymmetric with if: every non-true value negates to true
        assert_eq!(interp.eval_source("(not nil)").unwrap(), Value::True);
        assert_eq!(interp.eval_source("(not 1)").unwrap(), Value::True);
    }

    #[test]
    fn test_and_or_results() {
        let interp = Interpreter::new();
        assert_eq!(interp.eval_source("(and true true)").unwrap(), Value::True);
        assert_eq!(
            interp.eval_source("(and true false)").unwrap(),
            Value::False
        );
        // Only the true singleton counts as true
        assert_eq!(interp.eval_source("(and true 1)").unwrap(), Value::False);
        assert_eq!(interp.eval_source("(or false true)").unwrap(), Value::True);
        assert_eq!(interp.eval_source("(or false nil)").unwrap(), Value::False);
    }

    #[test]
    fn test_or_is_not_short_circuiting() {
        let interp = Interpreter::new();
        let err = interp.eval_source("(or true (error \"x\"))").unwrap_err();
        assert!(matches!(err, EvalError::User(msg) if msg == "x"));
    }

    #[test]
    fn test_and_is_not_short_circuiting() {
        let interp = Interpreter::new();
        let err = interp.eval_source("(and false (error \"y\"))").unwrap_err();
        assert!(matches!(err, EvalError::User(msg) if msg == "y"));
    }
}
