//! Type predicates: symbol?, pair?, nil?, atom?, lambda?
//!
//! Each evaluates a single argument and produces true or false.

use super::{deliver, expect_arity, stage_all, take_evaled};
use crate::cont::Continuation;
use crate::error::ARITY_ONE;
use crate::eval::StepOutcome;
use crate::value::Value;

fn predicate(
    cur: &Continuation,
    function: &'static str,
    test: fn(&Value) -> bool,
) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity(function, ARITY_ONE, &values, 1)?;
    deliver(
        cur,
        if test(&values[0]) {
            Value::True
        } else {
            Value::False
        },
    )
}

pub fn symbol_p(cur: &Continuation) -> StepOutcome {
    predicate(cur, "symbol?", |v| matches!(v, Value::Sym(_)))
}

pub fn pair_p(cur: &Continuation) -> StepOutcome {
    predicate(cur, "pair?", |v| matches!(v, Value::Pair(_)))
}

pub fn nil_p(cur: &Continuation) -> StepOutcome {
    predicate(cur, "nil?", |v| matches!(v, Value::Nil))
}

pub fn atom_p(cur: &Continuation) -> StepOutcome {
    predicate(cur, "atom?", Value::is_atom)
}

pub fn lambda_p(cur: &Continuation) -> StepOutcome {
    predicate(cur, "lambda?", |v| matches!(v, Value::Lambda(_)))
}

#[cfg(test)]
mod tests {
    use crate::trampoline::Interpreter;
    use crate::value::Value;

    #[test]
    fn test_pair_predicate() {
        let interp = Interpreter::new();
        assert_eq!(
            interp.eval_source("(pair? (cons 1 2))").unwrap(),
            Value::True
        );
        assert_eq!(interp.eval_source("(pair? 1)").unwrap(), Value::False);
        assert_eq!(interp.eval_source("(pair? nil)").unwrap(), Value::False);
    }

    #[test]
    fn test_atom_predicate() {
        let interp = Interpreter::new();
        assert_eq!(interp.eval_source("(atom? \"str\")").unwrap(), Value::True);
        assert_eq!(interp.eval_source("(atom? 5)").unwrap(), Value::True);
        assert_eq!(interp.eval_source("(atom? nil)").unwrap(), Value::True);
        assert_eq!(interp.eval_source("(atom? 'sym)").unwrap(), Value::True);
        assert_eq!(
            interp.eval_source("(atom? (cons 1 2))").unwrap(),
            Value::False
        );
        assert_eq!(
            interp.eval_source("(atom? (lambda (x) x))").unwrap(),
            Value::False
        );
    }

    #[test]
    fn test_symbol_and_nil_predicates() {
        let interp = Interpreter::new();
        assert_eq!(interp.eval_source("(symbol? 'a)").unwrap(), Value::True);
        assert_eq!(interp.eval_source("(symbol? \"a\")").unwrap(), Value::False);
        assert_eq!(interp.eval_source("(nil? nil)").unwrap(), Value::True);
        assert_eq!(interp.eval_source("(nil? false)").unwrap(), Value::False);
        assert_eq!(interp.eval_source("(nil? '())").unwrap(), Value::True);
    }

    #[test]
    fn test_lambda_predicate() {
        let interp = Interpreter::new();
        assert_eq!(
            interp.eval_source("(lambda? (lambda (x) x))").unwrap(),
            Value::True
        );
        interp.eval_source("(define (f) 1)").unwrap();
        assert_eq!(interp.eval_source("(lambda? f)").unwrap(), Value::True);
        assert_eq!(interp.eval_source("(lambda? 'f)").unwrap(), Value::False);
    }
}
