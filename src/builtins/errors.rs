//! User-raised failures: error
//!
//! `(error msg)` evaluates its argument and routes its textual value to the
//! chain's error handler, abandoning the rest of the computation.

use super::{expect_arity, stage_all, take_evaled};
use crate::cont::Continuation;
use crate::error::{EvalError, ARITY_ONE};
use crate::eval::StepOutcome;
use crate::printer;

pub fn error(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("error", ARITY_ONE, &values, 1)?;
    let message = values[0]
        .value_text()
        .unwrap_or_else(|| printer::print(&values[0]));
    Err(EvalError::User(message))
}

#[cfg(test)]
mod tests {
    use crate::error::EvalError;
    use crate::trampoline::Interpreter;
    use crate::value::Value;

    #[test]
    fn test_error_raises_its_message() {
        let interp = Interpreter::new();
        let err = interp.eval_source("(error \"boom\")").unwrap_err();
        assert!(matches!(err, EvalError::User(msg) if msg == "boom"));
    }

    #[test]
    fn test_error_message_may_be_any_value() {
        let interp = Interpreter::new();
        let err = interp.eval_source("(error 42)").unwrap_err();
        assert!(matches!(err, EvalError::User(msg) if msg == "42"));

        let err = interp.eval_source("(error '(a b))").unwrap_err();
        assert!(matches!(err, EvalError::User(msg) if msg == "(a b)"));
    }

    #[test]
    fn test_error_argument_is_evaluated() {
        let interp = Interpreter::new();
        interp.eval_source("(define reason \"bad input\")").unwrap();
        let err = interp.eval_source("(error reason)").unwrap_err();
        assert!(matches!(err, EvalError::User(msg) if msg == "bad input"));
    }

    #[test]
    fn test_errors_abandon_the_rest_of_the_form() {
        let interp = Interpreter::new();
        interp.eval_source("(define touched false)").unwrap();
        assert!(interp
            .eval_source("(begin (error \"stop\") (set touched true))")
            .is_err());
        assert_eq!(interp.eval_source("touched").unwrap(), Value::False);
    }
}
