// ABOUTME: The outer trampoline pumping continuation chains, and the driver API

use crate::cont::{new_heap, Args, Continuation, Step};
use crate::env::Environment;
use crate::error::EvalError;
use crate::eval;
use crate::printer;
use crate::reader;
use crate::scanner::Scanner;
use crate::value::Value;
use std::rc::Rc;

/// Owns a global environment and drives one chain per top-level form.
pub struct Interpreter {
    env: Rc<Environment>,
    trace_depth: Option<usize>,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            env: Environment::new(),
            trace_depth: None,
        }
    }

    /// Log every pumped continuation at debug level, rendering step ASTs at
    /// most `depth` pairs deep
    pub fn with_trace(depth: usize) -> Self {
        Interpreter {
            env: Environment::new(),
            trace_depth: Some(depth),
        }
    }

    pub fn global_env(&self) -> Rc<Environment> {
        self.env.clone()
    }

    /// Evaluate one top-level form: seed a chain ending in the terminal
    /// sentinel, install the error handler in the heap, pump to completion,
    /// and read the result out of the final node's `ast` slot.
    pub fn eval_form(&self, form: Value) -> Result<Value, EvalError> {
        let heap = new_heap();
        heap.borrow_mut().statement_ast = Some(form.clone());

        let terminal = Continuation::terminal(heap.clone());
        // The handler carries its own heap so the chain heap does not hold a
        // reference cycle through it; the diagnostic lands in the handler's
        // heap, which is where the pump ends on failure.
        let handler = Continuation::new(Step::Fail, Args::default(), None, new_heap());
        heap.borrow_mut().error_handler = Some(handler);

        let seed = terminal.create_before(Step::Eval, Args::ast_env(form, self.env.clone()));
        let end = self.pump(seed)?;

        let diagnostic = end.heap().borrow_mut().diagnostic.take();
        if let Some(diagnostic) = diagnostic {
            return Err(diagnostic.error);
        }
        let result = end.borrow().args.ast.clone().unwrap_or(Value::Nil);
        Ok(result)
    }

    /// Read and evaluate every form of `src`, returning the last result
    pub fn eval_source(&self, src: &str) -> Result<Value, EvalError> {
        let mut scan = Scanner::new(src);
        let mut last = Value::Nil;
        while let Some(form) = reader::read_progressing(&mut scan)? {
            last = self.eval_form(form)?;
        }
        Ok(last)
    }

    /// The trampoline proper: repeatedly invoke the current node's step until
    /// a step returns no successor or the terminal sentinel is reached.
    /// In-chain failures jump to the heap's error handler.
    fn pump(&self, seed: Continuation) -> Result<Continuation, EvalError> {
        let mut cur = seed;
        loop {
            let Some(step) = cur.func() else {
                return Ok(cur);
            };

            if let Some(depth) = self.trace_depth {
                let node = cur.borrow();
                let ast = node
                    .args
                    .ast
                    .as_ref()
                    .map(|v| printer::print_depth(v, depth))
                    .unwrap_or_else(|| "-".to_string());
                log::debug!(target: "cont", "{} ast={}", step.name(), ast);
            }

            match eval::dispatch(step, &cur) {
                Ok(Some(next)) => cur = next,
                Ok(None) => return Ok(cur),
                Err(error) => {
                    let heap = cur.heap();
                    let handler = heap.borrow().error_handler.clone();
                    match handler {
                        Some(handler) => {
                            let form = heap.borrow().statement_ast.clone();
                            handler.heap().borrow_mut().pending = Some(error.clone());
                            handler.with(Args {
                                ast: form,
                                message: Some(error.to_string()),
                                ..Args::default()
                            });
                            cur = handler;
                        }
                        None => return Err(error),
                    }
                }
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_one(interp: &Interpreter, src: &str) -> Result<Value, EvalError> {
        interp.eval_source(src)
    }

    #[test]
    fn test_self_evaluating_atoms() {
        let interp = Interpreter::new();
        assert_eq!(eval_one(&interp, "42").unwrap(), Value::Int(42));
        assert_eq!(eval_one(&interp, "\"hi\"").unwrap(), Value::Str("hi".to_string()));
        assert_eq!(eval_one(&interp, "nil").unwrap(), Value::Nil);
        assert_eq!(eval_one(&interp, "true").unwrap(), Value::True);
        assert_eq!(eval_one(&interp, "false").unwrap(), Value::False);
    }

    #[test]
    fn test_unresolved_symbol_errors() {
        let interp = Interpreter::new();
        let err = eval_one(&interp, "ghost").unwrap_err();
        assert!(matches!(err, EvalError::Unresolved(name) if name == "ghost"));
    }

    #[test]
    fn test_builtin_names_evaluate_to_themselves() {
        let interp = Interpreter::new();
        assert_eq!(eval_one(&interp, "plus").unwrap(), Value::sym("plus"));
    }

    #[test]
    fn test_interpreter_survives_errors() {
        let interp = Interpreter::new();
        assert!(eval_one(&interp, "(first 1)").is_err());
        // The same interpreter keeps working afterwards
        assert_eq!(eval_one(&interp, "(plus 1 2)").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_eval_source_threads_last_result() {
        let interp = Interpreter::new();
        assert_eq!(
            eval_one(&interp, "(define a 1) (define b 2) (plus a b)").unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn test_empty_source_is_nil() {
        let interp = Interpreter::new();
        assert_eq!(eval_one(&interp, " ; nothing\n").unwrap(), Value::Nil);
    }

    #[test]
    fn test_calling_a_non_function_errors() {
        let interp = Interpreter::new();
        let err = eval_one(&interp, "(1 2 3)").unwrap_err();
        assert!(matches!(err, EvalError::Type { .. }));
    }

    #[test]
    fn test_unknown_builtin_via_quoted_symbol() {
        let interp = Interpreter::new();
        let err = eval_one(&interp, "(define f 'frobnicate) (f 1)").unwrap_err();
        assert!(matches!(err, EvalError::UnknownBuiltin(name) if name == "frobnicate"));
    }

    #[test]
    fn test_deep_recursion_does_not_overflow_the_stack() {
        // Chained evaluation is heap-allocated continuations, not host frames
        let interp = Interpreter::new();
        eval_one(
            &interp,
            "(define (count n) (if (eq? n 0) 0 (count (minus n 1))))",
        )
        .unwrap();
        assert_eq!(eval_one(&interp, "(count 20000)").unwrap(), Value::Int(0));
    }
}
