//! Special forms: quote, define, set, lambda, begin, if
//!
//! These operations control what gets evaluated rather than computing over
//! already evaluated values.
//!
//! - `quote`: return the argument unevaluated
//! - `define`: bind a name in the current scope, with function-definition sugar
//! - `set`: mutate the nearest existing binding up the parent chain
//! - `lambda`: build a closure capturing the current environment
//! - `begin`: evaluate left to right, produce the last result
//! - `if`: evaluate the condition, then exactly one branch

use super::{deliver, form_args, stage, stage_all, take_evaled};
use crate::cont::{Args, Continuation, Step};
use crate::error::{EvalError, ARITY_AT_LEAST_ONE, ARITY_AT_LEAST_TWO, ARITY_TWO, ARITY_TWO_OR_THREE};
use crate::eval::StepOutcome;
use crate::value::{LambdaData, Value};
use std::rc::Rc;

/// Returns the first argument unevaluated
pub fn quote(cur: &Continuation) -> StepOutcome {
    let (arg_ast, _env) = form_args(cur);
    match arg_ast.first() {
        Some(form) => deliver(cur, form),
        None => Err(EvalError::arity_error("quote", ARITY_AT_LEAST_ONE, 0)),
    }
}

/// Two shapes: `(define name value)` evaluates the value and binds it;
/// `(define (name p1 ...) body...)` is sugar for binding a lambda, with a
/// multi-form body wrapped in `begin`. Produces the bound value.
pub fn define(cur: &Continuation) -> StepOutcome {
    let (arg_ast, env) = form_args(cur);
    let target = arg_ast
        .first()
        .ok_or_else(|| EvalError::arity_error("define", ARITY_AT_LEAST_TWO, 0))?;

    match target {
        Value::Sym(name) => match take_evaled(cur) {
            None => {
                let value_expr = arg_ast
                    .rest()
                    .and_then(|rest| rest.first())
                    .ok_or_else(|| EvalError::arity_error("define", ARITY_AT_LEAST_TWO, 1))?;
                stage(cur, vec![value_expr], env)
            }
            Some(mut values) => {
                let value = values.pop().unwrap_or(Value::Nil);
                env.define(name, value.clone());
                deliver(cur, value)
            }
        },
        Value::Pair(_) => {
            let mut signature = target.list_to_vec();
            if signature.is_empty() {
                return Err(EvalError::type_error("define", "signature list", &target));
            }
            let name = match signature.remove(0) {
                Value::Sym(name) => name,
                other => return Err(EvalError::type_error("define", "symbol", &other)),
            };
            let params = param_names("define", signature)?;
            let body = wrap_body(arg_ast.rest().unwrap_or(Value::Nil).list_to_vec());
            let lambda = Value::Lambda(Rc::new(LambdaData {
                params,
                body,
                env: env.clone(),
            }));
            env.define(name, lambda.clone());
            deliver(cur, lambda)
        }
        other => Err(EvalError::type_error(
            "define",
            "symbol or signature list",
            &other,
        )),
    }
}

/// Evaluates the value first, then mutates the nearest binding walking the
/// parent chain; a missing binding fails only after the value's effects ran.
pub fn set(cur: &Continuation) -> StepOutcome {
    let (arg_ast, env) = form_args(cur);
    match take_evaled(cur) {
        None => {
            let value_expr = arg_ast
                .rest()
                .and_then(|rest| rest.first())
                .ok_or_else(|| {
                    EvalError::arity_error("set", ARITY_TWO, arg_ast.list_to_vec().len())
                })?;
            stage(cur, vec![value_expr], env)
        }
        Some(mut values) => {
            let value = values.pop().unwrap_or(Value::Nil);
            let name = match arg_ast.first() {
                Some(Value::Sym(name)) => name,
                Some(other) => return Err(EvalError::type_error("set", "symbol", &other)),
                None => return Err(EvalError::arity_error("set", ARITY_TWO, 0)),
            };
            env.set(&name, value.clone())?;
            deliver(cur, value)
        }
    }
}

/// Builds a closure over the current environment without evaluating anything
pub fn lambda(cur: &Continuation) -> StepOutcome {
    let (arg_ast, env) = form_args(cur);
    let exprs = arg_ast.list_to_vec();
    if exprs.len() < 2 {
        return Err(EvalError::arity_error(
            "lambda",
            ARITY_AT_LEAST_TWO,
            exprs.len(),
        ));
    }
    let params = match &exprs[0] {
        Value::Nil | Value::Pair(_) => param_names("lambda", exprs[0].list_to_vec())?,
        other => return Err(EvalError::type_error("lambda", "parameter list", other)),
    };
    let body = wrap_body(exprs[1..].to_vec());
    deliver(
        cur,
        Value::Lambda(Rc::new(LambdaData { params, body, env })),
    )
}

/// Evaluates the arguments left to right and produces the last result
pub fn begin(cur: &Continuation) -> StepOutcome {
    match take_evaled(cur) {
        None => stage_all(cur),
        Some(values) => deliver(cur, values.last().cloned().unwrap_or(Value::Nil)),
    }
}

/// Evaluates the condition; anything but `false` and `nil` selects the then
/// branch. The chosen branch is evaluated; a missing else produces nil.
pub fn if_form(cur: &Continuation) -> StepOutcome {
    let (arg_ast, env) = form_args(cur);
    let exprs = arg_ast.list_to_vec();
    if exprs.len() < 2 || exprs.len() > 3 {
        return Err(EvalError::arity_error("if", ARITY_TWO_OR_THREE, exprs.len()));
    }

    let condition = cur.borrow_mut().args.ast.take();
    match condition {
        None => Ok(Some(
            cur.create_before(Step::Eval, Args::ast_env(exprs[0].clone(), env)),
        )),
        Some(value) => {
            let branch = if value.is_falsy() {
                exprs.get(2).cloned()
            } else {
                Some(exprs[1].clone())
            };
            match branch {
                Some(form) => Ok(Some(
                    cur.create_after(Step::Eval, Args::ast_env(form, env)),
                )),
                None => deliver(cur, Value::Nil),
            }
        }
    }
}

fn param_names(function: &str, params: Vec<Value>) -> Result<Vec<String>, EvalError> {
    params
        .into_iter()
        .map(|param| match param {
            Value::Sym(name) => Ok(name),
            other => Err(EvalError::type_error(function, "parameter symbol", &other)),
        })
        .collect()
}

/// A single body form stands alone; several are sequenced with `begin`
fn wrap_body(mut forms: Vec<Value>) -> Value {
    match forms.len() {
        0 => Value::Nil,
        1 => forms.remove(0),
        _ => {
            let mut items = vec![Value::sym("begin")];
            items.append(&mut forms);
            Value::list(items)
        }
    }
}
