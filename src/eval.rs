// ABOUTME: The CPS evaluator core: each evaluation step consumes and produces chain nodes

use crate::builtins::{self, BuiltinId};
use crate::cont::{Args, Continuation, Step};
use crate::env::Environment;
use crate::error::{EvalError, ARITY_ONE};
use crate::value::Value;
use std::collections::VecDeque;

/// What one step invocation hands back to the trampoline: the next node to
/// pump, `None` to end the chain, or a failure to route to the error handler.
pub type StepOutcome = Result<Option<Continuation>, EvalError>;

/// Invoke the step of the current continuation
pub fn dispatch(step: Step, cur: &Continuation) -> StepOutcome {
    match step {
        Step::Eval => eval(cur),
        Step::EvalBinding => eval_binding(cur),
        Step::EvalCall => eval_function_call(cur),
        Step::EvalArgs => eval_function_args(cur),
        Step::EvalLambda => eval_lambda(cur),
        Step::Builtin(id) => builtins::step(id, cur),
        Step::Fail => fail(cur),
    }
}

/// Evaluate `ast` in `env`. Atoms other than symbols produce themselves;
/// symbols resolve through a binding step; a pair first evaluates its
/// function slot, then hands the result to the call step.
fn eval(cur: &Continuation) -> StepOutcome {
    let (ast, env) = {
        let node = cur.borrow();
        (
            node.args.ast.clone().unwrap_or(Value::Nil),
            node.args.env.clone().expect("eval step requires env"),
        )
    };

    match ast {
        Value::Sym(name) => {
            let binding = cur.create_after(
                Step::EvalBinding,
                Args {
                    name: Some(name),
                    env: Some(env),
                    ..Args::default()
                },
            );
            Ok(Some(binding))
        }
        Value::Pair(ref cell) => {
            let (fn_slot, fn_args) = {
                let c = cell.borrow();
                (c.first.clone(), c.rest.clone())
            };
            // The call step receives the evaluated function slot in its ast
            let call = cur.create_after(
                Step::EvalCall,
                Args {
                    arg_ast: Some(fn_args),
                    env: Some(env.clone()),
                    ..Args::default()
                },
            );
            Ok(Some(cur.copy_with(Some(call), Args::ast_env(fn_slot, env))))
        }
        other => Ok(cur.next_with(Args::deliver(other))),
    }
}

/// Resolve a symbol by walking the environment chain. Built-in names not
/// shadowed by a binding evaluate to themselves; the call step dispatches
/// them against the built-in table.
fn eval_binding(cur: &Continuation) -> StepOutcome {
    let (name, env) = {
        let node = cur.borrow();
        (
            node.args.name.clone().expect("binding step requires name"),
            node.args.env.clone().expect("binding step requires env"),
        )
    };

    if let Some(value) = env.get(&name) {
        Ok(cur.next_with(Args::deliver(value)))
    } else if builtins::lookup(&name).is_some() {
        Ok(cur.next_with(Args::deliver(Value::Sym(name))))
    } else {
        Err(EvalError::Unresolved(name))
    }
}

/// Discriminate on the already evaluated function slot: built-in names go to
/// their builtin step, lambdas to the lambda step, and a captured
/// continuation reinstates its saved chain with the evaluated first argument.
fn eval_function_call(cur: &Continuation) -> StepOutcome {
    let (fn_value, arg_ast, env) = {
        let node = cur.borrow();
        (
            node.args.ast.clone().unwrap_or(Value::Nil),
            node.args.arg_ast.clone().unwrap_or(Value::Nil),
            node.args.env.clone().expect("call step requires env"),
        )
    };

    match fn_value {
        Value::Sym(name) => match builtins::lookup(&name) {
            Some(id) => Ok(Some(cur.create_after(
                Step::Builtin(id),
                Args {
                    arg_ast: Some(arg_ast),
                    env: Some(env),
                    ..Args::default()
                },
            ))),
            None => Err(EvalError::UnknownBuiltin(name)),
        },
        Value::Cont(captured) => {
            // Jump: evaluate the argument expression, deliver it into the
            // captured node, and resume the saved chain from there.
            let arg_expr = arg_ast.first().unwrap_or(Value::Nil);
            Ok(Some(
                captured.create_before(Step::Eval, Args::ast_env(arg_expr, env)),
            ))
        }
        lambda @ Value::Lambda(_) => Ok(Some(cur.create_after(
            Step::EvalLambda,
            Args {
                lambda: Some(lambda),
                arg_ast: Some(arg_ast),
                env: Some(env),
                ..Args::default()
            },
        ))),
        other => Err(EvalError::type_error(
            "call",
            "lambda, continuation, or built-in name",
            &other,
        )),
    }
}

/// Evaluate a queue of expressions left to right, accumulating the results.
/// Re-entered once per produced value; when the queue drains, the accumulated
/// values are delivered to the successor's `evaled` slot.
fn eval_function_args(cur: &Continuation) -> StepOutcome {
    let delivered = cur.borrow_mut().args.ast.take();
    if let Some(value) = delivered {
        cur.borrow_mut()
            .args
            .evaled
            .get_or_insert_with(Vec::new)
            .push(value);
        return Ok(Some(cur.clone()));
    }

    let head = {
        let mut node = cur.borrow_mut();
        node.args.unevaled.as_mut().and_then(|queue| queue.pop_front())
    };
    match head {
        Some(expr) => {
            let env = {
                let node = cur.borrow();
                node.args.env.clone().expect("args step requires env")
            };
            Ok(Some(cur.create_before(Step::Eval, Args::ast_env(expr, env))))
        }
        None => {
            let evaled = cur.borrow_mut().args.evaled.take().unwrap_or_default();
            Ok(cur.next_with(Args {
                evaled: Some(evaled),
                ..Args::default()
            }))
        }
    }
}

/// Apply a lambda. First entry checks arity and requests argument
/// evaluation; the re-entry binds parameters in a child of the captured
/// environment and evaluates the body there.
fn eval_lambda(cur: &Continuation) -> StepOutcome {
    let (lambda_value, arg_ast, env) = {
        let node = cur.borrow();
        (
            node.args.lambda.clone().expect("lambda step requires lambda"),
            node.args.arg_ast.clone().unwrap_or(Value::Nil),
            node.args.env.clone().expect("lambda step requires env"),
        )
    };
    let Value::Lambda(ref lambda) = lambda_value else {
        return Err(EvalError::type_error("call", "lambda", &lambda_value));
    };

    let evaled = cur.borrow_mut().args.evaled.take();
    match evaled {
        None => {
            let unevaled: VecDeque<Value> = arg_ast.list_to_vec().into();
            if unevaled.len() != lambda.params.len() {
                return Err(EvalError::arity_error(
                    "lambda",
                    lambda.params.len().to_string(),
                    unevaled.len(),
                ));
            }
            Ok(Some(cur.create_before(
                Step::EvalArgs,
                Args {
                    unevaled: Some(unevaled),
                    env: Some(env),
                    ..Args::default()
                },
            )))
        }
        Some(values) => {
            if values.len() != lambda.params.len() {
                return Err(EvalError::arity_error(
                    "lambda",
                    lambda.params.len().to_string(),
                    values.len(),
                ));
            }
            let child = Environment::with_parent(lambda.env.clone());
            for (param, value) in lambda.params.iter().zip(values) {
                child.define(param.clone(), value);
            }
            Ok(Some(cur.create_after(
                Step::Eval,
                Args::ast_env(lambda.body.clone(), child),
            )))
        }
    }
}

/// `callcc`: evaluate the single lambda argument, snapshot the successor of
/// this step, and apply the lambda to the snapshot. Invoking the snapshot
/// later resumes the saved chain with the supplied value. Only the chain is
/// captured; scanner state and environment mutations are not restored.
pub(crate) fn callcc(cur: &Continuation) -> StepOutcome {
    let evaled = cur.borrow_mut().args.evaled.take();
    match evaled {
        None => {
            let (arg_ast, env) = {
                let node = cur.borrow();
                (
                    node.args.arg_ast.clone().unwrap_or(Value::Nil),
                    node.args.env.clone(),
                )
            };
            let exprs: VecDeque<Value> = arg_ast.list_to_vec().into();
            if exprs.len() != 1 {
                return Err(EvalError::arity_error(
                    BuiltinId::Callcc.name(),
                    ARITY_ONE,
                    exprs.len(),
                ));
            }
            Ok(Some(cur.create_before(
                Step::EvalArgs,
                Args {
                    unevaled: Some(exprs),
                    env,
                    ..Args::default()
                },
            )))
        }
        Some(mut values) => {
            let func = values.pop().unwrap_or(Value::Nil);
            if !matches!(func, Value::Lambda(_)) {
                return Err(EvalError::type_error(BuiltinId::Callcc.name(), "lambda", &func));
            }
            let successor = cur.next().expect("callcc requires a successor");
            let snapshot = successor.dup();
            let env = {
                let node = cur.borrow();
                node.args.env.clone()
            };
            Ok(Some(cur.create_after(
                Step::EvalLambda,
                Args {
                    lambda: Some(func),
                    evaled: Some(vec![Value::Cont(snapshot)]),
                    env,
                    ..Args::default()
                },
            )))
        }
    }
}

/// The driver-installed error handler: move the routed failure into the
/// heap's diagnostic slot and discard the rest of the chain.
fn fail(cur: &Continuation) -> StepOutcome {
    let heap = cur.heap();
    let form = cur.borrow_mut().args.ast.take();
    let error = {
        let mut h = heap.borrow_mut();
        h.pending.take()
    }
    .unwrap_or_else(|| {
        let message = cur
            .borrow_mut()
            .args
            .message
            .take()
            .unwrap_or_else(|| "unknown error".to_string());
        EvalError::User(message)
    });
    heap.borrow_mut().diagnostic = Some(crate::cont::Diagnostic { error, form });
    Ok(None)
}
