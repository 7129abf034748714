//! File I/O operations: load, file_open, file_close, file_write, file_read
//!
//! - `load`: read a source file one form at a time, evaluating each before
//!   the next is read, producing the last result; an optional `log` flag
//!   logs every form as it is evaluated
//! - `file_open`: open a path with a POSIX fopen mode string, producing an
//!   opaque resource
//! - `file_close`: release the wrapped handle
//! - `file_write`: write a string, producing the byte count
//! - `file_read`: read all remaining bytes as a string
//!
//! Resources are owned by the Lisp program and released explicitly.

use super::{deliver, expect_arity, stage_all, take_evaled};
use crate::cont::{Args, Continuation, Step};
use crate::error::{EvalError, ARITY_AT_LEAST_ONE, ARITY_ONE, ARITY_TWO};
use crate::eval::StepOutcome;
use crate::printer;
use crate::reader;
use crate::scanner::Scanner;
use crate::value::{ResourceData, Value};
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::rc::Rc;

/// Map a POSIX fopen mode string onto open options. A `b` suffix is
/// accepted and ignored; bytes are bytes.
fn open_options(mode: &str) -> Option<OpenOptions> {
    let mut opts = OpenOptions::new();
    let normalized: String = mode.chars().filter(|c| *c != 'b').collect();
    match normalized.as_str() {
        "r" => opts.read(true),
        "r+" => opts.read(true).write(true),
        "w" => opts.write(true).create(true).truncate(true),
        "w+" => opts.read(true).write(true).create(true).truncate(true),
        "a" => opts.append(true).create(true),
        "a+" => opts.read(true).append(true).create(true),
        _ => return None,
    };
    Some(opts)
}

fn require_str(function: &'static str, value: &Value) -> Result<String, EvalError> {
    match value {
        Value::Str(text) => Ok(text.clone()),
        other => Err(EvalError::type_error(function, "string", other)),
    }
}

fn require_resource(
    function: &'static str,
    value: &Value,
) -> Result<Rc<RefCell<ResourceData>>, EvalError> {
    match value {
        Value::Resource(res) => Ok(res.clone()),
        other => Err(EvalError::type_error(function, "resource", other)),
    }
}

pub fn file_open(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("file_open", ARITY_TWO, &values, 2)?;
    let path = require_str("file_open", &values[0])?;
    let mode = require_str("file_open", &values[1])?;

    let opts = open_options(&mode)
        .ok_or_else(|| EvalError::io_error("file_open", format!("unsupported mode {:?}", mode)))?;
    let file = opts
        .open(&path)
        .map_err(|e| EvalError::io_error("file_open", e))?;
    deliver(
        cur,
        Value::Resource(Rc::new(RefCell::new(ResourceData {
            path,
            file: Some(file),
        }))),
    )
}

pub fn file_close(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("file_close", ARITY_ONE, &values, 1)?;
    let res = require_resource("file_close", &values[0])?;
    res.borrow_mut().file = None;
    deliver(cur, Value::Nil)
}

pub fn file_write(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("file_write", ARITY_TWO, &values, 2)?;
    let res = require_resource("file_write", &values[0])?;
    let text = require_str("file_write", &values[1])?;

    let mut guard = res.borrow_mut();
    let file = guard
        .file
        .as_mut()
        .ok_or_else(|| EvalError::io_error("file_write", "file is closed"))?;
    file.write_all(text.as_bytes())
        .map_err(|e| EvalError::io_error("file_write", e))?;
    drop(guard);
    deliver(cur, Value::Int(text.len() as i64))
}

pub fn file_read(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("file_read", ARITY_ONE, &values, 1)?;
    let res = require_resource("file_read", &values[0])?;

    let mut guard = res.borrow_mut();
    let file = guard
        .file
        .as_mut()
        .ok_or_else(|| EvalError::io_error("file_read", "file is closed"))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| EvalError::io_error("file_read", e))?;
    drop(guard);
    deliver(cur, Value::Str(contents))
}

/// Three phases, re-entering between each: evaluate the arguments; open the
/// file and park a scanner in the step's state; then read one form per
/// entry, evaluating it before the next read, threading the last produced
/// value through the step's `ast` slot.
pub fn load(cur: &Continuation) -> StepOutcome {
    let reading = cur.borrow().args.scan.is_some();
    if reading {
        let next_form = {
            let mut node = cur.borrow_mut();
            let scan = node.args.scan.as_mut().expect("load step scanner state");
            reader::read_progressing(scan)
        }?;
        return match next_form {
            Some(form) => {
                let (env, log_forms) = {
                    let node = cur.borrow();
                    (
                        node.args.env.clone().expect("builtin step requires env"),
                        node.args.log.unwrap_or(false),
                    )
                };
                if log_forms {
                    log::debug!(target: "load", "{}", printer::print(&form));
                }
                Ok(Some(cur.create_before(Step::Eval, Args::ast_env(form, env))))
            }
            None => {
                let last = cur.borrow_mut().args.ast.take().unwrap_or(Value::Nil);
                deliver(cur, last)
            }
        };
    }

    match take_evaled(cur) {
        None => stage_all(cur),
        Some(values) => {
            if values.is_empty() {
                return Err(EvalError::arity_error("load", ARITY_AT_LEAST_ONE, 0));
            }
            let path = require_str("load", &values[0])?;
            let log_forms = values[1..]
                .iter()
                .any(|flag| flag.value_text().as_deref() == Some("log"));
            let source = std::fs::read_to_string(&path)
                .map_err(|e| EvalError::io_error("load", e))?;
            cur.with(Args {
                scan: Some(Scanner::new(&source)),
                log: Some(log_forms),
                ..Args::default()
            });
            Ok(Some(cur.clone()))
        }
    }
}
