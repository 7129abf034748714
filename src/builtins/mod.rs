//! # Built-in Operations Module
//!
//! The built-in operations of the interpreter, organized into categories with
//! 34 total operations. Each operation is a continuation step: it receives
//! the unevaluated argument list in `arg_ast`, requests evaluated arguments
//! through the argument-evaluation step when its semantics need them, and
//! re-enters with `evaled` filled in.
//!
//! ## Categories
//!
//! - **[forms]** (6): quote, define, set, lambda, begin, if - Special forms
//! - **[lists]** (6): cons, first, rest, set_first, set_rest, last - Pair manipulation
//! - **[arithmetic]** (2): plus, minus - Value-level folds over ints and strings
//! - **[logic]** (5): not, and, or, eq?, gt? - Boolean and comparison operations
//! - **[types]** (5): symbol?, pair?, nil?, atom?, lambda? - Type predicates
//! - **[console]** (3): print, puts, to_s - Output and string conversion
//! - **[errors]** (1): error - User-raised failures
//! - **[filesystem]** (5): load, file_open, file_close, file_write, file_read - File I/O
//! - **callcc** (1): first-class continuation capture (lives with the evaluator core)
//!
//! Dispatch is a static table keyed by symbol name: `lookup` maps a name to a
//! `BuiltinId`, and `step` routes an id to its implementation.

use crate::cont::{Args, Continuation, Step};
use crate::env::Environment;
use crate::error::EvalError;
use crate::eval::{self, StepOutcome};
use crate::value::Value;
use std::collections::VecDeque;
use std::rc::Rc;

pub mod arithmetic;
pub mod console;
pub mod errors;
pub mod filesystem;
pub mod forms;
pub mod lists;
pub mod logic;
pub mod types;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinId {
    Quote,
    Define,
    Set,
    Lambda,
    Begin,
    If,
    Load,
    Cons,
    First,
    Rest,
    SetFirst,
    SetRest,
    Last,
    Plus,
    Minus,
    Not,
    And,
    Or,
    EqP,
    GtP,
    SymbolP,
    PairP,
    NilP,
    AtomP,
    LambdaP,
    Print,
    Puts,
    ToS,
    Error,
    FileOpen,
    FileClose,
    FileWrite,
    FileRead,
    Callcc,
}

/// Static dispatch table keyed by symbol name
pub fn lookup(name: &str) -> Option<BuiltinId> {
    Some(match name {
        "quote" => BuiltinId::Quote,
        "define" => BuiltinId::Define,
        "set" => BuiltinId::Set,
        "lambda" => BuiltinId::Lambda,
        "begin" => BuiltinId::Begin,
        "if" => BuiltinId::If,
        "load" => BuiltinId::Load,
        "cons" => BuiltinId::Cons,
        "first" => BuiltinId::First,
        "rest" => BuiltinId::Rest,
        "set_first" => BuiltinId::SetFirst,
        "set_rest" => BuiltinId::SetRest,
        "last" => BuiltinId::Last,
        "plus" => BuiltinId::Plus,
        "minus" => BuiltinId::Minus,
        "not" => BuiltinId::Not,
        "and" => BuiltinId::And,
        "or" => BuiltinId::Or,
        "eq?" => BuiltinId::EqP,
        "gt?" => BuiltinId::GtP,
        "symbol?" => BuiltinId::SymbolP,
        "pair?" => BuiltinId::PairP,
        "nil?" => BuiltinId::NilP,
        "atom?" => BuiltinId::AtomP,
        "lambda?" => BuiltinId::LambdaP,
        "print" => BuiltinId::Print,
        "puts" => BuiltinId::Puts,
        "to_s" => BuiltinId::ToS,
        "error" => BuiltinId::Error,
        "file_open" => BuiltinId::FileOpen,
        "file_close" => BuiltinId::FileClose,
        "file_write" => BuiltinId::FileWrite,
        "file_read" => BuiltinId::FileRead,
        "callcc" => BuiltinId::Callcc,
        _ => return None,
    })
}

impl BuiltinId {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinId::Quote => "quote",
            BuiltinId::Define => "define",
            BuiltinId::Set => "set",
            BuiltinId::Lambda => "lambda",
            BuiltinId::Begin => "begin",
            BuiltinId::If => "if",
            BuiltinId::Load => "load",
            BuiltinId::Cons => "cons",
            BuiltinId::First => "first",
            BuiltinId::Rest => "rest",
            BuiltinId::SetFirst => "set_first",
            BuiltinId::SetRest => "set_rest",
            BuiltinId::Last => "last",
            BuiltinId::Plus => "plus",
            BuiltinId::Minus => "minus",
            BuiltinId::Not => "not",
            BuiltinId::And => "and",
            BuiltinId::Or => "or",
            BuiltinId::EqP => "eq?",
            BuiltinId::GtP => "gt?",
            BuiltinId::SymbolP => "symbol?",
            BuiltinId::PairP => "pair?",
            BuiltinId::NilP => "nil?",
            BuiltinId::AtomP => "atom?",
            BuiltinId::LambdaP => "lambda?",
            BuiltinId::Print => "print",
            BuiltinId::Puts => "puts",
            BuiltinId::ToS => "to_s",
            BuiltinId::Error => "error",
            BuiltinId::FileOpen => "file_open",
            BuiltinId::FileClose => "file_close",
            BuiltinId::FileWrite => "file_write",
            BuiltinId::FileRead => "file_read",
            BuiltinId::Callcc => "callcc",
        }
    }
}

/// Route a builtin step to its implementation
pub fn step(id: BuiltinId, cur: &Continuation) -> StepOutcome {
    match id {
        BuiltinId::Quote => forms::quote(cur),
        BuiltinId::Define => forms::define(cur),
        BuiltinId::Set => forms::set(cur),
        BuiltinId::Lambda => forms::lambda(cur),
        BuiltinId::Begin => forms::begin(cur),
        BuiltinId::If => forms::if_form(cur),
        BuiltinId::Load => filesystem::load(cur),
        BuiltinId::Cons => lists::cons(cur),
        BuiltinId::First => lists::first(cur),
        BuiltinId::Rest => lists::rest(cur),
        BuiltinId::SetFirst => lists::set_first(cur),
        BuiltinId::SetRest => lists::set_rest(cur),
        BuiltinId::Last => lists::last(cur),
        BuiltinId::Plus => arithmetic::plus(cur),
        BuiltinId::Minus => arithmetic::minus(cur),
        BuiltinId::Not => logic::not(cur),
        BuiltinId::And => logic::and(cur),
        BuiltinId::Or => logic::or(cur),
        BuiltinId::EqP => logic::eq_p(cur),
        BuiltinId::GtP => logic::gt_p(cur),
        BuiltinId::SymbolP => types::symbol_p(cur),
        BuiltinId::PairP => types::pair_p(cur),
        BuiltinId::NilP => types::nil_p(cur),
        BuiltinId::AtomP => types::atom_p(cur),
        BuiltinId::LambdaP => types::lambda_p(cur),
        BuiltinId::Print => console::print(cur),
        BuiltinId::Puts => console::puts(cur),
        BuiltinId::ToS => console::to_s(cur),
        BuiltinId::Error => errors::error(cur),
        BuiltinId::FileOpen => filesystem::file_open(cur),
        BuiltinId::FileClose => filesystem::file_close(cur),
        BuiltinId::FileWrite => filesystem::file_write(cur),
        BuiltinId::FileRead => filesystem::file_read(cur),
        BuiltinId::Callcc => eval::callcc(cur),
    }
}

// ============================================================================
// Shared step plumbing
// ============================================================================

/// The unevaluated argument list and environment handed to every builtin
pub(crate) fn form_args(cur: &Continuation) -> (Value, Rc<Environment>) {
    let node = cur.borrow();
    (
        node.args.arg_ast.clone().unwrap_or(Value::Nil),
        node.args.env.clone().expect("builtin step requires env"),
    )
}

/// Consume the evaluated arguments if the argument step has delivered them
pub(crate) fn take_evaled(cur: &Continuation) -> Option<Vec<Value>> {
    cur.borrow_mut().args.evaled.take()
}

/// Request evaluation of the whole argument list; the builtin re-enters with
/// `evaled` once the argument step drains
pub(crate) fn stage_all(cur: &Continuation) -> StepOutcome {
    let (arg_ast, env) = form_args(cur);
    stage(cur, arg_ast.list_to_vec(), env)
}

/// Request evaluation of specific expressions
pub(crate) fn stage(cur: &Continuation, exprs: Vec<Value>, env: Rc<Environment>) -> StepOutcome {
    let unevaled: VecDeque<Value> = exprs.into();
    Ok(Some(cur.create_before(
        Step::EvalArgs,
        Args {
            unevaled: Some(unevaled),
            env: Some(env),
            ..Args::default()
        },
    )))
}

/// Hand the produced value to the successor and advance
pub(crate) fn deliver(cur: &Continuation, value: Value) -> StepOutcome {
    Ok(cur.next_with(Args::deliver(value)))
}

pub(crate) fn expect_arity(
    name: &'static str,
    expected: &'static str,
    values: &[Value],
    count: usize,
) -> Result<(), EvalError> {
    if values.len() == count {
        Ok(())
    } else {
        Err(EvalError::arity_error(name, expected, values.len()))
    }
}
