// ABOUTME: Value types representing Lisp data structures and expressions

use crate::cont::Continuation;
use crate::env::Environment;
use crate::printer;
use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::rc::Rc;

/// Shared handle to a mutable pair cell. Aliasing is observable: `set_first`
/// and `set_rest` mutate in place, and cells may form cycles.
pub type PairRef = Rc<RefCell<PairCell>>;

#[derive(Debug)]
pub struct PairCell {
    pub first: Value,
    pub rest: Value,
}

/// A closure: parameter names, body, and the captured definition environment.
#[derive(Debug, Clone)]
pub struct LambdaData {
    pub params: Vec<String>,
    pub body: Value,
    pub env: Rc<Environment>,
}

/// Host-owned file handle wrapped for the Lisp program. `file_close` drops
/// the handle in place; the path is kept for printing and diagnostics.
#[derive(Debug)]
pub struct ResourceData {
    pub path: String,
    pub file: Option<File>,
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    True,
    False,
    Sym(String),
    Str(String),
    Int(i64),
    Pair(PairRef),
    Lambda(Rc<LambdaData>),
    Resource(Rc<RefCell<ResourceData>>),
    Cont(Continuation),
}

impl Value {
    /// Allocate a fresh mutable pair cell
    pub fn pair(first: Value, rest: Value) -> Value {
        Value::Pair(Rc::new(RefCell::new(PairCell { first, rest })))
    }

    pub fn sym(name: &str) -> Value {
        Value::Sym(name.to_string())
    }

    /// Build a proper list (a pair chain terminated by nil)
    pub fn list(items: Vec<Value>) -> Value {
        items
            .into_iter()
            .rev()
            .fold(Value::Nil, |acc, item| Value::pair(item, acc))
    }

    /// Collect the elements of a pair chain into a vector, stopping at the
    /// first non-pair tail (the nil terminator or a dotted tail).
    pub fn list_to_vec(&self) -> Vec<Value> {
        let mut items = Vec::new();
        let mut cursor = self.clone();
        while let Value::Pair(cell) = cursor {
            let (first, rest) = {
                let c = cell.borrow();
                (c.first.clone(), c.rest.clone())
            };
            items.push(first);
            cursor = rest;
        }
        items
    }

    pub fn first(&self) -> Option<Value> {
        match self {
            Value::Pair(cell) => Some(cell.borrow().first.clone()),
            _ => None,
        }
    }

    pub fn rest(&self) -> Option<Value> {
        match self {
            Value::Pair(cell) => Some(cell.borrow().rest.clone()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::True => "true",
            Value::False => "false",
            Value::Sym(_) => "symbol",
            Value::Str(_) => "string",
            Value::Int(_) => "int",
            Value::Pair(_) => "pair",
            Value::Lambda(_) => "lambda",
            Value::Resource(_) => "resource",
            Value::Cont(_) => "continuation",
        }
    }

    /// Only `false` and `nil` are false for `if`
    pub fn is_falsy(&self) -> bool {
        matches!(self, Value::False | Value::Nil)
    }

    pub fn is_atom(&self) -> bool {
        matches!(
            self,
            Value::Nil | Value::True | Value::False | Value::Sym(_) | Value::Str(_) | Value::Int(_)
        )
    }

    /// The textual value of a value-bearing atom (symbol name, string text,
    /// or decimal digits). None for singletons and compound values.
    pub fn value_text(&self) -> Option<String> {
        match self {
            Value::Sym(name) => Some(name.clone()),
            Value::Str(text) => Some(text.clone()),
            Value::Int(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Ordering between two value-bearing atoms of the same kind. None when
    /// the kinds differ or either side carries no value.
    pub fn partial_gt(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a > b),
            (Value::Str(a), Value::Str(b)) => Some(a > b),
            (Value::Sym(a), Value::Sym(b)) => Some(a > b),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Structural equality for pairs, value equality for value-bearing atoms,
    /// tag identity for singletons, pointer identity for lambdas, resources,
    /// and continuations. Values of different tags are never equal.
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::True, Value::True) => true,
            (Value::False, Value::False) => true,
            (Value::Sym(a), Value::Sym(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Pair(a), Value::Pair(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a_first, a_rest) = {
                    let cell = a.borrow();
                    (cell.first.clone(), cell.rest.clone())
                };
                let (b_first, b_rest) = {
                    let cell = b.borrow();
                    (cell.first.clone(), cell.rest.clone())
                };
                a_first == b_first && a_rest == b_rest
            }
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            (Value::Resource(a), Value::Resource(b)) => Rc::ptr_eq(a, b),
            (Value::Cont(a), Value::Cont(b)) => a.same_node(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", printer::print(self))
    }
}
