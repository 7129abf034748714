// ABOUTME: Continuation records, the chain nodes pumped by the trampoline

use crate::builtins::BuiltinId;
use crate::env::Environment;
use crate::error::EvalError;
use crate::scanner::Scanner;
use crate::value::Value;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// The step a continuation performs, as a tagged variant. The terminal
/// sentinel carries no step at all (`func: None` on the node).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Eval,
    EvalBinding,
    EvalCall,
    EvalArgs,
    EvalLambda,
    Builtin(BuiltinId),
    /// Driver-installed error handler: records the diagnostic and ends the chain
    Fail,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Eval => "eval",
            Step::EvalBinding => "eval_binding",
            Step::EvalCall => "eval_function_call",
            Step::EvalArgs => "eval_function_args",
            Step::EvalLambda => "eval_lambda",
            Step::Builtin(id) => id.name(),
            Step::Fail => "fail",
        }
    }
}

/// The named-argument bag of a continuation: per-step local storage and
/// parameter passing. The one cross-step contract is that a producer writes
/// the value it produced into its successor's `ast` slot.
///
/// `scan` and `log` are the `load` built-in's reader state; `message` carries
/// the failure text handed to the error handler.
#[derive(Clone, Default)]
pub struct Args {
    pub ast: Option<Value>,
    pub env: Option<Rc<Environment>>,
    pub name: Option<String>,
    pub lambda: Option<Value>,
    pub arg_ast: Option<Value>,
    pub unevaled: Option<VecDeque<Value>>,
    pub evaled: Option<Vec<Value>>,
    pub message: Option<String>,
    pub scan: Option<Scanner>,
    pub log: Option<bool>,
}

impl Args {
    /// Overlay: fields present in `patch` replace the current ones
    pub fn merge(&mut self, patch: Args) {
        let Args {
            ast,
            env,
            name,
            lambda,
            arg_ast,
            unevaled,
            evaled,
            message,
            scan,
            log,
        } = patch;
        if ast.is_some() {
            self.ast = ast;
        }
        if env.is_some() {
            self.env = env;
        }
        if name.is_some() {
            self.name = name;
        }
        if lambda.is_some() {
            self.lambda = lambda;
        }
        if arg_ast.is_some() {
            self.arg_ast = arg_ast;
        }
        if unevaled.is_some() {
            self.unevaled = unevaled;
        }
        if evaled.is_some() {
            self.evaled = evaled;
        }
        if message.is_some() {
            self.message = message;
        }
        if scan.is_some() {
            self.scan = scan;
        }
        if log.is_some() {
            self.log = log;
        }
    }

    pub fn ast_env(ast: Value, env: Rc<Environment>) -> Args {
        Args {
            ast: Some(ast),
            env: Some(env),
            ..Args::default()
        }
    }

    /// The delivery patch a producer writes into its successor
    pub fn deliver(value: Value) -> Args {
        Args {
            ast: Some(value),
            ..Args::default()
        }
    }
}

/// Chain-global state, shared by reference among all continuations the chain
/// helpers create. The error handler lives here so any step can reach it.
#[derive(Clone, Default)]
pub struct HeapData {
    pub error_handler: Option<Continuation>,
    pub statement_ast: Option<Value>,
    /// Failure being routed to the handler; consumed by the Fail step
    pub pending: Option<EvalError>,
    /// Finished diagnostic left for the driver by the Fail step
    pub diagnostic: Option<Diagnostic>,
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub error: EvalError,
    pub form: Option<Value>,
}

pub type Heap = Rc<RefCell<HeapData>>;

pub fn new_heap() -> Heap {
    Rc::new(RefCell::new(HeapData::default()))
}

pub struct ContNode {
    pub func: Option<Step>,
    pub args: Args,
    pub next: Option<Continuation>,
    pub heap: Heap,
}

impl Drop for ContNode {
    // Unlink successors iteratively; a pending chain can be tens of
    // thousands of nodes long and must not unwind through recursive drops.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(cont) = next {
            match Rc::try_unwrap(cont.0) {
                Ok(cell) => next = cell.into_inner().next.take(),
                Err(_) => break,
            }
        }
    }
}

/// A node in the singly-linked chain of evaluation steps. Cloning shares the
/// node; `dup` makes the shallow snapshot used by callcc.
#[derive(Clone)]
pub struct Continuation(Rc<RefCell<ContNode>>);

impl Continuation {
    pub fn new(func: Step, args: Args, next: Option<Continuation>, heap: Heap) -> Continuation {
        Continuation(Rc::new(RefCell::new(ContNode {
            func: Some(func),
            args,
            next,
            heap,
        })))
    }

    /// The sentinel the chain ends on; its `ast` slot receives the final value
    pub fn terminal(heap: Heap) -> Continuation {
        Continuation(Rc::new(RefCell::new(ContNode {
            func: None,
            args: Args::default(),
            next: None,
            heap,
        })))
    }

    pub fn borrow(&self) -> Ref<'_, ContNode> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ContNode> {
        self.0.borrow_mut()
    }

    pub fn func(&self) -> Option<Step> {
        self.0.borrow().func
    }

    pub fn next(&self) -> Option<Continuation> {
        self.0.borrow().next.clone()
    }

    pub fn heap(&self) -> Heap {
        self.0.borrow().heap.clone()
    }

    pub fn same_node(&self, other: &Continuation) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Update this node's args in place and return it
    pub fn with(&self, patch: Args) -> Continuation {
        self.0.borrow_mut().args.merge(patch);
        self.clone()
    }

    /// Allocate a node inserted ahead of this one: its successor is `self`
    pub fn create_before(&self, func: Step, args: Args) -> Continuation {
        Continuation::new(func, args, Some(self.clone()), self.heap())
    }

    /// Allocate a node spliced between this one and its successor
    pub fn create_after(&self, func: Step, args: Args) -> Continuation {
        let (next, heap) = {
            let node = self.0.borrow();
            (node.next.clone(), node.heap.clone())
        };
        let created = Continuation::new(func, args, next, heap);
        self.0.borrow_mut().next = Some(created.clone());
        created
    }

    /// Fresh node sharing this node's step and heap, with merged args and an
    /// optional successor override; "retry this step with patched state"
    pub fn copy_with(&self, next: Option<Continuation>, patch: Args) -> Continuation {
        let node = self.0.borrow();
        let mut args = node.args.clone();
        args.merge(patch);
        let next = next.or_else(|| node.next.clone());
        Continuation(Rc::new(RefCell::new(ContNode {
            func: node.func,
            args,
            next,
            heap: node.heap.clone(),
        })))
    }

    /// Write the patch into the successor's args and return the successor
    pub fn next_with(&self, patch: Args) -> Option<Continuation> {
        let next = self.0.borrow().next.clone();
        if let Some(ref succ) = next {
            succ.0.borrow_mut().args.merge(patch);
        }
        next
    }

    /// Shallow clone for callcc capture: same step, a copy of the args, the
    /// same successor, and a copy of the heap
    pub fn dup(&self) -> Continuation {
        let node = self.0.borrow();
        let heap = Rc::new(RefCell::new(node.heap.borrow().clone()));
        Continuation(Rc::new(RefCell::new(ContNode {
            func: node.func,
            args: node.args.clone(),
            next: node.next.clone(),
            heap,
        })))
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.func() {
            Some(step) => write!(f, "#<cont {}>", step.name()),
            None => write!(f, "#<cont terminal>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_of_two() -> (Continuation, Continuation) {
        let heap = new_heap();
        let terminal = Continuation::terminal(heap);
        let head = terminal.create_before(Step::Eval, Args::default());
        (head, terminal)
    }

    #[test]
    fn test_create_before_links_to_self() {
        let (head, terminal) = chain_of_two();
        assert!(head.next().unwrap().same_node(&terminal));
        assert!(terminal.func().is_none());
    }

    #[test]
    fn test_create_after_splices() {
        let (head, terminal) = chain_of_two();
        let mid = head.create_after(Step::EvalArgs, Args::default());
        assert!(head.next().unwrap().same_node(&mid));
        assert!(mid.next().unwrap().same_node(&terminal));
    }

    #[test]
    fn test_next_with_delivers_into_successor() {
        let (head, terminal) = chain_of_two();
        let succ = head.next_with(Args::deliver(Value::Int(7))).unwrap();
        assert!(succ.same_node(&terminal));
        assert_eq!(terminal.borrow().args.ast, Some(Value::Int(7)));
    }

    #[test]
    fn test_copy_with_shares_heap_and_step() {
        let (head, terminal) = chain_of_two();
        let copy = head.copy_with(None, Args::deliver(Value::Int(1)));
        assert_eq!(copy.func(), Some(Step::Eval));
        assert!(copy.next().unwrap().same_node(&terminal));
        assert!(Rc::ptr_eq(&copy.heap(), &head.heap()));
        assert_eq!(copy.borrow().args.ast, Some(Value::Int(1)));
        // The original args are untouched
        assert!(head.borrow().args.ast.is_none());
    }

    #[test]
    fn test_dup_copies_args_and_heap_shares_next() {
        let (head, terminal) = chain_of_two();
        head.with(Args::deliver(Value::Int(1)));
        let snapshot = head.dup();

        // Later mutation of the live node must not reach the snapshot
        head.with(Args::deliver(Value::Int(2)));
        assert_eq!(snapshot.borrow().args.ast, Some(Value::Int(1)));
        assert_eq!(head.borrow().args.ast, Some(Value::Int(2)));

        assert!(snapshot.next().unwrap().same_node(&terminal));
        assert!(!Rc::ptr_eq(&snapshot.heap(), &head.heap()));
    }

    #[test]
    fn test_merge_overlays_only_present_fields() {
        let mut args = Args::deliver(Value::Int(1));
        args.message = Some("m".to_string());
        args.merge(Args::deliver(Value::Int(2)));
        assert_eq!(args.ast, Some(Value::Int(2)));
        assert_eq!(args.message.as_deref(), Some("m"));
    }
}
