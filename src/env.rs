// ABOUTME: Environment chains mapping symbols to values across lexical scopes

use crate::error::EvalError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One lexical scope: a mutable symbol table plus the scope it was opened
/// under. Scopes are shared, not copied: a lambda keeps an `Rc` to its
/// definition scope, a captured continuation may keep another, and every
/// holder observes the same `define`/`set` mutations.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// The global scope a fresh interpreter starts with
    pub fn new() -> Rc<Self> {
        Environment::scope(None)
    }

    /// A scope opened under `parent`, as lambda application does for its
    /// parameter frame
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Environment::scope(Some(parent))
    }

    fn scope(parent: Option<Rc<Environment>>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent,
        })
    }

    /// Bind or rebind `name` in this scope only; outer bindings of the same
    /// name are shadowed, never touched
    pub fn define(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Resolve `name` against this scope and then each enclosing scope in
    /// turn, innermost first
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        let mut outer = self.parent.clone();
        while let Some(scope) = outer {
            if let Some(value) = scope.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            outer = scope.parent.clone();
        }
        None
    }

    /// Overwrite the nearest existing binding of `name`, leaving the scope
    /// structure untouched. Unlike lookup this may not invent a binding, so
    /// an unbound name is an unresolved-symbol error.
    pub fn set(&self, name: &str, value: Value) -> Result<(), EvalError> {
        if self.assign(name, &value) {
            return Ok(());
        }
        let mut outer = self.parent.clone();
        while let Some(scope) = outer {
            if scope.assign(name, &value) {
                return Ok(());
            }
            outer = scope.parent.clone();
        }
        Err(EvalError::Unresolved(name.to_string()))
    }

    /// Store into this scope's slot for `name` if one exists
    fn assign(&self, name: &str, value: &Value) -> bool {
        match self.bindings.borrow_mut().get_mut(name) {
            Some(slot) => {
                *slot = value.clone();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The scope stack lambda application builds: a global scope, the scope
    /// a lambda was defined in, and the parameter frame of a call
    fn call_stack() -> (Rc<Environment>, Rc<Environment>, Rc<Environment>) {
        let global = Environment::new();
        let closure = Environment::with_parent(global.clone());
        let frame = Environment::with_parent(closure.clone());
        (global, closure, frame)
    }

    #[test]
    fn test_define_then_resolve() {
        let env = Environment::new();
        env.define("greeting".to_string(), Value::Str("hi".to_string()));
        assert_eq!(env.get("greeting"), Some(Value::Str("hi".to_string())));
        assert_eq!(env.get("other"), None);
    }

    #[test]
    fn test_redefine_replaces_in_place() {
        let env = Environment::new();
        env.define("x".to_string(), Value::Int(1));
        env.define("x".to_string(), Value::sym("later"));
        assert_eq!(env.get("x"), Some(Value::sym("later")));
    }

    #[test]
    fn test_call_frame_sees_globals_through_the_chain() {
        let (global, _closure, frame) = call_stack();
        global.define("origin".to_string(), Value::pair(Value::Int(0), Value::Int(0)));
        assert_eq!(
            frame.get("origin"),
            Some(Value::pair(Value::Int(0), Value::Int(0)))
        );
    }

    #[test]
    fn test_parameter_binding_shadows_without_touching_outer() {
        let (global, _closure, frame) = call_stack();
        global.define("n".to_string(), Value::Int(10));
        frame.define("n".to_string(), Value::Int(99));

        assert_eq!(frame.get("n"), Some(Value::Int(99)));
        assert_eq!(global.get("n"), Some(Value::Int(10)));
    }

    #[test]
    fn test_set_reaches_the_defining_scope() {
        let (global, _closure, frame) = call_stack();
        global.define("counter".to_string(), Value::Int(0));

        frame.set("counter", Value::Int(1)).unwrap();

        // The global slot changed; the frame gained no local binding
        assert_eq!(global.get("counter"), Some(Value::Int(1)));
        assert!(frame.bindings.borrow().is_empty());
    }

    #[test]
    fn test_set_prefers_the_nearest_binding() {
        let (global, closure, frame) = call_stack();
        global.define("x".to_string(), Value::sym("outer"));
        closure.define("x".to_string(), Value::sym("inner"));

        frame.set("x", Value::sym("changed")).unwrap();

        assert_eq!(closure.get("x"), Some(Value::sym("changed")));
        assert_eq!(global.get("x"), Some(Value::sym("outer")));
    }

    #[test]
    fn test_set_of_unbound_name_is_unresolved() {
        let (_global, _closure, frame) = call_stack();
        let err = frame.set("phantom", Value::Nil).unwrap_err();
        assert!(matches!(err, EvalError::Unresolved(name) if name == "phantom"));
    }

    #[test]
    fn test_captured_scope_is_shared_between_holders() {
        // A lambda and a continuation capturing the same scope observe each
        // other's definitions
        let scope = Environment::new();
        let held_by_lambda = scope.clone();
        let held_by_cont = scope.clone();

        held_by_lambda.define("state".to_string(), Value::Str("a".to_string()));
        assert_eq!(held_by_cont.get("state"), Some(Value::Str("a".to_string())));

        held_by_cont.set("state", Value::Str("b".to_string())).unwrap();
        assert_eq!(held_by_lambda.get("state"), Some(Value::Str("b".to_string())));
    }
}
