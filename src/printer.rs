// ABOUTME: Renders AST values back to source form, guarding against pair cycles

use crate::value::{PairCell, PairRef, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Render a value as source text. Pairs currently being printed are tracked
/// on a stack; a re-entered pair renders as `...` so cyclic structures
/// terminate.
pub fn print(v: &Value) -> String {
    let mut active = Vec::new();
    render(v, &mut active, usize::MAX)
}

/// Depth-capped rendering for continuation traces. Pairs nested deeper than
/// `depth` render as `...`.
pub fn print_depth(v: &Value, depth: usize) -> String {
    let mut active = Vec::new();
    render(v, &mut active, depth)
}

fn render(v: &Value, active: &mut Vec<*const RefCell<PairCell>>, depth: usize) -> String {
    match v {
        Value::Nil => "nil".to_string(),
        Value::True => "true".to_string(),
        Value::False => "false".to_string(),
        Value::Sym(name) => name.clone(),
        Value::Str(text) => format!("\"{}\"", text),
        Value::Int(n) => n.to_string(),
        Value::Pair(cell) => {
            if depth == 0 {
                "...".to_string()
            } else {
                render_pair(cell, active, depth)
            }
        }
        Value::Lambda(lambda) => format!(
            "(lambda ({}) {})",
            lambda.params.join(" "),
            render(&lambda.body, active, depth)
        ),
        Value::Resource(res) => format!("#<resource:{}>", res.borrow().path),
        Value::Cont(_) => "#<continuation>".to_string(),
    }
}

fn render_pair(cell: &PairRef, active: &mut Vec<*const RefCell<PairCell>>, depth: usize) -> String {
    let mut out = String::from("(");
    let mut cursor = cell.clone();
    let mut pushed = 0usize;
    let mut sep = "";
    loop {
        let ptr = Rc::as_ptr(&cursor);
        if active.contains(&ptr) {
            out.push_str(sep);
            out.push_str("...");
            break;
        }
        active.push(ptr);
        pushed += 1;
        let (first, rest) = {
            let c = cursor.borrow();
            (c.first.clone(), c.rest.clone())
        };
        out.push_str(sep);
        out.push_str(&render(&first, active, depth.saturating_sub(1)));
        sep = " ";
        match rest {
            Value::Pair(next) => cursor = next,
            Value::Nil => break,
            tail => {
                out.push_str(" . ");
                out.push_str(&render(&tail, active, depth.saturating_sub(1)));
                break;
            }
        }
    }
    for _ in 0..pushed {
        active.pop();
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::value::LambdaData;

    #[test]
    fn test_print_atoms() {
        assert_eq!(print(&Value::Nil), "nil");
        assert_eq!(print(&Value::True), "true");
        assert_eq!(print(&Value::False), "false");
        assert_eq!(print(&Value::Int(123)), "123");
        assert_eq!(print(&Value::sym("abc")), "abc");
        assert_eq!(print(&Value::Str("hi".to_string())), "\"hi\"");
    }

    #[test]
    fn test_print_lists() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(print(&list), "(1 2 3)");

        let nested = Value::list(vec![
            Value::list(vec![Value::sym("a")]),
            Value::list(vec![Value::sym("b"), Value::sym("c")]),
        ]);
        assert_eq!(print(&nested), "((a) (b c))");
    }

    #[test]
    fn test_print_dotted_pair() {
        let pair = Value::pair(Value::Int(1), Value::Int(2));
        assert_eq!(print(&pair), "(1 . 2)");

        let improper = Value::pair(Value::Int(1), Value::pair(Value::Int(2), Value::Int(3)));
        assert_eq!(print(&improper), "(1 2 . 3)");
    }

    #[test]
    fn test_print_lambda() {
        let lambda = Value::Lambda(Rc::new(LambdaData {
            params: vec!["a".to_string(), "b".to_string()],
            body: Value::list(vec![Value::sym("plus"), Value::sym("a"), Value::sym("b")]),
            env: Environment::new(),
        }));
        assert_eq!(print(&lambda), "(lambda (a b) (plus a b))");
    }

    #[test]
    fn test_print_cycle_in_rest() {
        // p = (1), then p.rest = p
        let p = Value::pair(Value::Int(1), Value::Nil);
        if let Value::Pair(cell) = &p {
            cell.borrow_mut().rest = p.clone();
        }
        let out = print(&p);
        assert!(out.contains("..."), "got: {}", out);
        assert_eq!(out, "(1 ...)");
    }

    #[test]
    fn test_print_cycle_in_first() {
        let p = Value::pair(Value::Int(1), Value::Nil);
        if let Value::Pair(cell) = &p {
            let alias = p.clone();
            cell.borrow_mut().first = alias;
        }
        let out = print(&p);
        assert!(out.contains("..."), "got: {}", out);
    }

    #[test]
    fn test_shared_but_acyclic_pairs_print_fully() {
        // The same cell appearing twice side by side is not a cycle
        let shared = Value::pair(Value::Int(7), Value::Nil);
        let list = Value::list(vec![shared.clone(), shared]);
        assert_eq!(print(&list), "((7) (7))");
    }

    #[test]
    fn test_print_depth_caps_nesting() {
        let deep = Value::list(vec![Value::list(vec![Value::list(vec![Value::Int(1)])])]);
        assert_eq!(print_depth(&deep, 2), "((...))");
        assert_eq!(print_depth(&deep, 4), "(((1)))");
    }
}
