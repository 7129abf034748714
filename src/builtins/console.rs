//! Output operations: print, puts, to_s
//!
//! - `print`: emit each argument's textual value to stdout
//! - `puts`: the same, with a newline after each argument
//! - `to_s`: convert a value to a string without emitting it
//!
//! Value-bearing atoms emit their bare value (string text without quotes,
//! symbol name, digits); other values emit their printed form. `print` and
//! `puts` expand the two-character sequences `\n` and `\t`, which the reader
//! leaves untouched in string literals. Both produce their last argument.

use super::{deliver, expect_arity, stage_all, take_evaled};
use crate::cont::Continuation;
use crate::error::ARITY_ONE;
use crate::eval::StepOutcome;
use crate::printer;
use crate::value::Value;

/// Bare text of a value: the atom's value, or the printed form
fn display_text(value: &Value) -> String {
    value
        .value_text()
        .unwrap_or_else(|| printer::print(value))
}

fn expand_escapes(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\t", "\t")
}

pub fn print(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    for value in &values {
        std::print!("{}", expand_escapes(&display_text(value)));
    }
    deliver(cur, values.last().cloned().unwrap_or(Value::Nil))
}

pub fn puts(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    if values.is_empty() {
        println!();
    }
    for value in &values {
        println!("{}", expand_escapes(&display_text(value)));
    }
    deliver(cur, values.last().cloned().unwrap_or(Value::Nil))
}

pub fn to_s(cur: &Continuation) -> StepOutcome {
    let Some(values) = take_evaled(cur) else {
        return stage_all(cur);
    };
    expect_arity("to_s", ARITY_ONE, &values, 1)?;
    deliver(cur, Value::Str(display_text(&values[0])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trampoline::Interpreter;

    #[test]
    fn test_display_text_uses_bare_values() {
        assert_eq!(display_text(&Value::Int(42)), "42");
        assert_eq!(display_text(&Value::Str("hi".to_string())), "hi");
        assert_eq!(display_text(&Value::sym("abc")), "abc");
        // Non-value atoms and compounds fall back to their printed form
        assert_eq!(display_text(&Value::Nil), "nil");
        assert_eq!(
            display_text(&Value::pair(Value::Int(1), Value::Int(2))),
            "(1 . 2)"
        );
    }

    #[test]
    fn test_expand_escapes() {
        assert_eq!(expand_escapes("a\\nb"), "a\nb");
        assert_eq!(expand_escapes("a\\tb"), "a\tb");
        assert_eq!(expand_escapes("plain"), "plain");
    }

    #[test]
    fn test_to_s() {
        let interp = Interpreter::new();
        assert_eq!(
            interp.eval_source("(to_s 42)").unwrap(),
            Value::Str("42".to_string())
        );
        assert_eq!(
            interp.eval_source("(to_s \"hi\")").unwrap(),
            Value::Str("hi".to_string())
        );
        assert_eq!(
            interp.eval_source("(to_s nil)").unwrap(),
            Value::Str("nil".to_string())
        );
        assert_eq!(
            interp.eval_source("(to_s (cons 1 2))").unwrap(),
            Value::Str("(1 . 2)".to_string())
        );
    }

    #[test]
    fn test_print_produces_its_last_argument() {
        let interp = Interpreter::new();
        assert_eq!(
            interp.eval_source("(print \"\" 7)").unwrap(),
            Value::Int(7)
        );
        assert_eq!(interp.eval_source("(puts \"\")").unwrap(), Value::Str(String::new()));
    }
}
