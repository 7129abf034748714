// ABOUTME: S-expression reader producing AST values from a scanner cursor

use crate::error::EvalError;
use crate::scanner::{Scanner, END};
use crate::value::Value;

/// Characters that end a bare word: whitespace, a closing paren, or end of input
const WORD_ENDS: [char; 5] = [' ', '\t', '\n', ')', END];

/// Read one form from the scanner. `None` means the input held no further
/// form (end of input after whitespace and comments); some call sites treat
/// that as a nil value.
pub fn read(scan: &mut Scanner) -> Result<Option<Value>, EvalError> {
    skip_blank(scan);
    if scan.ended() {
        return Ok(None);
    }
    match scan.peek() {
        '\'' => {
            scan.next();
            match read(scan)? {
                Some(form) => Ok(Some(Value::pair(
                    Value::sym("quote"),
                    Value::pair(form, Value::Nil),
                ))),
                None => Err(EvalError::Syntax("expected a form after '".to_string())),
            }
        }
        '(' => read_list(scan).map(Some),
        _ => read_atom(scan).map(Some),
    }
}

/// Read every remaining form of `src`
pub fn read_all(src: &str) -> Result<Vec<Value>, EvalError> {
    let mut scan = Scanner::new(src);
    let mut forms = Vec::new();
    while let Some(form) = read_progressing(&mut scan)? {
        forms.push(form);
    }
    Ok(forms)
}

/// `read`, but a form that consumed no input (a stray `)`) is a syntax
/// error instead of an endless supply of nils
pub fn read_progressing(scan: &mut Scanner) -> Result<Option<Value>, EvalError> {
    let before = scan.position();
    let form = read(scan)?;
    if form.is_some() && scan.position() == before {
        return Err(EvalError::Syntax(format!(
            "unexpected character at {:?}",
            scan.rest()
        )));
    }
    Ok(form)
}

/// Skip whitespace and `;` line comments
fn skip_blank(scan: &mut Scanner) {
    scan.skip_whitespace();
    while scan.peek() == ';' {
        // Comment runs to the end of the line (or of the input)
        let _ = scan.until(&['\n', END]);
        scan.skip_whitespace();
    }
}

fn read_atom(scan: &mut Scanner) -> Result<Value, EvalError> {
    if scan.peek() == '"' {
        scan.next();
        let text = scan
            .until(&['"'])
            .map_err(|_| EvalError::Syntax(format!("unterminated string at {:?}", scan.rest())))?;
        scan.one_of(&['"'])?;
        return Ok(Value::Str(text));
    }

    let word = scan.until(&WORD_ENDS)?;
    Ok(match word.as_str() {
        "" | "nil" | "null" => Value::Nil,
        "true" => Value::True,
        "false" => Value::False,
        _ if word.chars().all(|c| c.is_ascii_digit()) => {
            let n = word
                .parse::<i64>()
                .map_err(|_| EvalError::Syntax(format!("integer literal out of range: {}", word)))?;
            Value::Int(n)
        }
        _ => Value::Sym(word),
    })
}

fn read_list(scan: &mut Scanner) -> Result<Value, EvalError> {
    scan.one_of(&['('])?;
    read_list_rest(scan)
}

fn read_list_rest(scan: &mut Scanner) -> Result<Value, EvalError> {
    skip_blank(scan);
    if scan.ended() {
        return Err(EvalError::Syntax("unterminated list".to_string()));
    }
    if scan.peek() == ')' {
        scan.next();
        return Ok(Value::Nil);
    }
    let first = match read(scan)? {
        Some(form) => form,
        None => return Err(EvalError::Syntax("unterminated list".to_string())),
    };
    let rest = read_list_rest(scan)?;
    Ok(Value::pair(first, rest))
}
