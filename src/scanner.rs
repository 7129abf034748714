// ABOUTME: Character-level cursor over an immutable input buffer

use crate::error::EvalError;

/// Zero sentinel returned at end of input. Including it in a terminator or
/// choice set makes end-of-input an accepted match.
pub const END: char = '\0';

#[derive(Debug, Clone)]
pub struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    pub fn new(input: &str) -> Self {
        Scanner {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    /// Current character without consuming it
    pub fn peek(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or(END)
    }

    /// Consume and return the current character
    pub fn next(&mut self) -> char {
        let c = self.peek();
        if self.pos < self.chars.len() {
            self.pos += 1;
        }
        c
    }

    /// Consume the current character if it matches any of `choices`.
    /// The zero sentinel in `choices` matches end of input.
    pub fn one_of(&mut self, choices: &[char]) -> Result<char, EvalError> {
        let current = self.peek();
        if choices.contains(&current) {
            Ok(self.next())
        } else {
            Err(self.expected(choices))
        }
    }

    /// The substring from the cursor up to (not including) the first
    /// occurrence of any terminator. The cursor stops on the terminator.
    /// With the zero sentinel among the terminators, end of input is an
    /// accepted terminator; otherwise running off the end fails.
    pub fn until(&mut self, terminators: &[char]) -> Result<String, EvalError> {
        let start = self.pos;
        while self.pos < self.chars.len() {
            if terminators.contains(&self.chars[self.pos]) {
                return Ok(self.chars[start..self.pos].iter().collect());
            }
            self.pos += 1;
        }
        if terminators.contains(&END) {
            Ok(self.chars[start..].iter().collect())
        } else {
            self.pos = start;
            Err(self.expected(terminators))
        }
    }

    /// Consume any run of spaces, tabs, and newlines
    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), ' ' | '\t' | '\n') {
            self.pos += 1;
        }
    }

    /// Remaining input, for diagnostics
    pub fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    /// Cursor offset; callers looping over forms use it to detect input the
    /// reader cannot make progress on (a stray closing paren reads as an
    /// empty word without consuming it)
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn ended(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn expected(&self, choices: &[char]) -> EvalError {
        let shown: Vec<String> = choices
            .iter()
            .map(|c| {
                if *c == END {
                    "end of input".to_string()
                } else {
                    format!("{:?}", c)
                }
            })
            .collect();
        EvalError::Syntax(format!(
            "expected one of {} at {:?}",
            shown.join(", "),
            self.rest()
        ))
    }
}
