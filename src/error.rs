// ABOUTME: Error types covering scanner, reader, and evaluator failures

use crate::value::Value;
use thiserror::Error;

// ===== Arity constant strings (eliminates allocations in error paths) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_TWO_OR_THREE: &str = "2-3";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";
pub const ARITY_AT_LEAST_TWO: &str = "at least 2";

/// Every way an interpreter run can fail. In-chain failures are routed to the
/// chain's error handler continuation by the trampoline; the reader raises
/// `Syntax` before any chain exists.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    /// Malformed source text (unterminated string or list, unexpected character)
    #[error("{0}")]
    Syntax(String),

    /// Symbol not bound in the environment chain and not a built-in name
    #[error("unresolved symbol: {0}")]
    Unresolved(String),

    /// Argument of the wrong kind, with function name and expected/actual types
    #[error("{function}: expected {expected}, got {actual}")]
    Type {
        function: String,
        expected: String,
        actual: String,
    },

    /// Wrong number of arguments, with expected count/range
    #[error("{function}: expected {expected} argument{}, got {actual}", plural(.expected))]
    Arity {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Raised by `(error msg)`
    #[error("{0}")]
    User(String),

    /// Function slot resolved to a symbol naming no built-in
    #[error("unknown built-in function: {0}")]
    UnknownBuiltin(String),

    /// Host I/O failure wrapped around the file_* operations
    #[error("{function}: {message}")]
    Io {
        function: String,
        message: String,
    },
}

/// "argument" when the expected label ends in a count of one ("1",
/// "at least 1"), "arguments" for every other label
fn plural(expected: &str) -> &'static str {
    if expected.ends_with('1') {
        ""
    } else {
        "s"
    }
}

impl EvalError {
    /// Create a type mismatch error from the offending value
    pub fn type_error(function: &str, expected: &str, actual: &Value) -> Self {
        EvalError::Type {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
        }
    }

    /// Create an arity error with expected and actual counts
    pub fn arity_error(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::Arity {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    /// Wrap a host I/O failure with function context
    pub fn io_error(function: &str, err: impl std::fmt::Display) -> Self {
        EvalError::Io {
            function: function.to_string(),
            message: err.to_string(),
        }
    }
}
