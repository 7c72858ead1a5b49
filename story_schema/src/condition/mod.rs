//! The condition language.
//!
//! Authors write small boolean expressions that reference other entities:
//!
//! ```text
//! node_a.enabled and not locations.current_node.id == 'cellar'
//! ```
//!
//! Precedence from tightest to loosest is `not`, `and`, `or`. Comparisons
//! (`== != < <= > >= in`) bind tighter than all three and do not chain.
//! Dot paths are written without whitespace around the dots.

mod ast;
mod lexer;
mod parser;

use std::fmt;

pub use ast::{BoolExpr, Comparison, ComparisonOperator, DotPath, Literal, Operand, SnakeCase};
pub use parser::{parse, MAX_NESTING};

/// A condition that does not match the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    /// Character offset into `input` where matching failed.
    pub position: usize,
    pub input: String,
}

impl SyntaxError {
    pub(crate) fn new(message: impl Into<String>, position: usize, input: &str) -> Self {
        Self {
            message: message.into(),
            position,
            input: input.to_string(),
        }
    }

    /// Render the input with a caret under the failing column.
    pub fn explain(&self) -> String {
        format!(
            "{}\n{}^\nSyntaxError: {} (at char {}), (line:1, col:{})",
            self.input,
            " ".repeat(self.position),
            self.message,
            self.position,
            self.position + 1
        )
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at char {})", self.message, self.position)
    }
}

impl std::error::Error for SyntaxError {}
