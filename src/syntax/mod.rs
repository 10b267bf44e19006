//! The `.dsy` text format for call DAGs.
//!
//! ```text
//! # shared subexpression
//! let inner = add(1, 2)
//! add(inner, inner)
//! ```
//!
//! A `let` name refers to one node wherever it is used, which is how
//! sharing is written down. Every literal occurrence is its own terminal.
//! Calling a builtin by name embeds the function in the invocation; using
//! a builtin name as a value makes a terminal holding the function.

mod lexer;
mod parser;

#[cfg(test)]
mod tests;

pub use parser::SourceTree;

use crate::diagnostic::Diagnostic;
use lexer::Lexer;
use parser::Parser;

/// Parse source text without rendering diagnostics.
pub fn parse(source: &str) -> Result<SourceTree, Vec<Diagnostic>> {
    let (tokens, lex_errors) = Lexer::new(source).tokenize();
    if !lex_errors.is_empty() {
        return Err(lex_errors);
    }
    Parser::new(tokens).parse_file()
}
