//! Mini-notation parser and compiler.
//!
//! Parses the compact sequence/bracket/modifier notation used to write
//! patterns inline (`"bd sn*2 [~ cp]"`) into an AST, then compiles that
//! AST into a `loom_core::Pattern<Value>`. Parsing and compiling are
//! kept as separate steps so that source positions survive into
//! `Elem::span` for tools that want to highlight the text behind a
//! playing event.
//!
//! # Example
//!
//! ```
//! use loom_notation::parse_pattern;
//!
//! let result = parse_pattern("bd(3,8) sn");
//! assert!(!result.has_errors());
//! ```

pub mod ast;
pub mod compile;
pub mod feedback;
pub mod parser;

pub use feedback::{Feedback, FeedbackLevel, ParseResult};
use loom_core::{Pattern, Value};

/// Parse mini-notation text into its AST, without compiling it.
pub fn parse(input: &str) -> ParseResult<ast::Sequence> {
    parser::parse(input)
}

/// Parse and compile mini-notation text directly into a `Pattern`.
/// On a parse error the compiled pattern reflects whatever prefix of
/// the input parsed successfully; check `has_errors()` before trusting
/// the result for playback.
pub fn parse_pattern(input: &str) -> ParseResult<Pattern<Value>> {
    let parsed = parse(input);
    let pattern = compile::compile(&parsed.value);
    ParseResult::new(pattern, parsed.feedback)
}
