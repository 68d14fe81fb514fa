// api.rs - High-level entry points.
//
// Wraps the scanner + parser pipeline with string-in, AST-out functions:
// parse() for the defaults and ParseBuilder for flag/option control.

use crate::ast::Ast;
use crate::error::ParseError;
use crate::parser::{parse_tokens, ParseOptions};
use crate::scanner::tokenize;
use crate::tokens::Flags;

/// Parse a pattern with default flags and no structural optimization.
///
/// # Examples
///
/// ```
/// use oniparse::{parse, NodeType};
///
/// let ast = parse(r"(a)\g<1>").unwrap();
/// let alt = ast.alternatives(ast.pattern())[0];
/// assert_eq!(ast[ast.elements(alt)[0]].node_type(), NodeType::CapturingGroup);
/// assert_eq!(ast[ast.elements(alt)[1]].node_type(), NodeType::Subroutine);
/// ```
pub fn parse(pattern: &str) -> Result<Ast, ParseError> {
    ParseBuilder::new(pattern).build()
}

/// Builder for parsing with explicit flags and options.
///
/// # Examples
///
/// ```
/// use oniparse::ParseBuilder;
///
/// let ast = ParseBuilder::new(r"[a-z&&[^aeiou]]")
///     .case_insensitive(true)
///     .optimize(true)
///     .build()
///     .unwrap();
/// assert!(ast.flags().ignore_case);
/// ```
#[derive(Clone, Debug)]
pub struct ParseBuilder<'p> {
    pattern: &'p str,
    flags: Flags,
    options: ParseOptions,
}

impl<'p> ParseBuilder<'p> {
    pub fn new(pattern: &'p str) -> Self {
        ParseBuilder {
            pattern,
            flags: Flags::default(),
            options: ParseOptions::default(),
        }
    }

    /// Oniguruma `i`: case-insensitive matching.
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.flags.ignore_case = yes;
        self
    }

    /// Oniguruma `m`: `.` also matches newlines.
    pub fn dot_all(mut self, yes: bool) -> Self {
        self.flags.dot_all = yes;
        self
    }

    /// Oniguruma `x`: free-spacing mode with `#` comments.
    pub fn extended(mut self, yes: bool) -> Self {
        self.flags.extended = yes;
        self
    }

    /// Enable semantics-preserving tree rewrites.
    pub fn optimize(mut self, yes: bool) -> Self {
        self.options.optimize = yes;
        self
    }

    pub fn build(&self) -> Result<Ast, ParseError> {
        let tokens = tokenize(self.pattern, self.flags)?;
        parse_tokens(&tokens, self.flags, self.options)
    }
}
