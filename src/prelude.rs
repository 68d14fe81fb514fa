// prelude.rs - Convenient re-exports.
//
//! # Prelude
//!
//! ```
//! use oniparse::prelude::*;
//!
//! let ast = parse(r"a+").unwrap();
//! let alt = ast.alternatives(ast.pattern())[0];
//! assert_eq!(ast[ast.elements(alt)[0]].node_type(), NodeType::Quantifier);
//! ```

pub use crate::api::{parse, ParseBuilder};
pub use crate::ast::{Ast, AssertionKind, GroupRef, Node, NodeId, NodeInner, NodeType};
pub use crate::error::ParseError;
pub use crate::parser::{parse_tokens, ParseOptions};
pub use crate::tokens::{Flags, Token, TokenType};
