//! fgl_ast: Token vocabulary and syntax tree definitions for the 4GL front end.
//!
//! This crate defines the [`TokenKind`]/[`TokenCategory`] vocabulary shared by
//! the scanner, the parser and the completion engine, the [`AstNode`] model
//! with its start/decorator/end extents, and a visitor for walking trees.

pub mod expression;
pub mod node;
pub mod token_kind;
pub mod types;
pub mod visitor;

// Re-export key types
pub use expression::*;
pub use node::*;
pub use token_kind::{TokenCategory, TokenKind};
pub use types::*;
