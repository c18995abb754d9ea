// SPDX-License-Identifier: MIT

//! Arithmetic expression parsing
//!
//! Text goes through three stages:
//! - `token` - scanning and validation of the token sequence
//! - `rpn` - shunting-yard reordering into postfix
//! - `ast` - building the expression tree from postfix
//!
//! `parse` runs all three.

mod ast;
mod parser;
mod rpn;
mod token;

pub use ast::{AstNode, Operator};
pub(crate) use ast::Walk;
pub use parser::parse;
pub use rpn::to_postfix;
pub use token::{tokenize, Token};
