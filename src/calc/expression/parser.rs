// SPDX-License-Identifier: MIT

//! Expression text to AST
//!
//! Parses expressions like:
//! - `3 + 4 * 2`
//! - `(1 + 2) * 3`
//! - `2 ^ 3 ^ 2`

use super::ast::AstNode;
use super::rpn::to_postfix;
use super::token::tokenize;
use crate::calc::error::ParseError;

/// Parse an arithmetic expression string into an AST
pub fn parse(input: &str) -> Result<AstNode, ParseError> {
    let tokens = tokenize(input)?;
    let postfix = to_postfix(&tokens)?;
    AstNode::from_postfix(&postfix)
}
