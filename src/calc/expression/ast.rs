// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for arithmetic expressions

use serde::{Deserialize, Serialize};

use super::token::Token;
use crate::calc::error::{ArithmeticError, ParseError};

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// +
    #[serde(rename = "+")]
    Add,
    /// -
    #[serde(rename = "-")]
    Subtract,
    /// *
    #[serde(rename = "*")]
    Multiply,
    /// /
    #[serde(rename = "/")]
    Divide,
    /// ^
    #[serde(rename = "^")]
    Power,
}

impl Operator {
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            '^' => Some(Operator::Power),
            _ => None,
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Subtract => 1,
            Operator::Multiply | Operator::Divide => 2,
            Operator::Power => 3,
        }
    }

    pub fn is_right_associative(self) -> bool {
        matches!(self, Operator::Power)
    }

    /// Compute `left <op> right`.
    ///
    /// Division by zero is reported instead of producing an infinity, and any
    /// other non-finite outcome (overflow, `0 ^ -1`, ...) is rejected too.
    pub fn apply(self, left: f64, right: f64) -> Result<f64, ArithmeticError> {
        let value = match self {
            Operator::Add => left + right,
            Operator::Subtract => left - right,
            Operator::Multiply => left * right,
            Operator::Divide => {
                if right == 0.0 {
                    return Err(ArithmeticError::DivisionByZero);
                }
                left / right
            }
            Operator::Power => left.powf(right),
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(ArithmeticError::NonFinite)
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Add => write!(f, "+"),
            Operator::Subtract => write!(f, "-"),
            Operator::Multiply => write!(f, "*"),
            Operator::Divide => write!(f, "/"),
            Operator::Power => write!(f, "^"),
        }
    }
}

/// An expression tree. Parents own their children exclusively.
#[derive(Debug, PartialEq)]
pub enum AstNode {
    Literal(f64),
    Operation {
        op: Operator,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
}

impl AstNode {
    pub fn operation(op: Operator, left: AstNode, right: AstNode) -> Self {
        AstNode::Operation {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Build a tree from a postfix token sequence
    pub fn from_postfix(tokens: &[Token]) -> Result<Self, ParseError> {
        let mut stack: Vec<AstNode> = Vec::new();

        for token in tokens {
            match token {
                Token::Number(n) => stack.push(AstNode::Literal(*n)),
                Token::Operator(op) => {
                    // Right operand was pushed last
                    let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                        return Err(ParseError::InsufficientOperands);
                    };
                    stack.push(AstNode::operation(*op, left, right));
                }
                Token::LeftParen | Token::RightParen => {
                    return Err(ParseError::MalformedExpression);
                }
            }
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(root), true) => Ok(root),
            _ => Err(ParseError::MalformedExpression),
        }
    }

    /// Evaluate the tree directly, without going through tasks
    pub fn evaluate(&self) -> Result<f64, ArithmeticError> {
        let mut steps = vec![Walk::Enter(self)];
        let mut values: Vec<f64> = Vec::new();

        while let Some(step) = steps.pop() {
            match step {
                Walk::Enter(AstNode::Literal(v)) => values.push(*v),
                Walk::Enter(AstNode::Operation { op, left, right }) => {
                    steps.push(Walk::Exit(*op));
                    steps.push(Walk::Enter(right));
                    steps.push(Walk::Enter(left));
                }
                Walk::Exit(op) => {
                    let (Some(right), Some(left)) = (values.pop(), values.pop()) else {
                        unreachable!("both operands are evaluated before their operation");
                    };
                    values.push(op.apply(left, right)?);
                }
            }
        }

        match values.as_slice() {
            [value] => Ok(*value),
            _ => unreachable!("a tree evaluates to exactly one value"),
        }
    }
}

/// One step of an explicit-stack post-order walk.
///
/// Trees built from a long operator chain are as deep as the chain is long,
/// so nothing in this crate walks them by recursion.
pub(crate) enum Walk<'a> {
    Enter(&'a AstNode),
    Exit(Operator),
}

impl Drop for AstNode {
    fn drop(&mut self) {
        let mut detached = Vec::new();
        detach_children(self, &mut detached);
        // Each detached node has literal children by the time it is dropped
        while let Some(mut node) = detached.pop() {
            detach_children(&mut node, &mut detached);
        }
    }
}

fn detach_children(node: &mut AstNode, into: &mut Vec<AstNode>) {
    if let AstNode::Operation { left, right, .. } = node {
        into.push(std::mem::replace(left.as_mut(), AstNode::Literal(0.0)));
        into.push(std::mem::replace(right.as_mut(), AstNode::Literal(0.0)));
    }
}

impl std::fmt::Display for AstNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        enum Piece<'a> {
            Node(&'a AstNode),
            Op(Operator),
            Close,
        }

        let mut pieces = vec![Piece::Node(self)];
        while let Some(piece) = pieces.pop() {
            match piece {
                Piece::Node(AstNode::Literal(v)) => write!(f, "{}", v)?,
                Piece::Node(AstNode::Operation { op, left, right }) => {
                    f.write_str("(")?;
                    pieces.push(Piece::Close);
                    pieces.push(Piece::Node(right));
                    pieces.push(Piece::Op(*op));
                    pieces.push(Piece::Node(left));
                }
                Piece::Op(op) => write!(f, " {} ", op)?,
                Piece::Close => f.write_str(")")?,
            }
        }
        Ok(())
    }
}
