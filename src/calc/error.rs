// SPDX-License-Identifier: MIT

//! Typed error handling for calc-master
//!
//! Each layer owns its error enum:
//! - `ParseError` - rejected expression text, nothing gets registered
//! - `ArithmeticError` - a task could not produce a finite value
//! - `RegistryError` - protocol mistakes made by callers of the registry
//!
//! `CalcError` sits on top and is what the service and worker code return.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calc::graph::{ExpressionId, TaskId};

/// Reasons an expression is rejected before any task is created
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("Invalid character '{ch}' at position {position}")]
    InvalidCharacter { ch: char, position: usize },

    #[error("Invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("Unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("Empty expression")]
    EmptyExpression,

    #[error("Consecutive operators")]
    ConsecutiveOperators,

    #[error("Consecutive operands without an operator between them")]
    ConsecutiveOperands,

    #[error("Operator is missing an operand")]
    DanglingOperator,

    #[error("Operator has fewer than two operands")]
    InsufficientOperands,

    #[error("Malformed expression")]
    MalformedExpression,
}

impl ParseError {
    /// Stable snake_case name, used as the `kind` field on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::InvalidCharacter { .. } => "invalid_character",
            ParseError::InvalidNumber(_) => "invalid_number",
            ParseError::UnbalancedParentheses => "unbalanced_parentheses",
            ParseError::EmptyExpression => "empty_expression",
            ParseError::ConsecutiveOperators => "consecutive_operators",
            ParseError::ConsecutiveOperands => "consecutive_operands",
            ParseError::DanglingOperator => "dangling_operator",
            ParseError::InsufficientOperands => "insufficient_operands",
            ParseError::MalformedExpression => "malformed_expression",
        }
    }
}

/// Failures while computing a single binary operation
#[derive(Debug, Clone, Copy, Error, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Result is not a finite number")]
    NonFinite,
}

/// Protocol errors returned by the expression/task registry
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("Task {0} not found")]
    TaskNotFound(TaskId),

    #[error("Task {0} is already completed")]
    AlreadyCompleted(TaskId),

    #[error("Task {0} has not been dispatched")]
    TaskNotDispatched(TaskId),

    #[error("Expression {0} not found")]
    ExpressionNotFound(ExpressionId),
}

impl RegistryError {
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::TaskNotFound(_) => "task_not_found",
            RegistryError::AlreadyCompleted(_) => "already_completed",
            RegistryError::TaskNotDispatched(_) => "task_not_dispatched",
            RegistryError::ExpressionNotFound(_) => "expression_not_found",
        }
    }
}

/// Top-level error type for calc-master
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Configuration errors (unparsable env vars, bad URLs)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected response from the orchestrator
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl CalcError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CalcError>;
