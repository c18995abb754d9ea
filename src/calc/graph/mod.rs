// SPDX-License-Identifier: MIT

//! Task graphs
//!
//! An expression tree becomes a set of binary-operation tasks whose operand
//! slots either hold a value or point at the task producing it.

mod decomposer;
pub mod types;

pub use decomposer::decompose;
pub use types::{
    Dependency, ExpressionId, NodeId, Operand, Side, Task, TaskGraph, TaskId, TaskStatus,
};
