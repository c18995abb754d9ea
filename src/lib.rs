// SPDX-License-Identifier: MIT

//! Distributed arithmetic expression evaluator
//!
//! Expressions are parsed into trees, split into dependent binary-operation
//! tasks and handed out to polling workers until the root task resolves.

pub mod calc;
pub mod orchestrator;
