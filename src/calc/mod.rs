// SPDX-License-Identifier: MIT

//! Expression evaluation kit
//!
//! - `expression` - tokenizer, shunting-yard converter and AST builder
//! - `graph` - decomposition of a tree into dependent tasks
//! - `error` - error types shared by the whole crate

pub mod error;
pub mod expression;
pub mod graph;
