// SPDX-License-Identifier: MIT

pub mod config;
pub mod registry;
pub mod server;
pub mod types;
pub mod worker;
