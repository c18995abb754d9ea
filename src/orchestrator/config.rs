// SPDX-License-Identifier: MIT

//! Process configuration from environment variables
//!
//! `.env` files are loaded by the binary through `dotenv` before
//! `Config::from_env` runs. Unset variables fall back to defaults; a variable
//! that is set but does not parse is an error.

use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::calc::error::{CalcError, Result};
use crate::calc::expression::Operator;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ORCHESTRATOR_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Simulated cost of each operation, handed to workers with every task
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationTimes {
    pub addition: Duration,
    pub subtraction: Duration,
    pub multiplication: Duration,
    pub division: Duration,
    pub exponentiation: Duration,
}

impl OperationTimes {
    pub fn for_operator(&self, op: Operator) -> Duration {
        match op {
            Operator::Add => self.addition,
            Operator::Subtract => self.subtraction,
            Operator::Multiply => self.multiplication,
            Operator::Divide => self.division,
            Operator::Power => self.exponentiation,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Port the orchestrator listens on
    pub port: u16,
    pub operation_times: OperationTimes,
    /// Number of concurrent workers an agent runs
    pub computing_power: usize,
    /// Where agents find the orchestrator
    pub orchestrator_url: Url,
    /// How long an idle worker waits before polling again
    pub poll_interval: Duration,
}

impl Config {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let millis = |key: &str| -> Result<Duration> {
            Ok(Duration::from_millis(parse_var(&lookup, key, 0u64)?))
        };

        let operation_times = OperationTimes {
            addition: millis("TIME_ADDITION_MS")?,
            subtraction: millis("TIME_SUBTRACTION_MS")?,
            multiplication: millis("TIME_MULTIPLICATIONS_MS")?,
            division: millis("TIME_DIVISIONS_MS")?,
            exponentiation: millis("TIME_EXPONENTIATIONS_MS")?,
        };

        let computing_power = parse_var(&lookup, "COMPUTING_POWER", 1usize)?;
        if computing_power == 0 {
            return Err(CalcError::config("COMPUTING_POWER must be at least 1"));
        }

        let orchestrator_url = match lookup("ORCHESTRATOR_URL") {
            Some(raw) => Url::parse(raw.trim())
                .map_err(|e| CalcError::config(format!("ORCHESTRATOR_URL: {}", e)))?,
            None => Url::parse(DEFAULT_ORCHESTRATOR_URL)?,
        };

        Ok(Self {
            port: parse_var(&lookup, "PORT", DEFAULT_PORT)?,
            operation_times,
            computing_power,
            orchestrator_url,
            poll_interval: Duration::from_millis(parse_var(
                &lookup,
                "POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
        })
    }
}

impl Config {
    /// Worker count for an agent or local run; `--workers` overrides `COMPUTING_POWER`
    pub fn worker_count(&self, requested: Option<usize>) -> Result<usize> {
        match requested {
            Some(0) => Err(CalcError::config("--workers must be at least 1")),
            Some(n) => Ok(n),
            None => Ok(self.computing_power),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CalcError::config(format!("{}={:?}: {}", key, raw, e))),
    }
}
