// SPDX-License-Identifier: MIT

//! Types exchanged between the registry, the HTTP layer and workers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::calc::error::ArithmeticError;
use crate::calc::expression::Operator;
use crate::calc::graph::{ExpressionId, TaskId};

/// Expression lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionStatus {
    Pending,
    InProgress,
    Complete,
    Failed,
}

impl ExpressionStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, ExpressionStatus::Complete | ExpressionStatus::Failed)
    }
}

/// Read-only view of an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionSnapshot {
    pub id: ExpressionId,
    /// Source text as submitted
    pub expression: String,
    pub status: ExpressionStatus,
    pub result: Option<f64>,
    pub error: Option<ArithmeticError>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// A ready task handed to a worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub id: TaskId,
    pub arg1: f64,
    pub arg2: f64,
    pub operation: Operator,
    /// Simulated cost in milliseconds
    pub operation_time: u64,
}

impl TaskAssignment {
    pub fn operation_time(&self) -> Duration {
        Duration::from_millis(self.operation_time)
    }

    /// Run the operation locally
    pub fn compute(&self) -> TaskOutcome {
        match self.operation.apply(self.arg1, self.arg2) {
            Ok(value) => TaskOutcome::Value(value),
            Err(e) => TaskOutcome::Failed(e),
        }
    }
}

/// What a worker learned about a task
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskOutcome {
    Value(f64),
    Failed(ArithmeticError),
}

/// Wire form of a task outcome: `{id, result}` or `{id, error}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ArithmeticError>,
}

impl TaskReport {
    pub fn new(id: TaskId, outcome: TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Value(v) => Self {
                id,
                result: Some(v),
                error: None,
            },
            TaskOutcome::Failed(e) => Self {
                id,
                result: None,
                error: Some(e),
            },
        }
    }

    /// The outcome, if exactly one of `result` / `error` is set
    pub fn outcome(&self) -> Option<TaskOutcome> {
        match (self.result, self.error) {
            (Some(v), None) => Some(TaskOutcome::Value(v)),
            (None, Some(e)) => Some(TaskOutcome::Failed(e)),
            _ => None,
        }
    }
}

// --- HTTP bodies ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub expression: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub id: ExpressionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionEnvelope {
    pub expression: ExpressionSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionList {
    pub expressions: Vec<ExpressionSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub task: TaskAssignment,
}

/// Error payload of every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Counters reported by the health endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub expressions_pending: usize,
    pub expressions_in_progress: usize,
    pub expressions_complete: usize,
    pub expressions_failed: usize,
    pub tasks_blocked: usize,
    pub tasks_ready: usize,
    pub tasks_dispatched: usize,
    pub tasks_done: usize,
    pub tasks_abandoned: usize,
}
