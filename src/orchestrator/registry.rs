// SPDX-License-Identifier: MIT

//! Expression/task registry
//!
//! Shared store of in-flight expressions and their tasks. Every mutation
//! (submission, dispatch, completion, readiness promotion) runs under the
//! write half of a single lock, so a registry is one exclusion domain no
//! matter how many handles and workers share it.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::config::OperationTimes;
use super::types::{
    ExpressionSnapshot, ExpressionStatus, RegistryStats, TaskAssignment, TaskOutcome,
};
use crate::calc::error::{ArithmeticError, ParseError, RegistryError};
use crate::calc::expression::{self, AstNode};
use crate::calc::graph::{self, ExpressionId, NodeId, Side, Task, TaskId, TaskStatus};

/// An expression owned by the registry
#[derive(Debug)]
struct Expression {
    id: ExpressionId,
    source: String,
    ast: AstNode,
    status: ExpressionStatus,
    root_task: Option<TaskId>,
    task_ids: Vec<TaskId>,
    /// Values written back for operation nodes, keyed by post-order node id
    resolved: BTreeMap<NodeId, f64>,
    result: Option<f64>,
    error: Option<ArithmeticError>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Expression {
    fn snapshot(&self) -> ExpressionSnapshot {
        ExpressionSnapshot {
            id: self.id,
            expression: self.source.clone(),
            status: self.status,
            result: self.result,
            error: self.error,
            created_at: self.created_at,
            finished_at: self.finished_at,
        }
    }

    fn finish(&mut self, outcome: Result<f64, ArithmeticError>) {
        match outcome {
            Ok(value) => {
                self.status = ExpressionStatus::Complete;
                self.result = Some(value);
            }
            Err(e) => {
                self.status = ExpressionStatus::Failed;
                self.error = Some(e);
            }
        }
        self.finished_at = Some(Utc::now());
    }
}

struct RegistryState {
    expressions: HashMap<ExpressionId, Expression>,
    tasks: HashMap<TaskId, Task>,
    /// task -> tasks waiting on its result, and the slot each one fills
    dependents: HashMap<TaskId, Vec<(TaskId, Side)>>,
    /// Ready tasks in creation/promotion order
    ready: VecDeque<TaskId>,
    next_expression_id: ExpressionId,
    next_task_id: TaskId,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            expressions: HashMap::new(),
            tasks: HashMap::new(),
            dependents: HashMap::new(),
            ready: VecDeque::new(),
            next_expression_id: 1,
            next_task_id: 1,
        }
    }

    fn insert(&mut self, ast: AstNode, source: String) -> ExpressionId {
        let id = self.next_expression_id;
        self.next_expression_id += 1;

        let graph = graph::decompose(&ast, id, self.next_task_id);
        self.next_task_id += graph.len() as TaskId;

        let mut expression = Expression {
            id,
            source,
            ast,
            status: ExpressionStatus::Pending,
            root_task: graph.root,
            task_ids: graph.tasks.iter().map(|t| t.id).collect(),
            resolved: BTreeMap::new(),
            result: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        };

        for dep in &graph.dependencies {
            self.dependents
                .entry(dep.on)
                .or_default()
                .push((dep.dependent, dep.side));
        }
        for task in graph.tasks {
            if task.status == TaskStatus::Ready {
                self.ready.push_back(task.id);
            }
            self.tasks.insert(task.id, task);
        }

        expression.status = ExpressionStatus::InProgress;
        if let AstNode::Literal(value) = &expression.ast {
            // Nothing to compute
            let value = *value;
            expression.finish(Ok(value));
        }

        log::info!(
            "Registered expression {} ({} tasks): {}",
            id,
            expression.task_ids.len(),
            expression.source
        );
        self.expressions.insert(id, expression);
        id
    }

    fn dispatch(&mut self, operation_times: &OperationTimes) -> Option<TaskAssignment> {
        while let Some(id) = self.ready.pop_front() {
            let Some(task) = self.tasks.get_mut(&id) else {
                continue;
            };
            // Abandoned after being queued
            if task.status != TaskStatus::Ready {
                continue;
            }
            let Some((arg1, arg2)) = task.operands() else {
                log::error!("Task {} was queued with a pending operand", id);
                continue;
            };

            task.status = TaskStatus::Dispatched;
            log::debug!("Dispatching task {}: {} {} {}", id, arg1, task.op, arg2);
            return Some(TaskAssignment {
                id,
                arg1,
                arg2,
                operation: task.op,
                operation_time: operation_times.for_operator(task.op).as_millis() as u64,
            });
        }
        None
    }

    fn complete(&mut self, task_id: TaskId, outcome: TaskOutcome) -> Result<(), RegistryError> {
        let task = self
            .tasks
            .get_mut(&task_id)
            .ok_or(RegistryError::TaskNotFound(task_id))?;

        match task.status {
            TaskStatus::Done | TaskStatus::Abandoned => {
                return Err(RegistryError::AlreadyCompleted(task_id))
            }
            TaskStatus::Blocked | TaskStatus::Ready => {
                return Err(RegistryError::TaskNotDispatched(task_id))
            }
            TaskStatus::Dispatched => {}
        }
        task.status = TaskStatus::Done;
        let (expression_id, node) = (task.expression_id, task.node);

        let value = match outcome {
            TaskOutcome::Value(v) if v.is_finite() => v,
            TaskOutcome::Value(_) => {
                self.fail(expression_id, task_id, ArithmeticError::NonFinite);
                return Ok(());
            }
            TaskOutcome::Failed(e) => {
                self.fail(expression_id, task_id, e);
                return Ok(());
            }
        };

        if let Some(expression) = self.expressions.get_mut(&expression_id) {
            expression.resolved.insert(node, value);
            if expression.root_task == Some(task_id) {
                expression.finish(Ok(value));
                log::info!("Expression {} complete: {}", expression_id, value);
            }
        }

        for (dependent, side) in self.dependents.remove(&task_id).unwrap_or_default() {
            let Some(waiting) = self.tasks.get_mut(&dependent) else {
                continue;
            };
            if waiting.status != TaskStatus::Blocked || !waiting.fill(side, value) {
                continue;
            }
            if waiting.is_resolved() {
                waiting.status = TaskStatus::Ready;
                self.ready.push_back(dependent);
                log::debug!("Task {} is ready", dependent);
            }
        }

        Ok(())
    }

    /// Mark an expression failed and abandon its unfinished tasks
    fn fail(&mut self, expression_id: ExpressionId, task_id: TaskId, error: ArithmeticError) {
        let Some(expression) = self.expressions.get_mut(&expression_id) else {
            return;
        };
        expression.finish(Err(error));
        log::warn!(
            "Expression {} failed at task {}: {}",
            expression_id,
            task_id,
            error
        );

        for id in &expression.task_ids {
            if let Some(task) = self.tasks.get_mut(id) {
                if !task.status.is_terminal() {
                    task.status = TaskStatus::Abandoned;
                }
            }
            self.dependents.remove(id);
        }
    }

    fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for expression in self.expressions.values() {
            match expression.status {
                ExpressionStatus::Pending => stats.expressions_pending += 1,
                ExpressionStatus::InProgress => stats.expressions_in_progress += 1,
                ExpressionStatus::Complete => stats.expressions_complete += 1,
                ExpressionStatus::Failed => stats.expressions_failed += 1,
            }
        }
        for task in self.tasks.values() {
            match task.status {
                TaskStatus::Blocked => stats.tasks_blocked += 1,
                TaskStatus::Ready => stats.tasks_ready += 1,
                TaskStatus::Dispatched => stats.tasks_dispatched += 1,
                TaskStatus::Done => stats.tasks_done += 1,
                TaskStatus::Abandoned => stats.tasks_abandoned += 1,
            }
        }
        stats
    }
}

/// Cheaply cloneable handle to a shared registry
#[derive(Clone)]
pub struct Registry {
    state: Arc<RwLock<RegistryState>>,
    operation_times: Arc<OperationTimes>,
}

impl Registry {
    pub fn new(operation_times: OperationTimes) -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState::new())),
            operation_times: Arc::new(operation_times),
        }
    }

    /// Register a parsed expression and its tasks
    pub async fn submit(&self, ast: AstNode, source: impl Into<String>) -> ExpressionId {
        let mut state = self.state.write().await;
        state.insert(ast, source.into())
    }

    /// Parse and register expression text. Nothing is registered on a parse error.
    pub async fn submit_text(&self, text: &str) -> Result<ExpressionId, ParseError> {
        let ast = expression::parse(text)?;
        Ok(self.submit(ast, text.trim()).await)
    }

    /// Hand out the oldest ready task, or `None` if nothing is ready right now
    pub async fn next_ready_task(&self) -> Option<TaskAssignment> {
        let mut state = self.state.write().await;
        state.dispatch(&self.operation_times)
    }

    /// Record a worker's outcome for a dispatched task and propagate it
    pub async fn complete_task(
        &self,
        task_id: TaskId,
        outcome: TaskOutcome,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.write().await;
        state.complete(task_id, outcome)
    }

    pub async fn submit_result(&self, task_id: TaskId, value: f64) -> Result<(), RegistryError> {
        self.complete_task(task_id, TaskOutcome::Value(value)).await
    }

    pub async fn report_failure(
        &self,
        task_id: TaskId,
        error: ArithmeticError,
    ) -> Result<(), RegistryError> {
        self.complete_task(task_id, TaskOutcome::Failed(error)).await
    }

    pub async fn get_expression(
        &self,
        id: ExpressionId,
    ) -> Result<ExpressionSnapshot, RegistryError> {
        let state = self.state.read().await;
        state
            .expressions
            .get(&id)
            .map(Expression::snapshot)
            .ok_or(RegistryError::ExpressionNotFound(id))
    }

    /// All expressions, ordered by id
    pub async fn list_expressions(&self) -> Vec<ExpressionSnapshot> {
        let state = self.state.read().await;
        let mut expressions: Vec<_> = state
            .expressions
            .values()
            .map(Expression::snapshot)
            .collect();
        expressions.sort_by_key(|e| e.id);
        expressions
    }

    pub async fn get_task(&self, id: TaskId) -> Option<Task> {
        let state = self.state.read().await;
        state.tasks.get(&id).cloned()
    }

    /// Value written back for an operation node of an expression
    pub async fn resolved_value(&self, id: ExpressionId, node: NodeId) -> Option<f64> {
        let state = self.state.read().await;
        state.expressions.get(&id)?.resolved.get(&node).copied()
    }

    pub async fn stats(&self) -> RegistryStats {
        let state = self.state.read().await;
        state.stats()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(OperationTimes::default())
    }
}
