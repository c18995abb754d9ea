// SPDX-License-Identifier: MIT

//! Polling workers
//!
//! A worker repeatedly asks a `TaskSource` for one ready task, waits the
//! task's simulated operation time, computes it and reports the outcome.
//! When nothing is ready it sleeps for the poll interval and asks again.

mod http;

pub use http::HttpTaskSource;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::registry::Registry;
use super::types::{TaskAssignment, TaskReport};
use crate::calc::error::{CalcError, RegistryError, Result};

/// Where workers get tasks from and send outcomes to
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// One ready task, or `None` when there is nothing to do right now
    async fn poll_task(&self) -> Result<Option<TaskAssignment>>;

    /// Deliver the outcome of a previously polled task
    async fn report(&self, report: TaskReport) -> Result<()>;
}

#[async_trait]
impl TaskSource for Registry {
    async fn poll_task(&self) -> Result<Option<TaskAssignment>> {
        Ok(self.next_ready_task().await)
    }

    async fn report(&self, report: TaskReport) -> Result<()> {
        let outcome = report
            .outcome()
            .ok_or_else(|| CalcError::protocol("report needs exactly one of result or error"))?;
        self.complete_task(report.id, outcome).await?;
        Ok(())
    }
}

pub struct Worker {
    name: String,
    source: Arc<dyn TaskSource>,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(
        name: impl Into<String>,
        source: Arc<dyn TaskSource>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            poll_interval,
        }
    }

    /// Process at most one task. Returns whether a task was taken.
    pub async fn step(&self) -> Result<bool> {
        let Some(task) = self.source.poll_task().await? else {
            return Ok(false);
        };

        log::debug!(
            "{}: computing task {} ({} {} {})",
            self.name,
            task.id,
            task.arg1,
            task.operation,
            task.arg2
        );
        let delay = task.operation_time();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let outcome = task.compute();
        match self.source.report(TaskReport::new(task.id, outcome)).await {
            Ok(()) => {}
            // The expression already failed elsewhere; nothing left to do for this task
            Err(CalcError::Registry(e @ RegistryError::AlreadyCompleted(_))) => {
                log::warn!("{}: {}", self.name, e);
            }
            Err(e) => return Err(e),
        }
        Ok(true)
    }

    /// Keep processing tasks until `shutdown` flips to true
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        log::info!("{} started", self.name);

        while !*shutdown.borrow() {
            let idle = match self.step().await {
                Ok(true) => continue,
                Ok(false) => true,
                Err(e) => {
                    log::warn!("{}: {}", self.name, e);
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        log::info!("{} stopped", self.name);
    }
}

/// Start `count` workers sharing one task source
pub fn spawn_workers(
    source: Arc<dyn TaskSource>,
    count: usize,
    poll_interval: Duration,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|i| {
            let worker = Worker::new(format!("worker-{}", i), source.clone(), poll_interval);
            tokio::spawn(worker.run(shutdown.clone()))
        })
        .collect()
}
