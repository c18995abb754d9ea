// SPDX-License-Identifier: MIT

//! Task source backed by the orchestrator's internal HTTP endpoint

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use super::TaskSource;
use crate::calc::error::{CalcError, RegistryError, Result};
use crate::calc::graph::TaskId;
use crate::orchestrator::types::{ErrorBody, TaskAssignment, TaskEnvelope, TaskReport};

pub const TASK_PATH: &str = "internal/task";

pub struct HttpTaskSource {
    client: Client,
    task_url: Url,
}

impl HttpTaskSource {
    pub fn new(orchestrator_url: &Url) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            task_url: orchestrator_url.join(TASK_PATH)?,
        })
    }

    pub fn task_url(&self) -> &Url {
        &self.task_url
    }
}

#[async_trait]
impl TaskSource for HttpTaskSource {
    async fn poll_task(&self) -> Result<Option<TaskAssignment>> {
        let response = self.client.get(self.task_url.clone()).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let envelope: TaskEnvelope = response.json().await?;
                Ok(Some(envelope.task))
            }
            status => Err(CalcError::protocol(format!(
                "GET {} returned {}",
                self.task_url, status
            ))),
        }
    }

    async fn report(&self, report: TaskReport) -> Result<()> {
        let id = report.id;
        let response = self
            .client
            .post(self.task_url.clone())
            .json(&report)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body: Option<ErrorBody> = response.json().await.ok();
        match body.as_ref().and_then(|b| registry_error(b, id)) {
            Some(e) => Err(e.into()),
            None => Err(CalcError::protocol(format!(
                "POST {} returned {}: {}",
                self.task_url,
                status,
                body.map(|b| b.error).unwrap_or_default()
            ))),
        }
    }
}

/// Rebuild the registry error from the `kind` the server sent back
fn registry_error(body: &ErrorBody, id: TaskId) -> Option<RegistryError> {
    match body.kind.as_deref()? {
        "task_not_found" => Some(RegistryError::TaskNotFound(id)),
        "already_completed" => Some(RegistryError::AlreadyCompleted(id)),
        "task_not_dispatched" => Some(RegistryError::TaskNotDispatched(id)),
        _ => None,
    }
}
