// src/remote/client.rs

//! Thin typed HTTP client for the collaborator service.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{CotaskError, Result};

use super::api::{
    AllocationRow, CheckReply, DependencyReply, ExecutionStateReply, LogEventRequest,
    ParticipantCountReply, RobotStartRequest, SaveOrderRequest, TaskExport, TaskRow,
};

/// HTTP client for the collaborator endpoints.
///
/// Cheap to clone; the pollers and the backend each hold their own copy.
#[derive(Clone)]
pub struct RemoteClient {
    client: Client,
    base_url: String,
}

impl RemoteClient {
    /// Build a client against the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: ClientBuilder::new()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// `GET /tasks`: the full task list.
    pub async fn tasks(&self) -> Result<Vec<TaskRow>> {
        let response = self.client.get(self.url("tasks")).send().await?;
        decode(response, "tasks").await
    }

    /// `GET /get-task-dependencies`: dependency mapping plus group labels.
    pub async fn dependencies(&self) -> Result<DependencyReply> {
        let response = self
            .client
            .get(self.url("get-task-dependencies"))
            .send()
            .await?;
        decode(response, "task dependencies").await
    }

    /// `GET /check-human-dependency`: boundary check for the human side.
    pub async fn check_human(&self) -> Result<CheckReply> {
        let response = self
            .client
            .get(self.url("check-human-dependency"))
            .send()
            .await?;
        decode(response, "human dependency check").await
    }

    /// `GET /check-robot-dependency`: boundary check for the robot side.
    pub async fn check_robot(&self) -> Result<CheckReply> {
        let response = self
            .client
            .get(self.url("check-robot-dependency"))
            .send()
            .await?;
        decode(response, "robot dependency check").await
    }

    /// `GET /get-execution-state`: assigned and finished task lists.
    pub async fn execution_state(&self) -> Result<ExecutionStateReply> {
        let response = self
            .client
            .get(self.url("get-execution-state"))
            .send()
            .await?;
        decode(response, "execution state").await
    }

    /// `GET /previous-allocation`: the stored allocation of the first round.
    pub async fn previous_allocation(&self) -> Result<Vec<AllocationRow>> {
        let response = self
            .client
            .get(self.url("previous-allocation"))
            .send()
            .await?;
        decode(response, "previous allocation").await
    }

    /// `GET /participant-count`: number of stored participant logs.
    pub async fn participant_count(&self) -> Result<u64> {
        let response = self
            .client
            .get(self.url("participant-count"))
            .send()
            .await?;
        let reply: ParticipantCountReply = decode(response, "participant count").await?;
        Ok(reply.count)
    }

    /// `POST /start-execution`: hand the final allocation to the collaborator.
    pub async fn start_execution(&self, tasks: &[TaskExport]) -> Result<()> {
        let response = self
            .client
            .post(self.url("start-execution"))
            .json(&tasks)
            .send()
            .await?;
        check(response, "start execution")
    }

    /// `POST /robot/start`: hand the robot its share of the tasks.
    pub async fn robot_start(&self, request: &RobotStartRequest) -> Result<()> {
        let response = self
            .client
            .post(self.url("robot/start"))
            .json(request)
            .send()
            .await?;
        check(response, "robot start")
    }

    /// `POST /complete-human-task?task_name=..`: report a human task done.
    pub async fn complete_human_task(&self, task_name: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("complete-human-task"))
            .query(&[("task_name", task_name)])
            .send()
            .await?;
        check(response, "complete human task")
    }

    /// `POST /save-participant-order`: persist the operator's block order.
    pub async fn save_order(&self, request: &SaveOrderRequest) -> Result<()> {
        let response = self
            .client
            .post(self.url("save-participant-order"))
            .json(request)
            .send()
            .await?;
        check(response, "save participant order")
    }

    /// `POST /log-event`: append to the participant event log.
    pub async fn log_event(&self, request: &LogEventRequest) -> Result<()> {
        let response = self
            .client
            .post(self.url("log-event"))
            .json(request)
            .send()
            .await?;
        check(response, "log event")
    }

    /// `POST /robot/reset`: clear robot-side execution state.
    pub async fn robot_reset(&self) -> Result<()> {
        let response = self.client.post(self.url("robot/reset")).send().await?;
        check(response, "robot reset")
    }

    /// `POST /reset-dependencies`: clear the dependency bookkeeping.
    pub async fn reset_dependencies(&self) -> Result<()> {
        let response = self
            .client
            .post(self.url("reset-dependencies"))
            .send()
            .await?;
        check(response, "reset dependencies")
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
    let response = checked(response, what)?;
    debug!(what, "decoding collaborator reply");
    Ok(response.json().await?)
}

fn check(response: reqwest::Response, what: &str) -> Result<()> {
    checked(response, what).map(|_| ())
}

fn checked(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(CotaskError::RemoteError(format!(
            "{what} request failed with status {status}"
        )));
    }
    Ok(response)
}
