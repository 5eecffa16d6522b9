// src/remote/backend.rs

//! Pluggable remote backend abstraction.
//!
//! The runtime talks to a `RemoteBackend` instead of the HTTP client
//! directly. This makes it easy to swap in a fake backend in tests while
//! keeping the production implementation here.
//!
//! - `RealRemoteBackend` is the default implementation used by `cotask`. It
//!   fires collaborator calls on background tasks so a slow endpoint never
//!   stalls the event loop; fetch results flow back in as engine events.
//! - Tests can provide their own `RemoteBackend` that records calls and
//!   answers with canned replies.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::EngineEvent;
use crate::errors::Result;
use crate::seq::BlockSummary;
use crate::types::TaskName;

use super::api::{LogEventRequest, RobotStartRequest, SaveOrderRequest, TaskExport};
use super::client::RemoteClient;

/// Trait abstracting how remote work is carried out.
///
/// Production code uses [`RealRemoteBackend`]; tests can provide their own
/// implementation that doesn't touch the network.
pub trait RemoteBackend: Send {
    /// Re-fetch the task list and dependency mapping; results come back as a
    /// `TaskSetLoaded` event.
    fn reload_tasks(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Fetch the previous round's allocation; results come back as a
    /// `PreviousAllocationLoaded` event.
    fn fetch_previous_allocation(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Persist the operator's block ordering.
    fn save_block_order(
        &mut self,
        blocks: Vec<BlockSummary>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Launch remote execution with the final allocation.
    fn start_execution(
        &mut self,
        tasks: Vec<TaskExport>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Report the named human task as complete.
    fn complete_human_task(
        &mut self,
        task: TaskName,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Clear remote execution and dependency state.
    fn reset_remote(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Append an entry to the participant event log.
    fn log_event(
        &mut self,
        event: String,
        details: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real remote backend used in production.
///
/// Every call is fire-and-forget: the work runs on a spawned task, failures
/// are logged and never fed back as errors. Fetches send their results into
/// the runtime event channel.
pub struct RealRemoteBackend {
    client: RemoteClient,
    runtime_tx: mpsc::Sender<EngineEvent>,
    participant: String,
    task_mode: String,
}

impl RealRemoteBackend {
    pub fn new(
        client: RemoteClient,
        runtime_tx: mpsc::Sender<EngineEvent>,
        participant: String,
        task_mode: String,
    ) -> Self {
        Self {
            client,
            runtime_tx,
            participant,
            task_mode,
        }
    }
}

impl RemoteBackend for RealRemoteBackend {
    fn reload_tasks(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone what the spawned task needs so the future doesn't borrow
        // `self` across `await`.
        let client = self.client.clone();
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            tokio::spawn(async move {
                let tasks = match client.tasks().await {
                    Ok(rows) => rows,
                    Err(err) => {
                        warn!(error = %err, "failed to reload task list");
                        return;
                    }
                };
                let dependencies = match client.dependencies().await {
                    Ok(reply) => reply,
                    Err(err) => {
                        warn!(error = %err, "failed to reload task dependencies");
                        return;
                    }
                };
                if tx
                    .send(EngineEvent::TaskSetLoaded {
                        tasks,
                        dependencies,
                    })
                    .await
                    .is_err()
                {
                    debug!("runtime gone; dropping reloaded task set");
                }
            });
            Ok(())
        })
    }

    fn fetch_previous_allocation(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let client = self.client.clone();
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            tokio::spawn(async move {
                match client.previous_allocation().await {
                    Ok(rows) => {
                        if tx
                            .send(EngineEvent::PreviousAllocationLoaded { rows })
                            .await
                            .is_err()
                        {
                            debug!("runtime gone; dropping previous allocation");
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to load previous allocation");
                    }
                }
            });
            Ok(())
        })
    }

    fn save_block_order(
        &mut self,
        blocks: Vec<BlockSummary>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let client = self.client.clone();
        let request = SaveOrderRequest {
            participant_id: self.participant.clone(),
            block_order: blocks,
            task_mode: self.task_mode.clone(),
        };

        Box::pin(async move {
            tokio::spawn(async move {
                if let Err(err) = client.save_order(&request).await {
                    warn!(error = %err, "failed to save participant block order");
                }
            });
            Ok(())
        })
    }

    fn start_execution(
        &mut self,
        tasks: Vec<TaskExport>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let client = self.client.clone();

        Box::pin(async move {
            tokio::spawn(async move {
                if let Err(err) = client.start_execution(&tasks).await {
                    warn!(error = %err, "failed to start remote execution");
                    return;
                }
                let request = RobotStartRequest { tasks };
                if let Err(err) = client.robot_start(&request).await {
                    warn!(error = %err, "failed to start robot execution");
                }
            });
            Ok(())
        })
    }

    fn complete_human_task(
        &mut self,
        task: TaskName,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let client = self.client.clone();

        Box::pin(async move {
            tokio::spawn(async move {
                if let Err(err) = client.complete_human_task(&task).await {
                    warn!(task = %task, error = %err, "failed to report human task complete");
                }
            });
            Ok(())
        })
    }

    fn reset_remote(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let client = self.client.clone();

        Box::pin(async move {
            tokio::spawn(async move {
                if let Err(err) = client.robot_reset().await {
                    warn!(error = %err, "failed to reset robot state");
                }
                if let Err(err) = client.reset_dependencies().await {
                    warn!(error = %err, "failed to reset dependency state");
                }
            });
            Ok(())
        })
    }

    fn log_event(
        &mut self,
        event: String,
        details: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let client = self.client.clone();
        let request = LogEventRequest {
            participant_id: self.participant.clone(),
            event,
            details,
        };

        Box::pin(async move {
            tokio::spawn(async move {
                if let Err(err) = client.log_event(&request).await {
                    warn!(event = %request.event, error = %err, "failed to log event");
                }
            });
            Ok(())
        })
    }
}
