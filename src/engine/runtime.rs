// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::remote::RemoteBackend;

use super::core::CoreEngine;
use super::snapshot::SharedSnapshot;
use super::{CoreCommand, EngineEvent, EngineNotification};

/// Drives the core engine in response to `EngineEvent`s, and delegates
/// remote calls to a `RemoteBackend`.
///
/// This is a pure IO shell around `CoreEngine`, which contains all the
/// session semantics. This struct handles async IO: reading events from
/// channels, publishing snapshots and notifications, and forwarding remote
/// work to the backend.
pub struct Runtime<B: RemoteBackend> {
    core: CoreEngine,
    event_rx: mpsc::Receiver<EngineEvent>,
    backend: B,
    notify_tx: Option<mpsc::Sender<EngineNotification>>,
    snapshot: SharedSnapshot,
}

impl<B: RemoteBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: RemoteBackend> Runtime<B> {
    pub fn new(
        core: CoreEngine,
        event_rx: mpsc::Receiver<EngineEvent>,
        backend: B,
        notify_tx: Option<mpsc::Sender<EngineNotification>>,
        snapshot: SharedSnapshot,
    ) -> Self {
        Self {
            core,
            event_rx,
            backend,
            notify_tx,
            snapshot,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `EngineEvent`s from `event_rx`.
    /// - Feeds them into the pure core.
    /// - Executes commands returned by the core (remote calls, snapshot
    ///   publication, notifications, exit).
    pub async fn run(mut self) -> Result<()> {
        info!("cotask runtime started");

        // Seed the shared snapshot so the console sees configured state even
        // before the first load completes.
        self.publish_snapshot();

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            // Feed the event into the pure core and get commands back.
            let step = self.core.step(event);

            // Execute the commands.
            for command in step.commands {
                self.execute_command(command).await?;
            }

            // If the core says to stop, break out of the loop.
            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::Notify(notification) => {
                self.send_notification(notification).await;
            }
            CoreCommand::PublishSnapshot(snapshot) => {
                match self.snapshot.lock() {
                    Ok(mut guard) => *guard = snapshot,
                    Err(_) => {
                        warn!("snapshot mutex poisoned; dropping update");
                    }
                }
            }
            CoreCommand::ReloadTaskSet => {
                self.backend.reload_tasks().await?;
            }
            CoreCommand::FetchPreviousAllocation => {
                self.backend.fetch_previous_allocation().await?;
            }
            CoreCommand::PersistBlockOrder { blocks } => {
                self.backend.save_block_order(blocks).await?;
            }
            CoreCommand::StartRemoteExecution { tasks } => {
                self.backend.start_execution(tasks).await?;
            }
            CoreCommand::CompleteHumanTask { task } => {
                self.backend.complete_human_task(task).await?;
            }
            CoreCommand::ResetRemote => {
                self.backend.reset_remote().await?;
            }
            CoreCommand::LogEvent { event, details } => {
                self.backend.log_event(event, details).await?;
            }
            CoreCommand::RequestExit => {
                // The core already returns keep_running=false in this case,
                // so this command only needs a log entry.
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    fn publish_snapshot(&mut self) {
        let snapshot = self.core.snapshot();
        match self.snapshot.lock() {
            Ok(mut guard) => *guard = snapshot,
            Err(_) => warn!("snapshot mutex poisoned; dropping update"),
        }
    }

    async fn send_notification(&mut self, notification: EngineNotification) {
        let Some(tx) = &self.notify_tx else {
            return;
        };
        if tx.send(notification).await.is_err() {
            debug!("notification receiver dropped; disabling notifications");
            self.notify_tx = None;
        }
    }
}
