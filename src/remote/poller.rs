// src/remote/poller.rs

//! Background polling loops feeding the runtime event channel.
//!
//! Two loops: one for the human/robot boundary checks, one for the overall
//! execution state. Both idle until execution has started (read from the
//! shared snapshot) and exit when the runtime event channel closes. Results
//! are last-value-wins; a failed poll is logged and the next tick retries.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::engine::{EngineEvent, SharedSnapshot};

use super::client::RemoteClient;

/// Spawn the polling loops: boundary checks and execution state.
pub fn spawn_pollers(
    client: RemoteClient,
    runtime_tx: mpsc::Sender<EngineEvent>,
    snapshot: SharedSnapshot,
    interval: Duration,
) {
    spawn_check_poller(
        client.clone(),
        runtime_tx.clone(),
        snapshot.clone(),
        interval,
    );
    spawn_execution_poller(client, runtime_tx, snapshot, interval);
}

fn spawn_check_poller(
    client: RemoteClient,
    runtime_tx: mpsc::Sender<EngineEvent>,
    snapshot: SharedSnapshot,
    interval: Duration,
) {
    tokio::spawn(async move {
        info!("dependency check poller started");

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if runtime_tx.is_closed() {
                break;
            }
            if !execution_started(&snapshot) {
                continue;
            }

            match client.check_human().await {
                Ok(reply) => {
                    let event = EngineEvent::HumanCheckPolled {
                        reply,
                        at: Instant::now(),
                    };
                    if runtime_tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(err) => warn!(error = %err, "human dependency check failed"),
            }

            match client.check_robot().await {
                Ok(reply) => {
                    let event = EngineEvent::RobotCheckPolled {
                        reply,
                        at: Instant::now(),
                    };
                    if runtime_tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(err) => warn!(error = %err, "robot dependency check failed"),
            }
        }

        info!("dependency check poller finished");
    });
}

fn spawn_execution_poller(
    client: RemoteClient,
    runtime_tx: mpsc::Sender<EngineEvent>,
    snapshot: SharedSnapshot,
    interval: Duration,
) {
    tokio::spawn(async move {
        info!("execution state poller started");

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if runtime_tx.is_closed() {
                break;
            }
            if !execution_started(&snapshot) {
                continue;
            }

            match client.execution_state().await {
                Ok(reply) => {
                    if runtime_tx
                        .send(EngineEvent::ExecutionStatePolled { reply })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(err) => warn!(error = %err, "execution state poll failed"),
            }
        }

        info!("execution state poller finished");
    });
}

fn execution_started(snapshot: &SharedSnapshot) -> bool {
    match snapshot.lock() {
        Ok(guard) => guard.started,
        Err(_) => {
            warn!("snapshot mutex poisoned; skipping poll");
            false
        }
    }
}
