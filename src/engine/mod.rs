// src/engine/mod.rs

//! Orchestration engine for cotask.
//!
//! This module ties together:
//! - the task store and the block sequence built over it
//! - the session lifecycle (apply, start, human step cursor)
//! - the dependency gate fed by remote boundary checks
//! - the main runtime event loop that reacts to:
//!   - console commands
//!   - remote poll results
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::time::Instant;

use crate::gate::GateStatus;
use crate::remote::api::{AllocationRow, CheckReply, DependencyReply, ExecutionStateReply, TaskRow};
use crate::seq::{BlockId, BlockSummary};
use crate::task::Task;
use crate::types::{TaskId, TaskName};

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// If true, exit the runtime once every assigned task on both sides has
    /// finished (used for `--once`).
    pub exit_when_finished: bool,
}

/// Events flowing into the runtime from the console, the pollers and the
/// remote backend.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A fresh task list plus dependency mapping arrived from the
    /// collaborator.
    TaskSetLoaded {
        tasks: Vec<TaskRow>,
        dependencies: DependencyReply,
    },
    /// Operator locked in the current allocation.
    ApplyPressed,
    /// Previous-round allocation rows arrived (replay apply).
    PreviousAllocationLoaded { rows: Vec<AllocationRow> },
    /// Operator launched execution.
    StartPressed,
    /// Operator asked to move a block into another block's slot.
    MoveBlock { source: BlockId, target: BlockId },
    /// Operator changed a task's allocation control value.
    SetAllocation { task_id: TaskId, value: u8 },
    /// Operator confirmed the current human task is done.
    AdvanceHuman,
    /// Operator stepped the human cursor back.
    RetreatHuman,
    /// Poll result for the human-side boundary check.
    HumanCheckPolled { reply: CheckReply, at: Instant },
    /// Poll result for the robot-side boundary check.
    RobotCheckPolled { reply: CheckReply, at: Instant },
    /// Poll result for the overall execution state.
    ExecutionStatePolled { reply: ExecutionStateReply },
    /// Operator asked for a full session reset.
    ResetRequested,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Notifications pushed to the operator surface when state changes.
#[derive(Debug, Clone)]
pub enum EngineNotification {
    /// Block order (and with it the flattened task order) changed.
    OrderChanged {
        order: Vec<Task>,
        blocks: Vec<BlockSummary>,
    },
    /// The combined dependency-gate status changed.
    GateChanged(GateStatus),
    /// The human step cursor moved.
    StepChanged {
        step: usize,
        task: Option<TaskName>,
    },
    /// Every assigned task on both sides has finished.
    SessionFinished,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;
pub mod session;
pub mod snapshot;

pub use self::core::CoreEngine;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
pub use session::SessionState;
pub use snapshot::{new_shared, BlockHandle, EngineSnapshot, SharedSnapshot};
