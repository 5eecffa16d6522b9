// src/engine/core.rs

//! Pure core engine state machine.
//!
//! This module contains a synchronous, deterministic "core engine" that
//! consumes [`EngineEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - executing remote calls through the backend
//! - handling Ctrl+C / shutdown
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, or network access.

use std::collections::HashMap;

use crate::engine::event_handlers::{
    handle_advance_human, handle_apply, handle_execution_state, handle_human_check,
    handle_move_block, handle_previous_allocation, handle_reset, handle_retreat_human,
    handle_robot_check, handle_set_allocation, handle_start, handle_task_set_loaded, CoreStep,
};
use crate::engine::session::SessionState;
use crate::engine::snapshot::{BlockHandle, EngineSnapshot};
use crate::engine::{EngineEvent, EngineOptions};
use crate::gate::{DependencyGate, GateStatus};
use crate::seq::{CategoryTable, Sequence};
use crate::store::TaskStore;
use crate::types::TaskName;

/// Pure core engine state.
///
/// This owns:
/// - the task store and the block sequence built over it
/// - the dependency mapping and group labels from the last load
/// - the session lifecycle state and the dependency gate
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreEngine {
    pub(crate) store: TaskStore,
    pub(crate) dependencies: HashMap<TaskName, Vec<TaskName>>,
    pub(crate) labels: HashMap<TaskName, String>,
    pub(crate) sequence: Sequence,
    pub(crate) gate: DependencyGate,
    pub(crate) session: SessionState,
    pub(crate) categories: CategoryTable,
    pub(crate) terminal_keyword: String,
    pub(crate) saved_order: Option<Vec<String>>,
    pub(crate) options: EngineOptions,
}

impl CoreEngine {
    /// Build an empty core; the first `TaskSetLoaded` event fills it.
    pub fn new(
        session: SessionState,
        categories: CategoryTable,
        terminal_keyword: String,
        saved_order: Option<Vec<String>>,
        options: EngineOptions,
    ) -> Self {
        Self {
            store: TaskStore::default(),
            dependencies: HashMap::new(),
            labels: HashMap::new(),
            sequence: Sequence::default(),
            gate: DependencyGate::new(),
            session,
            categories,
            terminal_keyword,
            saved_order,
            options,
        }
    }

    /// Expose the task store (for tests).
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Expose the block sequence (for tests).
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Expose the session state (for tests).
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Expose the last published gate status (for tests).
    pub fn gate_status(&self) -> &GateStatus {
        self.gate.status()
    }

    /// Capture a point-in-time view for the operator surface.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            participant: self.session.participant().to_string(),
            mode: self.session.mode(),
            tasks: self.store.tasks().to_vec(),
            blocks: self
                .sequence
                .blocks()
                .iter()
                .map(BlockHandle::from)
                .collect(),
            gate: self.gate.status().clone(),
            applied: self.session.applied(),
            started: self.session.started(),
            editable: self.session.order_editable(),
            human_step: self.session.human_step(),
            current_human_task: self.session.current_human_task(&self.store),
            human_finished: self.session.human_finished().len(),
            human_total: self.store.human_tasks().len(),
            robot_finished: self.session.robot_finished().len(),
            robot_total: self.store.robot_tasks().len(),
            all_finished: self.session.all_finished(&self.store),
        }
    }

    /// Handle a single engine event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: EngineEvent) -> CoreStep {
        match event {
            EngineEvent::TaskSetLoaded {
                tasks,
                dependencies,
            } => handle_task_set_loaded(self, tasks, dependencies),
            EngineEvent::ApplyPressed => handle_apply(self),
            EngineEvent::PreviousAllocationLoaded { rows } => {
                handle_previous_allocation(self, rows)
            }
            EngineEvent::StartPressed => handle_start(self),
            EngineEvent::MoveBlock { source, target } => handle_move_block(self, source, target),
            EngineEvent::SetAllocation { task_id, value } => {
                handle_set_allocation(self, task_id, value)
            }
            EngineEvent::AdvanceHuman => handle_advance_human(self),
            EngineEvent::RetreatHuman => handle_retreat_human(self),
            EngineEvent::HumanCheckPolled { reply, at } => handle_human_check(self, reply, at),
            EngineEvent::RobotCheckPolled { reply, at } => handle_robot_check(self, reply, at),
            EngineEvent::ExecutionStatePolled { reply } => handle_execution_state(self, reply),
            EngineEvent::ResetRequested => handle_reset(self),
            EngineEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}
