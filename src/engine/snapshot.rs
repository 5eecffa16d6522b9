// src/engine/snapshot.rs

//! Read-only view of engine state shared with the console.
//!
//! The runtime publishes a fresh snapshot after every state change; the
//! console reads it to render status and to resolve operator-typed display
//! names back to ids. The snapshot is a plain value behind a mutex, never a
//! live reference into the core.

use std::sync::{Arc, Mutex};

use crate::gate::GateStatus;
use crate::seq::{Block, BlockId, BlockKind};
use crate::task::Task;
use crate::types::{SessionMode, TaskId, TaskName};

/// One sequence block as shown to the operator.
#[derive(Debug, Clone)]
pub struct BlockHandle {
    pub id: BlockId,
    pub kind: BlockKind,
    pub name: String,
    pub tasks: Vec<TaskName>,
}

impl From<&Block> for BlockHandle {
    fn from(block: &Block) -> Self {
        Self {
            id: block.id().clone(),
            kind: block.kind(),
            name: block.name().to_string(),
            tasks: block.task_names().to_vec(),
        }
    }
}

/// Point-in-time view of the engine.
#[derive(Debug, Clone, Default)]
pub struct EngineSnapshot {
    pub participant: String,
    pub mode: SessionMode,
    pub tasks: Vec<Task>,
    pub blocks: Vec<BlockHandle>,
    pub gate: GateStatus,
    pub applied: bool,
    pub started: bool,
    pub editable: bool,
    pub human_step: usize,
    pub current_human_task: Option<TaskName>,
    pub human_finished: usize,
    pub human_total: usize,
    pub robot_finished: usize,
    pub robot_total: usize,
    pub all_finished: bool,
}

impl EngineSnapshot {
    /// Resolve an operator-typed block name to its id. Trimmed and
    /// case-insensitive, first match in sequence order wins.
    pub fn block_id_by_name(&self, name: &str) -> Option<BlockId> {
        let wanted = name.trim();
        self.blocks
            .iter()
            .find(|block| block.name.eq_ignore_ascii_case(wanted))
            .map(|block| block.id.clone())
    }

    /// Resolve an operator-typed task name to its id, same matching rules.
    pub fn task_id_by_name(&self, name: &str) -> Option<TaskId> {
        let wanted = name.trim();
        self.tasks
            .iter()
            .find(|task| task.name.eq_ignore_ascii_case(wanted))
            .map(|task| task.id.clone())
    }
}

/// Snapshot cell shared between the runtime (writer) and the console
/// (reader).
pub type SharedSnapshot = Arc<Mutex<EngineSnapshot>>;

pub fn new_shared() -> SharedSnapshot {
    Arc::new(Mutex::new(EngineSnapshot::default()))
}
