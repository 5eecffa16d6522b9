// src/seq/block.rs

//! Movable units of the assembled sequence.

use serde::Serialize;

use crate::types::{TaskId, TaskName};

/// Stable handle for a block within one assembly.
///
/// Blocks carry no identity across rebuilds, so the id is derived from the
/// first member task (task ids are stable for the whole session).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId(TaskId);

impl BlockId {
    pub fn new(anchor: TaskId) -> Self {
        Self(anchor)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block:{}", self.0)
    }
}

/// Whether a block is a dependency-linked group or a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Group,
    Single,
}

/// One atomic movable unit: a dependency group or an independent task.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    id: BlockId,
    kind: BlockKind,
    /// Resolved display name (explicit label, category match or raw name).
    name: String,
    /// Member task ids in store order at assembly time.
    task_ids: Vec<TaskId>,
    /// Member task names, parallel to `task_ids`.
    task_names: Vec<TaskName>,
    /// Minimum store index among members at assembly time.
    natural_key: usize,
}

impl Block {
    pub fn new(
        kind: BlockKind,
        name: String,
        task_ids: Vec<TaskId>,
        task_names: Vec<TaskName>,
        natural_key: usize,
    ) -> Self {
        debug_assert!(!task_ids.is_empty());
        debug_assert_eq!(task_ids.len(), task_names.len());
        let id = BlockId::new(task_ids[0].clone());
        Self {
            id,
            kind,
            name,
            task_ids,
            task_names,
            natural_key,
        }
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn task_ids(&self) -> &[TaskId] {
        &self.task_ids
    }

    pub fn task_names(&self) -> &[TaskName] {
        &self.task_names
    }

    pub fn natural_key(&self) -> usize {
        self.natural_key
    }

    pub fn len(&self) -> usize {
        self.task_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.task_ids.is_empty()
    }

    pub fn contains_task(&self, id: &str) -> bool {
        self.task_ids.iter().any(|t| t == id)
    }

    /// Whether any member task name contains the given keyword
    /// (case-insensitive).
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.task_names
            .iter()
            .any(|name| name.to_lowercase().contains(&keyword))
    }

    pub fn summary(&self) -> BlockSummary {
        BlockSummary {
            kind: self.kind,
            name: self.name.clone(),
            tasks: self.task_names.clone(),
        }
    }
}

/// Compact block description emitted with order-change notifications and
/// persisted by the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSummary {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub name: String,
    pub tasks: Vec<TaskName>,
}
