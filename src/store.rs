// src/store.rs

//! Owned, ordered task state.
//!
//! The store is the single source of truth for the flattened task order and
//! per-task assignment state. All mutation goes through the narrow methods
//! here; callers are responsible for session-level gating (editability).

use tracing::{debug, warn};

use crate::remote::api::AllocationRow;
use crate::task::Task;
use crate::types::{Executor, TaskId};

/// Ordered collection of tasks plus assignment/slider state.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    /// Build a store from raw collaborator task rows, preserving row order.
    pub fn from_rows(rows: Vec<crate::remote::api::TaskRow>) -> Self {
        Self::new(rows.into_iter().map(Task::from_row).collect())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in their current canonical order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Position of a task id in the current order.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Position of a task name in the current order.
    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.name == name)
    }

    pub fn task_by_id(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_by_name(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Tasks currently assigned to the human, in flat order.
    pub fn human_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.assigned_to == Executor::Human)
            .collect()
    }

    /// Tasks currently assigned to the robot, in flat order.
    pub fn robot_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.assigned_to == Executor::Robot)
            .collect()
    }

    /// Update a task's assignment from a control value in [0, 10].
    ///
    /// Above the midpoint assigns the robot; the midpoint itself stays with
    /// the human. Fixed-to-human tasks are never changed. Returns true when
    /// the task was updated.
    pub fn set_allocation(&mut self, id: &str, value: u8) -> bool {
        let value = value.min(10);

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(task_id = %id, "allocation change for unknown task ignored");
            return false;
        };

        if task.fixed_to_human {
            debug!(task = %task.name, "allocation change for fixed-to-human task ignored");
            return false;
        }

        task.assigned_to = if value > 5 {
            Executor::Robot
        } else {
            Executor::Human
        };
        task.slider_value = value;
        debug!(
            task = %task.name,
            value,
            assigned_to = %task.assigned_to,
            "allocation updated"
        );
        true
    }

    /// Reorder the store to match the given id order.
    ///
    /// Ids that do not resolve are skipped; tasks missing from `order` keep
    /// their relative position at the end. Both cases are logged since the
    /// flattened sequence is expected to cover the store exactly.
    pub fn apply_order(&mut self, order: &[TaskId]) {
        let mut remaining = std::mem::take(&mut self.tasks);
        let mut reordered = Vec::with_capacity(remaining.len());

        for id in order {
            match remaining.iter().position(|t| &t.id == id) {
                Some(idx) => reordered.push(remaining.remove(idx)),
                None => warn!(task_id = %id, "ordered id not present in store"),
            }
        }

        if !remaining.is_empty() {
            let names: Vec<_> = remaining.iter().map(|t| t.name.clone()).collect();
            warn!(?names, "tasks missing from new order; appending in old order");
            reordered.append(&mut remaining);
        }

        self.tasks = reordered;
    }

    /// Merge restored allocation rows into the store.
    ///
    /// Rows are matched by trimmed, case-insensitive name. Fixed-to-human
    /// tasks are left untouched so the fixed invariant holds. Returns how
    /// many tasks were updated.
    pub fn restore_allocations(&mut self, rows: &[AllocationRow]) -> usize {
        let mut merged = 0;

        for task in self.tasks.iter_mut() {
            if task.fixed_to_human {
                continue;
            }

            let matched = rows.iter().find(|row| {
                row.name.trim().eq_ignore_ascii_case(task.name.trim())
            });

            if let Some(row) = matched {
                task.assigned_to = row.executor();
                task.slider_value = row.slider_as_control();
                merged += 1;
            }
        }

        merged
    }
}
