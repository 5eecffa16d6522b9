// src/task.rs

//! Task data model and initial seeding from the collaborator's task list.

use crate::remote::api::TaskRow;
use crate::types::{Executor, TaskId, TaskName};

/// One work item in the shared sequence.
///
/// Tasks are created once from the collaborator's task list and then mutated
/// in place by the allocation mutator and by order changes. Descriptive
/// fields are carried through untouched for downstream consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub name: TaskName,
    pub description: String,
    pub image: String,
    pub robot_code: String,
    pub time_human: u32,
    pub time_robot: u32,

    /// Current executor, derived from the slider or restored from a previous
    /// session.
    pub assigned_to: Executor,

    /// Allocation control value in [0, 10]; above 5 means Robot.
    pub slider_value: u8,

    /// True when the task can only be done by the human. Assignment and
    /// slider are then immutable.
    pub fixed_to_human: bool,
}

impl Task {
    /// Build a task from a collaborator task row, seeding the assignment.
    ///
    /// Fixed-to-human tasks start assigned to the human with the slider
    /// pinned at 0; every other task starts unassigned at the midpoint.
    pub fn from_row(row: TaskRow) -> Self {
        let (assigned_to, slider_value) = if row.fixed_to_human {
            (Executor::Human, 0)
        } else {
            (Executor::Unassigned, 5)
        };

        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            image: row.image,
            robot_code: row.robot_code,
            time_human: row.time_human,
            time_robot: row.time_robot,
            assigned_to,
            slider_value,
            fixed_to_human: row.fixed_to_human,
        }
    }
}
