// src/remote/api.rs

//! Wire types for the collaborator service.
//!
//! Field names follow the collaborator's JSON contract, which mixes snake
//! case, camel case and one pascal-case key (`RobotCode`); serde renames keep
//! the Rust side uniform.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::task::Task;
use crate::types::Executor;

/// One row of `GET /tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub time_human: u32,
    #[serde(default)]
    pub time_robot: u32,
    #[serde(default, rename = "assignedTo")]
    pub assigned_to: String,
    #[serde(default, rename = "sliderValue")]
    pub slider_value: f64,
    #[serde(default, rename = "RobotCode")]
    pub robot_code: String,
    #[serde(default, rename = "fixedToHuman")]
    pub fixed_to_human: bool,
}

/// Reply of `GET /get-task-dependencies`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependencyReply {
    /// Task name -> names it depends on.
    #[serde(default)]
    pub dependencies: HashMap<String, Vec<String>>,
    /// Task name -> explicit display label for its block.
    #[serde(default)]
    pub group_names: HashMap<String, String>,
}

/// Reply of `GET /check-human-dependency` and `GET /check-robot-dependency`.
///
/// The collaborator sends extra diagnostic fields; only these matter here.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CheckReply {
    pub allowed: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub current_task: Option<String>,
}

/// Reply of `GET /get-execution-state`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionStateReply {
    #[serde(default)]
    pub human_assigned_tasks: Vec<String>,
    #[serde(default)]
    pub robot_assigned_tasks: Vec<String>,
    #[serde(default)]
    pub all_finished_tasks: Vec<String>,
    #[serde(default)]
    pub current_human_task: Option<String>,
    #[serde(default)]
    pub current_robot_task: Option<String>,
}

/// One row of `GET /previous-allocation`.
///
/// Slider values come back as floats read from a spreadsheet, so they are
/// normalised before entering the store.
#[derive(Debug, Clone, Deserialize)]
pub struct AllocationRow {
    pub name: String,
    #[serde(default, rename = "assignedTo")]
    pub assigned_to: String,
    #[serde(default, rename = "sliderValue")]
    pub slider_value: f64,
}

impl AllocationRow {
    /// Restored executor; unparseable values stay unassigned.
    pub fn executor(&self) -> Executor {
        self.assigned_to.parse().unwrap_or(Executor::Unassigned)
    }

    /// Slider value rounded and clamped into the control range [0, 10].
    pub fn slider_as_control(&self) -> u8 {
        if self.slider_value.is_nan() {
            return 5;
        }
        self.slider_value.round().clamp(0.0, 10.0) as u8
    }
}

/// Reply of `GET /participant-count`.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantCountReply {
    pub count: u64,
}

/// One task row as posted to `/start-execution` and `/robot/start`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskExport {
    pub id: String,
    pub name: String,
    #[serde(rename = "assignedTo")]
    pub assigned_to: Executor,
    #[serde(rename = "sliderValue")]
    pub slider_value: u8,
    #[serde(rename = "RobotCode")]
    pub robot_code: String,
    #[serde(rename = "fixedToHuman")]
    pub fixed_to_human: bool,
}

impl From<&Task> for TaskExport {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            name: task.name.clone(),
            assigned_to: task.assigned_to,
            slider_value: task.slider_value,
            robot_code: task.robot_code.clone(),
            fixed_to_human: task.fixed_to_human,
        }
    }
}

/// Body of `POST /robot/start`.
#[derive(Debug, Clone, Serialize)]
pub struct RobotStartRequest {
    pub tasks: Vec<TaskExport>,
}

/// Body of `POST /save-participant-order`.
#[derive(Debug, Clone, Serialize)]
pub struct SaveOrderRequest {
    #[serde(rename = "participantId")]
    pub participant_id: String,
    #[serde(rename = "blockOrder")]
    pub block_order: Vec<crate::seq::BlockSummary>,
    #[serde(rename = "taskMode")]
    pub task_mode: String,
}

/// Body of `POST /log-event`.
#[derive(Debug, Clone, Serialize)]
pub struct LogEventRequest {
    #[serde(rename = "participantId")]
    pub participant_id: String,
    pub event: String,
    pub details: serde_json::Value,
}
