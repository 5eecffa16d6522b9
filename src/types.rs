// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical task id type (opaque, assigned by the collaborator).
pub type TaskId = String;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Who a task is currently assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Executor {
    Human,
    Robot,
    Unassigned,
}

impl Default for Executor {
    fn default() -> Self {
        Executor::Unassigned
    }
}

impl fmt::Display for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executor::Human => write!(f, "Human"),
            Executor::Robot => write!(f, "Robot"),
            Executor::Unassigned => write!(f, "Unassigned"),
        }
    }
}

impl FromStr for Executor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "human" => Ok(Executor::Human),
            "robot" => Ok(Executor::Robot),
            "unassigned" => Ok(Executor::Unassigned),
            other => Err(format!(
                "invalid executor: {other} (expected \"human\", \"robot\" or \"unassigned\")"
            )),
        }
    }
}

/// Which experiment round this session runs.
///
/// - `Record`: first run; the operator's block ordering is persisted on start.
/// - `Replay`: later run; the previous allocation is restored on apply and a
///   configured saved block order (if any) drives the initial block ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Record,
    Replay,
}

impl Default for SessionMode {
    fn default() -> Self {
        SessionMode::Record
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Record => write!(f, "record"),
            SessionMode::Replay => write!(f, "replay"),
        }
    }
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "record" => Ok(SessionMode::Record),
            "replay" => Ok(SessionMode::Replay),
            other => Err(format!(
                "invalid session mode: {other} (expected \"record\" or \"replay\")"
            )),
        }
    }
}
