// src/gate/mod.rs

//! Merged progression gate over the human and robot dependency checks.
//!
//! Two independently polled boundary signals feed one combined status. A
//! robot block strictly masks a simultaneous human block in the combined
//! status; progression decisions only consult the human signal.

use std::fmt;
use std::time::Instant;

use crate::remote::api::CheckReply;

pub mod signal;

pub use signal::{BoundarySignal, SignalState};

/// Combined gate status shown to the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GateStatus {
    #[default]
    AllClear,
    HumanBlocked { message: String },
    RobotBlocked { message: String },
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateStatus::AllClear => write!(f, "all dependencies met"),
            GateStatus::HumanBlocked { message } => write!(f, "{message}"),
            GateStatus::RobotBlocked { message } => write!(f, "robot: {message}"),
        }
    }
}

/// The dependency gate: two signals plus the last published combined status.
#[derive(Debug, Clone)]
pub struct DependencyGate {
    human: BoundarySignal,
    robot: BoundarySignal,
    published: GateStatus,
}

impl Default for DependencyGate {
    fn default() -> Self {
        Self {
            human: BoundarySignal::new(),
            robot: BoundarySignal::new(),
            published: GateStatus::AllClear,
        }
    }
}

impl DependencyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_human(&mut self, reply: &CheckReply, at: Instant) {
        self.human.observe(reply.allowed, reply.message.clone(), at);
    }

    pub fn observe_robot(&mut self, reply: &CheckReply, at: Instant) {
        self.robot.observe(reply.allowed, reply.message.clone(), at);
    }

    /// Pure merge of the two latest signal states.
    ///
    /// A disallowing check only produces a blocked status when it supplies a
    /// message; the robot side wins when both are blocked.
    pub fn combined(&self) -> GateStatus {
        if let Some(message) = self.robot.blocking_message() {
            return GateStatus::RobotBlocked {
                message: message.to_string(),
            };
        }
        if let Some(message) = self.human.blocking_message() {
            return GateStatus::HumanBlocked {
                message: message.to_string(),
            };
        }
        GateStatus::AllClear
    }

    /// Recompute the combined status, returning it only when it differs from
    /// the last published one.
    pub fn refresh(&mut self) -> Option<GateStatus> {
        let next = self.combined();
        if next == self.published {
            return None;
        }
        self.published = next.clone();
        Some(next)
    }

    /// Last published combined status.
    pub fn status(&self) -> &GateStatus {
        &self.published
    }

    /// Whether the human may advance to the next step right now.
    ///
    /// Independent of the combined status: a robot block masking the
    /// message does not unblock the human.
    pub fn human_allows_progress(&self) -> bool {
        self.human.allows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(allowed: bool, message: &str) -> CheckReply {
        CheckReply {
            allowed,
            message: message.to_string(),
            current_task: None,
        }
    }

    #[test]
    fn robot_block_masks_human_block() {
        let mut gate = DependencyGate::new();
        let now = Instant::now();
        gate.observe_human(&reply(false, "H"), now);
        gate.observe_robot(&reply(false, "R"), now);

        assert_eq!(
            gate.combined(),
            GateStatus::RobotBlocked {
                message: "R".to_string()
            }
        );
        assert!(!gate.human_allows_progress());
    }

    #[test]
    fn refresh_reports_only_changes() {
        let mut gate = DependencyGate::new();
        let now = Instant::now();

        // Initial all-clear matches the seeded published status.
        assert_eq!(gate.refresh(), None);

        gate.observe_human(&reply(false, "H"), now);
        assert!(gate.refresh().is_some());
        assert_eq!(gate.refresh(), None);

        gate.observe_human(&reply(true, ""), now);
        assert_eq!(gate.refresh(), Some(GateStatus::AllClear));
    }

    #[test]
    fn human_progress_ignores_robot_masking() {
        let mut gate = DependencyGate::new();
        let now = Instant::now();
        gate.observe_human(&reply(true, ""), now);
        gate.observe_robot(&reply(false, "R"), now);

        assert_eq!(
            gate.combined(),
            GateStatus::RobotBlocked {
                message: "R".to_string()
            }
        );
        assert!(gate.human_allows_progress());
    }

    #[test]
    fn disallow_without_message_is_not_a_status_block() {
        let mut gate = DependencyGate::new();
        let now = Instant::now();
        gate.observe_human(&reply(false, ""), now);

        assert_eq!(gate.combined(), GateStatus::AllClear);
        // Progression still refused: the signal itself disallows.
        assert!(!gate.human_allows_progress());
    }
}
