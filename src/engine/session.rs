// src/engine/session.rs

//! Session lifecycle state: apply/start gating, the human step cursor, and
//! per-executor completion tracking fed by remote execution-state polls.

use tracing::debug;

use crate::remote::ExecutionStateReply;
use crate::store::TaskStore;
use crate::types::{SessionMode, TaskName};

/// Mutable lifecycle state for one participant session.
///
/// The allocation/order surface is editable only in the window between a
/// successful apply and the start of execution. Once started, the session
/// tracks the human step cursor and the finished-task lists reported by the
/// remote side.
#[derive(Debug, Clone)]
pub struct SessionState {
    mode: SessionMode,
    participant: String,
    applied: bool,
    started: bool,
    human_complete: bool,
    human_step: usize,
    human_finished: Vec<TaskName>,
    robot_finished: Vec<TaskName>,
}

impl SessionState {
    pub fn new(mode: SessionMode, participant: impl Into<String>) -> Self {
        Self {
            mode,
            participant: participant.into(),
            applied: false,
            started: false,
            human_complete: false,
            human_step: 0,
            human_finished: Vec::new(),
            robot_finished: Vec::new(),
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn applied(&self) -> bool {
        self.applied
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn human_complete(&self) -> bool {
        self.human_complete
    }

    pub fn human_step(&self) -> usize {
        self.human_step
    }

    pub fn human_finished(&self) -> &[TaskName] {
        &self.human_finished
    }

    pub fn robot_finished(&self) -> &[TaskName] {
        &self.robot_finished
    }

    /// Block reordering is open only after apply and before start.
    pub fn order_editable(&self) -> bool {
        self.applied && !self.started
    }

    /// Allocation controls stay open until execution starts.
    pub fn allocation_editable(&self) -> bool {
        !self.started
    }

    /// Returns `false` if the session was already applied.
    pub fn mark_applied(&mut self) -> bool {
        if self.applied {
            return false;
        }
        self.applied = true;
        true
    }

    /// Returns `false` if execution was already started.
    pub fn mark_started(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        true
    }

    /// Name of the human task at the current step cursor, if any.
    pub fn current_human_task(&self, store: &TaskStore) -> Option<TaskName> {
        store
            .human_tasks()
            .get(self.human_step)
            .map(|task| task.name.clone())
    }

    /// Move the cursor forward after the current task is reported complete.
    ///
    /// Completing the final human task marks the human side complete instead
    /// of advancing past the end.
    pub fn advance_step(&mut self, human_count: usize) {
        if human_count == 0 {
            return;
        }
        if self.human_step + 1 >= human_count {
            self.human_complete = true;
            debug!(step = self.human_step, "final human step completed");
        } else {
            self.human_step += 1;
            debug!(step = self.human_step, "advanced human step");
        }
    }

    /// Move the cursor back one step, e.g. after an accidental advance.
    ///
    /// Always clears the human-complete flag so a retreat from the finished
    /// state re-opens the final step.
    pub fn retreat_step(&mut self) {
        self.human_complete = false;
        if self.human_step > 0 {
            self.human_step -= 1;
            debug!(step = self.human_step, "retreated human step");
        }
    }

    /// Keep the cursor valid when a reallocation shrinks the human task list.
    pub fn clamp_step(&mut self, human_count: usize) {
        if human_count > 0 && self.human_step >= human_count {
            self.human_step = human_count - 1;
            debug!(step = self.human_step, "clamped human step to task count");
        }
    }

    /// Recompute the per-executor finished lists from a polled execution
    /// state.
    ///
    /// A task counts as finished for its executor when its name appears in
    /// the overall finished list but is no longer in that executor's assigned
    /// (still pending) list. Names are compared trimmed and case-insensitive.
    ///
    /// Returns `true` when this update is the one that completes the whole
    /// session.
    pub fn update_execution(&mut self, store: &TaskStore, reply: &ExecutionStateReply) -> bool {
        let was_finished = self.all_finished(store);

        let all_finished = normalize_all(&reply.all_finished_tasks);
        let human_pending = normalize_all(&reply.human_assigned_tasks);
        let robot_pending = normalize_all(&reply.robot_assigned_tasks);

        self.human_finished = store
            .human_tasks()
            .iter()
            .filter(|task| {
                let name = normalize(&task.name);
                all_finished.contains(&name) && !human_pending.contains(&name)
            })
            .map(|task| task.name.clone())
            .collect();

        self.robot_finished = store
            .robot_tasks()
            .iter()
            .filter(|task| {
                let name = normalize(&task.name);
                all_finished.contains(&name) && !robot_pending.contains(&name)
            })
            .map(|task| task.name.clone())
            .collect();

        !was_finished && self.all_finished(store)
    }

    /// Whether every human and every robot task has been reported finished.
    ///
    /// Requires at least one task on each side so an unallocated session is
    /// never considered finished.
    pub fn all_finished(&self, store: &TaskStore) -> bool {
        let human_total = store.human_tasks().len();
        let robot_total = store.robot_tasks().len();
        human_total > 0
            && robot_total > 0
            && self.human_finished.len() == human_total
            && self.robot_finished.len() == robot_total
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn normalize_all(names: &[String]) -> Vec<String> {
    names.iter().map(|name| normalize(name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::TaskRow;

    fn store_with(names_human: &[&str], names_robot: &[&str]) -> TaskStore {
        let mut rows = Vec::new();
        for (i, name) in names_human.iter().chain(names_robot.iter()).enumerate() {
            rows.push(TaskRow {
                id: format!("t{i}"),
                name: (*name).to_string(),
                ..TaskRow::default()
            });
        }
        let mut store = TaskStore::from_rows(rows);
        for name in names_human {
            let id = store.task_by_name(name).map(|t| t.id.clone());
            if let Some(id) = id {
                store.set_allocation(&id, 3);
            }
        }
        for name in names_robot {
            let id = store.task_by_name(name).map(|t| t.id.clone());
            if let Some(id) = id {
                store.set_allocation(&id, 8);
            }
        }
        store
    }

    #[test]
    fn reorder_window_opens_on_apply_and_closes_on_start() {
        let mut session = SessionState::new(SessionMode::Record, "P1");
        assert!(!session.order_editable());
        assert!(session.allocation_editable());

        assert!(session.mark_applied());
        assert!(session.order_editable());
        assert!(!session.mark_applied());

        assert!(session.mark_started());
        assert!(!session.order_editable());
        assert!(!session.allocation_editable());
        assert!(!session.mark_started());
    }

    #[test]
    fn advance_marks_complete_on_last_step() {
        let mut session = SessionState::new(SessionMode::Record, "P1");
        session.advance_step(2);
        assert_eq!(session.human_step(), 1);
        assert!(!session.human_complete());

        session.advance_step(2);
        assert_eq!(session.human_step(), 1);
        assert!(session.human_complete());

        session.retreat_step();
        assert_eq!(session.human_step(), 0);
        assert!(!session.human_complete());
    }

    #[test]
    fn clamp_pulls_cursor_back_when_list_shrinks() {
        let mut session = SessionState::new(SessionMode::Record, "P1");
        session.advance_step(4);
        session.advance_step(4);
        assert_eq!(session.human_step(), 2);

        session.clamp_step(2);
        assert_eq!(session.human_step(), 1);

        // No human tasks at all leaves the cursor alone.
        session.clamp_step(0);
        assert_eq!(session.human_step(), 1);
    }

    #[test]
    fn update_execution_matches_names_loosely() {
        let store = store_with(&["Fetch Parts"], &["Weld Frame"]);
        let mut session = SessionState::new(SessionMode::Record, "P1");

        let reply = ExecutionStateReply {
            human_assigned_tasks: vec![],
            robot_assigned_tasks: vec!["  weld frame ".into()],
            all_finished_tasks: vec!["FETCH PARTS ".into(), " weld frame".into()],
            ..ExecutionStateReply::default()
        };

        // Robot task is finished overall but still listed as assigned, so only
        // the human side counts as done.
        assert!(!session.update_execution(&store, &reply));
        assert_eq!(session.human_finished(), ["Fetch Parts".to_string()]);
        assert!(session.robot_finished().is_empty());
        assert!(!session.all_finished(&store));

        let reply = ExecutionStateReply {
            human_assigned_tasks: vec![],
            robot_assigned_tasks: vec![],
            all_finished_tasks: vec!["fetch parts".into(), "weld frame".into()],
            ..ExecutionStateReply::default()
        };
        assert!(session.update_execution(&store, &reply));
        assert!(session.all_finished(&store));

        // A repeat poll with the same state is not "newly" finished.
        assert!(!session.update_execution(&store, &reply));
    }

    #[test]
    fn one_sided_store_never_finishes() {
        let store = store_with(&["Fetch Parts"], &[]);
        let mut session = SessionState::new(SessionMode::Record, "P1");
        let reply = ExecutionStateReply {
            all_finished_tasks: vec!["fetch parts".into()],
            ..ExecutionStateReply::default()
        };
        assert!(!session.update_execution(&store, &reply));
        assert!(!session.all_finished(&store));
    }
}
