// src/engine/event_handlers.rs

//! Event handling logic for the core engine.

use std::time::Instant;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::engine::core::CoreEngine;
use crate::engine::session::SessionState;
use crate::engine::snapshot::EngineSnapshot;
use crate::engine::EngineNotification;
use crate::gate::DependencyGate;
use crate::remote::api::{
    AllocationRow, CheckReply, DependencyReply, ExecutionStateReply, TaskExport, TaskRow,
};
use crate::seq::{self, BlockId, BlockSummary};
use crate::store::TaskStore;
use crate::types::{SessionMode, TaskId, TaskName};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Push a state-change notification to the operator surface.
    Notify(EngineNotification),
    /// Replace the shared snapshot with this view.
    PublishSnapshot(EngineSnapshot),
    /// Re-fetch the task list and dependency mapping.
    ReloadTaskSet,
    /// Fetch the previous round's allocation (replay apply).
    FetchPreviousAllocation,
    /// Persist the operator's block ordering (record start).
    PersistBlockOrder { blocks: Vec<BlockSummary> },
    /// Launch remote execution with the final allocation.
    StartRemoteExecution { tasks: Vec<TaskExport> },
    /// Report the current human task as complete.
    CompleteHumanTask { task: TaskName },
    /// Clear remote execution and dependency state.
    ResetRemote,
    /// Append an entry to the participant event log.
    LogEvent {
        event: String,
        details: serde_json::Value,
    },
    /// Request that the process exits (used for `--once` when finished).
    RequestExit,
}

/// Decision returned by the core after handling a single `EngineEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute (remote calls, notifications).
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Handle a fresh task list plus dependency mapping.
///
/// The store is rebuilt from scratch (this only happens at startup and after
/// a reset), the sequence is re-assembled over it, and the store order is
/// aligned to the flattened sequence. A configured saved block order is
/// honoured in replay mode only.
pub fn handle_task_set_loaded(
    core: &mut CoreEngine,
    tasks: Vec<TaskRow>,
    dependencies: DependencyReply,
) -> CoreStep {
    let fetched_order: Vec<TaskId> = tasks.iter().map(|row| row.id.clone()).collect();

    core.store = TaskStore::from_rows(tasks);
    core.dependencies = dependencies.dependencies;
    core.labels = dependencies.group_names;

    let saved = match core.session.mode() {
        SessionMode::Replay => core.saved_order.as_deref(),
        SessionMode::Record => None,
    };
    core.sequence = seq::assemble(
        &core.store,
        &core.dependencies,
        &core.labels,
        &core.categories,
        &core.terminal_keyword,
        saved,
    );

    let flat = core.sequence.flattened();
    core.store.apply_order(&flat);

    info!(
        tasks = core.store.len(),
        blocks = core.sequence.len(),
        "task set loaded"
    );

    let mut commands = Vec::new();
    if flat != fetched_order {
        commands.push(CoreCommand::Notify(EngineNotification::OrderChanged {
            order: core.store.tasks().to_vec(),
            blocks: core.sequence.summaries(),
        }));
    }
    commands.push(CoreCommand::PublishSnapshot(core.snapshot()));

    CoreStep {
        commands,
        keep_running: true,
    }
}

/// Handle the operator pressing apply.
///
/// Sets the applied flag (opening the reorder window) and, in replay mode,
/// asks the shell to fetch the previous round's allocation. Pressing apply
/// again repeats the fetch; the flag simply stays set.
pub fn handle_apply(core: &mut CoreEngine) -> CoreStep {
    let mut commands = vec![CoreCommand::LogEvent {
        event: "Apply Button Pressed".to_string(),
        details: json!({ "taskMode": core.session.mode().to_string() }),
    }];

    if core.session.mark_applied() {
        debug!("allocation round applied; reorder window open");
    }

    if core.session.mode() == SessionMode::Replay {
        commands.push(CoreCommand::FetchPreviousAllocation);
    }

    commands.push(CoreCommand::PublishSnapshot(core.snapshot()));
    CoreStep {
        commands,
        keep_running: true,
    }
}

/// Handle previous-round allocation rows arriving (replay apply).
///
/// Rows are merged into the store by name; an empty reply leaves the local
/// allocation untouched. A successful merge also clears the configured saved
/// block order so later rebuilds keep the current order.
pub fn handle_previous_allocation(core: &mut CoreEngine, rows: Vec<AllocationRow>) -> CoreStep {
    if rows.is_empty() {
        warn!("no previous allocation found; keeping local allocation");
        return CoreStep {
            commands: Vec::new(),
            keep_running: true,
        };
    }

    let restored = core.store.restore_allocations(&rows);
    core.saved_order = None;
    core.session.clamp_step(core.store.human_tasks().len());
    info!(restored, total = rows.len(), "previous allocation restored");

    CoreStep {
        commands: vec![
            CoreCommand::LogEvent {
                event: "Previous Allocation Loaded".to_string(),
                details: json!({ "restored": restored }),
            },
            CoreCommand::PublishSnapshot(core.snapshot()),
        ],
        keep_running: true,
    }
}

/// Handle the operator pressing start.
///
/// The first press persists the block order (record mode), launches remote
/// execution with the final allocation and locks editing. Later presses only
/// log the attempt.
pub fn handle_start(core: &mut CoreEngine) -> CoreStep {
    let mut commands = vec![CoreCommand::LogEvent {
        event: "Start Button Pressed".to_string(),
        details: json!({}),
    }];

    if !core.session.mark_started() {
        debug!("start pressed again; execution already running");
        return CoreStep {
            commands,
            keep_running: true,
        };
    }

    if core.session.mode() == SessionMode::Record {
        commands.push(CoreCommand::PersistBlockOrder {
            blocks: core.sequence.summaries(),
        });
    }

    let tasks: Vec<TaskExport> = core.store.tasks().iter().map(TaskExport::from).collect();
    info!(tasks = tasks.len(), "starting remote execution");
    commands.push(CoreCommand::StartRemoteExecution { tasks });
    commands.push(CoreCommand::PublishSnapshot(core.snapshot()));

    CoreStep {
        commands,
        keep_running: true,
    }
}

/// Handle a block move request from the operator.
///
/// Refused outside the reorder window. A successful move re-aligns the store
/// to the new flattened order and notifies the operator surface; rejections
/// are silent apart from a debug trace.
pub fn handle_move_block(core: &mut CoreEngine, source: BlockId, target: BlockId) -> CoreStep {
    if !core.session.order_editable() {
        debug!(
            source = %source,
            target = %target,
            "block move ignored; reorder window closed"
        );
        return CoreStep {
            commands: Vec::new(),
            keep_running: true,
        };
    }

    let source_name = core
        .sequence
        .blocks()
        .iter()
        .find(|b| *b.id() == source)
        .map(|b| b.name().to_string());
    let target_name = core
        .sequence
        .blocks()
        .iter()
        .find(|b| *b.id() == target)
        .map(|b| b.name().to_string());

    let outcome = core.sequence.move_block(&source, &target);
    if !outcome.moved() {
        return CoreStep {
            commands: Vec::new(),
            keep_running: true,
        };
    }

    core.store.apply_order(&core.sequence.flattened());

    CoreStep {
        commands: vec![
            CoreCommand::LogEvent {
                event: "Block Moved".to_string(),
                details: json!({
                    "source": source_name,
                    "target": target_name,
                }),
            },
            CoreCommand::Notify(EngineNotification::OrderChanged {
                order: core.store.tasks().to_vec(),
                blocks: core.sequence.summaries(),
            }),
            CoreCommand::PublishSnapshot(core.snapshot()),
        ],
        keep_running: true,
    }
}

/// Handle an allocation control change.
///
/// The attempt is logged even when refused. Changes are refused once
/// execution has started; fixed-to-human tasks are refused by the store.
pub fn handle_set_allocation(core: &mut CoreEngine, task_id: TaskId, value: u8) -> CoreStep {
    let assigned = if value > 5 { "Robot" } else { "Human" };
    let mut commands = vec![CoreCommand::LogEvent {
        event: "Task Allocation Changed".to_string(),
        details: json!({
            "taskId": task_id,
            "assignedTo": assigned,
            "sliderValue": value,
        }),
    }];

    if !core.session.allocation_editable() {
        debug!(task_id = %task_id, "allocation change ignored; execution started");
        return CoreStep {
            commands,
            keep_running: true,
        };
    }

    if core.store.set_allocation(&task_id, value) {
        core.session.clamp_step(core.store.human_tasks().len());
        commands.push(CoreCommand::PublishSnapshot(core.snapshot()));
    }

    CoreStep {
        commands,
        keep_running: true,
    }
}

/// Handle the operator confirming the current human task.
///
/// Refused while execution has not started, after the human side finished,
/// or while the human gate signal disallows progression. Completing the
/// final task marks the human side complete.
pub fn handle_advance_human(core: &mut CoreEngine) -> CoreStep {
    if !core.session.started() || core.session.human_complete() {
        debug!("advance ignored; no active human step");
        return CoreStep {
            commands: Vec::new(),
            keep_running: true,
        };
    }

    if !core.gate.human_allows_progress() {
        debug!("advance refused; current task blocked by dependencies");
        return CoreStep {
            commands: Vec::new(),
            keep_running: true,
        };
    }

    let Some(current) = core.session.current_human_task(&core.store) else {
        debug!("advance ignored; no human task at cursor");
        return CoreStep {
            commands: Vec::new(),
            keep_running: true,
        };
    };
    let current_id = core
        .store
        .task_by_name(&current)
        .map(|task| task.id.clone())
        .unwrap_or_default();

    let human_count = core.store.human_tasks().len();
    let final_step = core.session.human_step() + 1 >= human_count;
    core.session.advance_step(human_count);

    let event = if final_step {
        "Finish Button Pressed"
    } else {
        "Next Button Pressed"
    };

    CoreStep {
        commands: vec![
            CoreCommand::CompleteHumanTask {
                task: current.clone(),
            },
            CoreCommand::LogEvent {
                event: event.to_string(),
                details: json!({ "taskId": format!("Task_{current_id}") }),
            },
            CoreCommand::Notify(EngineNotification::StepChanged {
                step: core.session.human_step(),
                task: core.session.current_human_task(&core.store),
            }),
            CoreCommand::PublishSnapshot(core.snapshot()),
        ],
        keep_running: true,
    }
}

/// Handle the operator stepping the human cursor back.
pub fn handle_retreat_human(core: &mut CoreEngine) -> CoreStep {
    if !core.session.started() {
        debug!("retreat ignored; execution not started");
        return CoreStep {
            commands: Vec::new(),
            keep_running: true,
        };
    }

    let current_id = core
        .session
        .current_human_task(&core.store)
        .and_then(|name| core.store.task_by_name(&name).map(|task| task.id.clone()))
        .unwrap_or_default();
    core.session.retreat_step();

    CoreStep {
        commands: vec![
            CoreCommand::LogEvent {
                event: "Previous Button Pressed".to_string(),
                details: json!({ "taskId": format!("Task_{current_id}") }),
            },
            CoreCommand::Notify(EngineNotification::StepChanged {
                step: core.session.human_step(),
                task: core.session.current_human_task(&core.store),
            }),
            CoreCommand::PublishSnapshot(core.snapshot()),
        ],
        keep_running: true,
    }
}

/// Handle a polled human-side boundary check.
pub fn handle_human_check(core: &mut CoreEngine, reply: CheckReply, at: Instant) -> CoreStep {
    core.gate.observe_human(&reply, at);
    publish_gate_change(core)
}

/// Handle a polled robot-side boundary check.
pub fn handle_robot_check(core: &mut CoreEngine, reply: CheckReply, at: Instant) -> CoreStep {
    core.gate.observe_robot(&reply, at);
    publish_gate_change(core)
}

fn publish_gate_change(core: &mut CoreEngine) -> CoreStep {
    let mut commands = Vec::new();
    if let Some(status) = core.gate.refresh() {
        commands.push(CoreCommand::Notify(EngineNotification::GateChanged(
            status,
        )));
        commands.push(CoreCommand::PublishSnapshot(core.snapshot()));
    }
    CoreStep {
        commands,
        keep_running: true,
    }
}

/// Handle a polled execution state.
///
/// Finished lists are replaced last-value-wins. The poll that completes both
/// sides notifies the operator surface and, with `--once`, stops the loop.
pub fn handle_execution_state(core: &mut CoreEngine, reply: ExecutionStateReply) -> CoreStep {
    let newly_finished = core.session.update_execution(&core.store, &reply);

    let mut commands = Vec::new();
    let mut keep_running = true;

    if newly_finished {
        info!("all assigned tasks finished on both sides");
        commands.push(CoreCommand::Notify(EngineNotification::SessionFinished));
        if core.options.exit_when_finished {
            commands.push(CoreCommand::RequestExit);
            keep_running = false;
        }
    }
    commands.push(CoreCommand::PublishSnapshot(core.snapshot()));

    CoreStep {
        commands,
        keep_running,
    }
}

/// Handle a full session reset.
///
/// Session flags, cursor and gate go back to their initial state, the remote
/// side is cleared and the task set is re-fetched (which rebuilds the store
/// and sequence).
pub fn handle_reset(core: &mut CoreEngine) -> CoreStep {
    core.session = SessionState::new(
        core.session.mode(),
        core.session.participant().to_string(),
    );
    core.gate = DependencyGate::new();
    info!("session reset");

    CoreStep {
        commands: vec![
            CoreCommand::LogEvent {
                event: "Session Reset".to_string(),
                details: json!({}),
            },
            CoreCommand::ResetRemote,
            CoreCommand::ReloadTaskSet,
            CoreCommand::PublishSnapshot(core.snapshot()),
        ],
        keep_running: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineEvent, EngineOptions};
    use crate::seq::CategoryTable;
    use crate::types::SessionMode;

    fn row(id: &str, name: &str) -> TaskRow {
        TaskRow {
            id: id.to_string(),
            name: name.to_string(),
            ..TaskRow::default()
        }
    }

    fn loaded_core() -> CoreEngine {
        let mut core = CoreEngine::new(
            SessionState::new(SessionMode::Record, "P1"),
            CategoryTable::default(),
            "inspection".to_string(),
            None,
            EngineOptions::default(),
        );
        let tasks = vec![
            row("t1", "bridge_deck"),
            row("t2", "bridge_rail"),
            row("t3", "wheel_hub"),
            row("t4", "final_inspection"),
        ];
        let dependencies = DependencyReply {
            dependencies: [("bridge_rail".to_string(), vec!["bridge_deck".to_string()])]
                .into_iter()
                .collect(),
            group_names: Default::default(),
        };
        core.step(EngineEvent::TaskSetLoaded {
            tasks,
            dependencies,
        });
        core
    }

    fn has_log(step: &CoreStep, event: &str) -> bool {
        step.commands.iter().any(|c| {
            matches!(c, CoreCommand::LogEvent { event: e, .. } if e == event)
        })
    }

    #[test]
    fn load_groups_dependent_tasks() {
        let core = loaded_core();
        assert_eq!(core.sequence().len(), 3);
        assert_eq!(core.sequence().blocks()[0].task_names().len(), 2);
    }

    #[test]
    fn move_refused_before_apply() {
        let mut core = loaded_core();
        let source = core.sequence().blocks()[1].id().clone();
        let target = core.sequence().blocks()[0].id().clone();

        let step = core.step(EngineEvent::MoveBlock {
            source: source.clone(),
            target: target.clone(),
        });
        assert!(step.commands.is_empty());

        core.step(EngineEvent::ApplyPressed);
        let step = core.step(EngineEvent::MoveBlock { source, target });
        assert!(has_log(&step, "Block Moved"));
        assert_eq!(core.sequence().blocks()[0].task_names()[0], "wheel_hub");
    }

    #[test]
    fn start_is_idempotent() {
        let mut core = loaded_core();
        let step = core.step(EngineEvent::StartPressed);
        assert!(step
            .commands
            .iter()
            .any(|c| matches!(c, CoreCommand::StartRemoteExecution { .. })));
        assert!(step
            .commands
            .iter()
            .any(|c| matches!(c, CoreCommand::PersistBlockOrder { .. })));

        let step = core.step(EngineEvent::StartPressed);
        assert!(!step
            .commands
            .iter()
            .any(|c| matches!(c, CoreCommand::StartRemoteExecution { .. })));
        assert!(has_log(&step, "Start Button Pressed"));
    }

    #[test]
    fn allocation_locked_after_start() {
        let mut core = loaded_core();
        core.step(EngineEvent::SetAllocation {
            task_id: "t3".to_string(),
            value: 8,
        });
        assert_eq!(core.store().robot_tasks().len(), 1);

        core.step(EngineEvent::StartPressed);
        core.step(EngineEvent::SetAllocation {
            task_id: "t3".to_string(),
            value: 2,
        });
        assert_eq!(core.store().robot_tasks().len(), 1);
    }

    #[test]
    fn advance_refused_while_blocked() {
        let mut core = loaded_core();
        core.step(EngineEvent::SetAllocation {
            task_id: "t1".to_string(),
            value: 2,
        });
        core.step(EngineEvent::StartPressed);

        core.step(EngineEvent::HumanCheckPolled {
            reply: CheckReply {
                allowed: false,
                message: "waiting on the robot".to_string(),
                current_task: None,
            },
            at: Instant::now(),
        });
        let step = core.step(EngineEvent::AdvanceHuman);
        assert!(step.commands.is_empty());

        core.step(EngineEvent::HumanCheckPolled {
            reply: CheckReply {
                allowed: true,
                message: String::new(),
                current_task: None,
            },
            at: Instant::now(),
        });
        let step = core.step(EngineEvent::AdvanceHuman);
        assert!(step
            .commands
            .iter()
            .any(|c| matches!(c, CoreCommand::CompleteHumanTask { task } if task == "bridge_deck")));
    }
}
