// tests/allocation.rs

//! Allocation control behaviour: the midpoint threshold, the fixed-to-human
//! lock and the editing window that closes on start.

mod common;

use crate::common::engine;
use cotask::engine::{CoreCommand, CoreEngine, CoreStep, EngineEvent};
use cotask::types::Executor;
use cotask_test_utils::init_tracing;

fn set(core: &mut CoreEngine, task_id: &str, value: u8) -> CoreStep {
    core.step(EngineEvent::SetAllocation {
        task_id: task_id.to_string(),
        value,
    })
}

fn published_snapshot(step: &CoreStep) -> bool {
    step.commands
        .iter()
        .any(|c| matches!(c, CoreCommand::PublishSnapshot(_)))
}

#[test]
fn control_above_midpoint_assigns_robot() {
    init_tracing();

    let mut core = engine();
    let step = set(&mut core, "3", 7);

    let wing = core.store().task_by_id("3").expect("hospital wing");
    assert_eq!(wing.assigned_to, Executor::Robot);
    assert_eq!(wing.slider_value, 7);
    assert!(published_snapshot(&step));
}

#[test]
fn midpoint_and_below_assign_human() {
    init_tracing();

    let mut core = engine();
    set(&mut core, "3", 5);
    let wing = core.store().task_by_id("3").expect("hospital wing");
    assert_eq!(wing.assigned_to, Executor::Human);
    assert_eq!(wing.slider_value, 5);

    set(&mut core, "1", 0);
    let case = core.store().task_by_id("1").expect("museum case");
    assert_eq!(case.assigned_to, Executor::Human);
    assert_eq!(case.slider_value, 0);
}

#[test]
fn control_value_is_capped_at_ten() {
    init_tracing();

    let mut core = engine();
    set(&mut core, "3", 12);

    let wing = core.store().task_by_id("3").expect("hospital wing");
    assert_eq!(wing.assigned_to, Executor::Robot);
    assert_eq!(wing.slider_value, 10);
}

#[test]
fn fixed_to_human_task_is_immutable() {
    init_tracing();

    let mut core = engine();
    let step = set(&mut core, "4", 9);

    let frame = core.store().task_by_id("4").expect("triangle frame");
    assert_eq!(frame.assigned_to, Executor::Human);
    assert_eq!(frame.slider_value, 0);
    // Refused changes log the attempt but never republish the snapshot.
    assert!(!published_snapshot(&step));
}

#[test]
fn unknown_task_is_ignored() {
    init_tracing();

    let mut core = engine();
    let step = set(&mut core, "99", 8);
    assert!(!published_snapshot(&step));
}

#[test]
fn edits_lock_once_execution_starts() {
    init_tracing();

    let mut core = engine();
    core.step(EngineEvent::StartPressed);

    let step = set(&mut core, "3", 9);
    let wing = core.store().task_by_id("3").expect("hospital wing");
    assert_eq!(wing.assigned_to, Executor::Unassigned);
    assert_eq!(wing.slider_value, 5);
    assert!(!published_snapshot(&step));
}

#[test]
fn every_attempt_lands_in_the_event_log() {
    init_tracing();

    let mut core = engine();
    let step = set(&mut core, "3", 9);

    let details = step
        .commands
        .iter()
        .find_map(|c| match c {
            CoreCommand::LogEvent { event, details } if event == "Task Allocation Changed" => {
                Some(details.clone())
            }
            _ => None,
        })
        .expect("allocation log entry");
    assert_eq!(details["taskId"], "3");
    assert_eq!(details["assignedTo"], "Robot");
    assert_eq!(details["sliderValue"], 9);

    // The refused variant is logged as well.
    let step = set(&mut core, "4", 9);
    assert!(step
        .commands
        .iter()
        .any(|c| matches!(c, CoreCommand::LogEvent { event, .. } if event == "Task Allocation Changed")));
}
