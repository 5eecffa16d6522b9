// tests/gate.rs

//! Gate behaviour driven through the core engine: robot blocks mask human
//! blocks in the combined status, refreshes publish only changes, and the
//! human cursor is held while the human check disallows.

mod common;

use std::time::Instant;

use crate::common::engine;
use cotask::engine::{CoreCommand, CoreEngine, CoreStep, EngineEvent, EngineNotification};
use cotask::gate::GateStatus;
use cotask::remote::CheckReply;
use cotask_test_utils::init_tracing;

fn reply(allowed: bool, message: &str) -> CheckReply {
    CheckReply {
        allowed,
        message: message.to_string(),
        current_task: None,
    }
}

fn human_check(core: &mut CoreEngine, allowed: bool, message: &str) -> CoreStep {
    core.step(EngineEvent::HumanCheckPolled {
        reply: reply(allowed, message),
        at: Instant::now(),
    })
}

fn robot_check(core: &mut CoreEngine, allowed: bool, message: &str) -> CoreStep {
    core.step(EngineEvent::RobotCheckPolled {
        reply: reply(allowed, message),
        at: Instant::now(),
    })
}

fn gate_notification(step: &CoreStep) -> Option<GateStatus> {
    step.commands.iter().find_map(|c| match c {
        CoreCommand::Notify(EngineNotification::GateChanged(status)) => Some(status.clone()),
        _ => None,
    })
}

fn completes_task(step: &CoreStep) -> Option<String> {
    step.commands.iter().find_map(|c| match c {
        CoreCommand::CompleteHumanTask { task } => Some(task.clone()),
        _ => None,
    })
}

#[test]
fn robot_block_masks_simultaneous_human_block() {
    init_tracing();

    let mut core = engine();
    human_check(&mut core, false, "waiting for museum_case");
    robot_check(&mut core, false, "robot arm busy");

    assert_eq!(
        core.gate_status(),
        &GateStatus::RobotBlocked {
            message: "robot arm busy".to_string()
        }
    );
    assert_eq!(core.gate_status().to_string(), "robot: robot arm busy");
}

#[test]
fn status_changes_are_published_once() {
    init_tracing();

    let mut core = engine();
    let step = human_check(&mut core, false, "waiting for museum_case");
    assert!(gate_notification(&step).is_some());

    // The identical poll result changes nothing, so nothing is pushed.
    let step = human_check(&mut core, false, "waiting for museum_case");
    assert!(step.commands.is_empty());

    let step = human_check(&mut core, true, "");
    assert_eq!(gate_notification(&step), Some(GateStatus::AllClear));
}

#[test]
fn advance_is_held_while_human_check_disallows() {
    init_tracing();

    let mut core = engine();
    core.step(EngineEvent::StartPressed);
    human_check(&mut core, false, "waiting for museum_case");

    let step = core.step(EngineEvent::AdvanceHuman);
    assert!(step.commands.is_empty());

    human_check(&mut core, true, "");
    let step = core.step(EngineEvent::AdvanceHuman);
    assert_eq!(completes_task(&step).as_deref(), Some("triangle_frame"));
}

#[test]
fn robot_block_alone_does_not_hold_the_human() {
    init_tracing();

    let mut core = engine();
    core.step(EngineEvent::StartPressed);
    robot_check(&mut core, false, "robot waiting");

    assert_eq!(
        core.gate_status(),
        &GateStatus::RobotBlocked {
            message: "robot waiting".to_string()
        }
    );
    let step = core.step(EngineEvent::AdvanceHuman);
    assert_eq!(completes_task(&step).as_deref(), Some("triangle_frame"));
}

#[test]
fn unpolled_signals_allow_progress() {
    init_tracing();

    let mut core = engine();
    core.step(EngineEvent::StartPressed);

    let step = core.step(EngineEvent::AdvanceHuman);
    assert_eq!(completes_task(&step).as_deref(), Some("triangle_frame"));
}

#[test]
fn disallow_without_message_holds_progress_but_not_status() {
    init_tracing();

    let mut core = engine();
    core.step(EngineEvent::StartPressed);
    let step = human_check(&mut core, false, "");

    assert!(gate_notification(&step).is_none());
    assert_eq!(core.gate_status(), &GateStatus::AllClear);
    assert!(core.step(EngineEvent::AdvanceHuman).commands.is_empty());
}
