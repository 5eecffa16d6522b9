// src/console.rs

//! Line-oriented operator console on stdin.
//!
//! The console translates typed commands into engine events; display names
//! are resolved against the shared snapshot. It never mutates engine state
//! directly, so a rejected command simply produces no visible change (the
//! core logs the rejection at debug level).

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{EngineEvent, EngineSnapshot, SharedSnapshot};
use crate::seq::BlockKind;

enum ConsoleAction {
    Send(EngineEvent),
    Handled,
    Quit,
}

/// Spawn the console loop.
///
/// The loop ends on `quit`, on stdin EOF, or when the runtime channel
/// closes.
pub fn spawn_console(runtime_tx: mpsc::Sender<EngineEvent>, snapshot: SharedSnapshot) {
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("stdin closed; console finished");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "failed to read console input");
                    break;
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match handle_line(line, &snapshot) {
                ConsoleAction::Send(event) => {
                    if runtime_tx.send(event).await.is_err() {
                        debug!("runtime gone; console finished");
                        break;
                    }
                }
                ConsoleAction::Handled => {}
                ConsoleAction::Quit => {
                    let _ = runtime_tx.send(EngineEvent::ShutdownRequested).await;
                    break;
                }
            }
        }
    });
}

fn handle_line(line: &str, snapshot: &SharedSnapshot) -> ConsoleAction {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default().to_lowercase();
    let rest: Vec<&str> = parts.collect();

    match command.as_str() {
        "order" => {
            with_snapshot(snapshot, print_order);
            ConsoleAction::Handled
        }
        "status" => {
            with_snapshot(snapshot, print_status);
            ConsoleAction::Handled
        }
        "move" => parse_move(&rest, snapshot),
        "set" => parse_set(&rest, snapshot),
        "apply" => ConsoleAction::Send(EngineEvent::ApplyPressed),
        "start" => ConsoleAction::Send(EngineEvent::StartPressed),
        "next" => ConsoleAction::Send(EngineEvent::AdvanceHuman),
        "back" => ConsoleAction::Send(EngineEvent::RetreatHuman),
        "reset" => ConsoleAction::Send(EngineEvent::ResetRequested),
        "quit" | "exit" => ConsoleAction::Quit,
        "help" => {
            print_help();
            ConsoleAction::Handled
        }
        _ => {
            println!("unknown command: {line}");
            print_help();
            ConsoleAction::Handled
        }
    }
}

/// Parse `move <source> <target>`.
///
/// Block display names may contain spaces, so every split of the argument
/// words into source/target is tried until both halves resolve.
fn parse_move(args: &[&str], snapshot: &SharedSnapshot) -> ConsoleAction {
    if args.len() < 2 {
        println!("usage: move <source block> <target block>");
        return ConsoleAction::Handled;
    }

    let resolved = with_snapshot(snapshot, |snap| {
        for split in 1..args.len() {
            let source_name = args[..split].join(" ");
            let target_name = args[split..].join(" ");
            if let (Some(source), Some(target)) = (
                snap.block_id_by_name(&source_name),
                snap.block_id_by_name(&target_name),
            ) {
                return Some((source, target));
            }
        }
        None
    })
    .flatten();

    match resolved {
        Some((source, target)) => ConsoleAction::Send(EngineEvent::MoveBlock { source, target }),
        None => {
            println!("unknown block name; see `order` for the current blocks");
            ConsoleAction::Handled
        }
    }
}

/// Parse `set <task> <value>`.
fn parse_set(args: &[&str], snapshot: &SharedSnapshot) -> ConsoleAction {
    let Some((value_raw, name_parts)) = args.split_last() else {
        println!("usage: set <task> <0..10>");
        return ConsoleAction::Handled;
    };
    if name_parts.is_empty() {
        println!("usage: set <task> <0..10>");
        return ConsoleAction::Handled;
    }

    let Ok(value) = value_raw.parse::<u8>() else {
        println!("allocation value must be a number from 0 to 10");
        return ConsoleAction::Handled;
    };
    if value > 10 {
        println!("allocation value must be a number from 0 to 10");
        return ConsoleAction::Handled;
    }

    let name = name_parts.join(" ");
    let task_id = with_snapshot(snapshot, |snap| snap.task_id_by_name(&name)).flatten();

    match task_id {
        Some(task_id) => ConsoleAction::Send(EngineEvent::SetAllocation { task_id, value }),
        None => {
            println!("unknown task name: {name}");
            ConsoleAction::Handled
        }
    }
}

fn with_snapshot<T>(snapshot: &SharedSnapshot, f: impl FnOnce(&EngineSnapshot) -> T) -> Option<T> {
    match snapshot.lock() {
        Ok(guard) => Some(f(&guard)),
        Err(_) => {
            warn!("snapshot mutex poisoned; command dropped");
            None
        }
    }
}

fn print_order(snap: &EngineSnapshot) {
    if snap.blocks.is_empty() {
        println!("no tasks loaded yet");
        return;
    }

    for (position, block) in snap.blocks.iter().enumerate() {
        let kind = match block.kind {
            BlockKind::Group => "group",
            BlockKind::Single => "task",
        };
        println!(
            "{:>2}. [{kind}] {}: {}",
            position + 1,
            block.name,
            block.tasks.join(", ")
        );
    }

    let flat: Vec<String> = snap
        .tasks
        .iter()
        .map(|task| format!("{} ({})", task.name, task.assigned_to))
        .collect();
    println!("flat order: {}", flat.join(", "));
}

fn print_status(snap: &EngineSnapshot) {
    println!("participant {} ({} mode)", snap.participant, snap.mode);
    println!(
        "applied: {}  started: {}  reorder open: {}",
        yes_no(snap.applied),
        yes_no(snap.started),
        yes_no(snap.editable)
    );
    println!("gate: {}", snap.gate);

    match &snap.current_human_task {
        Some(task) if snap.started => {
            println!(
                "human step {}/{}: {task}",
                snap.human_step + 1,
                snap.human_total
            );
        }
        _ => println!("human step: - (not started)"),
    }

    println!(
        "finished: human {}/{}, robot {}/{}{}",
        snap.human_finished,
        snap.human_total,
        snap.robot_finished,
        snap.robot_total,
        if snap.all_finished {
            "  (all done)"
        } else {
            ""
        }
    );
}

fn print_help() {
    println!("commands:");
    println!("  order                     show blocks and the flat task order");
    println!("  move <source> <target>    move a block into another block's slot");
    println!("  set <task> <0..10>        set a task's allocation control");
    println!("  apply                     lock in the allocation round");
    println!("  start                     launch execution");
    println!("  next                      confirm the current human task");
    println!("  back                      step the human cursor back");
    println!("  status                    show session and gate state");
    println!("  reset                     reset the session and reload tasks");
    println!("  quit                      stop the engine");
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
