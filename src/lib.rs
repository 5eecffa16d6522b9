// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod errors;
pub mod gate;
pub mod logging;
pub mod remote;
pub mod seq;
pub mod store;
pub mod task;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, ConfigFile, RawConfigFile};
use crate::engine::{
    new_shared, CoreEngine, EngineEvent, EngineNotification, EngineOptions, Runtime, SessionState,
};
use crate::remote::{spawn_pollers, RealRemoteBackend, RemoteClient};
use crate::seq::CategoryTable;
use crate::types::SessionMode;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the remote client, backend and pollers
/// - the operator console on stdin
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_config(&config_path)?;

    let mode = args
        .mode
        .map(SessionMode::from)
        .unwrap_or(cfg.session().mode);

    if args.dry_run {
        print_dry_run(&cfg, mode, &args);
        return Ok(());
    }

    let client = RemoteClient::new(cfg.remote().base_url.clone(), cfg.timeout());
    let participant = resolve_participant(&args, &cfg, &client).await;
    info!(%participant, %mode, "session configured");

    // Runtime event channel.
    let (runtime_tx, runtime_rx) = mpsc::channel::<EngineEvent>(64);

    // Shared snapshot for the console and pollers, plus a printer for
    // engine notifications.
    let snapshot = new_shared();
    let (notify_tx, notify_rx) = mpsc::channel::<EngineNotification>(16);
    spawn_notification_printer(notify_rx);

    // Remote backend (real implementation in production).
    let backend = RealRemoteBackend::new(
        client.clone(),
        runtime_tx.clone(),
        participant.clone(),
        mode.to_string(),
    );

    spawn_pollers(
        client.clone(),
        runtime_tx.clone(),
        snapshot.clone(),
        cfg.poll_interval(),
    );
    console::spawn_console(runtime_tx.clone(), snapshot.clone());

    // Ctrl-C → graceful shutdown.
    {
        let tx = runtime_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(EngineEvent::ShutdownRequested).await;
        });
    }

    // The initial task set is required before anything can happen, so a
    // failure here ends the run instead of being retried in the background.
    let tasks = client.tasks().await?;
    let dependencies = client.dependencies().await?;
    info!(tasks = tasks.len(), "initial task set fetched");
    runtime_tx
        .send(EngineEvent::TaskSetLoaded { tasks, dependencies })
        .await?;

    let options = EngineOptions {
        exit_when_finished: args.once,
    };

    let extra: Vec<(String, String)> = cfg
        .sequence()
        .extra_categories
        .iter()
        .map(|(keyword, label)| (keyword.clone(), label.clone()))
        .collect();

    // Construct the pure core engine (single source of truth for semantics).
    let core = CoreEngine::new(
        SessionState::new(mode, participant),
        CategoryTable::with_extra(&extra),
        cfg.sequence().terminal_category.clone(),
        cfg.session().saved_block_order.clone(),
        options,
    );

    // Construct the async IO shell around the core.
    let runtime = Runtime::new(core, runtime_rx, backend, Some(notify_tx), snapshot);
    Ok(runtime.run().await?)
}

/// Load and validate the config file.
///
/// A missing file is only an error when the operator asked for a specific
/// path; the default `Cotask.toml` is optional because every built-in
/// default is usable on its own.
fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() && path == default_config_path() {
        info!("no Cotask.toml found; using built-in defaults");
        return Ok(ConfigFile::try_from(RawConfigFile::default())?);
    }
    Ok(load_and_validate(path)?)
}

/// Pick the participant identifier: CLI flag, config entry, or the next
/// free slot reported by the collaborator.
async fn resolve_participant(args: &CliArgs, cfg: &ConfigFile, client: &RemoteClient) -> String {
    if let Some(participant) = &args.participant {
        return participant.trim().to_string();
    }
    if let Some(participant) = &cfg.session().participant {
        return participant.trim().to_string();
    }
    match client.participant_count().await {
        Ok(count) => format!("P{}", count + 1),
        Err(err) => {
            warn!(error = %err, "could not fetch participant count; using P1");
            "P1".to_string()
        }
    }
}

/// Print engine notifications to stdout so order, gate and step changes are
/// visible between console prompts.
fn spawn_notification_printer(mut notify_rx: mpsc::Receiver<EngineNotification>) {
    tokio::spawn(async move {
        while let Some(notification) = notify_rx.recv().await {
            match notification {
                EngineNotification::OrderChanged { order, blocks } => {
                    let names: Vec<&str> = blocks.iter().map(|b| b.name.as_str()).collect();
                    println!("order: {}", names.join(" | "));
                    let flat: Vec<&str> = order.iter().map(|t| t.name.as_str()).collect();
                    println!("tasks: {}", flat.join(", "));
                }
                EngineNotification::GateChanged(status) => {
                    println!("gate: {status}");
                }
                EngineNotification::StepChanged { step, task } => {
                    println!("human step {}: {}", step + 1, task.as_deref().unwrap_or("-"));
                }
                EngineNotification::SessionFinished => {
                    println!("all tasks finished");
                }
            }
        }
    });
}

/// Simple dry-run output: print the effective remote, session and sequence
/// settings without contacting the collaborator.
fn print_dry_run(cfg: &ConfigFile, mode: SessionMode, args: &CliArgs) {
    println!("cotask dry-run");
    println!("  remote.base_url = {}", cfg.remote().base_url);
    println!("  remote.timeout_secs = {}", cfg.remote().timeout_secs);
    println!(
        "  remote.poll_interval_secs = {}",
        cfg.remote().poll_interval_secs
    );
    println!();

    println!("  session.mode = {mode}");
    match (&args.participant, &cfg.session().participant) {
        (Some(participant), _) => println!("  session.participant = {participant} (from CLI)"),
        (None, Some(participant)) => {
            println!("  session.participant = {participant} (from config)")
        }
        (None, None) => println!("  session.participant = assigned by the collaborator"),
    }
    if let Some(order) = &cfg.session().saved_block_order {
        println!("  session.saved_block_order = {}", order.join(", "));
    }
    println!();

    println!(
        "  sequence.terminal_category = {}",
        cfg.sequence().terminal_category
    );
    for (keyword, label) in &cfg.sequence().extra_categories {
        println!("  sequence.extra_categories.{keyword} = {label}");
    }
}
