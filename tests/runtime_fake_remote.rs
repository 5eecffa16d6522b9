// tests/runtime_fake_remote.rs

use cotask_test_utils::builders::TaskSetBuilder;
use cotask_test_utils::fake_remote::{FakeRemote, RemoteCall};
use cotask_test_utils::init_tracing;

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use cotask::engine::{
    new_shared, CoreEngine, EngineEvent, EngineOptions, Runtime, SessionState,
};
use cotask::remote::{AllocationRow, CheckReply, DependencyReply, ExecutionStateReply, TaskRow};
use cotask::seq::CategoryTable;
use cotask::types::{Executor, SessionMode};

type TestResult = Result<(), Box<dyn Error>>;

/// bridge pair + independent wheel + terminal inspection.
fn task_set() -> (Vec<TaskRow>, DependencyReply) {
    TaskSetBuilder::new()
        .task("bridge_base")
        .task("bridge_deck")
        .task("wheel_hub")
        .task("final_inspection")
        .depends("bridge_deck", &["bridge_base"])
        .build()
}

fn core(mode: SessionMode, once: bool) -> CoreEngine {
    CoreEngine::new(
        SessionState::new(mode, "P1"),
        CategoryTable::default(),
        "inspection".to_string(),
        None,
        EngineOptions {
            exit_when_finished: once,
        },
    )
}

#[tokio::test]
async fn runtime_with_fake_remote_runs_a_session_to_completion() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<EngineEvent>(32);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let backend = FakeRemote::new(rt_tx.clone(), calls.clone());

    // Seed a whole record-mode session before starting the runtime loop:
    // load, allocate the wheel to the robot, apply, start, confirm every
    // human step, then report everything finished.
    let (tasks, dependencies) = task_set();
    rt_tx
        .send(EngineEvent::TaskSetLoaded {
            tasks,
            dependencies,
        })
        .await?;
    rt_tx
        .send(EngineEvent::SetAllocation {
            task_id: "1".to_string(),
            value: 2,
        })
        .await?;
    rt_tx
        .send(EngineEvent::SetAllocation {
            task_id: "2".to_string(),
            value: 3,
        })
        .await?;
    rt_tx
        .send(EngineEvent::SetAllocation {
            task_id: "3".to_string(),
            value: 9,
        })
        .await?;
    rt_tx
        .send(EngineEvent::SetAllocation {
            task_id: "4".to_string(),
            value: 1,
        })
        .await?;
    rt_tx.send(EngineEvent::ApplyPressed).await?;
    rt_tx.send(EngineEvent::StartPressed).await?;
    rt_tx.send(EngineEvent::AdvanceHuman).await?;
    rt_tx.send(EngineEvent::AdvanceHuman).await?;
    rt_tx.send(EngineEvent::AdvanceHuman).await?;
    rt_tx
        .send(EngineEvent::ExecutionStatePolled {
            reply: ExecutionStateReply {
                all_finished_tasks: vec![
                    "bridge_base".to_string(),
                    "bridge_deck".to_string(),
                    "wheel_hub".to_string(),
                    "final_inspection".to_string(),
                ],
                ..ExecutionStateReply::default()
            },
        })
        .await?;

    let snapshot = new_shared();
    let runtime = Runtime::new(
        core(SessionMode::Record, true),
        rt_rx,
        backend,
        None,
        snapshot.clone(),
    );

    // Enforce an upper bound on how long this test may run.
    let run_result = timeout(Duration::from_secs(3), runtime.run()).await;

    match run_result {
        Ok(Ok(())) => {
            // Runtime finished normally within the timeout.
        }
        Ok(Err(e)) => {
            // Runtime returned an error.
            return Err(e.into());
        }
        Err(_) => {
            // Timeout elapsed: treat as test failure instead of hanging.
            panic!("runtime did not finish within 3 seconds");
        }
    }

    let recorded = calls.lock().unwrap().clone();

    // Start persisted the block order and launched execution, in that order.
    let save_at = recorded
        .iter()
        .position(|c| matches!(c, RemoteCall::SaveBlockOrder(_)))
        .expect("block order saved");
    let start_at = recorded
        .iter()
        .position(|c| matches!(c, RemoteCall::StartExecution(_)))
        .expect("execution started");
    assert!(save_at < start_at);

    // Every human step was reported in sequence.
    let completions: Vec<&str> = recorded
        .iter()
        .filter_map(|c| match c {
            RemoteCall::CompleteHumanTask(task) => Some(task.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        completions,
        ["bridge_base", "bridge_deck", "final_inspection"]
    );

    let logged: Vec<&str> = recorded
        .iter()
        .filter_map(|c| match c {
            RemoteCall::LogEvent(event) => Some(event.as_str()),
            _ => None,
        })
        .collect();
    assert!(logged.contains(&"Apply Button Pressed"));
    assert!(logged.contains(&"Start Button Pressed"));
    assert!(logged.contains(&"Finish Button Pressed"));

    let snap = snapshot.lock().unwrap();
    assert!(snap.all_finished);
    assert_eq!(snap.robot_total, 1);
    assert_eq!(snap.human_finished, 3);

    Ok(())
}

#[tokio::test]
async fn replay_apply_round_trips_allocation_through_the_backend() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<EngineEvent>(32);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let backend = FakeRemote::new(rt_tx.clone(), calls.clone()).with_previous_allocation(vec![
        AllocationRow {
            name: "wheel_hub".to_string(),
            assigned_to: "Robot".to_string(),
            slider_value: 8.0,
        },
    ]);

    let (tasks, dependencies) = task_set();
    rt_tx
        .send(EngineEvent::TaskSetLoaded {
            tasks,
            dependencies,
        })
        .await?;
    rt_tx.send(EngineEvent::ApplyPressed).await?;

    let snapshot = new_shared();
    let runtime = Runtime::new(
        core(SessionMode::Replay, false),
        rt_rx,
        backend,
        None,
        snapshot.clone(),
    );
    let handle = tokio::spawn(runtime.run());

    // The fake backend feeds the canned allocation back through the event
    // channel, so the merged assignment shows up in the snapshot shortly
    // after apply is processed.
    let merged = timeout(Duration::from_secs(3), async {
        loop {
            {
                let snap = snapshot.lock().unwrap();
                let wheel = snap.tasks.iter().find(|t| t.name == "wheel_hub");
                if let Some(task) = wheel {
                    if task.assigned_to == Executor::Robot {
                        break task.slider_value;
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("previous allocation never merged");
    assert_eq!(merged, 8);

    assert!(calls
        .lock()
        .unwrap()
        .iter()
        .any(|c| matches!(c, RemoteCall::FetchPreviousAllocation)));

    rt_tx.send(EngineEvent::ShutdownRequested).await?;
    let run_result = timeout(Duration::from_secs(3), handle).await??;
    run_result?;

    Ok(())
}

#[tokio::test]
async fn reset_reloads_the_task_set_through_the_backend() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<EngineEvent>(32);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let (tasks, dependencies) = task_set();
    let backend =
        FakeRemote::new(rt_tx.clone(), calls.clone()).with_task_set(tasks.clone(), dependencies.clone());

    rt_tx
        .send(EngineEvent::TaskSetLoaded {
            tasks,
            dependencies,
        })
        .await?;
    rt_tx
        .send(EngineEvent::SetAllocation {
            task_id: "3".to_string(),
            value: 9,
        })
        .await?;
    rt_tx.send(EngineEvent::ResetRequested).await?;

    let snapshot = new_shared();
    let runtime = Runtime::new(
        core(SessionMode::Record, false),
        rt_rx,
        backend,
        None,
        snapshot.clone(),
    );
    let handle = tokio::spawn(runtime.run());

    // First wait until the reset actually reached the backend; only then is
    // "wheel unassigned" unambiguously the reloaded state rather than the
    // pre-allocation one.
    timeout(Duration::from_secs(3), async {
        loop {
            if calls
                .lock()
                .unwrap()
                .iter()
                .any(|c| matches!(c, RemoteCall::ReloadTasks))
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("reset never reached the backend");

    // The reload arrives as a fresh TaskSetLoaded event, reseeding the wheel
    // back to unassigned.
    timeout(Duration::from_secs(3), async {
        loop {
            {
                let snap = snapshot.lock().unwrap();
                let wheel = snap.tasks.iter().find(|t| t.name == "wheel_hub");
                if let Some(task) = wheel {
                    if task.assigned_to == Executor::Unassigned && !snap.blocks.is_empty() {
                        break;
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("task set never reloaded");

    assert!(calls
        .lock()
        .unwrap()
        .iter()
        .any(|c| matches!(c, RemoteCall::ResetRemote)));

    rt_tx.send(EngineEvent::ShutdownRequested).await?;
    let run_result = timeout(Duration::from_secs(3), handle).await??;
    run_result?;

    Ok(())
}

#[tokio::test]
async fn gate_changes_surface_as_notifications() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<EngineEvent>(32);
    let (notify_tx, mut notify_rx) = mpsc::channel(16);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let backend = FakeRemote::new(rt_tx.clone(), calls.clone());

    let (tasks, dependencies) = task_set();
    rt_tx
        .send(EngineEvent::TaskSetLoaded {
            tasks,
            dependencies,
        })
        .await?;
    rt_tx
        .send(EngineEvent::HumanCheckPolled {
            reply: CheckReply {
                allowed: false,
                message: "waiting for bridge_base".to_string(),
                current_task: Some("bridge_deck".to_string()),
            },
            at: std::time::Instant::now(),
        })
        .await?;
    rt_tx.send(EngineEvent::ShutdownRequested).await?;

    let runtime = Runtime::new(
        core(SessionMode::Record, false),
        rt_rx,
        backend,
        Some(notify_tx),
        new_shared(),
    );
    timeout(Duration::from_secs(3), runtime.run()).await??;

    let mut saw_gate_change = false;
    while let Ok(notification) = notify_rx.try_recv() {
        if let cotask::engine::EngineNotification::GateChanged(status) = notification {
            assert_eq!(status.to_string(), "waiting for bridge_base");
            saw_gate_change = true;
        }
    }
    assert!(saw_gate_change);

    Ok(())
}
