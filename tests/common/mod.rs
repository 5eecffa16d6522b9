// tests/common/mod.rs

//! Shared fixture for the integration tests that drive the pure core
//! engine directly.

use cotask::engine::{CoreEngine, EngineEvent, EngineOptions, SessionState};
use cotask::remote::{DependencyReply, TaskRow};
use cotask::seq::CategoryTable;
use cotask::types::SessionMode;
use cotask_test_utils::builders::{TaskRowBuilder, TaskSetBuilder};

/// museum_case(1) + museum_plinth(2) as a dependency pair, hospital_wing(3)
/// free, triangle_frame(4) locked to the human, final_inspection(5) locked
/// and terminal.
pub fn task_set() -> (Vec<TaskRow>, DependencyReply) {
    TaskSetBuilder::new()
        .task("museum_case")
        .task("museum_plinth")
        .task("hospital_wing")
        .row(
            TaskRowBuilder::new("4", "triangle_frame")
                .fixed_to_human(true)
                .build(),
        )
        .row(
            TaskRowBuilder::new("5", "final_inspection")
                .robot_code("cannot")
                .fixed_to_human(true)
                .build(),
        )
        .depends("museum_plinth", &["museum_case"])
        .build()
}

/// A record-mode core with the fixture already loaded.
pub fn engine() -> CoreEngine {
    let mut core = CoreEngine::new(
        SessionState::new(SessionMode::Record, "P3"),
        CategoryTable::default(),
        "inspection".to_string(),
        None,
        EngineOptions::default(),
    );
    let (tasks, dependencies) = task_set();
    core.step(EngineEvent::TaskSetLoaded {
        tasks,
        dependencies,
    });
    core
}
