#![allow(dead_code)]

use std::collections::HashMap;

use cotask::remote::{DependencyReply, TaskRow};

/// Builder for a single collaborator task row.
pub struct TaskRowBuilder {
    row: TaskRow,
}

impl TaskRowBuilder {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            row: TaskRow {
                id: id.to_string(),
                name: name.to_string(),
                assigned_to: "Unassigned".to_string(),
                slider_value: 5.0,
                ..TaskRow::default()
            },
        }
    }

    pub fn assigned_to(mut self, executor: &str) -> Self {
        self.row.assigned_to = executor.to_string();
        self
    }

    pub fn slider(mut self, value: f64) -> Self {
        self.row.slider_value = value;
        self
    }

    pub fn robot_code(mut self, code: &str) -> Self {
        self.row.robot_code = code.to_string();
        self
    }

    pub fn fixed_to_human(mut self, val: bool) -> Self {
        self.row.fixed_to_human = val;
        self
    }

    pub fn build(self) -> TaskRow {
        self.row
    }
}

/// Builder for a whole task set: rows plus the dependency reply, as the
/// collaborator would send them.
pub struct TaskSetBuilder {
    rows: Vec<TaskRow>,
    dependencies: HashMap<String, Vec<String>>,
    group_names: HashMap<String, String>,
    next_id: usize,
}

impl TaskSetBuilder {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            dependencies: HashMap::new(),
            group_names: HashMap::new(),
            next_id: 1,
        }
    }

    /// Add a task row with an auto-assigned id ("1", "2", ...).
    pub fn task(mut self, name: &str) -> Self {
        let id = self.next_id.to_string();
        self.next_id += 1;
        self.rows.push(TaskRowBuilder::new(&id, name).build());
        self
    }

    /// Add a fully built row (for cases the simple `task` helper can't cover).
    pub fn row(mut self, row: TaskRow) -> Self {
        self.next_id += 1;
        self.rows.push(row);
        self
    }

    /// Declare that `task` depends on the named prerequisites.
    pub fn depends(mut self, task: &str, on: &[&str]) -> Self {
        self.dependencies
            .insert(task.to_string(), on.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Attach an explicit display label to the block containing `task`.
    pub fn group_name(mut self, task: &str, label: &str) -> Self {
        self.group_names
            .insert(task.to_string(), label.to_string());
        self
    }

    pub fn build(self) -> (Vec<TaskRow>, DependencyReply) {
        (
            self.rows,
            DependencyReply {
                dependencies: self.dependencies,
                group_names: self.group_names,
            },
        )
    }
}

impl Default for TaskSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
