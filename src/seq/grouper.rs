// src/seq/grouper.rs

//! Connected-component grouping over the dependency relation.

use std::collections::HashSet;

use tracing::debug;

use crate::seq::graph::DependencyGraph;
use crate::task::Task;
use crate::types::TaskName;

/// Compute the maximal connected components of the undirected dependency
/// relation, restricted to real tasks.
///
/// Tasks are visited in store order, so components come out in the order of
/// their first member and repeated runs on identical input produce identical
/// output. Dependency names without a backing task conduct connectivity
/// during traversal but are dropped from the result. Components that end up
/// with fewer than two real tasks are discarded; their tasks stay
/// independent.
pub fn connected_components(
    tasks: &[Task],
    graph: &DependencyGraph,
) -> Vec<Vec<TaskName>> {
    let task_names: HashSet<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    let mut visited: HashSet<TaskName> = HashSet::new();
    let mut components = Vec::new();

    for task in tasks {
        if !graph.contains(&task.name) || visited.contains(&task.name) {
            continue;
        }

        let reached = traverse_from(&task.name, graph, &mut visited);

        let members: Vec<TaskName> = reached
            .into_iter()
            .filter(|name| task_names.contains(name.as_str()))
            .collect();

        if members.len() >= 2 {
            debug!(?members, "dependency component found");
            components.push(members);
        }
    }

    components
}

/// Depth-first traversal with an explicit stack, following edges in both
/// directions. Returns every name reached, including non-task names.
fn traverse_from(
    root: &str,
    graph: &DependencyGraph,
    visited: &mut HashSet<TaskName>,
) -> Vec<TaskName> {
    let mut stack: Vec<TaskName> = vec![root.to_string()];
    let mut reached = Vec::new();

    while let Some(name) = stack.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        reached.push(name.clone());

        for dep in graph.dependencies_of(&name) {
            if !visited.contains(dep) {
                stack.push(dep.clone());
            }
        }
        for dependent in graph.dependents_of(&name) {
            if !visited.contains(dependent) {
                stack.push(dependent.clone());
            }
        }
    }

    reached
}
