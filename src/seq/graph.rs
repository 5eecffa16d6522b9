// src/seq/graph.rs

use std::collections::HashMap;

use crate::types::TaskName;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct GraphNode {
    /// Names this task depends on, in the order the collaborator listed them.
    deps: Vec<TaskName>,
    /// Names that list this one among their dependencies.
    dependents: Vec<TaskName>,
}

/// In-memory dependency relation keyed by task name.
///
/// The relation is traversed undirected for grouping, so both directions are
/// kept as adjacency. Nodes exist for every name appearing as a key or as a
/// value in the supplied mapping; names without a backing task still conduct
/// connectivity (they are filtered out later when blocks are formed).
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: HashMap<TaskName, GraphNode>,
}

impl DependencyGraph {
    /// Build the graph from the collaborator's dependency mapping.
    ///
    /// `task_names` fixes the iteration order (current store order) so that
    /// adjacency lists come out identical for identical input; mapping keys
    /// that are not tasks are processed afterwards in sorted order.
    pub fn build(
        task_names: &[TaskName],
        dependencies: &HashMap<TaskName, Vec<TaskName>>,
    ) -> Self {
        let mut nodes: HashMap<TaskName, GraphNode> = HashMap::new();

        let mut ordered_keys: Vec<&TaskName> = task_names
            .iter()
            .filter(|name| dependencies.contains_key(*name))
            .collect();
        let mut extra_keys: Vec<&TaskName> = dependencies
            .keys()
            .filter(|key| !task_names.contains(key))
            .collect();
        extra_keys.sort();
        ordered_keys.extend(extra_keys);

        // First pass: create nodes with their dependency lists.
        for key in &ordered_keys {
            let deps = dependencies.get(*key).cloned().unwrap_or_default();
            for dep in &deps {
                nodes.entry(dep.clone()).or_default();
            }
            nodes.entry((*key).clone()).or_default().deps = deps;
        }

        // Second pass: populate dependents based on deps.
        for key in &ordered_keys {
            let deps = nodes
                .get(*key)
                .map(|n| n.deps.clone())
                .unwrap_or_default();

            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push((*key).clone());
                }
            }
        }

        Self { nodes }
    }

    /// Whether a name participates in the dependency relation at all.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Names this one depends on.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Names that depend on this one.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
