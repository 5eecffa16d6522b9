// src/seq/assembler.rs

//! Assembly of the block sequence from tasks, components and saved order.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::seq::block::{Block, BlockKind};
use crate::seq::category::CategoryTable;
use crate::seq::graph::DependencyGraph;
use crate::seq::grouper::connected_components;
use crate::seq::sequence::Sequence;
use crate::store::TaskStore;
use crate::types::TaskName;

/// Build the ordered block sequence for the current store.
///
/// - One group block per dependency component (members in store order), one
///   single block per unaffiliated task.
/// - Without a saved order, blocks are ordered by their first member's store
///   index.
/// - With a saved order, blocks whose display name appears in it are ordered
///   by their saved position; the rest follow in natural order.
/// - The terminal block always ends up last, whatever the ordering said.
pub fn assemble(
    store: &TaskStore,
    dependencies: &HashMap<TaskName, Vec<TaskName>>,
    labels: &HashMap<TaskName, String>,
    categories: &CategoryTable,
    terminal_keyword: &str,
    saved_order: Option<&[String]>,
) -> Sequence {
    let task_names: Vec<TaskName> =
        store.tasks().iter().map(|t| t.name.clone()).collect();
    let graph = DependencyGraph::build(&task_names, dependencies);
    let components = connected_components(store.tasks(), &graph);

    let grouped: HashSet<&str> = components
        .iter()
        .flat_map(|c| c.iter().map(|n| n.as_str()))
        .collect();

    let mut blocks: Vec<Block> = Vec::new();

    for members in &components {
        let mut indices: Vec<usize> = members
            .iter()
            .filter_map(|name| store.index_of_name(name))
            .collect();
        indices.sort_unstable();

        let tasks: Vec<&crate::task::Task> =
            indices.iter().map(|&i| &store.tasks()[i]).collect();
        let first = tasks[0];
        let name = display_name(&first.name, labels, categories);

        blocks.push(Block::new(
            BlockKind::Group,
            name,
            tasks.iter().map(|t| t.id.clone()).collect(),
            tasks.iter().map(|t| t.name.clone()).collect(),
            indices[0],
        ));
    }

    for (index, task) in store.tasks().iter().enumerate() {
        if grouped.contains(task.name.as_str()) {
            continue;
        }
        let name = display_name(&task.name, labels, categories);
        blocks.push(Block::new(
            BlockKind::Single,
            name,
            vec![task.id.clone()],
            vec![task.name.clone()],
            index,
        ));
    }

    blocks.sort_by_key(Block::natural_key);

    if let Some(saved) = saved_order.filter(|s| !s.is_empty()) {
        sort_by_saved_order(&mut blocks, saved);
    }

    pin_terminal_last(&mut blocks, terminal_keyword);

    debug!(
        block_count = blocks.len(),
        order = ?blocks.iter().map(Block::name).collect::<Vec<_>>(),
        "sequence assembled"
    );

    Sequence::new(blocks)
}

/// Display name for a block, resolved from its first member task.
fn display_name(
    first_member: &TaskName,
    labels: &HashMap<TaskName, String>,
    categories: &CategoryTable,
) -> String {
    labels
        .get(first_member)
        .cloned()
        .unwrap_or_else(|| categories.display_for(first_member))
}

/// Reorder blocks by their position in the saved display-name list.
///
/// Matching is case-insensitive and exact. Blocks without a saved position
/// keep their natural relative order after all resolved blocks.
fn sort_by_saved_order(blocks: &mut [Block], saved: &[String]) {
    for block in blocks.iter() {
        if saved_position(saved, block.name()).is_none() {
            debug!(block = %block.name(), "block not in saved order; natural fallback");
        }
    }

    blocks.sort_by_key(|block| match saved_position(saved, block.name()) {
        Some(position) => (0, position),
        None => (1, block.natural_key()),
    });
}

fn saved_position(saved: &[String], name: &str) -> Option<usize> {
    saved
        .iter()
        .position(|entry| entry.trim().eq_ignore_ascii_case(name.trim()))
}

/// Move the terminal block to the end if the ordering left it elsewhere.
fn pin_terminal_last(blocks: &mut Vec<Block>, terminal_keyword: &str) {
    let Some(position) = blocks
        .iter()
        .position(|b| b.matches_keyword(terminal_keyword))
    else {
        return;
    };

    if position + 1 != blocks.len() {
        warn!(
            block = %blocks[position].name(),
            "terminal block not last after ordering; pinning to the end"
        );
        let terminal = blocks.remove(position);
        blocks.push(terminal);
    }
}
