// src/seq/mod.rs

//! Block sequencing: grouping, assembly and constrained reordering.
//!
//! - [`graph`] holds the undirected dependency relation keyed by task name.
//! - [`grouper`] computes connected components over that relation.
//! - [`category`] is the block category vocabulary for display names.
//! - [`block`] defines the movable units and their summaries.
//! - [`assembler`] turns components + saved order into an ordered sequence.
//! - [`sequence`] owns the block list and the constrained move operation.

pub mod assembler;
pub mod block;
pub mod category;
pub mod graph;
pub mod grouper;
pub mod sequence;

pub use assembler::assemble;
pub use block::{Block, BlockId, BlockKind, BlockSummary};
pub use category::{BlockCategory, CategoryTable};
pub use graph::DependencyGraph;
pub use grouper::connected_components;
pub use sequence::{MoveOutcome, Sequence};
