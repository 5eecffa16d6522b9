// src/seq/sequence.rs

//! The ordered block sequence and the constrained move operation.

use tracing::debug;

use crate::seq::block::{Block, BlockId, BlockSummary};
use crate::types::TaskId;

/// Result of a block move request.
///
/// Rejections are expected operator-reachable no-ops, not errors; callers
/// log them and leave state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The source is the last block; the terminal slot never moves.
    RejectedTerminalSource,
    /// The destination is the last position; nothing enters the terminal
    /// slot.
    RejectedTerminalSlot,
    RejectedSamePosition,
    RejectedUnknownBlock,
}

impl MoveOutcome {
    pub fn moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved)
    }
}

/// Ordered list of blocks. Flattening it yields the canonical task order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence {
    blocks: Vec<Block>,
}

impl Sequence {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn position_of(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id() == id)
    }

    /// Look up a block by display name, case-insensitive.
    pub fn block_by_name(&self, name: &str) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|b| b.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn block_containing_task(&self, task_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.contains_task(task_id))
    }

    /// Move `source` to `target`'s former position, shifting the blocks in
    /// between by one. The last position is locked in both directions.
    pub fn move_block(&mut self, source: &BlockId, target: &BlockId) -> MoveOutcome {
        let (Some(src), Some(dst)) = (self.position_of(source), self.position_of(target))
        else {
            debug!(%source, %target, "move rejected: unknown block");
            return MoveOutcome::RejectedUnknownBlock;
        };

        let last = self.blocks.len() - 1;
        if src == last {
            debug!(block = %self.blocks[src].name(), "move rejected: source is the terminal block");
            return MoveOutcome::RejectedTerminalSource;
        }
        if dst == last {
            debug!(block = %self.blocks[src].name(), "move rejected: destination is the terminal slot");
            return MoveOutcome::RejectedTerminalSlot;
        }
        if src == dst {
            debug!(block = %self.blocks[src].name(), "move rejected: same position");
            return MoveOutcome::RejectedSamePosition;
        }

        let block = self.blocks.remove(src);
        debug!(
            block = %block.name(),
            from = src,
            to = dst,
            "block moved"
        );
        self.blocks.insert(dst, block);
        MoveOutcome::Moved
    }

    /// Canonical task order: member ids concatenated in block order.
    pub fn flattened(&self) -> Vec<TaskId> {
        self.blocks
            .iter()
            .flat_map(|b| b.task_ids().iter().cloned())
            .collect()
    }

    /// Compact per-block description for notifications and persistence.
    pub fn summaries(&self) -> Vec<BlockSummary> {
        self.blocks.iter().map(Block::summary).collect()
    }
}
