use serde::Serialize;

use super::{Block, Hash256};
use crate::error::LedgerError;

/// Append-only history of sealed blocks.
///
/// Blocks are stored by position, so `block.block_num` is also the index of
/// the block and `block.next` is the index of its successor.
#[derive(Debug, Clone, Serialize)]
pub struct Ledger {
    blocks: Vec<Block>,
    target: Hash256,
}

impl Ledger {
    pub fn new(target: Hash256) -> Self {
        Self {
            blocks: Vec::new(),
            target,
        }
    }

    /// Append a sealed block after checking hash, proof-of-work and linkage.
    pub fn append(&mut self, block: Block) -> Result<&Block, LedgerError> {
        self.check_next(&block)?;
        self.blocks.push(block);
        Ok(&self.blocks[self.blocks.len() - 1])
    }

    fn check_next(&self, block: &Block) -> Result<(), LedgerError> {
        let expected = self.blocks.len() as u64;
        if block.block_num != expected {
            return Err(LedgerError::OutOfOrder {
                expected,
                got: block.block_num,
            });
        }

        let hash = block.hash.ok_or(LedgerError::NotSealed(block.block_num))?;
        if !block.has_valid_hash() {
            return Err(LedgerError::HashMismatch(block.block_num));
        }
        if !hash.meets(&self.target) {
            return Err(LedgerError::AboveTarget(block.block_num));
        }

        let expected_previous = match self.blocks.last() {
            Some(prev) => prev.hash,
            None => Some(Hash256::ZERO),
        };
        if expected_previous != Some(block.previous_hash) {
            return Err(LedgerError::BrokenLink(block.block_num));
        }
        Ok(())
    }

    pub fn get(&self, block_num: u64) -> Option<&Block> {
        self.blocks.get(usize::try_from(block_num).ok()?)
    }

    /// Follow the forward link of `block`, if its successor is stored.
    pub fn next_of(&self, block: &Block) -> Option<&Block> {
        self.get(block.next?)
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Re-validate every stored block: hashes, proof-of-work and linkage.
    pub fn is_valid_chain(&self) -> bool {
        let mut replay = Ledger::new(self.target);
        self.blocks
            .iter()
            .all(|block| replay.append(block.clone()).is_ok())
    }
}
