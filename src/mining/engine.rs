use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::blockchain::{Block, BlockPatch, Chain, ChainPatch, Hash256};

/// Hash of `block` as used for proof-of-work.
#[inline]
pub fn hash_block(block: &Block) -> Hash256 {
    block.compute_hash()
}

/// Source of timestamps for freshly created blocks.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant. Makes mining rounds reproducible.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Shared flag checked by the miner between nonce attempts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of a successful round.
#[derive(Debug, Clone)]
pub struct MinedBlock {
    /// The accepted candidate, with its hash cached and `next` pointing at
    /// the fresh block.
    pub sealed: Block,
    pub hash: Hash256,
    /// Fresh block to mine in the next round.
    pub next: Block,
    /// Chain advanced by one block.
    pub chain: Chain,
    pub attempts: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub enum MineOutcome {
    Found(Box<MinedBlock>),
    /// Every nonce in the round's budget missed the target.
    Exhausted { attempts: u64, elapsed: Duration },
    Cancelled { attempts: u64, elapsed: Duration },
}

#[cfg(test)]
impl MineOutcome {
    pub fn found(&self) -> Option<&MinedBlock> {
        match self {
            MineOutcome::Found(mined) => Some(&**mined),
            _ => None,
        }
    }
}

/// Single-threaded proof-of-work miner.
#[derive(Debug)]
pub struct Miner<C: Clock = SystemClock> {
    clock: C,
    cancel: CancelToken,
}

impl Miner<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> Miner<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            cancel: CancelToken::default(),
        }
    }

    /// Token that stops any round in progress at the next nonce boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run one round of nonce search starting at `candidate`.
    ///
    /// Tries at most `chain.max_nonce` candidates. On a hit the chain is
    /// extended by one block; otherwise the round ends with no new block.
    pub fn mine(&self, candidate: &Block, chain: &Chain) -> MineOutcome {
        let started = Instant::now();
        let mut current = candidate.clone();

        for attempt in 0..chain.max_nonce {
            if self.cancel.is_cancelled() {
                warn!(
                    "MINER - round for block #{} cancelled after {} attempts",
                    chain.block_num, attempt
                );
                return MineOutcome::Cancelled {
                    attempts: attempt,
                    elapsed: started.elapsed(),
                };
            }

            let hash = hash_block(&current);
            if hash.meets(&chain.target) {
                let mined = self.extend(current, hash, chain, attempt + 1, started.elapsed());
                return MineOutcome::Found(Box::new(mined));
            }

            let nonce = current.nonce.wrapping_add(1);
            current = current.patch(BlockPatch {
                nonce: Some(nonce),
                name: Some(format!("Block #{nonce}")),
                ..Default::default()
            });
        }

        warn!(
            "MINER - no nonce below target for block #{} within {} attempts",
            chain.block_num, chain.max_nonce
        );
        MineOutcome::Exhausted {
            attempts: chain.max_nonce,
            elapsed: started.elapsed(),
        }
    }

    fn extend(
        &self,
        winner: Block,
        hash: Hash256,
        chain: &Chain,
        attempts: u64,
        elapsed: Duration,
    ) -> MinedBlock {
        let block_num = chain.block_num + 1;

        let sealed = winner.patch(BlockPatch {
            hash: Some(Some(hash)),
            next: Some(Some(block_num)),
            ..Default::default()
        });

        let next = Block {
            name: format!("Block #{block_num}"),
            block_num,
            next: None,
            hash: None,
            nonce: 0,
            previous_hash: hash,
            timestamp: self.clock.now(),
        };

        let sealed_ref = Arc::new(sealed.clone());
        let chain = chain.patch(ChainPatch {
            block_num: Some(block_num),
            block: Some(sealed_ref),
            head: Some(Arc::new(next.clone())),
        });

        debug!(
            "MINER - sealed {} (nonce={}, attempts={}, hash={})",
            sealed.name, sealed.nonce, attempts, hash
        );

        MinedBlock {
            sealed,
            hash,
            next,
            chain,
            attempts,
            elapsed,
        }
    }
}
