pub mod block;
pub mod digest;
pub mod ledger;
pub mod model;
pub mod reducer;

pub use block::{Block, BlockPatch, genesis_block, with_block_fields};
pub use digest::Hash256;
pub use ledger::Ledger;
pub use model::{Chain, ChainPatch, chain_with_difficulty, genesis_chain, with_chain_fields};

/// Default Proof-of-Work difficulty: target is `2^(256 - 10)`.
pub const DEFAULT_DIFFICULTY: u32 = 10;

/// Difficulty bounds; the target has to fit in 256 bits.
pub const MIN_DIFFICULTY: u32 = 1;
pub const MAX_DIFFICULTY: u32 = 255;

/// Upper bound on nonces tried per mining round.
pub const DEFAULT_MAX_NONCE: u64 = 1 << 32;

pub const GENESIS_NAME: &str = "Genesis";
