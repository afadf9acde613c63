use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use super::reducer::{self, FieldMap, Record, field_map, put_field, take_field};
use super::{Block, DEFAULT_DIFFICULTY, DEFAULT_MAX_NONCE, Hash256, MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::error::ReduceError;

/// Mining configuration plus the current tip of the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub block_num: u64,
    pub max_nonce: u64,
    pub diff: u32,
    pub target: Hash256,
    /// Previous block (the one sealed by the last successful round).
    pub block: Arc<Block>,
    /// Most recent block, the next candidate to mine.
    pub head: Arc<Block>,
}

/// Partial update of a [`Chain`]. `max_nonce`, `diff` and `target` are fixed
/// when the chain is created and cannot be patched.
#[derive(Debug, Clone, Default)]
pub struct ChainPatch {
    pub block_num: Option<u64>,
    pub block: Option<Arc<Block>>,
    pub head: Option<Arc<Block>>,
}

/// `2^(256 - diff)`.
pub fn target_for(diff: u32) -> Result<Hash256, ReduceError> {
    if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&diff) {
        return Err(ReduceError::InvalidDifficulty(diff));
    }
    Hash256::pow2(256 - diff).ok_or(ReduceError::InvalidDifficulty(diff))
}

/// Genesis chain at the default difficulty.
pub fn genesis_chain(initial_block: &Block) -> Result<Chain, ReduceError> {
    chain_with_difficulty(initial_block, DEFAULT_DIFFICULTY)
}

/// Genesis chain at an explicit difficulty.
pub fn chain_with_difficulty(initial_block: &Block, diff: u32) -> Result<Chain, ReduceError> {
    let target = target_for(diff)?;
    reducer::from_defaults(field_map(json!({
        "block_num": 0,
        "max_nonce": DEFAULT_MAX_NONCE,
        "diff": diff,
        "target": target,
        "block": initial_block,
        "head": initial_block,
    })))
}

/// Reduce `prior` with a dynamic set of field overrides.
pub fn with_chain_fields(prior: &Chain, overrides: FieldMap) -> Result<Chain, ReduceError> {
    reducer::reduce(Some(prior), overrides)
}

impl Chain {
    pub fn patch(&self, patch: ChainPatch) -> Chain {
        Chain {
            block_num: patch.block_num.unwrap_or(self.block_num),
            max_nonce: self.max_nonce,
            diff: self.diff,
            target: self.target,
            block: patch.block.unwrap_or_else(|| Arc::clone(&self.block)),
            head: patch.head.unwrap_or_else(|| Arc::clone(&self.head)),
        }
    }
}

impl Record for Chain {
    const FIELDS: &'static [&'static str] =
        &["block_num", "max_nonce", "diff", "target", "block", "head"];

    fn to_fields(&self) -> Result<FieldMap, ReduceError> {
        let mut fields = FieldMap::new();
        put_field(&mut fields, "block_num", &self.block_num)?;
        put_field(&mut fields, "max_nonce", &self.max_nonce)?;
        put_field(&mut fields, "diff", &self.diff)?;
        put_field(&mut fields, "target", &self.target)?;
        put_field(&mut fields, "block", &self.block)?;
        put_field(&mut fields, "head", &self.head)?;
        Ok(fields)
    }

    fn from_fields(mut fields: FieldMap) -> Result<Self, ReduceError> {
        let chain = Self {
            block_num: take_field(&mut fields, "block_num")?,
            max_nonce: take_field(&mut fields, "max_nonce")?,
            diff: take_field(&mut fields, "diff")?,
            target: take_field(&mut fields, "target")?,
            block: take_field(&mut fields, "block")?,
            head: take_field(&mut fields, "head")?,
        };

        if target_for(chain.diff)? != chain.target {
            return Err(ReduceError::TargetMismatch {
                diff: chain.diff,
                target: chain.target,
            });
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::block::tests::fixed_genesis;

    #[test]
    fn genesis_chain_defaults() {
        let b = fixed_genesis();
        let chain = genesis_chain(&b).unwrap();
        assert_eq!(chain.block_num, 0);
        assert_eq!(chain.max_nonce, 1u64 << 32);
        assert_eq!(chain.diff, 10);
        assert_eq!(chain.target, Hash256::pow2(246).unwrap());
        assert_eq!(*chain.block, b);
        assert_eq!(*chain.head, b);
    }

    #[test]
    fn difficulty_bounds() {
        let b = fixed_genesis();
        assert_eq!(
            chain_with_difficulty(&b, 1).unwrap().target,
            Hash256::pow2(255).unwrap()
        );
        assert!(matches!(
            chain_with_difficulty(&b, 0),
            Err(ReduceError::InvalidDifficulty(0))
        ));
        assert!(matches!(
            chain_with_difficulty(&b, 256),
            Err(ReduceError::InvalidDifficulty(256))
        ));
    }

    #[test]
    fn empty_overrides_copy_chain() {
        let chain = genesis_chain(&fixed_genesis()).unwrap();
        assert_eq!(with_chain_fields(&chain, FieldMap::new()).unwrap(), chain);
        assert_eq!(chain.patch(ChainPatch::default()), chain);
    }

    #[test]
    fn patch_keeps_mining_config() {
        let chain = genesis_chain(&fixed_genesis()).unwrap();
        let advanced = chain.patch(ChainPatch {
            block_num: Some(1),
            ..Default::default()
        });
        assert_eq!(advanced.block_num, 1);
        assert_eq!(advanced.max_nonce, chain.max_nonce);
        assert_eq!(advanced.diff, chain.diff);
        assert_eq!(advanced.target, chain.target);
    }

    #[test]
    fn override_keeps_other_fields() {
        let chain = genesis_chain(&fixed_genesis()).unwrap();
        let updated = with_chain_fields(&chain, field_map(json!({ "block_num": 5 }))).unwrap();
        assert_eq!(updated.block_num, 5);
        assert_eq!(updated.diff, chain.diff);
        assert_eq!(updated.target, chain.target);
        assert_eq!(updated.head, chain.head);
    }

    #[test]
    fn target_must_follow_difficulty() {
        let chain = genesis_chain(&fixed_genesis()).unwrap();
        let err = with_chain_fields(&chain, field_map(json!({ "diff": 11 }))).unwrap_err();
        assert!(matches!(err, ReduceError::TargetMismatch { diff: 11, .. }));

        let retuned = with_chain_fields(
            &chain,
            field_map(json!({ "diff": 11, "target": Hash256::pow2(245).unwrap() })),
        )
        .unwrap();
        assert_eq!(retuned.diff, 11);
    }

    #[test]
    fn unknown_chain_field_is_rejected() {
        let chain = genesis_chain(&fixed_genesis()).unwrap();
        let err = with_chain_fields(&chain, field_map(json!({ "next": null }))).unwrap_err();
        assert!(matches!(err, ReduceError::UnknownField(ref k) if k == "next"));
    }
}
