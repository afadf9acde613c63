use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use super::Hash256;
use super::reducer::{self, FieldMap, Record, field_map, put_field, take_field};
use crate::error::ReduceError;

/// A single immutable block. Updates go through [`Block::patch`] or
/// [`with_block_fields`] and always produce a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub block_num: u64,
    /// `block_num` of the successor in the ledger.
    pub next: Option<u64>,
    /// Cached hash, set once the block is sealed.
    pub hash: Option<Hash256>,
    pub nonce: u64,
    pub previous_hash: Hash256,
    pub timestamp: DateTime<Utc>,
}

/// Partial update of a [`Block`]: `Some` fields replace, `None` fields copy forward.
#[derive(Debug, Clone, Default)]
pub struct BlockPatch {
    pub name: Option<String>,
    pub block_num: Option<u64>,
    pub next: Option<Option<u64>>,
    pub hash: Option<Option<Hash256>>,
    pub nonce: Option<u64>,
    pub previous_hash: Option<Hash256>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Create the genesis block stamped with the current time.
pub fn genesis_block(name: &str) -> Result<Block, ReduceError> {
    genesis_block_at(name, Utc::now())
}

/// Create the genesis block with a fixed timestamp.
pub fn genesis_block_at(name: &str, timestamp: DateTime<Utc>) -> Result<Block, ReduceError> {
    reducer::from_defaults(field_map(json!({
        "name": name,
        "block_num": 0,
        "next": null,
        "hash": null,
        "nonce": 0,
        "previous_hash": Hash256::ZERO,
        "timestamp": timestamp,
    })))
}

/// Reduce `prior` with a dynamic set of field overrides.
pub fn with_block_fields(prior: &Block, overrides: FieldMap) -> Result<Block, ReduceError> {
    reducer::reduce(Some(prior), overrides)
}

impl Block {
    /// Apply a typed partial update, returning the new block.
    pub fn patch(&self, patch: BlockPatch) -> Block {
        Block {
            name: patch.name.unwrap_or_else(|| self.name.clone()),
            block_num: patch.block_num.unwrap_or(self.block_num),
            next: patch.next.unwrap_or(self.next),
            hash: patch.hash.unwrap_or(self.hash),
            nonce: patch.nonce.unwrap_or(self.nonce),
            previous_hash: patch.previous_hash.unwrap_or(self.previous_hash),
            timestamp: patch.timestamp.unwrap_or(self.timestamp),
        }
    }

    /// SHA-256 over `name`, `nonce`, `previous_hash`, `timestamp` and
    /// `block_num`, concatenated in that order. `hash` and `next` are not
    /// part of the preimage.
    pub fn compute_hash(&self) -> Hash256 {
        let preimage = format!(
            "{}{}{}{}{}",
            self.name,
            self.nonce,
            self.previous_hash,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.block_num
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        Hash256::from(digest)
    }

    /// True when the cached hash is present and matches the contents.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == Some(self.compute_hash())
    }
}

impl Record for Block {
    const FIELDS: &'static [&'static str] = &[
        "name",
        "block_num",
        "next",
        "hash",
        "nonce",
        "previous_hash",
        "timestamp",
    ];

    fn to_fields(&self) -> Result<FieldMap, ReduceError> {
        let mut fields = FieldMap::new();
        put_field(&mut fields, "name", &self.name)?;
        put_field(&mut fields, "block_num", &self.block_num)?;
        put_field(&mut fields, "next", &self.next)?;
        put_field(&mut fields, "hash", &self.hash)?;
        put_field(&mut fields, "nonce", &self.nonce)?;
        put_field(&mut fields, "previous_hash", &self.previous_hash)?;
        put_field(&mut fields, "timestamp", &self.timestamp)?;
        Ok(fields)
    }

    fn from_fields(mut fields: FieldMap) -> Result<Self, ReduceError> {
        Ok(Self {
            name: take_field(&mut fields, "name")?,
            block_num: take_field(&mut fields, "block_num")?,
            next: take_field(&mut fields, "next")?,
            hash: take_field(&mut fields, "hash")?,
            nonce: take_field(&mut fields, "nonce")?,
            previous_hash: take_field(&mut fields, "previous_hash")?,
            timestamp: take_field(&mut fields, "timestamp")?,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::TimeZone;

    use super::*;

    pub fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    pub fn fixed_genesis() -> Block {
        genesis_block_at("Genesis", fixed_time()).unwrap()
    }

    #[test]
    fn genesis_defaults() {
        let b = genesis_block("X").unwrap();
        assert_eq!(b.name, "X");
        assert_eq!(b.block_num, 0);
        assert_eq!(b.nonce, 0);
        assert_eq!(b.previous_hash, Hash256::ZERO);
        assert_eq!(b.next, None);
        assert_eq!(b.hash, None);
    }

    #[test]
    fn hash_is_deterministic() {
        let a = fixed_genesis();
        let b = fixed_genesis();
        assert_eq!(a, b);
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn hash_ignores_cache_and_link_fields() {
        let b = fixed_genesis();
        let sealed = b.patch(BlockPatch {
            hash: Some(Some(b.compute_hash())),
            next: Some(Some(1)),
            ..Default::default()
        });
        assert_eq!(sealed.compute_hash(), b.compute_hash());
        assert!(sealed.has_valid_hash());
        assert!(!b.has_valid_hash());
    }

    #[test]
    fn invalid_when_mutated() {
        let b = fixed_genesis();
        let sealed = b.patch(BlockPatch {
            hash: Some(Some(b.compute_hash())),
            ..Default::default()
        });
        let tampered = sealed.patch(BlockPatch {
            nonce: Some(sealed.nonce + 1),
            ..Default::default()
        });
        assert_ne!(tampered.compute_hash(), sealed.compute_hash());
        assert!(!tampered.has_valid_hash());
    }

    #[test]
    fn every_field_feeds_the_hash() {
        let b = fixed_genesis();
        let base = b.compute_hash();
        let variants = [
            b.patch(BlockPatch {
                name: Some("Y".into()),
                ..Default::default()
            }),
            b.patch(BlockPatch {
                nonce: Some(1),
                ..Default::default()
            }),
            b.patch(BlockPatch {
                block_num: Some(1),
                ..Default::default()
            }),
            b.patch(BlockPatch {
                previous_hash: Hash256::pow2(3),
                ..Default::default()
            }),
            b.patch(BlockPatch {
                timestamp: Some(fixed_time() + chrono::Duration::nanoseconds(1)),
                ..Default::default()
            }),
        ];
        for v in variants {
            assert_ne!(v.compute_hash(), base);
        }
    }

    #[test]
    fn empty_patch_is_identity() {
        let b = fixed_genesis();
        assert_eq!(b.patch(BlockPatch::default()), b);
        assert_eq!(with_block_fields(&b, FieldMap::new()).unwrap(), b);
    }

    #[test]
    fn overrides_replace_only_named_fields() {
        let b = fixed_genesis();
        let over = field_map(json!({ "nonce": 42, "name": "Block #42" }));
        let updated = with_block_fields(&b, over).unwrap();
        assert_eq!(updated.nonce, 42);
        assert_eq!(updated.name, "Block #42");
        assert_eq!(updated.block_num, b.block_num);
        assert_eq!(updated.previous_hash, b.previous_hash);
        assert_eq!(updated.timestamp, b.timestamp);
    }

    #[test]
    fn bogus_field_is_rejected() {
        let b = fixed_genesis();
        let over = field_map(json!({ "data": 1 }));
        let err = with_block_fields(&b, over).unwrap_err();
        assert!(matches!(err, ReduceError::UnknownField(ref k) if k == "data"));
    }
}
