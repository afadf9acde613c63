use std::io;

use crate::blockchain::Hash256;

/// Failures while building a Block or Chain value through the reducer.
#[derive(Debug, thiserror::Error)]
pub enum ReduceError {
    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("overrides supplied without a prior state")]
    MissingPriorState,

    #[error("field `{0}` is missing from both the prior state and the overrides")]
    MissingField(String),

    #[error("invalid value for field `{field}`: {source}")]
    InvalidField {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("difficulty {0} out of range (expected 1..=255)")]
    InvalidDifficulty(u32),

    #[error("target {target} does not match difficulty {diff}")]
    TargetMismatch { diff: u32, target: Hash256 },
}

/// Reasons a block cannot be appended to a ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("block #{0} has no cached hash")]
    NotSealed(u64),

    #[error("block #{0} cached hash does not match its contents")]
    HashMismatch(u64),

    #[error("block #{0} hash is above the target")]
    AboveTarget(u64),

    #[error("expected block #{expected}, got #{got}")]
    OutOfOrder { expected: u64, got: u64 },

    #[error("block #{0} does not reference its predecessor's hash")]
    BrokenLink(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Top-level error surfaced by the binary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Reduce(#[from] ReduceError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("failed to write block report: {0}")]
    Io(#[from] io::Error),
}
