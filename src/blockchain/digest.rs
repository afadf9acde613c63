use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DigestError {
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),

    #[error("Invalid digest length. 32 bytes expected, got {0}")]
    InvalidLength(usize),
}

/// 256-bit SHA-256 digest.
///
/// Bytes are stored big-endian, so the derived ordering is the ordering of
/// the digest read as an unsigned integer. That is what target comparison
/// relies on.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// The all-zero digest, used as `previous_hash` of a genesis block.
    pub const ZERO: Hash256 = Hash256([0; 32]);

    /// `2^exp` as a 256-bit value. `None` when it does not fit.
    pub fn pow2(exp: u32) -> Option<Self> {
        if exp >= 256 {
            return None;
        }
        let mut bytes = [0u8; 32];
        bytes[31 - (exp / 8) as usize] = 1 << (exp % 8);
        Some(Self(bytes))
    }

    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(value: impl AsRef<str>) -> Result<Self, DigestError> {
        let decoded = hex::decode(value.as_ref())?;
        if decoded.len() != 32 {
            return Err(DigestError::InvalidLength(decoded.len()));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    /// Proof-of-work check: the digest as an integer must not exceed `target`.
    #[inline]
    pub fn meets(&self, target: &Hash256) -> bool {
        self <= target
    }
}

impl From<[u8; 32]> for Hash256 {
    #[inline]
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Hash256::from_hex(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{DigestError, Hash256};

    #[test]
    fn pow2_sets_single_bit() {
        let one = Hash256::pow2(0).unwrap();
        assert_eq!(one.to_hex(), format!("{}01", "0".repeat(62)));

        let top = Hash256::pow2(255).unwrap();
        assert_eq!(top.to_hex(), format!("80{}", "0".repeat(62)));

        assert_eq!(
            Hash256::pow2(246).unwrap().to_hex(),
            format!("0040{}", "0".repeat(60))
        );
        assert!(Hash256::pow2(256).is_none());
    }

    #[test]
    fn ordering_is_numeric() {
        let small = Hash256::pow2(8).unwrap();
        let big = Hash256::pow2(200).unwrap();
        assert!(small < big);
        assert!(small.meets(&big));
        assert!(big.meets(&big));
        assert!(!big.meets(&small));
        assert!(Hash256::ZERO.meets(&small));
    }

    #[test]
    fn hex_parsing_rejects_bad_input() {
        let h = Hash256::pow2(100).unwrap();
        assert_eq!(Hash256::from_hex(h.to_hex()).unwrap(), h);
        assert_eq!(Hash256::from_hex("abcd"), Err(DigestError::InvalidLength(2)));
        assert!(matches!(Hash256::from_hex("zz"), Err(DigestError::Hex(_))));
    }
}
