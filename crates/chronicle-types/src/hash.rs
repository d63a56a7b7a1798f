use std::fmt;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::TypeError;

/// Number of hex characters in a short hash (4 bytes).
pub const SHORT_HASH_LEN: usize = 8;

/// keccak256 digest of a contract's creation bytecode.
///
/// Stored as lowercase hex without a `0x` prefix. Two deployments under the
/// same contract name with different hashes were built from different
/// bytecode.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InitcodeHash(String);

impl InitcodeHash {
    /// Hash the hex-encoded creation input of a transaction.
    pub fn compute(initcode: &str) -> Result<Self, TypeError> {
        let hex_part = initcode.strip_prefix("0x").unwrap_or(initcode);
        let bytes = hex::decode(hex_part).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(hex::encode(Keccak256::digest(&bytes))))
    }

    /// Parse an existing digest (full 64 hex characters, optional `0x`).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(hex_part).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        Ok(Self(hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, as shown to operators and used in storage keys.
    pub fn short(&self) -> &str {
        self.0.get(..SHORT_HASH_LEN).unwrap_or(&self.0)
    }
}

impl fmt::Debug for InitcodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InitcodeHash({})", self.short())
    }
}

impl fmt::Display for InitcodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
