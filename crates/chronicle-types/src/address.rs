use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// An EVM contract address as written by the build tool or the chain.
///
/// The original spelling (usually EIP-55 checksummed) is preserved for
/// output, but identity is case-insensitive: `0xAbC…` and `0xabc…` are the
/// same address for equality and hashing.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap an address string without validation.
    ///
    /// Broadcast documents and older ledgers are taken at face value; only
    /// values read back from chain storage go through [`Address::from_storage_word`].
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Decode the low 20 bytes of a 32-byte storage word (`0x`-prefixed hex).
    pub fn from_storage_word(word: &str) -> Result<Self, TypeError> {
        let hex_part = word.trim().trim_matches('"');
        let hex_part = hex_part.strip_prefix("0x").unwrap_or(hex_part);
        let bytes = hex::decode(hex_part).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        Ok(Self(format!("0x{}", hex::encode(&bytes[12..]))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-case form used for lookups in label maps.
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Case-insensitive comparison against a raw string (e.g. a constructor argument).
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
