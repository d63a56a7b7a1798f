use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TypeError;
use crate::record::ContractRecord;

/// EVM chain identifier.
///
/// Accepts both a JSON number and a decimal string on input, since ledgers
/// written by older tooling stored whatever the command line supplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl FromStr for ChainId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidChainId(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record in the latest directory, stamped with the batch that last
/// touched it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestEntry {
    #[serde(flatten)]
    pub record: ContractRecord,
    pub timestamp: u64,
    pub commit_hash: String,
}

/// Every contract produced by one merged batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub contracts: IndexMap<String, ContractRecord>,
    pub timestamp: u64,
    pub commit_hash: String,
}

/// Persisted deployment state for one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub chain_id: ChainId,
    #[serde(default)]
    pub latest: IndexMap<String, LatestEntry>,
    /// Newest first.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Ledger {
    pub fn empty(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            latest: IndexMap::new(),
            history: Vec::new(),
        }
    }

    /// Commit of the most recent history entry.
    pub fn last_commit(&self) -> Option<&str> {
        self.history.first().map(|entry| entry.commit_hash.as_str())
    }

    /// Re-establish newest-first order. Stable, so entries sharing a
    /// timestamp keep their relative order.
    pub fn sort_history(&mut self) {
        self.history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }
}
