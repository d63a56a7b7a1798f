//! Collaborator ports consumed by the merge engine.
//!
//! The engine never talks to a node or a compiler directly. Callers inject a
//! [`ChainReader`] and an [`ArtifactSource`]; tests use the in-memory doubles
//! in [`crate::memory`].

use chronicle_types::{Address, ChainId, ConstructorAbi, Ledger};

use crate::error::LedgerError;

/// Read access to deployed contract state.
pub trait ChainReader: Send + Sync {
    /// Best-effort `version()` lookup. Any failure yields `None`.
    fn version_of(&self, address: &Address) -> Option<String>;

    /// Implementation address held in the proxy's EIP-1967 slot.
    ///
    /// Errors when the chain cannot be queried; an upgrade cannot be
    /// recorded without this answer.
    fn implementation_of(&self, proxy: &Address) -> Result<Address, LedgerError>;
}

/// Access to compiled contract artifacts.
pub trait ArtifactSource: Send + Sync {
    /// Rebuild artifacts so ABIs match the deployed sources.
    fn refresh(&self) -> Result<(), LedgerError>;

    /// Constructor signature of `contract`, or `None` if it declares none.
    fn constructor(&self, contract: &str) -> Result<Option<ConstructorAbi>, LedgerError>;
}

/// Storage for per-chain ledgers.
pub trait LedgerStore: Send + Sync {
    /// Read the ledger for `chain_id`.
    ///
    /// Returns `Ok(None)` if no ledger has been written yet.
    fn load(&self, chain_id: ChainId) -> Result<Option<Ledger>, LedgerError>;

    /// Replace the stored ledger for `ledger.chain_id` in full.
    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError>;

    /// Read the ledger, or start an empty one.
    fn load_or_empty(&self, chain_id: ChainId) -> Result<Ledger, LedgerError> {
        Ok(self
            .load(chain_id)?
            .unwrap_or_else(|| Ledger::empty(chain_id)))
    }
}

/// Chain reader used when no RPC endpoint is configured.
///
/// Versions are simply absent; upgrade verification fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisconnectedChain;

impl ChainReader for DisconnectedChain {
    fn version_of(&self, _address: &Address) -> Option<String> {
        None
    }

    fn implementation_of(&self, proxy: &Address) -> Result<Address, LedgerError> {
        Err(LedgerError::ChainUnavailable(format!(
            "no RPC endpoint configured; cannot verify upgrade of {proxy}"
        )))
    }
}
