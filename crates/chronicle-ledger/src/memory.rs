//! In-memory collaborators for testing and embedding.
//!
//! [`InMemoryChain`], [`InMemoryArtifacts`] and [`InMemoryLedgerStore`]
//! implement the ports in [`crate::traits`] over plain maps, so the merge
//! engine can be exercised without a node, a compiler or a filesystem.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use chronicle_types::{Address, ChainId, ConstructorAbi, Ledger};

use crate::error::LedgerError;
use crate::traits::{ArtifactSource, ChainReader, LedgerStore};

/// A fake chain: fixed versions and proxy slots keyed by address.
#[derive(Clone, Debug, Default)]
pub struct InMemoryChain {
    versions: HashMap<String, String>,
    implementations: HashMap<String, Address>,
    unreachable: bool,
}

impl InMemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain every slot read fails against.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with_version(mut self, address: &str, version: &str) -> Self {
        self.versions
            .insert(address.to_ascii_lowercase(), version.to_string());
        self
    }

    /// Point `proxy`'s implementation slot at `implementation`.
    pub fn with_implementation(mut self, proxy: &str, implementation: &str) -> Self {
        self.implementations
            .insert(proxy.to_ascii_lowercase(), Address::new(implementation));
        self
    }
}

impl ChainReader for InMemoryChain {
    fn version_of(&self, address: &Address) -> Option<String> {
        if self.unreachable {
            return None;
        }
        self.versions.get(&address.normalized()).cloned()
    }

    fn implementation_of(&self, proxy: &Address) -> Result<Address, LedgerError> {
        if self.unreachable {
            return Err(LedgerError::ChainUnavailable(format!(
                "cannot read implementation slot of {proxy}"
            )));
        }
        // An unset slot reads as zero.
        Ok(self
            .implementations
            .get(&proxy.normalized())
            .cloned()
            .unwrap_or_else(|| Address::new(format!("0x{}", "0".repeat(40)))))
    }
}

/// Constructor ABIs served from a map; unknown contracts have none.
#[derive(Debug, Default)]
pub struct InMemoryArtifacts {
    constructors: HashMap<String, ConstructorAbi>,
    fail_refresh: bool,
    refreshes: AtomicUsize,
}

impl InMemoryArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constructor(mut self, contract: &str, abi: ConstructorAbi) -> Self {
        self.constructors.insert(contract.to_string(), abi);
        self
    }

    /// Make every [`ArtifactSource::refresh`] call fail.
    pub fn failing() -> Self {
        Self {
            fail_refresh: true,
            ..Self::default()
        }
    }

    /// Number of refreshes requested so far.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl ArtifactSource for InMemoryArtifacts {
    fn refresh(&self) -> Result<(), LedgerError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh {
            return Err(LedgerError::BuildFailed("refresh disabled".into()));
        }
        Ok(())
    }

    fn constructor(&self, contract: &str) -> Result<Option<ConstructorAbi>, LedgerError> {
        Ok(self.constructors.get(contract).cloned())
    }
}

/// An in-memory implementation of [`LedgerStore`].
///
/// Ledgers live in a `HashMap` behind a `RwLock` and are lost when the
/// store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    ledgers: RwLock<HashMap<ChainId, Ledger>>,
    writes: AtomicUsize,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing ledger.
    pub fn with_ledger(ledger: Ledger) -> Self {
        let mut ledgers = HashMap::new();
        ledgers.insert(ledger.chain_id, ledger);
        Self {
            ledgers: RwLock::new(ledgers),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of successful saves.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn load(&self, chain_id: ChainId) -> Result<Option<Ledger>, LedgerError> {
        let ledgers = self
            .ledgers
            .read()
            .map_err(|e| LedgerError::Serialization(format!("lock poisoned: {e}")))?;
        Ok(ledgers.get(&chain_id).cloned())
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let mut ledgers = self
            .ledgers
            .write()
            .map_err(|e| LedgerError::Serialization(format!("lock poisoned: {e}")))?;
        ledgers.insert(ledger.chain_id, ledger.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chronicle_types::AbiParam;

    use super::*;

    #[test]
    fn chain_lookups_ignore_address_case() {
        let chain = InMemoryChain::new()
            .with_version("0xABC", "1.2.0")
            .with_implementation("0xPROXY", "0xImpl");
        assert_eq!(chain.version_of(&Address::new("0xabc")).as_deref(), Some("1.2.0"));
        assert_eq!(
            chain.implementation_of(&Address::new("0xproxy")).unwrap(),
            Address::new("0ximpl")
        );
    }

    #[test]
    fn unset_slot_reads_zero() {
        let chain = InMemoryChain::new();
        let slot = chain.implementation_of(&Address::new("0x1")).unwrap();
        assert_eq!(slot.as_str(), format!("0x{}", "0".repeat(40)));
    }

    #[test]
    fn unreachable_chain_fails_slot_reads() {
        let chain = InMemoryChain::unreachable().with_version("0x1", "1");
        assert!(chain.version_of(&Address::new("0x1")).is_none());
        assert!(matches!(
            chain.implementation_of(&Address::new("0x1")),
            Err(LedgerError::ChainUnavailable(_))
        ));
    }

    #[test]
    fn artifacts_count_refreshes() {
        let artifacts = InMemoryArtifacts::new()
            .with_constructor("Token", ConstructorAbi::new(vec![AbiParam::new("owner", "address")]));
        artifacts.refresh().unwrap();
        artifacts.refresh().unwrap();
        assert_eq!(artifacts.refresh_count(), 2);
        assert!(artifacts.constructor("Token").unwrap().is_some());
        assert!(artifacts.constructor("Missing").unwrap().is_none());
        assert!(InMemoryArtifacts::failing().refresh().is_err());
    }

    #[test]
    fn store_round_trips_by_chain() {
        let store = InMemoryLedgerStore::new();
        assert!(store.load(ChainId(1)).unwrap().is_none());
        assert_eq!(store.load_or_empty(ChainId(1)).unwrap(), Ledger::empty(ChainId(1)));

        store.save(&Ledger::empty(ChainId(5))).unwrap();
        assert!(store.load(ChainId(5)).unwrap().is_some());
        assert!(store.load(ChainId(1)).unwrap().is_none());
        assert_eq!(store.write_count(), 1);
    }
}
