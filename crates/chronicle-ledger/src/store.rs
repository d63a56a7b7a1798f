//! JSON file storage for ledgers.
//!
//! One document per chain at `<dir>/<chain_id>.json`. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so a reader never observes a partially written ledger.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use chronicle_types::{ChainId, Ledger};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::LedgerError;
use crate::traits::LedgerStore;

/// A [`LedgerStore`] backed by pretty-printed JSON files.
#[derive(Clone, Debug)]
pub struct JsonLedgerStore {
    dir: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding the ledger of `chain_id`.
    pub fn path_for(&self, chain_id: ChainId) -> PathBuf {
        self.dir.join(format!("{chain_id}.json"))
    }
}

impl LedgerStore for JsonLedgerStore {
    fn load(&self, chain_id: ChainId) -> Result<Option<Ledger>, LedgerError> {
        let path = self.path_for(chain_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no ledger on disk yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let ledger: Ledger = serde_json::from_slice(&bytes).map_err(|e| {
            LedgerError::Serialization(format!("{}: {e}", path.display()))
        })?;
        Ok(Some(ledger))
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(ledger.chain_id);

        let mut json = serde_json::to_string_pretty(ledger)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        json.push('\n');

        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| LedgerError::Io(e.error))?;

        debug!(path = %path.display(), bytes = json.len(), "ledger written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chronicle_types::{Address, ContractRecord, HistoryEntry, LatestEntry};
    use indexmap::IndexMap;

    use super::*;

    fn sample() -> Ledger {
        let record = ContractRecord::plain(Address::new("0x1"), "0xtx", None);
        let mut ledger = Ledger::empty(ChainId(31337));
        ledger.latest.insert(
            "Token".into(),
            LatestEntry {
                record: record.clone(),
                timestamp: 10,
                commit_hash: "abc".into(),
            },
        );
        let mut contracts = IndexMap::new();
        contracts.insert("Token".to_string(), record);
        ledger.history.push(HistoryEntry {
            contracts,
            timestamp: 10,
            commit_hash: "abc".into(),
        });
        ledger
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLedgerStore::new(dir.path());
        assert!(store.load(ChainId(1)).unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLedgerStore::new(dir.path().join("deployments").join("json"));
        let ledger = sample();
        store.save(&ledger).unwrap();

        assert!(store.path_for(ChainId(31337)).ends_with("31337.json"));
        assert_eq!(store.load(ChainId(31337)).unwrap(), Some(ledger));
    }

    #[test]
    fn saving_same_ledger_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLedgerStore::new(dir.path());
        let ledger = sample();
        store.save(&ledger).unwrap();
        let first = fs::read(store.path_for(ledger.chain_id)).unwrap();

        let reloaded = store.load(ledger.chain_id).unwrap().unwrap();
        store.save(&reloaded).unwrap();
        let second = fs::read(store.path_for(ledger.chain_id)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn written_document_uses_external_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLedgerStore::new(dir.path());
        store.save(&sample()).unwrap();

        let text = fs::read_to_string(store.path_for(ChainId(31337))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["chainId"], 31337);
        assert_eq!(value["latest"]["Token"]["deploymentTxn"], "0xtx");
        assert_eq!(value["latest"]["Token"]["commitHash"], "abc");
        assert_eq!(value["history"][0]["contracts"]["Token"]["kind"], "plain");
        assert!(text.contains("\n  "));
    }

    #[test]
    fn loads_ledger_written_with_proxy_flags() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLedgerStore::new(dir.path());
        let hash = "a".repeat(64);
        let text = r#"{
          "chainId": "31337",
          "latest": {
            "Vault": {
              "implementation": "0xI",
              "address": "0xP",
              "proxy": true,
              "version": "1.0.0",
              "proxyType": "TransparentUpgradeableProxy",
              "deploymentTxn": "0xtx-p",
              "proxyAdmin": "0xA",
              "initcodeHash": "HASH",
              "timestamp": 10,
              "commitHash": "abc"
            },
            "Token": {
              "address": "0x1",
              "proxy": false,
              "version": "",
              "deploymentTxn": "0xtx-1",
              "initcodeHash": "",
              "timestamp": 10,
              "commitHash": "abc"
            }
          },
          "history": [
            {
              "contracts": {
                "Vault#aaaaaaaa": {
                  "implementation": "0xI",
                  "address": "0xP",
                  "proxy": true,
                  "version": "1.0.0",
                  "proxyType": "TransparentUpgradeableProxy",
                  "deploymentTxn": "0xtx-p",
                  "proxyAdmin": "0xA",
                  "initcodeHash": "HASH",
                  "input": { "constructor": {}, "initializeData": "0x8129fc1c" }
                }
              },
              "timestamp": 10,
              "commitHash": "abc"
            }
          ]
        }"#
        .replace("HASH", &hash);
        fs::write(store.path_for(ChainId(31337)), text).unwrap();

        let ledger = store.load(ChainId(31337)).unwrap().unwrap();
        assert_eq!(ledger.last_commit(), Some("abc"));
        let vault = &ledger.latest["Vault"];
        assert_eq!(vault.commit_hash, "abc");
        assert_eq!(vault.record.proxy_details().unwrap().implementation, Address::new("0xI"));
        assert!(!ledger.latest["Token"].record.is_proxy());
        assert!(ledger.latest["Token"].record.version.is_none());

        let recorded = &ledger.history[0].contracts["Vault#aaaaaaaa"];
        let details = recorded.proxy_details().unwrap();
        assert_eq!(details.initialize_args.as_deref(), Some("0x8129fc1c"));
        assert_eq!(recorded.initcode_hash.as_ref().unwrap().as_str(), hash);

        // Saved back with the `kind` tag.
        store.save(&ledger).unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&fs::read(store.path_for(ChainId(31337))).unwrap()).unwrap();
        assert_eq!(value["latest"]["Vault"]["kind"], "proxy");
        assert_eq!(value["history"][0]["contracts"]["Vault#aaaaaaaa"]["initializeData"], "0x8129fc1c");
        assert_eq!(store.load(ChainId(31337)).unwrap(), Some(ledger));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLedgerStore::new(dir.path());
        fs::write(store.path_for(ChainId(1)), b"{ not json").unwrap();
        assert!(matches!(
            store.load(ChainId(1)),
            Err(LedgerError::Serialization(_))
        ));
    }
}
