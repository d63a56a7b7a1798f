//! Disambiguating aliases for contracts that share a name.
//!
//! When the same contract name is deployed from different bytecode, the
//! ledger needs distinct keys (`Vault#v1`, `Vault#1a2b3c4d`). Tags come from,
//! in priority order:
//!
//! 1. a label configured for the record's address,
//! 2. a label configured for its initcode hash (short or full),
//! 3. a human-chosen tag already present on its key,
//! 4. nothing.
//!
//! Latest only tags what an operator labelled; untagged conflicts collapse to
//! the bare name, later entries winning. History tags every record of a
//! conflicting name, falling back to the short hash.

use std::collections::{HashMap, HashSet};

use chronicle_types::{Address, ContractRecord, HistoryEntry, InitcodeHash, LatestEntry, StorageKey};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Operator-supplied labels, keyed case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagLabels {
    by_hash: HashMap<String, String>,
    by_address: HashMap<String, String>,
}

impl TagLabels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label a short (8 hex) or full initcode hash. A `0x` prefix is ignored.
    pub fn insert_hash(&mut self, hash: &str, label: impl Into<String>) {
        let hash = hash.trim();
        let hash = hash.strip_prefix("0x").unwrap_or(hash);
        self.by_hash.insert(hash.to_ascii_lowercase(), label.into());
    }

    pub fn insert_address(&mut self, address: &str, label: impl Into<String>) {
        self.by_address
            .insert(address.trim().to_ascii_lowercase(), label.into());
    }

    pub fn with_hash(mut self, hash: &str, label: impl Into<String>) -> Self {
        self.insert_hash(hash, label);
        self
    }

    pub fn with_address(mut self, address: &str, label: impl Into<String>) -> Self {
        self.insert_address(address, label);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty() && self.by_address.is_empty()
    }

    pub fn for_address(&self, address: &Address) -> Option<&str> {
        self.by_address.get(&address.normalized()).map(String::as_str)
    }

    /// Short hash is checked before the full hash.
    pub fn for_hash(&self, hash: &InitcodeHash) -> Option<&str> {
        self.by_hash
            .get(&hash.short().to_ascii_lowercase())
            .or_else(|| self.by_hash.get(&hash.as_str().to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// Highest-priority explicit label for a record.
    pub fn explicit(&self, record: &ContractRecord) -> Option<&str> {
        self.for_address(&record.address)
            .or_else(|| record.initcode_hash.as_ref().and_then(|h| self.for_hash(h)))
    }
}

/// Applies [`TagLabels`] to the latest directory and the history.
pub struct TagResolver<'a> {
    labels: &'a TagLabels,
}

impl<'a> TagResolver<'a> {
    pub fn new(labels: &'a TagLabels) -> Self {
        Self { labels }
    }

    /// Re-key the latest directory.
    pub fn resolve_latest(
        &self,
        latest: IndexMap<String, LatestEntry>,
    ) -> IndexMap<String, LatestEntry> {
        let mut groups: IndexMap<String, Vec<(StorageKey, LatestEntry)>> = IndexMap::new();
        for (key, entry) in latest {
            let key = StorageKey::parse(&key);
            groups
                .entry(key.base().to_string())
                .or_default()
                .push((key, entry));
        }

        let mut resolved = IndexMap::new();
        for (base, entries) in groups {
            let conflict = distinct_hashes(entries.iter().map(|(_, e)| &e.record)) > 1;

            for (key, entry) in entries {
                let tag = self
                    .labels
                    .explicit(&entry.record)
                    .or_else(|| key.human_tag())
                    .map(str::to_string);

                match tag {
                    Some(tag) => {
                        resolved.insert(StorageKey::tagged(base.as_str(), tag).to_string(), entry);
                    }
                    None => {
                        if conflict && resolved.contains_key(&base) {
                            let short = entry
                                .record
                                .initcode_hash
                                .as_ref()
                                .map_or("unknown", InitcodeHash::short);
                            warn!(
                                contract = %base,
                                hash = short,
                                "conflicting deployments share a name; overwriting previous entry (label {short} to keep both)"
                            );
                        }
                        resolved.insert(base.clone(), entry);
                    }
                }
            }
        }
        resolved
    }

    /// Re-key every history entry against the global conflict set.
    pub fn resolve_history(&self, history: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
        let mut hashes_by_base: HashMap<String, HashSet<InitcodeHash>> = HashMap::new();
        for entry in &history {
            for (key, record) in &entry.contracts {
                let hashes = hashes_by_base
                    .entry(StorageKey::parse(key).base().to_string())
                    .or_default();
                if let Some(hash) = &record.initcode_hash {
                    hashes.insert(hash.clone());
                }
            }
        }
        let conflicting: HashSet<String> = hashes_by_base
            .into_iter()
            .filter(|(_, hashes)| hashes.len() > 1)
            .map(|(base, _)| base)
            .collect();

        history
            .into_iter()
            .map(|entry| HistoryEntry {
                contracts: entry
                    .contracts
                    .into_iter()
                    .map(|(key, record)| {
                        let key = self.history_key(&StorageKey::parse(&key), &record, &conflicting);
                        (key, record)
                    })
                    .collect(),
                ..entry
            })
            .collect()
    }

    fn history_key(
        &self,
        key: &StorageKey,
        record: &ContractRecord,
        conflicting: &HashSet<String>,
    ) -> String {
        let base = key.base();
        let in_conflict = conflicting.contains(base);
        let explicit = self.labels.explicit(record);

        if !in_conflict && explicit.is_none() && key.tag().is_none() {
            return base.to_string();
        }

        match &record.initcode_hash {
            Some(hash) => {
                let tag = explicit.or_else(|| key.human_tag()).unwrap_or(hash.short());
                StorageKey::tagged(base, tag).to_string()
            }
            None => match explicit.or_else(|| key.human_tag()) {
                Some(tag) => StorageKey::tagged(base, tag).to_string(),
                None => {
                    if in_conflict {
                        warn!(contract = base, "legacy record without initcode hash in a conflicting group; keeping bare name");
                    }
                    base.to_string()
                }
            },
        }
    }
}

fn distinct_hashes<'r>(records: impl Iterator<Item = &'r ContractRecord>) -> usize {
    records
        .filter_map(|record| record.initcode_hash.as_ref())
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(seed: &str) -> InitcodeHash {
        InitcodeHash::compute(seed).unwrap()
    }

    fn record(address: &str, initcode: Option<&str>) -> ContractRecord {
        ContractRecord::plain(Address::new(address), format!("0xtx{address}"), initcode.map(hash))
    }

    fn latest_entry(address: &str, initcode: Option<&str>) -> LatestEntry {
        LatestEntry {
            record: record(address, initcode),
            timestamp: 1,
            commit_hash: "c".into(),
        }
    }

    fn latest(entries: Vec<(String, LatestEntry)>) -> IndexMap<String, LatestEntry> {
        entries.into_iter().collect()
    }

    fn keys<V>(map: &IndexMap<String, V>) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[test]
    fn labels_are_case_insensitive() {
        let h = hash("0x01");
        let labels = TagLabels::new()
            .with_hash(&h.short().to_ascii_uppercase(), "v1")
            .with_address("0xABCDEF", "main");
        assert_eq!(labels.for_hash(&h), Some("v1"));
        assert_eq!(labels.for_address(&Address::new("0xabcdef")), Some("main"));

        let full = TagLabels::new().with_hash(&format!("0x{}", h.as_str()), "full");
        assert_eq!(full.for_hash(&h), Some("full"));
    }

    #[test]
    fn address_label_beats_hash_label() {
        let labels = TagLabels::new()
            .with_hash(hash("0x01").short(), "by-hash")
            .with_address("0x1", "by-address");
        assert_eq!(labels.explicit(&record("0x1", Some("0x01"))), Some("by-address"));
        assert_eq!(labels.explicit(&record("0x2", Some("0x01"))), Some("by-hash"));
        assert_eq!(labels.explicit(&record("0x2", None)), None);
    }

    #[test]
    fn latest_collapses_unlabelled_conflicts_to_later_entry() {
        let h1 = hash("0x01");
        let h2 = hash("0x02");
        let input = latest(vec![
            (format!("Foo#{}", h1.short()), latest_entry("0x1", Some("0x01"))),
            (format!("Foo#{}", h2.short()), latest_entry("0x2", Some("0x02"))),
        ]);
        let labels = TagLabels::new();
        let out = TagResolver::new(&labels).resolve_latest(input);
        assert_eq!(keys(&out), ["Foo"]);
        assert_eq!(out["Foo"].record.address, Address::new("0x2"));
    }

    #[test]
    fn latest_keeps_labelled_and_bare_side_by_side() {
        let h1 = hash("0x01");
        let h2 = hash("0x02");
        let input = latest(vec![
            (format!("Foo#{}", h1.short()), latest_entry("0x1", Some("0x01"))),
            (format!("Foo#{}", h2.short()), latest_entry("0x2", Some("0x02"))),
        ]);
        let labels = TagLabels::new().with_hash(h1.short(), "v1");
        let out = TagResolver::new(&labels).resolve_latest(input);
        assert_eq!(keys(&out), ["Foo#v1", "Foo"]);
        assert_eq!(out["Foo#v1"].record.address, Address::new("0x1"));
        assert_eq!(out["Foo"].record.address, Address::new("0x2"));
    }

    #[test]
    fn latest_preserves_human_tags_but_drops_short_hashes() {
        let input = latest(vec![
            ("Foo#legacy".into(), latest_entry("0x1", Some("0x01"))),
            ("Bar#deadbeef".into(), latest_entry("0x2", Some("0x02"))),
        ]);
        let labels = TagLabels::new();
        let out = TagResolver::new(&labels).resolve_latest(input);
        assert_eq!(keys(&out), ["Foo#legacy", "Bar"]);
    }

    #[test]
    fn latest_same_hash_is_not_a_conflict() {
        let input = latest(vec![
            ("Foo".into(), latest_entry("0x1", Some("0x01"))),
            (format!("Foo#{}", hash("0x01").short()), latest_entry("0x9", Some("0x01"))),
        ]);
        let labels = TagLabels::new();
        let out = TagResolver::new(&labels).resolve_latest(input);
        assert_eq!(keys(&out), ["Foo"]);
        assert_eq!(out["Foo"].record.address, Address::new("0x9"));
    }

    fn history_entry(timestamp: u64, contracts: Vec<(String, ContractRecord)>) -> HistoryEntry {
        HistoryEntry {
            contracts: contracts.into_iter().collect(),
            timestamp,
            commit_hash: format!("c{timestamp}"),
        }
    }

    #[test]
    fn history_tags_conflicts_across_entries() {
        let h1 = hash("0x01");
        let h2 = hash("0x02");
        let history = vec![
            history_entry(2, vec![("Foo".into(), record("0x2", Some("0x02")))]),
            history_entry(1, vec![
                ("Foo".into(), record("0x1", Some("0x01"))),
                ("Bar".into(), record("0x3", Some("0x03"))),
            ]),
        ];
        let labels = TagLabels::new();
        let out = TagResolver::new(&labels).resolve_history(history);
        assert_eq!(keys(&out[0].contracts), [format!("Foo#{}", h2.short()).as_str()]);
        assert_eq!(
            keys(&out[1].contracts),
            [format!("Foo#{}", h1.short()).as_str(), "Bar"]
        );
        assert_eq!(out[0].timestamp, 2);
        assert_eq!(out[0].commit_hash, "c2");
    }

    #[test]
    fn history_uses_labels_and_existing_tags() {
        let h1 = hash("0x01");
        let history = vec![history_entry(
            1,
            vec![
                (format!("Foo#{}", h1.short()), record("0x1", Some("0x01"))),
                ("Bar#legacy".into(), record("0x2", Some("0x02"))),
                ("Baz".into(), record("0x3", Some("0x03"))),
            ],
        )];
        let labels = TagLabels::new().with_hash(h1.short(), "v1").with_address("0x3", "main");
        let out = TagResolver::new(&labels).resolve_history(history);
        assert_eq!(keys(&out[0].contracts), ["Foo#v1", "Bar#legacy", "Baz#main"]);
    }

    #[test]
    fn history_keeps_short_hash_tag_without_conflict() {
        let h1 = hash("0x01");
        let key = format!("Foo#{}", h1.short());
        let history = vec![history_entry(1, vec![(key.clone(), record("0x1", Some("0x01")))])];
        let labels = TagLabels::new();
        let out = TagResolver::new(&labels).resolve_history(history);
        assert_eq!(keys(&out[0].contracts), [key.as_str()]);
    }

    #[test]
    fn history_legacy_records_without_hash_stay_bare() {
        let history = vec![
            history_entry(2, vec![("Foo".into(), record("0x1", Some("0x01")))]),
            history_entry(1, vec![
                ("Foo#x".into(), record("0x2", Some("0x02"))),
                ("Foo".into(), record("0x3", None)),
            ]),
        ];
        let labels = TagLabels::new();
        let out = TagResolver::new(&labels).resolve_history(history);
        let last = keys(&out[1].contracts);
        assert_eq!(last, ["Foo#x", "Foo"]);
    }

    #[test]
    fn unrelated_names_untouched() {
        let history = vec![history_entry(1, vec![("Solo".into(), record("0x1", Some("0x01")))])];
        let labels = TagLabels::new();
        let out = TagResolver::new(&labels).resolve_history(history.clone());
        assert_eq!(out, history);
    }
}
