//! The record merger.
//!
//! Builds a candidate [`Ledger`] from the previous ledger and one batch. The
//! previous ledger is never mutated; callers swap the candidate in only when
//! [`MergeOutcome::Merged`] is returned.

use chronicle_types::key::base_name;
use chronicle_types::{
    Broadcast, ConstructorInputs, ContractRecord, HistoryEntry, InitcodeHash, LatestEntry, Ledger, ProxyDetails,
    StorageKey,
};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::classify::{creation_events, CreationEvent};
use crate::constructor::match_constructor_inputs;
use crate::error::LedgerError;
use crate::linker::{is_proxy_name, link, Link};
use crate::tags::TagLabels;
use crate::traits::{ArtifactSource, ChainReader};

/// Options controlling a merge.
#[derive(Clone, Debug, Default)]
pub struct MergeOptions {
    /// Re-process a batch whose commit is already recorded, including records
    /// the duplicate guard would otherwise skip.
    pub force: bool,
    pub labels: TagLabels,
}

/// What a merge produced, for reporting.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Keys of records deployed for the first time.
    pub created: Vec<String>,
    /// Keys of proxies whose implementation changed.
    pub upgraded: Vec<String>,
    /// Keys of plain contracts redeployed under an existing name.
    pub replaced: Vec<String>,
    /// Events skipped as already recorded or unexpected.
    pub skipped: usize,
}

impl MergeSummary {
    pub fn total(&self) -> usize {
        self.created.len() + self.upgraded.len() + self.replaced.len()
    }
}

/// Result of [`Merger::merge`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No new records; the previous ledger stands.
    Unchanged { skipped: usize },
    /// A candidate ledger with one new history entry.
    Merged { ledger: Ledger, summary: MergeSummary },
}

/// Abort if the batch's commit is the most recent one recorded.
pub fn ensure_unprocessed(
    previous: &Ledger,
    batch: &Broadcast,
    force: bool,
) -> Result<(), LedgerError> {
    if !force && previous.last_commit() == Some(batch.commit.as_str()) {
        return Err(LedgerError::AlreadyProcessed {
            commit: batch.commit.clone(),
        });
    }
    Ok(())
}

/// Whether history already holds a record of this name deployed at this
/// address by this transaction.
pub fn already_recorded(history: &[HistoryEntry], event: &CreationEvent<'_>) -> bool {
    history.iter().any(|entry| {
        entry.contracts.iter().any(|(key, record)| {
            base_name(key) == event.name
                && record.address == *event.address
                && record.deployment_tx == event.tx.hash
        })
    })
}

/// Applies one batch to a ledger through the injected collaborators.
pub struct Merger<'a, C: ?Sized, A: ?Sized> {
    chain: &'a C,
    artifacts: &'a A,
    force: bool,
}

/// Working state of a single merge.
struct Batch<'b> {
    broadcast: &'b Broadcast,
    latest: IndexMap<String, LatestEntry>,
    contracts: IndexMap<String, ContractRecord>,
    summary: MergeSummary,
}

impl Batch<'_> {
    /// Store a record in the batch's new records and in the working latest.
    fn commit(&mut self, name: &str, record: ContractRecord) -> String {
        let key = StorageKey::for_record(name, record.initcode_hash.as_ref()).to_string();
        self.latest.insert(
            key.clone(),
            LatestEntry {
                record: record.summary(),
                timestamp: self.broadcast.timestamp,
                commit_hash: self.broadcast.commit.clone(),
            },
        );
        self.contracts.insert(key.clone(), record);
        key
    }
}

impl<'a, C, A> Merger<'a, C, A>
where
    C: ChainReader + ?Sized,
    A: ArtifactSource + ?Sized,
{
    pub fn new(chain: &'a C, artifacts: &'a A, force: bool) -> Self {
        Self {
            chain,
            artifacts,
            force,
        }
    }

    /// Merge `batch` into a copy of `previous`.
    pub fn merge(&self, previous: &Ledger, batch: &Broadcast) -> Result<MergeOutcome, LedgerError> {
        ensure_unprocessed(previous, batch, self.force)?;

        let events = creation_events(&batch.transactions);
        let mut work = Batch {
            broadcast: batch,
            latest: previous.latest.clone(),
            contracts: IndexMap::new(),
            summary: MergeSummary::default(),
        };

        for (index, event) in events.iter().enumerate() {
            if !self.force
                && !is_proxy_name(event.name)
                && already_recorded(&previous.history, event)
            {
                info!(contract = event.name, address = %event.address, "skipping duplicate contract");
                work.summary.skipped += 1;
                continue;
            }

            match link(&events, index, &work.latest) {
                Link::ProxyEvent => {
                    let claimed = work
                        .latest
                        .values()
                        .any(|entry| entry.record.address == *event.address);
                    if claimed {
                        debug!(address = %event.address, "proxy linked to its implementation");
                    } else {
                        warn!(address = %event.address, "unexpected proxy; skipping");
                        work.summary.skipped += 1;
                    }
                }
                Link::Upgrade { key } => {
                    let record = self.upgrade(event, &work.latest[&key].record)?;
                    work.latest.shift_remove(&key);
                    let key = work.commit(event.name, record);
                    work.summary.upgraded.push(key);
                }
                Link::Redeploy { key } => {
                    debug!(contract = event.name, previous = %key, "redeploying plain contract");
                    let record = self.plain(event)?;
                    let key = work.commit(event.name, record);
                    work.summary.replaced.push(key);
                }
                Link::NewProxies(proxies) => {
                    // Every proxy yields a record, but they share the
                    // implementation's storage key: the last one stays.
                    for proxy in proxies {
                        let record = self.new_proxy(event, proxy)?;
                        let key = work.commit(event.name, record);
                        if !work.summary.created.contains(&key) {
                            work.summary.created.push(key);
                        }
                    }
                }
                Link::Standalone => {
                    let record = self.plain(event)?;
                    let key = work.commit(event.name, record);
                    work.summary.created.push(key);
                }
            }
        }

        if work.contracts.is_empty() {
            info!(commit = %batch.commit, "no new contracts found");
            return Ok(MergeOutcome::Unchanged {
                skipped: work.summary.skipped,
            });
        }

        let mut ledger = Ledger {
            chain_id: previous.chain_id,
            latest: work.latest,
            history: previous.history.clone(),
        };
        ledger.history.insert(
            0,
            HistoryEntry {
                contracts: work.contracts,
                timestamp: batch.timestamp,
                commit_hash: batch.commit.clone(),
            },
        );
        ledger.sort_history();

        Ok(MergeOutcome::Merged {
            ledger,
            summary: work.summary,
        })
    }

    /// An implementation deployed behind an existing proxy. The proxy must
    /// already point at it on-chain.
    fn upgrade(
        &self,
        event: &CreationEvent<'_>,
        existing: &ContractRecord,
    ) -> Result<ContractRecord, LedgerError> {
        let Some(previous) = existing.proxy_details() else {
            return Err(LedgerError::InvalidTransaction {
                hash: event.tx.hash.clone(),
                reason: format!("{} is not a proxy", event.name),
            });
        };

        let onchain = self.chain.implementation_of(&existing.address)?;
        if onchain != *event.address {
            return Err(LedgerError::UpgradeMismatch {
                contract: event.name.to_string(),
                proxy: existing.address.clone(),
                expected: event.address.clone(),
                actual: onchain,
            });
        }
        info!(contract = event.name, proxy = %existing.address, implementation = %event.address, "upgrade verified");

        let record = ContractRecord::proxy(
            existing.address.clone(),
            existing.deployment_tx.clone(),
            Some(self.initcode_hash(event)?),
            ProxyDetails {
                implementation: event.address.clone(),
                proxy_type: previous.proxy_type.clone(),
                proxy_admin: previous.proxy_admin.clone(),
                initialize_args: None,
            },
        )
        .with_version(self.chain.version_of(&existing.address))
        .with_constructor(self.constructor_inputs(event)?);
        Ok(record)
    }

    /// A fresh implementation wrapped by `proxy` from later in the batch.
    fn new_proxy(
        &self,
        implementation: &CreationEvent<'_>,
        proxy: &CreationEvent<'_>,
    ) -> Result<ContractRecord, LedgerError> {
        debug!(contract = implementation.name, proxy = %proxy.address, "new upgradeable contract");
        let record = ContractRecord::proxy(
            proxy.address.clone(),
            proxy.tx.hash.clone(),
            Some(self.initcode_hash(implementation)?),
            ProxyDetails {
                implementation: implementation.address.clone(),
                proxy_type: proxy.name.to_string(),
                proxy_admin: proxy
                    .tx
                    .additional_contracts
                    .first()
                    .map(|admin| admin.address.clone()),
                initialize_args: proxy.tx.argument(2).map(str::to_string),
            },
        )
        .with_version(self.chain.version_of(proxy.address))
        .with_constructor(self.constructor_inputs(implementation)?);
        Ok(record)
    }

    fn plain(&self, event: &CreationEvent<'_>) -> Result<ContractRecord, LedgerError> {
        let record = ContractRecord::plain(
            event.address.clone(),
            event.tx.hash.clone(),
            Some(self.initcode_hash(event)?),
        )
        .with_version(self.chain.version_of(event.address))
        .with_constructor(self.constructor_inputs(event)?);
        Ok(record)
    }

    /// Input that is not hex aborts the merge; the storage key needs the hash.
    fn initcode_hash(&self, event: &CreationEvent<'_>) -> Result<InitcodeHash, LedgerError> {
        InitcodeHash::compute(&event.tx.transaction.input).map_err(|e| {
            LedgerError::InvalidTransaction {
                hash: event.tx.hash.clone(),
                reason: e.to_string(),
            }
        })
    }

    fn constructor_inputs(
        &self,
        event: &CreationEvent<'_>,
    ) -> Result<ConstructorInputs, LedgerError> {
        let abi = self.artifacts.constructor(event.name)?;
        match_constructor_inputs(event.name, abi.as_ref(), event.tx.arguments.as_deref())
    }
}
