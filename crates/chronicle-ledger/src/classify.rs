//! Reduces a broadcast batch to its contract-creation events.

use chronicle_types::{Address, DeploymentTransaction};
use tracing::{debug, info, warn};

/// A `CREATE`/`CREATE2` transaction attributable to a named contract.
#[derive(Clone, Copy, Debug)]
pub struct CreationEvent<'a> {
    pub name: &'a str,
    pub address: &'a Address,
    pub tx: &'a DeploymentTransaction,
}

/// Creation events of a batch, in their original order.
///
/// Events without a contract name cannot be attributed safely (the build tool
/// found several contracts with the same bytecode) and are dropped.
pub fn creation_events(transactions: &[DeploymentTransaction]) -> Vec<CreationEvent<'_>> {
    let mut events = Vec::new();
    for tx in transactions {
        if !tx.kind.is_creation() {
            debug!(hash = %tx.hash, kind = %tx.kind, "ignoring non-creation transaction");
            continue;
        }
        let Some(name) = tx.contract_name.as_deref() else {
            info!(hash = %tx.hash, "contract name not unique or not found; skipping");
            continue;
        };
        let Some(address) = tx.contract_address.as_ref() else {
            warn!(hash = %tx.hash, contract = name, "creation without contract address; skipping");
            continue;
        };
        events.push(CreationEvent { name, address, tx });
    }
    events
}
