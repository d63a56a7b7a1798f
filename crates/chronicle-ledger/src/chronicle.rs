//! End-to-end processing of one broadcast batch against one chain.

use chronicle_types::{Broadcast, ChainId, Ledger};
use tracing::info;

use crate::error::LedgerError;
use crate::merge::{ensure_unprocessed, MergeOptions, MergeOutcome, MergeSummary, Merger};
use crate::tags::TagResolver;
use crate::traits::{ArtifactSource, ChainReader, LedgerStore};

/// Result of [`Chronicle::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing new in the batch; the stored ledger was not touched.
    Unchanged { skipped: usize },
    /// A new history entry was written.
    Committed { summary: MergeSummary, ledger: Ledger },
}

/// Owns the collaborators of a run and drives load, merge, tag and save.
pub struct Chronicle<S, A, C> {
    store: S,
    artifacts: A,
    chain: C,
    options: MergeOptions,
}

impl<S, A, C> Chronicle<S, A, C>
where
    S: LedgerStore,
    A: ArtifactSource,
    C: ChainReader,
{
    pub fn new(store: S, artifacts: A, chain: C) -> Self {
        Self {
            store,
            artifacts,
            chain,
            options: MergeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn artifacts(&self) -> &A {
        &self.artifacts
    }

    /// Merge `batch` into the ledger of `chain_id` and persist the result.
    ///
    /// Either the whole batch is committed or the stored ledger is left
    /// exactly as it was.
    pub fn run(&self, chain_id: ChainId, batch: &Broadcast) -> Result<RunOutcome, LedgerError> {
        let previous = self.store.load_or_empty(chain_id)?;
        ensure_unprocessed(&previous, batch, self.options.force)?;

        self.artifacts.refresh()?;

        let merger = Merger::new(&self.chain, &self.artifacts, self.options.force);
        let (mut ledger, summary) = match merger.merge(&previous, batch)? {
            MergeOutcome::Unchanged { skipped } => {
                info!(chain = %chain_id, commit = %batch.commit, skipped, "ledger unchanged");
                return Ok(RunOutcome::Unchanged { skipped });
            }
            MergeOutcome::Merged { ledger, summary } => (ledger, summary),
        };

        let resolver = TagResolver::new(&self.options.labels);
        ledger.latest = resolver.resolve_latest(ledger.latest);
        ledger.history = resolver.resolve_history(ledger.history);

        self.store.save(&ledger)?;
        info!(
            chain = %chain_id,
            commit = %batch.commit,
            created = summary.created.len(),
            upgraded = summary.upgraded.len(),
            replaced = summary.replaced.len(),
            skipped = summary.skipped,
            "ledger committed"
        );
        Ok(RunOutcome::Committed { summary, ledger })
    }
}
