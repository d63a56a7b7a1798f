use chronicle_types::{Address, TypeError};

/// Errors produced by ledger operations.
///
/// Every variant is fatal to a run: the ledger on disk is left untouched.
/// Recoverable conditions (ambiguous names, unexpected proxies, duplicates)
/// are logged and skipped instead.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("commit {commit} already processed; pass force to re-process it")]
    AlreadyProcessed { commit: String },

    #[error("constructor inputs of {contract} do not match: ABI declares {expected}, transaction has {actual}")]
    ConstructorArity {
        contract: String,
        expected: usize,
        actual: usize,
    },

    #[error("{contract} not upgraded: proxy {proxy} points to {actual}, expected {expected}")]
    UpgradeMismatch {
        contract: String,
        proxy: Address,
        expected: Address,
        actual: Address,
    },

    #[error("chain unavailable: {0}")]
    ChainUnavailable(String),

    #[error("artifact build failed: {0}")]
    BuildFailed(String),

    #[error("artifact error for {contract}: {reason}")]
    Artifact { contract: String, reason: String },

    #[error("invalid transaction {hash}: {reason}")]
    InvalidTransaction { hash: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
