//! Deployment ledger reconciliation for Chronicle.
//!
//! This crate turns one broadcast batch into an updated per-chain ledger.
//! It provides:
//! - Classification of creation events and proxy-to-implementation linkage
//! - The record merger with on-chain upgrade verification
//! - Constructor argument matching against ABI constructors
//! - Tag resolution for same-named contracts with different bytecode
//! - `ChainReader` / `ArtifactSource` / `LedgerStore` trait boundaries
//! - In-memory implementations for tests and embedding
//! - An atomic JSON file store and the [`Chronicle`] orchestrator

pub mod chronicle;
pub mod classify;
pub mod constructor;
pub mod error;
pub mod linker;
pub mod memory;
pub mod merge;
pub mod store;
pub mod tags;
pub mod traits;

pub use chronicle::{Chronicle, RunOutcome};
pub use classify::{creation_events, CreationEvent};
pub use constructor::match_constructor_inputs;
pub use error::LedgerError;
pub use linker::{is_proxy_name, Link, TRANSPARENT_PROXY};
pub use memory::{InMemoryArtifacts, InMemoryChain, InMemoryLedgerStore};
pub use merge::{MergeOptions, MergeOutcome, MergeSummary, Merger};
pub use store::JsonLedgerStore;
pub use tags::{TagLabels, TagResolver};
pub use traits::{ArtifactSource, ChainReader, DisconnectedChain, LedgerStore};
