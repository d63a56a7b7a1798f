//! Foundation types for Chronicle.
//!
//! Chronicle reconciles the contract-creation transactions of a deployment
//! broadcast into a per-chain ledger. This crate holds the data model every
//! other Chronicle crate speaks.
//!
//! # Key Types
//!
//! - [`Address`]: Contract address with case-insensitive identity
//! - [`InitcodeHash`]: keccak256 digest of a contract's creation bytecode
//! - [`StorageKey`]: `name#tag` display key used in ledger maps
//! - [`Broadcast`] / [`DeploymentTransaction`]: The input batch
//! - [`ConstructorAbi`]: Constructor signature read from build artifacts
//! - [`ContractRecord`]: Plain or proxy deployment record
//! - [`Ledger`]: Latest directory plus append-only history for one chain

pub mod abi;
pub mod address;
pub mod broadcast;
pub mod error;
pub mod hash;
pub mod key;
pub mod ledger;
pub mod record;

pub use abi::{AbiItem, AbiParam, ConstructorAbi, ContractArtifact};
pub use address::Address;
pub use broadcast::{AdditionalContract, Broadcast, DeploymentTransaction, TransactionKind, TransactionRequest};
pub use error::TypeError;
pub use hash::InitcodeHash;
pub use key::StorageKey;
pub use ledger::{ChainId, HistoryEntry, LatestEntry, Ledger};
pub use record::{ConstructorInputs, ConstructorValue, ContractRecord, ProxyDetails, RecordInput, RecordKind};
