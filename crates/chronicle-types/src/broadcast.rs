use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::address::Address;

/// One deployment run as written by the build tool (`run-latest.json`).
///
/// Only the fields Chronicle reads are modelled; everything else in the
/// document is ignored on deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    pub transactions: Vec<DeploymentTransaction>,
    /// Seconds since the UNIX epoch, shared by every transaction in the batch.
    pub timestamp: u64,
    /// Source commit the batch was produced from. Empty outside a git checkout.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub commit: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Transaction type as reported by the build tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionKind {
    Create,
    Create2,
    Call,
    Other(String),
}

impl TransactionKind {
    /// `CREATE` and `CREATE2` transactions deploy a contract.
    pub fn is_creation(&self) -> bool {
        matches!(self, Self::Create | Self::Create2)
    }
}

impl From<String> for TransactionKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CREATE" => Self::Create,
            "CREATE2" => Self::Create2,
            "CALL" => Self::Call,
            _ => Self::Other(value),
        }
    }
}

impl From<TransactionKind> for String {
    fn from(value: TransactionKind) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("CREATE"),
            Self::Create2 => f.write_str("CREATE2"),
            Self::Call => f.write_str("CALL"),
            Self::Other(kind) => f.write_str(kind),
        }
    }
}

/// A single transaction of a broadcast batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTransaction {
    #[serde(rename = "transactionType")]
    pub kind: TransactionKind,
    /// `None` when the build tool could not attribute the bytecode to a
    /// unique contract name.
    #[serde(default)]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub transaction: TransactionRequest,
    /// Constructor arguments, positionally aligned with the ABI constructor.
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
    /// Contracts created as a side effect of this transaction.
    #[serde(default)]
    pub additional_contracts: Vec<AdditionalContract>,
}

/// The request body of a transaction; only the creation input is used.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub input: String,
}

/// A contract deployed as a side effect of another creation
/// (e.g. the admin contract a transparent proxy spawns).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalContract {
    pub address: Address,
    #[serde(default)]
    pub contract_name: Option<String>,
}

impl DeploymentTransaction {
    /// Argument at `index`, if the transaction carries one.
    pub fn argument(&self, index: usize) -> Option<&str> {
        self.arguments
            .as_ref()
            .and_then(|args| args.get(index))
            .map(String::as_str)
    }
}
