use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::address::Address;
use crate::error::TypeError;
use crate::hash::InitcodeHash;

/// Constructor parameter name to value.
pub type ConstructorInputs = IndexMap<String, ConstructorValue>;

/// A constructor argument value as recorded in history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstructorValue {
    Scalar(String),
    /// A tuple argument decomposed into its named components.
    Tuple(IndexMap<String, String>),
}

impl From<&str> for ConstructorValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

/// Audit payload kept on history records and stripped from latest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInput {
    #[serde(default)]
    pub constructor: ConstructorInputs,
}

/// Fields specific to a transparent upgradeable proxy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyDetails {
    /// Implementation the proxy currently forwards to.
    pub implementation: Address,
    /// Contract name of the proxy itself.
    pub proxy_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_admin: Option<Address>,
    /// Initializer payload passed to the proxy constructor.
    #[serde(
        default,
        rename = "initializeData",
        skip_serializing_if = "Option::is_none"
    )]
    pub initialize_args: Option<String>,
}

/// Variant part of a [`ContractRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordKind {
    Plain,
    Proxy(ProxyDetails),
}

/// A deployed contract as stored in the ledger.
///
/// For a proxy, `address` is the proxy's own address and stays fixed across
/// upgrades; `version`, `initcode_hash` and the implementation address move
/// with each upgrade.
///
/// Always written with a `kind` tag. Ledgers from older tooling carry a
/// `proxy` flag instead and keep `initializeData` under `input`; both shapes
/// are read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "deploymentTxn")]
    pub deployment_tx: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initcode_hash: Option<InitcodeHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<RecordInput>,
    #[serde(flatten)]
    pub kind: RecordKind,
}

/// Every field either record shape may carry.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    address: Address,
    #[serde(default)]
    version: Option<String>,
    #[serde(rename = "deploymentTxn")]
    deployment_tx: String,
    #[serde(default)]
    initcode_hash: Option<String>,
    #[serde(default)]
    input: Option<RawInput>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    proxy: Option<bool>,
    #[serde(default)]
    implementation: Option<Address>,
    #[serde(default)]
    proxy_type: Option<String>,
    #[serde(default)]
    proxy_admin: Option<String>,
    #[serde(default)]
    initialize_data: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInput {
    #[serde(default)]
    constructor: ConstructorInputs,
    #[serde(default)]
    initialize_data: Option<String>,
}

/// Older tooling wrote `""` for values it could not fill in.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl TryFrom<RawRecord> for ContractRecord {
    type Error = TypeError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let is_proxy = match (raw.kind.as_deref(), raw.proxy) {
            (Some("proxy"), _) => true,
            (Some("plain"), _) => false,
            (Some(other), _) => {
                return Err(TypeError::InvalidRecord(format!("unknown kind `{other}`")))
            }
            (None, Some(flag)) => flag,
            (None, None) => {
                return Err(TypeError::InvalidRecord(format!(
                    "{}: missing `kind` or `proxy`",
                    raw.address
                )))
            }
        };

        let (input, nested_init) = match raw.input {
            Some(input) => (
                Some(RecordInput {
                    constructor: input.constructor,
                }),
                input.initialize_data,
            ),
            None => (None, None),
        };

        let kind = if is_proxy {
            let implementation = raw.implementation.ok_or_else(|| {
                TypeError::InvalidRecord(format!("proxy {} has no implementation", raw.address))
            })?;
            RecordKind::Proxy(ProxyDetails {
                implementation,
                proxy_type: raw.proxy_type.unwrap_or_default(),
                proxy_admin: non_empty(raw.proxy_admin).map(Address::new),
                initialize_args: non_empty(raw.initialize_data.or(nested_init)),
            })
        } else {
            RecordKind::Plain
        };

        Ok(Self {
            address: raw.address,
            version: non_empty(raw.version),
            deployment_tx: raw.deployment_tx,
            initcode_hash: non_empty(raw.initcode_hash)
                .map(|hash| InitcodeHash::from_hex(&hash))
                .transpose()?,
            input,
            kind,
        })
    }
}

impl<'de> Deserialize<'de> for ContractRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawRecord::deserialize(deserializer)?
            .try_into()
            .map_err(serde::de::Error::custom)
    }
}

impl ContractRecord {
    pub fn plain(
        address: Address,
        deployment_tx: impl Into<String>,
        initcode_hash: Option<InitcodeHash>,
    ) -> Self {
        Self {
            address,
            version: None,
            deployment_tx: deployment_tx.into(),
            initcode_hash,
            input: None,
            kind: RecordKind::Plain,
        }
    }

    pub fn proxy(
        address: Address,
        deployment_tx: impl Into<String>,
        initcode_hash: Option<InitcodeHash>,
        details: ProxyDetails,
    ) -> Self {
        Self {
            address,
            version: None,
            deployment_tx: deployment_tx.into(),
            initcode_hash,
            input: None,
            kind: RecordKind::Proxy(details),
        }
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_constructor(mut self, constructor: ConstructorInputs) -> Self {
        self.input = Some(RecordInput { constructor });
        self
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.kind, RecordKind::Proxy(_))
    }

    pub fn proxy_details(&self) -> Option<&ProxyDetails> {
        match &self.kind {
            RecordKind::Proxy(details) => Some(details),
            RecordKind::Plain => None,
        }
    }

    /// Copy without the audit payload, as kept in the latest directory.
    pub fn summary(&self) -> Self {
        Self {
            input: None,
            ..self.clone()
        }
    }
}
