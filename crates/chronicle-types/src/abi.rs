use serde::{Deserialize, Serialize};

/// A compiled contract artifact; only the ABI is read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractArtifact {
    #[serde(default)]
    pub abi: Vec<AbiItem>,
}

impl ContractArtifact {
    /// The constructor entry of the ABI, if the contract declares one.
    pub fn constructor(&self) -> Option<ConstructorAbi> {
        self.abi
            .iter()
            .find(|item| item.kind == "constructor")
            .map(|item| ConstructorAbi {
                inputs: item.inputs.clone(),
            })
    }
}

/// One entry of a JSON ABI (function, event, constructor, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
}

/// A named, typed ABI parameter. Tuples carry their components.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
}

impl AbiParam {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            components: Vec::new(),
        }
    }

    pub fn tuple(name: impl Into<String>, components: Vec<AbiParam>) -> Self {
        Self {
            name: name.into(),
            ty: "tuple".into(),
            components,
        }
    }

    pub fn is_tuple(&self) -> bool {
        self.ty == "tuple"
    }
}

/// Constructor signature of a contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorAbi {
    pub inputs: Vec<AbiParam>,
}

impl ConstructorAbi {
    pub fn new(inputs: Vec<AbiParam>) -> Self {
        Self { inputs }
    }
}
