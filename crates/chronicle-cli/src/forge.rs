//! Process-backed collaborators: `forge` for artifacts, `cast` for chain reads.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chronicle_ledger::{ArtifactSource, ChainReader, LedgerError};
use chronicle_types::{Address, ConstructorAbi, ContractArtifact};
use tracing::{debug, info};

/// EIP-1967 implementation slot: `keccak256("eip1967.proxy.implementation") - 1`.
pub const IMPLEMENTATION_SLOT: &str =
    "0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc";

/// Artifacts compiled by `forge build` under `<out>/<Name>.sol/<Name>.json`.
#[derive(Clone, Debug)]
pub struct ForgeArtifacts {
    root: PathBuf,
    out_dir: PathBuf,
}

impl ForgeArtifacts {
    pub fn new(root: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            out_dir: out_dir.into(),
        }
    }

    pub fn artifact_path(&self, contract: &str) -> PathBuf {
        self.out_dir
            .join(format!("{contract}.sol"))
            .join(format!("{contract}.json"))
    }
}

impl ArtifactSource for ForgeArtifacts {
    fn refresh(&self) -> Result<(), LedgerError> {
        info!(root = %self.root.display(), "building artifacts");
        let status = Command::new("forge")
            .arg("build")
            .current_dir(&self.root)
            .status()
            .map_err(|e| LedgerError::BuildFailed(format!("failed to run forge build: {e}")))?;
        if !status.success() {
            return Err(LedgerError::BuildFailed(format!(
                "forge build failed in {} ({status})",
                self.root.display()
            )));
        }
        Ok(())
    }

    fn constructor(&self, contract: &str) -> Result<Option<ConstructorAbi>, LedgerError> {
        read_constructor(contract, &self.artifact_path(contract))
    }
}

fn read_constructor(contract: &str, path: &Path) -> Result<Option<ConstructorAbi>, LedgerError> {
    let artifact_error = |reason: String| LedgerError::Artifact {
        contract: contract.to_string(),
        reason,
    };
    let bytes = fs::read(path).map_err(|e| artifact_error(format!("{}: {e}", path.display())))?;
    let artifact: ContractArtifact = serde_json::from_slice(&bytes)
        .map_err(|e| artifact_error(format!("{}: {e}", path.display())))?;
    Ok(artifact.constructor())
}

/// Chain reads through `cast` against an RPC endpoint.
#[derive(Clone, Debug)]
pub struct CastChainReader {
    rpc_url: String,
}

impl CastChainReader {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
        }
    }

    /// Run `cast <args> --rpc-url <url>` and return its trimmed stdout.
    fn cast(&self, args: &[&str]) -> Result<String, String> {
        let output = Command::new("cast")
            .args(args)
            .args(["--rpc-url", &self.rpc_url])
            .output()
            .map_err(|e| format!("failed to run cast: {e}"))?;
        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl ChainReader for CastChainReader {
    fn version_of(&self, address: &Address) -> Option<String> {
        match self.cast(&["call", address.as_str(), "version()(string)"]) {
            Ok(output) => parse_version(&output),
            Err(reason) => {
                debug!(address = %address, %reason, "no version");
                None
            }
        }
    }

    fn implementation_of(&self, proxy: &Address) -> Result<Address, LedgerError> {
        let word = self
            .cast(&["storage", proxy.as_str(), IMPLEMENTATION_SLOT])
            .map_err(|reason| {
                LedgerError::ChainUnavailable(format!("implementation slot of {proxy}: {reason}"))
            })?;
        Ok(Address::from_storage_word(&word)?)
    }
}

/// `cast` prints strings quoted.
fn parse_version(output: &str) -> Option<String> {
    let version = output.trim().trim_matches('"');
    (!version.is_empty()).then(|| version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_path_layout() {
        let artifacts = ForgeArtifacts::new("/work", "/work/out");
        assert_eq!(
            artifacts.artifact_path("Vault"),
            PathBuf::from("/work/out/Vault.sol/Vault.json")
        );
    }

    #[test]
    fn reads_constructor_from_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ForgeArtifacts::new(dir.path(), dir.path());
        let path = artifacts.artifact_path("Token");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{
                "abi": [
                    { "type": "function", "name": "mint", "inputs": [] },
                    { "type": "constructor", "inputs": [
                        { "name": "owner", "type": "address" },
                        { "name": "cap", "type": "uint256" }
                    ] }
                ],
                "bytecode": { "object": "0x" }
            }"#,
        )
        .unwrap();

        let abi = artifacts.constructor("Token").unwrap().unwrap();
        let names: Vec<_> = abi.inputs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["owner", "cap"]);
    }

    #[test]
    fn artifact_without_constructor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Lib.json");
        fs::write(&path, r#"{ "abi": [] }"#).unwrap();
        assert!(read_constructor("Lib", &path).unwrap().is_none());
    }

    #[test]
    fn missing_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = ForgeArtifacts::new(dir.path(), dir.path());
        assert!(matches!(
            artifacts.constructor("Ghost"),
            Err(LedgerError::Artifact { .. })
        ));
    }

    #[test]
    fn version_output_is_unquoted() {
        assert_eq!(parse_version("\"1.2.0\"\n").as_deref(), Some("1.2.0"));
        assert_eq!(parse_version("2").as_deref(), Some("2"));
        assert!(parse_version("\"\"").is_none());
    }
}
