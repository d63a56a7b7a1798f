use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chronicle_ledger::{MergeOptions, TagLabels};
use chronicle_types::ChainId;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

pub const DEFAULT_CHAIN_ID: ChainId = ChainId(31337);
pub const DEFAULT_SCRIPT: &str = "Deploy.s.sol";
pub const DEFAULT_BROADCAST_DIR: &str = "broadcast";
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments/json";

/// Contents of an optional `--config` TOML file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronicleConfig {
    pub project_root: Option<PathBuf>,
    pub broadcast_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub deployments_dir: Option<PathBuf>,
    pub rpc_url: Option<String>,
    /// Initcode hash (short or full) to label.
    pub tags: BTreeMap<String, String>,
    /// Contract address to label.
    pub tag_addresses: BTreeMap<String, String>,
}

impl ChronicleConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }
}

/// Effective settings: flags over the config file over defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub script: String,
    pub chain_id: ChainId,
    pub root: PathBuf,
    pub broadcast_dir: PathBuf,
    pub out_dir: PathBuf,
    pub deployments_dir: PathBuf,
    pub rpc_url: Option<String>,
    pub force: bool,
    pub labels: TagLabels,
}

impl Settings {
    pub fn resolve(cli: &Cli, file: ChronicleConfig) -> Self {
        let root = cli
            .root
            .clone()
            .or(file.project_root)
            .unwrap_or_else(|| PathBuf::from("."));
        let dir = |flag: &Option<PathBuf>, from_file: Option<PathBuf>, default: &str| {
            root.join(
                flag.clone()
                    .or(from_file)
                    .unwrap_or_else(|| PathBuf::from(default)),
            )
        };

        let broadcast_dir = dir(&cli.broadcast_dir, file.broadcast_dir, DEFAULT_BROADCAST_DIR);
        let out_dir = dir(&cli.out_dir, file.out_dir, DEFAULT_OUT_DIR);
        let deployments_dir = dir(
            &cli.deployments_dir,
            file.deployments_dir,
            DEFAULT_DEPLOYMENTS_DIR,
        );

        let mut labels = TagLabels::new();
        for (hash, label) in file.tags.iter().chain(cli.tags.iter().map(|(k, v)| (k, v))) {
            labels.insert_hash(hash, label.clone());
        }
        for (address, label) in file
            .tag_addresses
            .iter()
            .chain(cli.tag_addresses.iter().map(|(k, v)| (k, v)))
        {
            labels.insert_address(address, label.clone());
        }

        Self {
            script: cli
                .script
                .clone()
                .unwrap_or_else(|| DEFAULT_SCRIPT.to_string()),
            chain_id: cli.chain_id.unwrap_or(DEFAULT_CHAIN_ID),
            root,
            broadcast_dir,
            out_dir,
            deployments_dir,
            rpc_url: cli.rpc_url.clone().or(file.rpc_url),
            force: cli.force,
            labels,
        }
    }

    /// `<broadcast>/<script>/<chain>/run-latest.json`
    pub fn broadcast_path(&self) -> PathBuf {
        self.broadcast_dir
            .join(&self.script)
            .join(self.chain_id.to_string())
            .join("run-latest.json")
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            force: self.force,
            labels: self.labels.clone(),
        }
    }
}
