use std::path::PathBuf;

use chronicle_types::ChainId;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "chronicle",
    about = "Chronicle: record contract deployments in a per-chain ledger",
    version
)]
pub struct Cli {
    /// Deployment script whose broadcast is read (default: Deploy.s.sol)
    pub script: Option<String>,

    /// Chain id of the broadcast (default: 31337)
    #[arg(short = 'c', long)]
    pub chain_id: Option<ChainId>,

    /// RPC endpoint used for version lookups and upgrade verification
    #[arg(short = 'r', long)]
    pub rpc_url: Option<String>,

    /// Broadcast directory, relative to the project root
    #[arg(short = 'b', long)]
    pub broadcast_dir: Option<PathBuf>,

    /// Compiled artifacts directory, relative to the project root
    #[arg(short = 'o', long)]
    pub out_dir: Option<PathBuf>,

    /// Ledger directory, relative to the project root
    #[arg(short = 'd', long)]
    pub deployments_dir: Option<PathBuf>,

    /// Project root
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Re-process a batch that was already recorded
    #[arg(short, long)]
    pub force: bool,

    /// Label contracts by initcode hash (short or full): HASH:LABEL
    #[arg(long = "tag", value_name = "HASH:LABEL", value_parser = parse_label)]
    pub tags: Vec<(String, String)>,

    /// Label contracts by address: ADDRESS:LABEL
    #[arg(long = "tag-address", value_name = "ADDRESS:LABEL", value_parser = parse_label)]
    pub tag_addresses: Vec<(String, String)>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_label(s: &str) -> Result<(String, String), String> {
    let (key, label) = s
        .split_once(':')
        .ok_or_else(|| format!("expected KEY:LABEL, got `{s}`"))?;
    let (key, label) = (key.trim(), label.trim());
    if key.is_empty() || label.is_empty() {
        return Err(format!("expected KEY:LABEL, got `{s}`"));
    }
    Ok((key.to_string(), label.to_string()))
}
