use std::fs;
use std::path::Path;

use anyhow::Context;
use chronicle_ledger::{
    ChainReader, Chronicle, DisconnectedChain, JsonLedgerStore, MergeSummary, RunOutcome,
};
use chronicle_types::Broadcast;
use colored::Colorize;
use tracing::warn;

use crate::cli::Cli;
use crate::config::{ChronicleConfig, Settings};
use crate::forge::{CastChainReader, ForgeArtifacts};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let file = match &cli.config {
        Some(path) => ChronicleConfig::load(path)?,
        None => ChronicleConfig::default(),
    };
    let settings = Settings::resolve(&cli, file);
    let batch = read_broadcast(&settings.broadcast_path())?;

    match &settings.rpc_url {
        Some(url) => execute(&settings, &batch, CastChainReader::new(url.as_str())),
        None => {
            warn!("no RPC endpoint configured; versions are skipped and upgrades cannot be verified");
            execute(&settings, &batch, DisconnectedChain)
        }
    }
}

fn read_broadcast(path: &Path) -> anyhow::Result<Broadcast> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read broadcast {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid broadcast {}", path.display()))
}

fn execute<C: ChainReader>(settings: &Settings, batch: &Broadcast, chain: C) -> anyhow::Result<()> {
    let store = JsonLedgerStore::new(&settings.deployments_dir);
    let ledger_path = store.path_for(settings.chain_id);
    let chronicle = Chronicle::new(
        store,
        ForgeArtifacts::new(&settings.root, &settings.out_dir),
        chain,
    )
    .with_options(settings.merge_options());

    let outcome = chronicle
        .run(settings.chain_id, batch)
        .with_context(|| format!("failed to record {} on chain {}", settings.script, settings.chain_id))?;

    let when = chrono::DateTime::from_timestamp(batch.timestamp as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| batch.timestamp.to_string());
    println!(
        "{} {} on chain {} (commit {}, {})",
        "Batch".bold(),
        settings.script.bold(),
        settings.chain_id.to_string().cyan(),
        batch.commit.yellow(),
        when.dimmed()
    );

    match outcome {
        RunOutcome::Unchanged { skipped } => {
            println!(
                "{} No new contracts ({} skipped); {} left untouched.",
                "•".yellow().bold(),
                skipped,
                ledger_path.display()
            );
        }
        RunOutcome::Committed { summary, ledger } => {
            print_summary(&summary);
            println!(
                "{} Ledger written to {} ({} latest, {} batches)",
                "✓".green().bold(),
                ledger_path.display().to_string().bold(),
                ledger.latest.len(),
                ledger.history.len()
            );
        }
    }
    Ok(())
}

fn print_summary(summary: &MergeSummary) {
    for key in &summary.created {
        println!("  {} {}", "new:".green(), key);
    }
    for key in &summary.upgraded {
        println!("  {} {}", "upgraded:".cyan(), key);
    }
    for key in &summary.replaced {
        println!("  {} {}", "redeployed:".yellow(), key);
    }
    if summary.skipped > 0 {
        println!("  {} {}", "skipped:".dimmed(), summary.skipped);
    }
}
