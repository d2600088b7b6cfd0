//! postboi-check - Pre-flight connection test of every configured platform

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use libpostboi::{Config, ConnectionStatus, PlatformKind, ShareManager};
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "postboi-check")]
#[command(version, about = "Test the credentials of every configured platform")]
#[command(long_about = r#"Test the credentials of every configured platform.

Runs a read-only probe against each enabled platform section of the
configuration file concurrently. Nothing is posted.

EXAMPLES:
    # Check everything in ~/.config/postboi/config.toml
    postboi-check

    # Check a different config file
    postboi-check --config ./staging.toml

    # JSON output for scripting
    postboi-check --format json | jq '.[] | select(.success == false)'

EXIT CODES:
    0 - Every configured platform responded
    1 - A platform failed, none are configured, or the config is invalid
"#)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct CheckEntry {
    platform: PlatformKind,
    name: &'static str,
    success: bool,
    message: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    libpostboi::logging::init_default(args.verbose);

    match run(args).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<bool> {
    let config = match &args.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    let manager = ShareManager::from_config(&config);
    if manager.configured_platforms().is_empty() {
        eprintln!(
            "No platforms configured. \
             Enable [wordpress], [facebook] or [instagram] in the config file."
        );
        return Ok(false);
    }

    info!(platforms = ?manager.configured_platforms(), "Testing connections");
    let statuses = manager.test_all_connections().await;
    let entries = to_entries(statuses);

    match args.format.as_str() {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("Failed to serialize results")?
        ),
        _ => {
            for entry in &entries {
                let mark = if entry.success { "✓" } else { "✗" };
                println!("{} {}: {}", mark, entry.name, entry.message);
            }
        }
    }

    Ok(entries.iter().all(|entry| entry.success))
}

fn to_entries(statuses: BTreeMap<PlatformKind, ConnectionStatus>) -> Vec<CheckEntry> {
    statuses
        .into_iter()
        .map(|(platform, status)| CheckEntry {
            platform,
            name: platform.display_name(),
            success: status.success,
            message: status.message,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_platform_order() {
        let mut statuses = BTreeMap::new();
        statuses.insert(PlatformKind::BusinessAccount, ConnectionStatus::ok("@shop"));
        statuses.insert(PlatformKind::Blog, ConnectionStatus::failed("401"));

        let entries = to_entries(statuses);
        assert_eq!(entries[0].name, "WordPress");
        assert!(!entries[0].success);
        assert_eq!(entries[1].name, "Instagram");
        assert_eq!(entries[1].message, "@shop");
    }
}
