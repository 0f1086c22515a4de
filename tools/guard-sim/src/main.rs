use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod scenario;

use scenario::{Scenario, Simulator};

/// Replay a JSON scenario against the timelock and action policies, then print a JSON report.
///
/// Every step runs against an in-memory host whose clock only moves on `warp` steps. Failed
/// steps are reported with their error message and ABI revert data; they do not stop the run.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to the scenario file (eg, demos/scenario.json).
    #[arg(long, env = "GUARD_SCENARIO")]
    scenario: PathBuf,

    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, env = "GUARD_JSON_LOGS")]
    json_logs: bool,

    /// Write the report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let raw = fs::read_to_string(&cli.scenario)
        .with_context(|| format!("failed reading {}", cli.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing scenario {}", cli.scenario.display()))?;
    tracing::info!(
        path = %cli.scenario.display(),
        steps = scenario.steps.len(),
        chain_id = scenario.chain_id,
        "scenario loaded"
    );

    let report = Simulator::new(&scenario).run(&scenario.steps);
    tracing::info!(passed = report.passed, failed = report.failed, "scenario finished");

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("failed serialising report")?;

    match cli.output {
        Some(path) => fs::write(&path, rendered.as_bytes())
            .with_context(|| format!("failed writing {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
