use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::{debug, error};

use ec2_controller::plan::{self, Kind};
use ec2_controller::telemetry::{self, LogFormat};

#[derive(Debug, Parser)]
#[command(name = "ec2-sync", version, about = "Plan EC2 sub-resource changes offline")]
struct Arguments {
    #[arg(long = "log-format", env = "EC2_LOG_FORMAT", value_enum, default_value_t)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the changes that converge the latest items on the desired items
    Plan {
        #[arg(long, value_enum)]
        kind: Kind,
        /// YAML or JSON list of desired items
        #[arg(long)]
        desired: PathBuf,
        /// YAML or JSON list of items as observed in EC2
        #[arg(long)]
        latest: PathBuf,
    },
    /// Print the JSON schema of an item list
    Schema {
        #[arg(long, value_enum)]
        kind: Kind,
    },
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    telemetry::init(args.log_format)?;

    let output = match args.command {
        Command::Plan {
            kind,
            desired,
            latest,
        } => {
            debug!(?kind, desired = %desired.display(), latest = %latest.display(), "Planning");
            plan::plan(kind, &read(&desired)?, &read(&latest)?).inspect_err(|e| {
                error!(error = %e, "Planning failed");
            })?
        }
        Command::Schema { kind } => serde_json::to_value(plan::schema(kind))?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
