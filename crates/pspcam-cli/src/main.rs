use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pspcam_core::Config;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod shutdown;

#[derive(Parser)]
#[command(name = "pspcam")]
#[command(about = "PPSSPP mouse-look injector for Medal of Honor Heroes")]
struct Args {
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Attach and inject mouse look until interrupted (default)
    Run,
    /// Dump guest RAM and/or a scan report for diagnostics
    Dump {
        /// Output file for the raw dump (timestamped name if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Guest-relative start offset
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Bytes to dump (full guest RAM if omitted)
        #[arg(long)]
        size: Option<u64>,

        /// Also write a JSON scan report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("pspcam_core=info".parse()?)
                .add_directive("pspcam_cli=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(c) => {
            info!("Loaded config from {:?}", args.config);
            c
        }
        Err(e) => {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        }
    };

    match args.command.unwrap_or(Command::Run) {
        Command::Run => commands::run::run(&config),
        Command::Dump {
            output,
            offset,
            size,
            report,
        } => commands::dump::run(&config, output, offset, size, report),
    }
}
