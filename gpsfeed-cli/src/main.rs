//! GpsFeed CLI - Command-line interface
//!
//! Drives the gpsfeed library from a terminal: run a simulated feed, listen
//! to a remote location server, or inspect generated routes.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::common;
use commands::listen::{self, ListenArgs};
use commands::route::{self, RouteArgs};
use commands::simulate::{self, SimulateArgs};
use error::CliError;

#[derive(Parser)]
#[command(name = "gpsfeed")]
#[command(version = gpsfeed::VERSION)]
#[command(about = "Simulated and relayed GPS location feeds", long_about = None)]
struct Cli {
    /// Config file (default: ~/.gpsfeed/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file (cleared on start)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated feed and print each broadcast
    Simulate(SimulateArgs),
    /// Connect to a location server and print incoming positions
    Listen(ListenArgs),
    /// Print a generated circle or square route as JSON
    Route(RouteArgs),
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = common::load_config(cli.config.as_deref())?;
    let _logging_guard = common::init_logging(cli.log_file.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Simulate(args) => common::block_on(simulate::run(args, &config))?,
        Commands::Listen(args) => common::block_on(listen::run(args, &config))?,
        Commands::Route(args) => route::run(args, &config),
    }
}
