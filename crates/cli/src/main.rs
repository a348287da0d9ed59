// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! telepresence - CLI for the telepresence session core

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod daemon_process;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use output::OutputFormat;
use tp_core::Category;

use crate::client::ClientError;

#[derive(Parser)]
#[command(
    name = "telepresence",
    version,
    about = "Telepresence - code locally against a remote Kubernetes cluster"
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a cluster
    Connect(commands::connect::ConnectArgs),
    /// Disconnect from the cluster, keeping the daemons running
    Disconnect,
    /// Show the status of the daemons and the session
    Status,
    /// Intercept a workload, optionally running a handler command
    Intercept(commands::intercept::InterceptArgs),
    /// Remove an intercept
    Leave {
        /// Name of the intercept to remove
        name: String,
    },
    /// Disconnect and stop both daemons
    Quit,
    /// Change a daemon log level, optionally for a limited time
    Loglevel(commands::loglevel::LoglevelArgs),
    /// Show client and daemon versions
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        report_error(&error);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Connect(args) => commands::connect::run(args, cli.output).await,
        Commands::Disconnect => commands::connect::disconnect(cli.output).await,
        Commands::Status => commands::status::run(cli.output).await,
        Commands::Intercept(args) => commands::intercept::run(args, cli.output).await,
        Commands::Leave { name } => commands::intercept::leave(&name).await,
        Commands::Quit => commands::quit::run().await,
        Commands::Loglevel(args) => commands::loglevel::run(args).await,
        Commands::Version => commands::status::version(cli.output).await,
    }
}

/// Print an error the way its category asks for.
///
/// User and config mistakes get the bare message; unknown failures add
/// the pointer to the daemon log.
fn report_error(error: &anyhow::Error) {
    eprintln!("telepresence: error: {error:#}");
    let category = error
        .downcast_ref::<ClientError>()
        .map(ClientError::category)
        .unwrap_or(Category::Unknown);
    if category.wants_log_hint() {
        if let Ok(config) = daemon_process::connector_config() {
            eprintln!("See logs at {} for details", config.log_path.display());
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
