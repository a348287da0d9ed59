// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telepresence root daemon (telepresence-rootd)
//!
//! Privileged process owning the virtual network. Started by the CLI
//! (via sudo) and driven by the user daemon over the root socket.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use tp_rootd::{lifecycle, ListenCtx, Listener, NetworkState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("telepresence-rootd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("telepresence-rootd {}", env!("CARGO_PKG_VERSION"));
                println!("Telepresence root daemon - owns the virtual network, DNS and routing");
                println!();
                println!("USAGE:");
                println!("    telepresence-rootd");
                println!();
                println!("The daemon is started by the `telepresence` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket for commands");
                println!("from the user daemon.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: telepresence-rootd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = lifecycle::Config::load();

    tp_adapters::rotate_log_if_needed(&config.log_path);
    tp_adapters::write_startup_marker(&config.log_path, "telepresence-rootd")?;

    // The shared client config decides the base log level.
    let client_config = tp_config::load().unwrap_or_default();
    let level = client_config.log_levels.root_daemon.to_string();
    let (log_guard, log_level) = tp_adapters::setup_logging(&config.log_path, &level)?;
    tp_config::replace(Arc::new(client_config));

    info!("Starting root daemon");

    let startup = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(e) => {
            tp_adapters::write_startup_error(&config.log_path, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let shutdown_notify = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        network: Arc::new(Mutex::new(NetworkState::new())),
        log_level: Some(log_level),
        shutdown: Arc::clone(&shutdown_notify),
    });
    tokio::spawn(Listener::new(startup.listener, ctx).run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        "Daemon ready, listening on {}",
        config.socket_path.display()
    );
    println!("READY");

    tokio::select! {
        _ = shutdown_notify.notified() => info!("Shutdown requested via command"),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    lifecycle::shutdown(&config, startup.lock);
    info!("Daemon stopped");
    Ok(())
}
