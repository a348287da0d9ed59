// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telepresence user daemon (telepresence-connector)
//!
//! Background process owning the session with the traffic manager.
//!
//! Architecture:
//! - Listener task: socket I/O, one task per connection
//! - Orchestrator coroutine: owns the session, serializes all mutation

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info, warn};
use uuid::Uuid;

use tp_adapters::NoBridge;
use tp_daemon::{
    lifecycle, ListenCtx, Listener, NoInstaller, Orchestrator, RootClient, WireDialer,
};

/// Port of the traffic manager's API service.
const MANAGER_API_PORT: u16 = 8081;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("telepresence-connector {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("telepresence-connector {}", env!("CARGO_PKG_VERSION"));
                println!("Telepresence user daemon - owns the traffic manager session");
                println!();
                println!("USAGE:");
                println!("    telepresence-connector");
                println!();
                println!("The daemon is started by the `telepresence` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket for commands");
                println!("from `telepresence`.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: telepresence-connector [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = lifecycle::Config::load()?;

    tp_adapters::rotate_log_if_needed(&config.log_path);
    tp_adapters::write_startup_marker(&config.log_path, "telepresence-connector")?;

    // Layered config plus environment overrides, into the global slot.
    let mut client_config = tp_config::load()?;
    let env = tp_config::Env::load();
    env.apply(&mut client_config);
    let level = client_config.log_levels.user_daemon.to_string();
    tp_config::replace(Arc::new(client_config));

    let (log_guard, log_level) = tp_adapters::setup_logging(&config.log_path, &level)?;

    info!("Starting user daemon");

    let startup = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(e) => {
            tp_adapters::write_startup_error(&config.log_path, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    // Watch the user config directory; reloads land in the global slot.
    let watcher = tp_config::watch(tp_config::default_dirs(), |_| {
        info!("configuration reloaded");
    });
    if let Err(e) = &watcher {
        warn!(error = %e, "config watcher not installed");
    }

    let root = RootClient::from_env();
    let orchestrator = Orchestrator::spawn(tp_daemon::session::OrchestratorDeps {
        dialer: WireDialer::new(MANAGER_API_PORT),
        installer: NoInstaller,
        bridge: NoBridge,
        root: root.clone(),
        client_version: env!("CARGO_PKG_VERSION").to_string(),
        install_id: Uuid::new_v4().to_string(),
    });

    let shutdown_notify = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        orchestrator: orchestrator.clone(),
        root,
        log_level: Some(log_level),
        shutdown: Arc::clone(&shutdown_notify),
        version: env!("CARGO_PKG_VERSION").to_string(),
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

    // Session teardown first: intercepts removed, depart sent.
    orchestrator.quit().await;
    drop(watcher);
    lifecycle::shutdown(&config, startup.lock);
    info!("Daemon stopped");
    Ok(())
}
