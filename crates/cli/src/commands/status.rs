// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `telepresence status` / `telepresence version`

use anyhow::Result;
use serde::Serialize;

use tp_ipc::{ConnectionState, ConnectorStatus};

use crate::client::ClientError;
use crate::daemon_process;
use crate::output::{render_fields, render_machine, OutputFormat};

#[derive(Serialize, Default)]
struct StatusReport {
    user_daemon_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<ConnectorStatus>,
}

pub async fn run(format: OutputFormat) -> Result<()> {
    let client = daemon_process::existing_client();
    let report = match client.status().await {
        Ok(status) => StatusReport {
            user_daemon_running: true,
            status: Some(status),
        },
        Err(ClientError::Dial(_)) => StatusReport::default(),
        Err(e) => return Err(e.into()),
    };

    if format != OutputFormat::Text {
        println!("{}", render_machine(&report, format)?);
        return Ok(());
    }

    let Some(status) = report.status else {
        println!("User daemon: not running");
        println!("Root daemon: unknown (user daemon is down)");
        return Ok(());
    };
    print_text(&status);
    Ok(())
}

fn print_text(status: &ConnectorStatus) {
    println!("User daemon: running");
    let state = match status.state {
        ConnectionState::Disconnected => "Disconnected".to_string(),
        ConnectionState::Connecting => "Connecting".to_string(),
        ConnectionState::Connected => "Connected".to_string(),
        ConnectionState::Reconnecting => "Reconnecting".to_string(),
        ConnectionState::Failed => "Failed".to_string(),
    };
    let mut fields = vec![
        ("Version", status.version.clone()),
        ("Status", state),
    ];
    if let Some(session) = &status.session {
        fields.push(("Session", session.id.to_string()));
        fields.push(("Context", session.context.clone()));
        fields.push(("Mapped namespaces", format_list(&session.mapped_namespaces)));
    }
    if let Some(manager) = &status.manager {
        fields.push((
            "Traffic manager",
            format!("{} {}", manager.name, manager.version),
        ));
    }
    fields.push(("Traffic agent", status.agent_image.clone()));
    print!("{}", render_fields(&fields));

    if status.intercepts.is_empty() {
        println!("Intercepts: none");
    } else {
        println!("Intercepts:");
        for intercept in &status.intercepts {
            println!(
                "  {} -> {}:{} [{}]{}",
                intercept.spec.name,
                intercept.spec.target_host,
                intercept.spec.port.local,
                intercept.disposition,
                if intercept.message.is_empty() {
                    String::new()
                } else {
                    format!(" {}", intercept.message)
                }
            );
        }
    }

    match &status.root {
        Some(root) => {
            println!("Root daemon: running");
            print!(
                "{}",
                render_fields(&[
                    ("Version", root.version.clone()),
                    ("Network", if root.programmed { "programmed".to_string() } else { "idle".to_string() }),
                    ("Subnets", format_list(&root.subnets)),
                    ("DNS suffixes", format_list(&root.dns.include_suffixes)),
                    ("Also proxy", format_list(&root.also_proxy)),
                    ("Never proxy", format_list(&root.never_proxy)),
                ])
            );
        }
        None => println!("Root daemon: not running"),
    }
}

fn format_list(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

#[derive(Serialize)]
struct VersionReport {
    client: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_daemon: Option<String>,
}

pub async fn version(format: OutputFormat) -> Result<()> {
    let client = daemon_process::existing_client();
    let report = VersionReport {
        client: env!("CARGO_PKG_VERSION").to_string(),
        user_daemon: client.version().await.ok(),
    };
    match format {
        OutputFormat::Text => {
            println!("Client   : {}", report.client);
            match &report.user_daemon {
                Some(v) => println!("Daemon   : {v}"),
                None => println!("Daemon   : not running"),
            }
        }
        machine => println!("{}", render_machine(&report, machine)?),
    }
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
