// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `telepresence connect` / `telepresence disconnect`

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use tp_core::{ConnectCode, ConnectRequest};

use crate::daemon_process;
use crate::output::{render_fields, render_machine, OutputFormat};

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Kubeconfig context to connect to
    #[arg(long)]
    pub context: String,

    /// Namespace the traffic manager lives in
    #[arg(long)]
    pub manager_namespace: Option<String>,

    /// Namespaces exposed to this workstation
    #[arg(long, value_delimiter = ',')]
    pub mapped_namespaces: Vec<String>,
}

#[derive(Serialize)]
struct ConnectReport {
    code: ConnectCode,
    session_id: String,
    context: String,
    manager_version: String,
}

pub async fn run(args: ConnectArgs, format: OutputFormat) -> Result<()> {
    let manager_namespace = args.manager_namespace.unwrap_or_else(|| {
        tp_config::current()
            .cluster
            .default_manager_namespace
            .clone()
    });

    let client = daemon_process::connect_or_start().await?;
    let outcome = client
        .connect(ConnectRequest {
            context: args.context,
            manager_namespace,
            mapped_namespaces: args.mapped_namespaces,
        })
        .await?;

    let session = outcome
        .session
        .ok_or_else(|| anyhow::anyhow!("connected without session info"))?;

    match format {
        OutputFormat::Text => {
            if outcome.code == ConnectCode::AlreadyConnected {
                println!("Already connected to context {}", session.context);
            } else {
                println!("Connected to context {}", session.context);
            }
            print!(
                "{}",
                render_fields(&[
                    ("Session", session.id.to_string()),
                    ("Manager namespace", session.manager_namespace.clone()),
                    ("Manager version", session.manager_version.clone()),
                ])
            );
        }
        machine => {
            let report = ConnectReport {
                code: outcome.code,
                session_id: session.id.to_string(),
                context: session.context.clone(),
                manager_version: session.manager_version.clone(),
            };
            println!("{}", render_machine(&report, machine)?);
        }
    }
    Ok(())
}

pub async fn disconnect(format: OutputFormat) -> Result<()> {
    let client = daemon_process::existing_client();
    client.disconnect().await?;
    if format == OutputFormat::Text {
        println!("Disconnected");
    }
    Ok(())
}
