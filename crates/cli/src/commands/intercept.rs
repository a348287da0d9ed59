// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `telepresence intercept` / `telepresence leave`
//!
//! With a trailing `-- <cmd>` the whole lifecycle is wrapped in the
//! ensured-state combinator: create the intercept, run the handler with
//! the pod environment exported, and remove the intercept even when the
//! handler fails or the user hits Ctrl-C.

use anyhow::Result;
use clap::Args;

use tp_adapters::{CommandLauncher, Launchable};
use tp_core::{
    ensured, Cancel, InterceptInfo, InterceptSpec, MountPolicy, PortSpec, WorkloadRef,
};

use crate::client::{ClientError, ConnectorClient};
use crate::daemon_process;
use crate::output::OutputFormat;

/// How often the handler loop checks that the intercept still exists.
const WATCH_INTERVAL: std::time::Duration = std::time::Duration::from_secs(2);

#[derive(Args, Debug)]
pub struct InterceptArgs {
    /// Name of the intercept (unique within the session)
    pub name: String,

    /// Workload to intercept (defaults to the intercept name)
    #[arg(long)]
    pub workload: Option<String>,

    /// Namespace of the workload
    #[arg(long, default_value = "default")]
    pub namespace: String,

    /// Port specification: local[:svcPort], or with --docker-run
    /// local:containerPort[:svcPort]
    #[arg(long)]
    pub port: Option<String>,

    /// Mount behavior: true, false, or a directory path
    #[arg(long, default_value = "true")]
    pub mount: String,

    /// Run the handler as a docker container; arguments after `--` are
    /// passed to `docker run`
    #[arg(long)]
    pub docker_run: bool,

    /// Mount point inside the handler container
    #[arg(long)]
    pub docker_mount: Option<String>,

    /// Record the intercept locally without touching the cluster
    #[arg(long)]
    pub local_only: bool,

    /// Extra pod ports to forward to the workstation
    #[arg(long, value_delimiter = ',')]
    pub extra_ports: Vec<u16>,

    /// Handler command to run while the intercept is active
    #[arg(last = true)]
    pub command: Vec<String>,
}

/// Flag validation and spec assembly; everything here is a user error.
pub fn build_spec(args: &InterceptArgs) -> Result<InterceptSpec, ClientError> {
    let user = |message: String| ClientError::Daemon(tp_core::Failure::user(message));

    let mount = MountPolicy::parse(&args.mount);
    if args.docker_mount.is_some() && !mount.enabled() {
        return Err(user(
            "--docker-mount cannot be used with --mount=false".to_string(),
        ));
    }
    if args.docker_mount.is_some() && !args.docker_run {
        return Err(user(
            "--docker-mount only makes sense with --docker-run".to_string(),
        ));
    }
    if args.local_only {
        if args.port.is_some() {
            return Err(user("--local-only takes no --port".to_string()));
        }
        if args.mount != "true" && args.mount != "false" {
            return Err(user("--local-only takes no mount point".to_string()));
        }
    }

    if args.docker_run {
        for arg in &args.command {
            if arg == "-d" || arg == "--detach" {
                return Err(user(format!(
                    "background containers are not supported: remove {arg}"
                )));
            }
        }
    }

    let default_port = tp_config::current().intercept.default_port;
    let port = match &args.port {
        Some(spec) => PortSpec::parse(spec, args.docker_run)
            .map_err(|e| user(e.to_string()))?,
        None => PortSpec {
            local: default_port,
            container: None,
            service: None,
        },
    };

    Ok(InterceptSpec {
        name: args.name.clone(),
        workload: WorkloadRef {
            kind: "Deployment".to_string(),
            name: args.workload.clone().unwrap_or_else(|| args.name.clone()),
            namespace: args.namespace.clone(),
        },
        port,
        target_host: "127.0.0.1".to_string(),
        mechanism: "tcp".to_string(),
        mechanism_args: Vec::new(),
        mount: if args.local_only {
            MountPolicy::Disabled
        } else {
            mount
        },
        extra_ports: args.extra_ports.clone(),
        local_only: args.local_only,
        preview_url: None,
    })
}

pub async fn run(args: InterceptArgs, format: OutputFormat) -> Result<()> {
    let spec = build_spec(&args)?;
    let client = daemon_process::connect_or_start().await?;

    if args.command.is_empty() {
        let info = client.create_intercept(spec).await?;
        if format == OutputFormat::Text {
            println!(
                "Using intercept {} ({} -> {}:{})",
                info.spec.name, info.spec.workload, info.spec.target_host, info.spec.port.local
            );
        } else {
            println!("{}", crate::output::render_machine(&info, format)?);
        }
        return Ok(());
    }

    run_with_handler(&client, spec, args).await
}

/// The ensured-state lifecycle around a handler command.
async fn run_with_handler(
    client: &ConnectorClient,
    spec: InterceptSpec,
    args: InterceptArgs,
) -> Result<()> {
    let cancel = Cancel::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let name = spec.name.clone();
    let socket_path = tp_ipc::socket::connector_socket();
    let created: std::sync::Arc<parking_lot::Mutex<Option<InterceptInfo>>> =
        std::sync::Arc::new(parking_lot::Mutex::new(None));
    let created_for_action = std::sync::Arc::clone(&created);

    let prolog = async {
        let info = client
            .create_intercept(spec)
            .await
            .map_err(|e| e.to_string())?;
        *created.lock() = Some(info);
        Ok(true)
    };

    let action_client = ConnectorClient::new(socket_path.clone());
    let action = async {
        let info = created_for_action
            .lock()
            .clone()
            .ok_or_else(|| "intercept was not created".to_string())?;
        if args.docker_run {
            run_docker_handler(&action_client, &info, &args).await
        } else {
            run_subprocess_handler(&action_client, &info, &args).await
        }
    };

    let epilog_name = name.clone();
    let epilog = move || async move {
        let client = ConnectorClient::new(socket_path);
        match client.remove_intercept(&epilog_name).await {
            Ok(()) => Ok(()),
            // Already gone (server-side leave or handler race): fine.
            Err(e) if e.intercept_code() == Some(tp_core::InterceptCode::NotFound) => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    };

    ensured(&cancel, prolog, action, epilog)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(())
}

/// Run `<cmd>` with the collected pod environment exported, killing it
/// if the intercept disappears server-side.
async fn run_subprocess_handler(
    client: &ConnectorClient,
    info: &InterceptInfo,
    args: &InterceptArgs,
) -> Result<(), String> {
    let program = args.command[0].clone();
    let handler_args: Vec<String> = args.command[1..].to_vec();
    let mut launcher =
        CommandLauncher::new(program, handler_args).with_env(info.handler_environment());
    let mut child = launcher.launch().await?;
    wait_for_handler(client, info, child.as_mut()).await
}

/// Run the handler as a docker container with the env file and volume
/// mount wired up.
async fn run_docker_handler(
    client: &ConnectorClient,
    info: &InterceptInfo,
    args: &InterceptArgs,
) -> Result<(), String> {
    let run = tp_adapters::DockerRun {
        intercept_name: info.spec.name.clone(),
        local_port: info.spec.port.local,
        container_port: info.spec.port.container,
        mount: match (&info.mount_point, &args.docker_mount) {
            (Some(local), Some(container)) => {
                Some((local.clone(), std::path::PathBuf::from(container)))
            }
            (Some(local), None) => Some((local.clone(), local.clone())),
            (None, _) => None,
        },
        run_args: args.command.clone(),
    };

    let env_file = std::env::temp_dir().join(format!("telepresence-{}.env", info.spec.name));
    tp_adapters::write_env_file(&env_file, &info.handler_environment())
        .map_err(|e| e.to_string())?;
    let docker_args = tp_adapters::docker_run_args(&run, &env_file).map_err(|e| e.to_string())?;

    let container = tp_adapters::container_name(&info.spec.name, info.spec.port.local);
    client
        .set_container(&info.spec.name, &container)
        .await
        .map_err(|e| e.to_string())?;

    let mut launcher = CommandLauncher::new("docker", docker_args);
    let mut child = launcher.launch().await?;
    let result = wait_for_handler(client, info, child.as_mut()).await;
    let _ = std::fs::remove_file(&env_file);
    result
}

/// Wait for the handler to exit, terminating it if the session drops
/// the intercept (server-side leave, quit, scale to zero).
async fn wait_for_handler(
    client: &ConnectorClient,
    info: &InterceptInfo,
    child: &mut dyn tp_adapters::Running,
) -> Result<(), String> {
    let mut watch = tokio::time::interval(WATCH_INTERVAL);
    watch.tick().await;
    loop {
        tokio::select! {
            exit = child.exit_rx() => {
                return match exit.ok().flatten() {
                    Some(0) => Ok(()),
                    Some(code) => Err(format!("handler exited with status {code}")),
                    None => Ok(()),
                };
            }
            _ = watch.tick() => {
                let gone = match client.list_intercepts().await {
                    Ok(intercepts) => !intercepts
                        .iter()
                        .any(|i| i.spec.name == info.spec.name),
                    Err(_) => true,
                };
                if gone {
                    child.terminate();
                    return Err(format!(
                        "intercept {} was removed by the session; handler stopped",
                        info.spec.name
                    ));
                }
            }
        }
    }
}

pub async fn leave(name: &str) -> Result<()> {
    let client = daemon_process::existing_client();
    client.remove_intercept(name).await?;
    println!("Intercept {name} removed");
    Ok(())
}

#[cfg(test)]
#[path = "intercept_tests.rs"]
mod tests;
