// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `telepresence loglevel` - adjust daemon log levels at runtime.

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::daemon_process;

#[derive(Args, Debug)]
pub struct LoglevelArgs {
    /// New level: trace, debug, info, warn or error
    pub level: String,

    /// Revert to the configured level after this long (e.g. 30m)
    #[arg(long)]
    pub duration: Option<String>,
}

pub async fn run(args: LoglevelArgs) -> Result<()> {
    let duration: Option<Duration> = match &args.duration {
        Some(text) => Some(
            tp_config::parse_duration(text)
                .map_err(|e| anyhow::anyhow!("invalid --duration: {e}"))?,
        ),
        None => None,
    };

    let client = daemon_process::existing_client();
    client.set_log_level(&args.level, duration).await?;
    println!("Log level set to {}", args.level);
    Ok(())
}
