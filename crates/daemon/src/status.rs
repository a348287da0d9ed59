// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status snapshot assembly.

use tracing::debug;

use tp_ipc::ConnectorStatus;

use crate::rootd::RootClient;
use crate::session::OrchestratorHandle;

/// Assemble the full status view, querying the root daemon and the
/// orchestrator concurrently. A dead root daemon is reported as absent,
/// not as an error.
pub async fn assemble_status(
    orchestrator: &OrchestratorHandle,
    root: &RootClient,
    version: &str,
) -> ConnectorStatus {
    let (snapshot, root_status) = tokio::join!(orchestrator.snapshot(), root.status());

    let root = match root_status {
        Ok(status) => Some(status),
        Err(e) => {
            debug!(error = %e, "root daemon status unavailable");
            None
        }
    };

    let config = tp_config::current();
    let agent_image = if config.images.agent_image.is_empty() {
        format!("{}/tel2", config.images.registry)
    } else {
        format!("{}/{}", config.images.registry, config.images.agent_image)
    };

    ConnectorStatus {
        version: version.to_string(),
        state: snapshot.state,
        session: snapshot.session,
        manager: snapshot.manager,
        agent_image,
        mapped_namespaces: snapshot.mapped_namespaces,
        intercepts: snapshot.intercepts,
        root,
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
