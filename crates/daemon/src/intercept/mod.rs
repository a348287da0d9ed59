// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The intercept manager.
//!
//! Owns the session's intercept table: validation, creation, mounting,
//! disposition tracking from the manager's watch stream, and the
//! cleanup guarantees on removal and session end.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use tp_adapters::MountBridge;
use tp_core::{
    Disposition, Failure, InterceptCode, InterceptError, InterceptId, InterceptInfo,
    InterceptSpec, MountPolicy, SessionId,
};
use tp_manager::{ManagerApi, ManagerError};

/// One intercept as tracked locally.
#[derive(Debug, Clone)]
pub struct LocalIntercept {
    pub info: InterceptInfo,
    /// Name of the docker handler container, when one runs.
    pub container: Option<String>,
}

/// Intercept CRUD for one session.
pub struct InterceptManager<M: ManagerApi, B: MountBridge> {
    api: M,
    session: SessionId,
    bridge: B,
    table: Arc<Mutex<HashMap<String, LocalIntercept>>>,
}

impl<M: ManagerApi, B: MountBridge> InterceptManager<M, B> {
    pub fn new(api: M, session: SessionId, bridge: B) -> Self {
        Self {
            api,
            session,
            bridge,
            table: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Local validation that needs no server round-trip.
    fn validate(&self, spec: &InterceptSpec) -> Result<(), InterceptError> {
        let table = self.table.lock();
        if table.contains_key(&spec.name) {
            return Err(InterceptError::new(
                InterceptCode::AlreadyExists,
                format!("intercept {} already exists", spec.name),
            ));
        }
        for local in table.values() {
            if local.info.spec.port.local == spec.port.local
                && local.info.spec.target_host == spec.target_host
            {
                return Err(InterceptError::local_target_in_use(
                    &spec.target_host,
                    spec.port.local,
                    &local.info.spec.name,
                ));
            }
        }
        if spec.local_only && (spec.mount.enabled() || spec.preview_url.is_some()) {
            return Err(InterceptError::new(
                InterceptCode::UnknownFlag,
                "a local-only intercept takes no mount or preview flags",
            ));
        }
        Ok(())
    }

    /// Pick (and prepare) the mount point for a spec.
    fn resolve_mount(&self, spec: &InterceptSpec) -> Result<Option<PathBuf>, Failure> {
        let path = match &spec.mount {
            MountPolicy::Disabled => return Ok(None),
            MountPolicy::Auto => {
                if !self.bridge.available() {
                    return Err(InterceptError::new(
                        InterceptCode::FailedToEstablish,
                        "remote volume mounts require a filesystem bridge; \
                         pass --mount=false to intercept without one",
                    )
                    .into());
                }
                std::env::temp_dir().join(format!("telepresence-intercept-{}", spec.name))
            }
            MountPolicy::Path(path) => {
                if !self.bridge.available() {
                    return Err(InterceptError::new(
                        InterceptCode::FailedToEstablish,
                        "remote volume mounts require a filesystem bridge; \
                         pass --mount=false to intercept without one",
                    )
                    .into());
                }
                path.clone()
            }
        };
        std::fs::create_dir_all(&path)
            .map_err(|e| Failure::new(format!("cannot create mount point {}: {e}", path.display())))?;
        Ok(Some(path))
    }

    /// Create an intercept from a validated spec.
    ///
    /// Local-only specs are recorded and returned without any server
    /// interaction. Remote specs run the extra `can_intercept`
    /// round-trip first so guaranteed failures surface before anything
    /// user-visible happens.
    pub async fn create(&self, spec: InterceptSpec) -> Result<InterceptInfo, Failure> {
        self.validate(&spec).map_err(Failure::from)?;

        if spec.local_only {
            let info = InterceptInfo {
                id: InterceptId(format!("local/{}", spec.name)),
                spec: spec.clone(),
                disposition: Disposition::Active,
                message: "local-only intercept".to_string(),
                environment: HashMap::new(),
                mount_point: None,
            };
            self.table.lock().insert(
                spec.name.clone(),
                LocalIntercept {
                    info: info.clone(),
                    container: None,
                },
            );
            info!(name = %spec.name, "local-only intercept recorded");
            return Ok(info);
        }

        self.api
            .can_intercept(&self.session, &spec)
            .await
            .map_err(map_manager_error)?;

        let mount_point = self.resolve_mount(&spec)?;

        let prepared = self
            .api
            .prepare_intercept(&self.session, &spec)
            .await
            .map_err(map_manager_error)?;

        let mut info = self
            .api
            .create_intercept(&self.session, &spec)
            .await
            .map_err(map_manager_error)?;

        if info.environment.is_empty() {
            info.environment = prepared.environment;
        }

        if let Some(path) = &mount_point {
            if let Err(e) = self.bridge.mount(&info.id.0, path).await {
                // The cluster-side intercept exists; take it back down.
                let result = self.api.remove_intercept(&self.session, &spec.name).await;
                if let Err(remove_err) = result {
                    warn!(name = %spec.name, error = %remove_err, "cleanup after mount failure failed");
                }
                return Err(map_mount_error(e));
            }
            info.mount_point = Some(path.clone());
        }

        info!(name = %spec.name, id = %info.id, "intercept created");
        self.table.lock().insert(
            spec.name.clone(),
            LocalIntercept {
                info: info.clone(),
                container: None,
            },
        );
        Ok(info)
    }

    /// Record the docker handler container attached to an intercept.
    pub fn set_container(&self, name: &str, container: String) {
        if let Some(local) = self.table.lock().get_mut(name) {
            local.container = Some(container);
        }
    }

    /// Remove an intercept: stop its handler container, release its
    /// mount, then tell the manager.
    ///
    /// When the handler ran in its own container, stopping it first can
    /// race a server-side leave; a structured NOT_FOUND from the Remove
    /// call is then expected and swallowed.
    pub async fn remove(&self, name: &str) -> Result<(), Failure> {
        let Some(local) = self.table.lock().remove(name) else {
            return Err(InterceptError::new(
                InterceptCode::NotFound,
                format!("intercept {name} not found"),
            )
            .into());
        };

        let had_container = match &local.container {
            Some(container) => {
                if let Err(e) = tp_adapters::stop_container(container).await {
                    warn!(name, container, error = %e, "could not stop handler container");
                }
                true
            }
            None => false,
        };

        if let Some(mount_point) = &local.info.mount_point {
            if let Err(e) = self.bridge.unmount(&local.info.id.0, mount_point).await {
                warn!(name, error = %e, "unmount failed");
            }
        }

        if local.info.spec.local_only {
            return Ok(());
        }

        match self.api.remove_intercept(&self.session, name).await {
            Ok(()) => Ok(()),
            Err(ManagerError::Intercept(e))
                if e.code == InterceptCode::NotFound && had_container =>
            {
                // The container stopped first and triggered a
                // server-side leave; the intercept is already gone.
                debug!(name, "remove raced a server-side leave");
                Ok(())
            }
            Err(e) => Err(map_manager_error(e)),
        }
    }

    /// Merge a snapshot from the intercept watch stream into the table.
    ///
    /// Returns the names of intercepts the server dropped, so handlers
    /// attached to them can be stopped.
    pub fn apply_snapshot(&self, snapshot: Vec<InterceptInfo>) -> Vec<String> {
        let mut table = self.table.lock();
        let seen: std::collections::HashSet<String> =
            snapshot.iter().map(|u| u.spec.name.clone()).collect();

        for update in snapshot {
            let name = update.spec.name.clone();
            if let Some(local) = table.get_mut(&name) {
                if local.info.disposition != update.disposition {
                    debug!(
                        name,
                        from = %local.info.disposition,
                        to = %update.disposition,
                        "intercept disposition changed"
                    );
                }
                local.info.disposition = update.disposition;
                local.info.message = update.message;
                if !update.environment.is_empty() {
                    local.info.environment = update.environment;
                }
            }
        }

        let dropped: Vec<String> = table
            .iter()
            .filter(|(name, local)| !local.info.spec.local_only && !seen.contains(name.as_str()))
            .map(|(name, _)| name.clone())
            .collect();
        for name in &dropped {
            info!(name, "intercept dropped by the manager");
            table.remove(name);
        }
        dropped
    }

    pub fn list(&self) -> Vec<InterceptInfo> {
        let mut list: Vec<InterceptInfo> =
            self.table.lock().values().map(|l| l.info.clone()).collect();
        list.sort_by(|a, b| a.spec.name.cmp(&b.spec.name));
        list
    }

    pub fn get(&self, name: &str) -> Option<InterceptInfo> {
        self.table.lock().get(name).map(|l| l.info.clone())
    }

    /// Remove every intercept; called no later than session shutdown.
    pub async fn close(&self) {
        let names: Vec<String> = self.table.lock().keys().cloned().collect();
        for name in names {
            if let Err(e) = self.remove(&name).await {
                warn!(name, error = %e, "failed to remove intercept at shutdown");
            }
        }
    }
}

fn map_manager_error(err: ManagerError) -> Failure {
    match err {
        ManagerError::Intercept(e) => e.into(),
        other => Failure::new(other.to_string()),
    }
}

fn map_mount_error(err: tp_adapters::MountError) -> Failure {
    match err {
        tp_adapters::MountError::MountPointBusy(path) => InterceptError::new(
            InterceptCode::MountPointBusy,
            format!("mount point {} is already in use", path.display()),
        )
        .into(),
        other => Failure::new(other.to_string()),
    }
}

#[cfg(test)]
#[path = "intercept_tests.rs"]
mod tests;
