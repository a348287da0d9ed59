// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tp-adapters: seams between the session core and the host system.
//!
//! Subprocess launching, the monitored-resource supervisor, the docker
//! runner, and the mount-bridge contract all live here, each behind a
//! trait with a fake implementation for tests.

pub mod docker;
pub mod launcher;
pub mod lockfile;
pub mod logging;
pub mod mount;
pub mod subprocess;
pub mod supervisor;

pub use docker::{
    container_name, docker_run_args, stop_container, write_env_file, DockerError, DockerRun,
};
pub use launcher::{CommandLauncher, Launchable, Running};
pub use lockfile::{process_exists, read_pid, LockError, PidLock};
pub use logging::{
    rotate_log_if_needed, setup_logging, write_startup_error, write_startup_marker, LogLevelHandle,
    LoggingError,
};
pub use mount::{MountBridge, MountError, NoBridge};
pub use subprocess::run_with_timeout;
pub use supervisor::{
    Hook, ResourceSpec, ResourceState, Supervisor, SupervisorHandle, CHECK_INTERVAL,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use launcher::fake::{FakeLauncher, FakeProcess, LauncherCall};
#[cfg(any(test, feature = "test-support"))]
pub use mount::fake::FakeMountBridge;
