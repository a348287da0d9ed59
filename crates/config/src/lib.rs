// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tp-config: layered client configuration.
//!
//! Configuration is read from an ordered list of directories (system
//! directories first, the per-user directory last), each contributing an
//! optional `config.yml` merged right-biased over built-in defaults. The
//! resolved [`ClientConfig`] lives in a process-wide slot and is replaced
//! atomically when the user file changes on disk.

pub mod bytes;
pub mod duration;
pub mod env;
pub mod load;
pub mod schema;
pub mod slot;
pub mod timeouts;
pub mod watch;

pub use bytes::ByteSize;
pub use duration::{format_duration, parse_duration};
pub use env::Env;
pub use load::{default_dirs, load, load_from_dirs, user_config_dir, user_config_file, ConfigError};
pub use schema::{
    AppProtocolStrategy, ClientConfig, Cloud, ClusterDefaults, ConfigFragment, Dns, Grpc, Images,
    InterceptDefaults, LogLevel, LogLevels, Routing, TelepresenceApi,
};
pub use slot::{current, replace};
pub use timeouts::{TimeoutError, TimeoutId, Timeouts};
pub use watch::{watch, ConfigWatcher};

/// Name of the configuration file inside each config directory.
pub const CONFIG_FILE: &str = "config.yml";
