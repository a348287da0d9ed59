// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tp-core: shared types for the telepresence client core.
//!
//! Everything the daemons, the manager client, and the CLI exchange lives
//! here: error categories, session and intercept records, the port-spec
//! grammar, and the ensured-state combinator that guarantees cleanup.

pub mod category;
pub mod ensure;
pub mod intercept;
pub mod port;
pub mod session;

pub use category::{Category, Failure};
pub use ensure::{ensured, Cancel, EnsureError, EPILOG_DEADLINE};
pub use intercept::{
    Disposition, InterceptCode, InterceptError, InterceptId, InterceptInfo, InterceptSpec,
    MountPolicy, PreviewSpec, WorkloadRef, ENV_INTERCEPT_ID, ENV_ROOT,
};
pub use port::{PortSpec, ServicePort};
pub use session::{ConnectCode, ConnectRequest, SessionId, SessionInfo};
