// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Virtual network state.
//!
//! The session core negotiates and records what the virtual interface
//! must expose; programming the OS (tun device, resolver hooks, route
//! table) happens behind this state and is out of scope here.

use thiserror::Error;
use tracing::info;

use tp_ipc::{DnsSpec, RootStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("the network is already open for session {0}")]
    SessionConflict(String),

    #[error("the network is not open")]
    NotOpen,
}

/// What the virtual network currently exposes.
#[derive(Debug, Clone, Default)]
pub struct NetworkState {
    programmed: bool,
    session_id: Option<String>,
    dns: DnsSpec,
    subnets: Vec<String>,
    also_proxy: Vec<String>,
    never_proxy: Vec<String>,
    allow_conflicting: Vec<String>,
}

impl NetworkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program the network for a session. Idempotent for the same
    /// session; a different session must close the previous one first.
    pub fn open(
        &mut self,
        session_id: String,
        dns: DnsSpec,
        also_proxy: Vec<String>,
        never_proxy: Vec<String>,
        allow_conflicting: Vec<String>,
    ) -> Result<(), NetworkError> {
        if let Some(current) = &self.session_id {
            if *current != session_id {
                return Err(NetworkError::SessionConflict(current.clone()));
            }
            return Ok(());
        }
        info!(session_id, "opening virtual network");
        self.programmed = true;
        self.session_id = Some(session_id);
        self.dns = dns;
        self.also_proxy = also_proxy;
        self.never_proxy = never_proxy;
        self.allow_conflicting = allow_conflicting;
        Ok(())
    }

    /// Tear everything down. Closing an unopened network is a no-op.
    pub fn close(&mut self) {
        if self.programmed {
            info!(session_id = ?self.session_id, "closing virtual network");
        }
        *self = Self::default();
    }

    pub fn set_dns_suffixes(&mut self, suffixes: Vec<String>) -> Result<(), NetworkError> {
        if !self.programmed {
            return Err(NetworkError::NotOpen);
        }
        self.dns.include_suffixes = suffixes;
        Ok(())
    }

    /// Route additional subnets, keeping order and dropping duplicates.
    pub fn add_subnets(&mut self, subnets: Vec<String>) -> Result<(), NetworkError> {
        if !self.programmed {
            return Err(NetworkError::NotOpen);
        }
        for subnet in subnets {
            if !self.subnets.contains(&subnet) && !self.never_proxy.contains(&subnet) {
                self.subnets.push(subnet);
            }
        }
        Ok(())
    }

    pub fn clear_subnets(&mut self) {
        self.subnets.clear();
    }

    pub fn is_open(&self) -> bool {
        self.programmed
    }

    pub fn status(&self, version: &str) -> RootStatus {
        RootStatus {
            version: version.to_string(),
            programmed: self.programmed,
            session_id: self.session_id.clone(),
            dns: self.dns.clone(),
            subnets: self.subnets.clone(),
            also_proxy: self.also_proxy.clone(),
            never_proxy: self.never_proxy.clone(),
            allow_conflicting: self.allow_conflicting.clone(),
        }
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
