// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port-spec grammar for intercept flags.
//!
//! Outside docker: `<local>[:<svcPort>]`. With `--docker-run` a container
//! port slots in between: `<local>:<containerPort>[:<svcPort>]`. The
//! service port may be a name or a number.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A service port identifier: numeric port or named port on the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServicePort {
    Number(u16),
    Name(String),
}

impl ServicePort {
    fn parse(s: &str) -> Result<Self, PortSpecError> {
        if s.is_empty() {
            return Err(PortSpecError::Empty);
        }
        if s.chars().all(|c| c.is_ascii_digit()) {
            let n = s
                .parse::<u16>()
                .map_err(|_| PortSpecError::BadPort(s.to_string()))?;
            Ok(ServicePort::Number(n))
        } else {
            Ok(ServicePort::Name(s.to_string()))
        }
    }
}

impl fmt::Display for ServicePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServicePort::Number(n) => write!(f, "{n}"),
            ServicePort::Name(n) => f.write_str(n),
        }
    }
}

/// Parsed `--port` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port bound on the workstation.
    pub local: u16,
    /// Container-side port; only present for docker runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<u16>,
    /// Service port selecting which service port is intercepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServicePort>,
}

/// Port-spec parse failures. All are user errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortSpecError {
    #[error("port specification is empty")]
    Empty,

    #[error("{0:?} is not a valid port number")]
    BadPort(String),

    #[error("port specification {0:?} has too many colon-separated parts")]
    TooManyParts(String),

    #[error("container port in {0:?} is only valid together with --docker-run")]
    ContainerPortWithoutDocker(String),
}

impl PortSpec {
    /// Parse a port flag. `docker` widens the grammar with a container port.
    pub fn parse(s: &str, docker: bool) -> Result<Self, PortSpecError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortSpecError::Empty);
        }
        let parts: Vec<&str> = s.split(':').collect();

        let local = parse_port(parts[0])?;
        match parts.len() {
            1 => Ok(Self {
                local,
                container: None,
                service: None,
            }),
            2 if docker => Ok(Self {
                local,
                container: Some(parse_port(parts[1])?),
                service: None,
            }),
            2 => Ok(Self {
                local,
                container: None,
                service: Some(ServicePort::parse(parts[1])?),
            }),
            3 if docker => Ok(Self {
                local,
                container: Some(parse_port(parts[1])?),
                service: Some(ServicePort::parse(parts[2])?),
            }),
            3 => Err(PortSpecError::ContainerPortWithoutDocker(s.to_string())),
            _ => Err(PortSpecError::TooManyParts(s.to_string())),
        }
    }
}

fn parse_port(s: &str) -> Result<u16, PortSpecError> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(PortSpecError::BadPort(s.to_string()));
    }
    s.parse::<u16>()
        .map_err(|_| PortSpecError::BadPort(s.to_string()))
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local)?;
        if let Some(c) = self.container {
            write!(f, ":{c}")?;
        }
        if let Some(svc) = &self.service {
            write!(f, ":{svc}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
