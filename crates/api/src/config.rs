//! Server settings read once at startup.

use std::net::SocketAddr;

use thiserror::Error;

pub const BIND_VAR: &str = "STOCKWISE_BIND";
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {var}: {message}")]
pub struct ServerConfigError {
    pub var: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ServerConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerConfigError> {
        let raw = lookup(BIND_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = raw.trim().parse().map_err(|e: std::net::AddrParseError| ServerConfigError {
            var: BIND_VAR,
            message: format!("{raw:?}: {e}"),
        })?;
        Ok(Self { bind })
    }
}
