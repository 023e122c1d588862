//! Relay host configuration.
//!
//! Provides a type-safe interface for configuring the two listeners and the
//! relay's command timeout. Loading values from the environment or a file
//! is the embedding process's concern.
//!
//! # Example
//!
//! ```ignore
//! use sketchwire::Config;
//!
//! let config = Config::new()
//!     .with_http_port(4114)
//!     .with_relay_port(4115)
//!     .with_access_token("sk-...");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::relay::core::DEFAULT_COMMAND_TIMEOUT;

// ============================================================================
// Config
// ============================================================================

/// Relay host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address of the HTTP front door.
    pub http_addr: SocketAddr,

    /// Address of the executor WebSocket listener.
    pub relay_addr: SocketAddr,

    /// Timeout applied to forwarded executor commands.
    pub command_timeout: Duration,

    /// Bearer token required on `/tool` calls, if set.
    pub access_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl Config {
    /// Creates a configuration with localhost listeners on OS-assigned
    /// ports and the default command timeout.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            http_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            relay_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            access_token: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl Config {
    /// Sets the HTTP front door port.
    #[inline]
    #[must_use]
    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_addr.set_port(port);
        self
    }

    /// Sets the executor listener port.
    #[inline]
    #[must_use]
    pub fn with_relay_port(mut self, port: u16) -> Self {
        self.relay_addr.set_port(port);
        self
    }

    /// Sets the HTTP front door address.
    #[inline]
    #[must_use]
    pub fn with_http_addr(mut self, addr: SocketAddr) -> Self {
        self.http_addr = addr;
        self
    }

    /// Sets the executor listener address.
    #[inline]
    #[must_use]
    pub fn with_relay_addr(mut self, addr: SocketAddr) -> Self {
        self.relay_addr = addr;
        self
    }

    /// Sets the forwarded-command timeout.
    #[inline]
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Requires a bearer token on `/tool` calls.
    #[inline]
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.http_addr.port(), 0);
        assert_eq!(config.relay_addr.port(), 0);
        assert_eq!(config.command_timeout, DEFAULT_COMMAND_TIMEOUT);
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let config = Config::new()
            .with_http_port(4114)
            .with_relay_port(4115)
            .with_command_timeout(Duration::from_secs(10))
            .with_access_token("sk-1");

        assert_eq!(config.http_addr.port(), 4114);
        assert_eq!(config.relay_addr.port(), 4115);
        assert_eq!(config.command_timeout, Duration::from_secs(10));
        assert_eq!(config.access_token.as_deref(), Some("sk-1"));
    }
}
