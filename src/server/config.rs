//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};

use crate::error::{Error, Result};
use crate::hub::HubConfig;
use crate::server::auth::Credentials;

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default cap on a single inbound WebSocket message
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 512;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Hub settings (history, keepalive, write bounds)
    pub hub: HubConfig,

    /// Largest inbound message accepted from a subscriber
    pub max_message_size: usize,

    /// Basic-auth credentials guarding the producer endpoints (None = open)
    pub credentials: Option<Credentials>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            hub: HubConfig::default(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            credentials: Some(Credentials::default()),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the hub configuration
    pub fn hub(mut self, hub: HubConfig) -> Self {
        self.hub = hub;
        self
    }

    /// Set the inbound message size cap
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Require these credentials on producer endpoints
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Leave producer endpoints unauthenticated
    pub fn disable_auth(mut self) -> Self {
        self.credentials = None;
        self
    }

    /// Validate the configuration, including the hub settings
    pub fn validate(&self) -> Result<()> {
        if self.max_message_size == 0 {
            return Err(Error::Config("max message size must be non-zero".into()));
        }
        self.hub.validate()
    }
}
