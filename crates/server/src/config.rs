//! Server bind configuration

use std::net::SocketAddr;

use crate::error::{Result, ServerError};

/// Bind address for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse into a socket address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ServerError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr_parses() {
        let config = ServerConfig::new("127.0.0.1", 8080);
        let addr = config.bind_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_bad_host_is_rejected() {
        let config = ServerConfig::new("not a host", 8080);
        assert!(config.bind_addr().is_err());
    }
}
