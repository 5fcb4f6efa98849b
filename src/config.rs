use std::net::SocketAddr;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `sqlite://...` for the durable store, `memory` for a throwaway one.
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub enable_dev_routes: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://bodyassess.db".into());
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>().context("APP_PORT must be a port number")?,
            Err(_) => 8080,
        };
        let enable_dev_routes = std::env::var("ENABLE_DEV_ROUTES")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        Ok(Self {
            database_url,
            host,
            port,
            enable_dev_routes,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_joins_host_and_port() {
        let config = AppConfig {
            database_url: "memory".into(),
            host: "127.0.0.1".into(),
            port: 9000,
            enable_dev_routes: false,
        };
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn bind_addr_rejects_hostnames() {
        let config = AppConfig {
            database_url: "memory".into(),
            host: "not a host".into(),
            port: 9000,
            enable_dev_routes: false,
        };
        assert!(config.bind_addr().is_err());
    }
}
