//! Server configuration module

use clap::Parser;

use crate::config::{
    db::DatabaseConfig, identity::IdentityConfig, observability::LoggingConfig,
    server::ServerRuntimeConfig,
};

pub(crate) mod db;
pub(crate) mod identity;
pub(crate) mod observability;
pub(crate) mod server;

/// Spareline JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "spareline-json", about = "Spareline JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Token lifetimes and login code limits.
    #[command(flatten)]
    pub identity: IdentityConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // .env is optional
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }
}
