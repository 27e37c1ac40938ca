//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use nebula_config::ConfigError;
use nebula_core::SyncError;
use nebula_core::webhook::WebhookError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const SYNC: i32 = 3;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration")]
    #[diagnostic(
        code(nebula::config),
        help(
            "Set PRIMARY and REPLICAS as 'url|password' (or point PRIMARY_FILE/REPLICAS_FILE at files).\n\
             Multiple replicas are separated by commas."
        )
    )]
    Config {
        #[source]
        source: ConfigError,
    },

    #[error("Could not create HTTP client")]
    #[diagnostic(code(nebula::client))]
    Client {
        #[source]
        source: nebula_api::Error,
    },

    #[error("Could not create webhook client")]
    #[diagnostic(code(nebula::webhook))]
    Webhook {
        #[source]
        source: WebhookError,
    },

    // ── Sync ─────────────────────────────────────────────────────────
    #[error("Sync failed")]
    #[diagnostic(
        code(nebula::sync_failed),
        help("Run with NS_DEBUG=true or -v for per-request details.")
    )]
    Sync {
        #[source]
        source: SyncError,
    },

    // ── Health ───────────────────────────────────────────────────────
    #[error("Could not bind health endpoint on {addr}")]
    #[diagnostic(
        code(nebula::server),
        help("Choose another port with API_PORT or disable the endpoint with API_ENABLED=false.")
    )]
    Server {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Health check failed for {url}: {reason}")]
    #[diagnostic(code(nebula::unhealthy))]
    Unhealthy { url: String, reason: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => exit_code::CONFIG,
            Self::Sync { .. } => exit_code::SYNC,
            Self::Client { .. }
            | Self::Webhook { .. }
            | Self::Server { .. }
            | Self::Unhealthy { .. } => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(source: ConfigError) -> Self {
        Self::Config { source }
    }
}

impl From<SyncError> for CliError {
    fn from(source: SyncError) -> Self {
        Self::Sync { source }
    }
}

impl From<nebula_api::Error> for CliError {
    fn from(source: nebula_api::Error) -> Self {
        Self::Client { source }
    }
}

impl From<WebhookError> for CliError {
    fn from(source: WebhookError) -> Self {
        Self::Webhook { source }
    }
}
