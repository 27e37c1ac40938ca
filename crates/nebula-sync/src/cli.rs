//! Clap derive structures for the `nebula-sync` binary.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nebula-sync -- replicate Pi-hole v6 configuration
#[derive(Debug, Parser)]
#[command(
    name = "nebula-sync",
    version,
    about = "Synchronize Pi-hole v6 configuration from a primary to its replicas",
    long_about = "Synchronize Pi-hole v6 configuration from a primary to its replicas.\n\n\
        Settings are read from the environment (PRIMARY, REPLICAS, FULL_SYNC, CRON, ...)\n\
        and optionally from a TOML file passed with --config.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Enable debug logging
    #[arg(long, env = "NS_DEBUG", global = true)]
    pub debug: bool,

    /// Log output format
    #[arg(
        long,
        env = "NS_LOG_FORMAT",
        value_enum,
        default_value = "text",
        global = true
    )]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a sync now, then on the configured CRON schedule
    Run(RunArgs),

    /// Probe the local health endpoint (container health checks)
    #[command(hide = true)]
    Healthcheck(HealthcheckArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// TOML settings file; environment variables take precedence over it
    #[arg(long, short = 'c', env = "NS_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct HealthcheckArgs {
    /// Port of the health endpoint
    #[arg(long, env = "API_PORT", default_value_t = 8080)]
    pub port: u16,
}
