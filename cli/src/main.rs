// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Remoting Guard CLI
//!
//! The `rguard` binary inspects and exercises the interception pipeline that
//! vets inbound remote operations.
//!
//! ## Commands
//!
//! - `rguard policy show|check` - Effective policy and dry-run evaluation
//! - `rguard self-test` - Run the canned probes through a loopback channel
//! - `rguard config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use remoting_guard::commands::{self, ConfigCommand, PolicyCommand};

/// Remoting guard - vet remote operations before dispatch
#[derive(Parser)]
#[command(name = "rguard")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery, must exist).
    /// REMOTING_GUARD_CONFIG_PATH is honored by discovery and skipped when missing.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "RGUARD_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the effective policy and dry-run operation types
    #[command(name = "policy")]
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },

    /// Verify the guard rejects and allows the canned probes as shipped
    #[command(name = "self-test")]
    SelfTest {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Policy { command }) => commands::policy::handle_command(command, cli.config),
        Some(Commands::SelfTest { json }) => commands::self_test::run(cli.config, json),
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).map(|()| ExitCode::SUCCESS)
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
