// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use remoting_guard_core::domain::guard_config::{
    GuardConfig, ENV_ADDITIONAL_DENYLIST, ENV_CONFIG_PATH, ENV_DISABLE_ROLE_CHECK,
    ENV_ROLE_CHECK_BYPASS,
};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./remoting-guard.yaml)
        #[arg(short, long, default_value = "./remoting-guard.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, examples } => generate(output, examples),
    }
}

fn env_or_unset(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| "(not set)".to_string())
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = GuardConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!("  2. {}: {}", ENV_CONFIG_PATH, env_or_unset(ENV_CONFIG_PATH).dimmed());
        println!("  3. ./remoting-guard.yaml");
        println!("  4. ~/.remoting-guard/config.yaml");
        println!("  5. /etc/remoting-guard/config.yaml");
        println!();

        println!("{}", "Startup overrides:".bold());
        for name in [
            ENV_ADDITIONAL_DENYLIST,
            ENV_DISABLE_ROLE_CHECK,
            ENV_ROLE_CHECK_BYPASS,
        ] {
            println!("  {}: {}", name, env_or_unset(name).dimmed());
        }
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();
    print!("{}", serde_yaml::to_string(&config)?);

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config =
        GuardConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_templates_are_valid() {
        for template in [
            include_str!("../../templates/config-minimal.yaml"),
            include_str!("../../templates/config-with-examples.yaml"),
        ] {
            let config = GuardConfig::from_yaml_str(template).unwrap();
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_generate_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remoting-guard.yaml");

        generate(path.clone(), true).unwrap();

        let config = GuardConfig::from_yaml_file(&path).unwrap();
        assert!(!config.spec.denylist.additional.is_empty());
    }
}
