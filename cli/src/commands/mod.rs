// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the remoting guard CLI

pub mod config;
pub mod policy;

pub use self::config::ConfigCommand;
pub use self::policy::PolicyCommand;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use remoting_guard_core::domain::guard_config::{ConfigSource, EnvSource, GuardConfig};
use remoting_guard_core::domain::policy::PolicyStore;

/// Load configuration the way a host would at startup and seed a policy store.
pub(crate) fn load_policy(config_override: Option<PathBuf>) -> Result<Arc<PolicyStore>> {
    load_policy_with(config_override, &EnvSource)
}

pub(crate) fn load_policy_with(
    config_override: Option<PathBuf>,
    source: &impl ConfigSource,
) -> Result<Arc<PolicyStore>> {
    let config =
        GuardConfig::load_with(config_override, source).context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let policy = PolicyStore::from_config(&config);
    let snapshot = policy.snapshot();
    info!(
        config = %config.metadata.name,
        denylist = snapshot.denylist.len(),
        bypass_allowlist = snapshot.bypass_allowlist.len(),
        global_bypass = snapshot.global_bypass,
        "Policy store seeded"
    );
    Ok(Arc::new(policy))
}
