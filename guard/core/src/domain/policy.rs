// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Policy Store
//!
//! Shared, concurrently mutable configuration consulted by both interceptor
//! stages. Constructed once at startup (see [`PolicyStore::from_config`]) and
//! handed to the stages as an `Arc<PolicyStore>`.
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `denylist` | type identifiers always rejected, whatever their scope declaration |
//! | `bypass_allowlist` | type identifiers exempt from the role-check requirement |
//! | `protocol_exemptions` | fixed protocol-internal operations that predate the contract |
//! | `global_bypass` | disables role-check enforcement for every operation |
//!
//! ## Concurrency
//!
//! Every inbound operation reads the store; writes are rare operator or test
//! actions. Both sets are sharded [`DashSet`]s so unrelated readers never
//! serialize on a single lock, and the bypass flag is an atomic. A write is
//! visible to every decision that starts after it returns; decisions already in
//! flight may or may not observe it.

use dashmap::DashSet;
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::guard_config::GuardConfig;

/// Operator-facing remediation reference attached to every rejection.
pub const DEFAULT_REMEDIATION_URL: &str =
    "https://www.jenkins.io/redirect/remoting-security-workaround/";

/// Type identifier of the self-test probe that must stay denylisted by default.
pub const SELF_TEST_BLOCKED_PROBE: &str =
    "remoting_guard_core::application::self_test::BlockedByDefaultProbe";

/// Known-dangerous historical operation types.
pub const BUILTIN_DENYLIST: &[&str] = &[
    "hudson.scm.SubversionSCM$DescriptorImpl$SshPublicKeyCredential$1", // SECURITY-2506
    "hudson.FilePath$FileCallableWrapper",                               // SECURITY-2455
    "org.jenkinsci.squashtm.tawrapper.TestListSaver$TestListCallable",   // SECURITY-2525
    SELF_TEST_BLOCKED_PROBE,
];

/// Operations patched upstream to declare their scope, which older peers may
/// still send without a declaration.
pub const BUILTIN_BYPASS_ALLOWLIST: &[&str] = &[
    "hudson.remoting.Channel$IOSyncer",
    "hudson.remoting.Channel$SetMaximumBytecodeLevel",
    "hudson.remoting.PingThread$Ping",
];

/// Protocol-internal RPC envelopes. Matched exactly; sharing a prefix with one
/// of these grants nothing.
pub const PROTOCOL_EXEMPTIONS: &[&str] = &[
    "hudson.remoting.RemoteInvocationHandler$RPCRequest",
    "hudson.remoting.RemoteInvocationHandler$UserRPCRequest",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Operation type identifier must not be empty")]
    EmptyTypeName,
}

/// Trimmed, non-empty operation type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct OperationType(String);

impl OperationType {
    pub fn parse(raw: &str) -> Result<Self, PolicyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PolicyError::EmptyTypeName);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parse a comma-separated list, dropping blank entries.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',').filter_map(|entry| Self::parse(entry).ok()).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<OperationType> for String {
    fn from(value: OperationType) -> Self {
        value.0
    }
}

impl Borrow<str> for OperationType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time copy of the store, sorted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySnapshot {
    pub denylist: Vec<OperationType>,
    pub bypass_allowlist: Vec<OperationType>,
    pub protocol_exemptions: Vec<OperationType>,
    pub global_bypass: bool,
    pub remediation: String,
}

pub struct PolicyStore {
    denylist: DashSet<OperationType>,
    bypass_allowlist: DashSet<OperationType>,
    protocol_exemptions: HashSet<OperationType>,
    global_bypass: AtomicBool,
    remediation: String,
}

impl PolicyStore {
    /// Store with no denylist or bypass entries. Protocol exemptions are structural
    /// and always present.
    pub fn empty() -> Self {
        Self {
            denylist: DashSet::new(),
            bypass_allowlist: DashSet::new(),
            protocol_exemptions: parse_static(PROTOCOL_EXEMPTIONS).collect(),
            global_bypass: AtomicBool::new(false),
            remediation: DEFAULT_REMEDIATION_URL.to_string(),
        }
    }

    /// Store seeded with the built-in denylist and bypass allowlist.
    pub fn with_defaults() -> Self {
        let store = Self::empty();
        for entry in parse_static(BUILTIN_DENYLIST) {
            store.denylist.insert(entry);
        }
        for entry in parse_static(BUILTIN_BYPASS_ALLOWLIST) {
            store.bypass_allowlist.insert(entry);
        }
        store
    }

    /// Seed the store from startup configuration. Call once, before any stage
    /// can see inbound traffic.
    pub fn from_config(config: &GuardConfig) -> Self {
        let mut store = Self::with_defaults();
        let spec = &config.spec;

        if !spec.denylist.additional.is_empty() {
            info!(
                "Rejecting the following operation types regardless of scope declaration: {}",
                join(&spec.denylist.additional)
            );
            for entry in &spec.denylist.additional {
                store.denylist.insert(entry.clone());
            }
        }

        if !spec.role_check.bypass.is_empty() {
            info!(
                "Allowing the following operation types to skip scope declaration: {}",
                join(&spec.role_check.bypass)
            );
            for entry in &spec.role_check.bypass {
                store.bypass_allowlist.insert(entry.clone());
            }
        }

        if spec.role_check.disable_all {
            info!("Role-check enforcement disabled for all operation types");
        }
        store.global_bypass = AtomicBool::new(spec.role_check.disable_all);
        store.remediation = spec.remediation_url.clone();
        store
    }

    pub fn is_denied(&self, type_name: &str) -> bool {
        self.denylist.contains(type_name)
    }

    /// Add a type to the denylist. Returns `true` if it was not already present.
    pub fn deny(&self, type_name: &str) -> Result<bool, PolicyError> {
        let entry = OperationType::parse(type_name)?;
        debug!(operation_type = %entry, "Adding operation type to denylist");
        Ok(self.denylist.insert(entry))
    }

    /// Remove a type from the denylist. Returns `true` if it was present.
    pub fn remove_denied(&self, type_name: &str) -> bool {
        debug!(operation_type = type_name.trim(), "Removing operation type from denylist");
        self.denylist.remove(type_name.trim()).is_some()
    }

    pub fn is_bypassed(&self, type_name: &str) -> bool {
        self.bypass_allowlist.contains(type_name)
    }

    /// Exempt a type from the role-check requirement. Returns `true` if newly added.
    pub fn add_bypass(&self, type_name: &str) -> Result<bool, PolicyError> {
        let entry = OperationType::parse(type_name)?;
        debug!(operation_type = %entry, "Adding operation type to role-check bypass allowlist");
        Ok(self.bypass_allowlist.insert(entry))
    }

    pub fn remove_bypass(&self, type_name: &str) -> bool {
        debug!(
            operation_type = type_name.trim(),
            "Removing operation type from role-check bypass allowlist"
        );
        self.bypass_allowlist.remove(type_name.trim()).is_some()
    }

    pub fn is_protocol_exempt(&self, type_name: &str) -> bool {
        self.protocol_exemptions.contains(type_name)
    }

    pub fn global_bypass(&self) -> bool {
        self.global_bypass.load(Ordering::Acquire)
    }

    pub fn set_global_bypass(&self, enabled: bool) {
        info!(enabled, "Changing global role-check bypass");
        self.global_bypass.store(enabled, Ordering::Release);
    }

    pub fn remediation(&self) -> &str {
        &self.remediation
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        let mut denylist: Vec<_> = self.denylist.iter().map(|e| e.key().clone()).collect();
        let mut bypass_allowlist: Vec<_> =
            self.bypass_allowlist.iter().map(|e| e.key().clone()).collect();
        let mut protocol_exemptions: Vec<_> = self.protocol_exemptions.iter().cloned().collect();
        denylist.sort();
        bypass_allowlist.sort();
        protocol_exemptions.sort();

        PolicySnapshot {
            denylist,
            bypass_allowlist,
            protocol_exemptions,
            global_bypass: self.global_bypass(),
            remediation: self.remediation.clone(),
        }
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for PolicyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyStore")
            .field("denylist", &self.denylist.len())
            .field("bypass_allowlist", &self.bypass_allowlist.len())
            .field("global_bypass", &self.global_bypass())
            .finish()
    }
}

fn parse_static(entries: &'static [&'static str]) -> impl Iterator<Item = OperationType> {
    entries.iter().filter_map(|e| OperationType::parse(e).ok())
}

fn join(entries: &[OperationType]) -> String {
    entries
        .iter()
        .map(OperationType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
