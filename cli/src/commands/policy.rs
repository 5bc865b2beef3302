// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Policy inspection commands
//!
//! Commands: show, check

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use remoting_guard_core::application::pipeline::{InterceptionPipeline, LegacyFallback};
use remoting_guard_core::domain::decision::PolicyRejection;
use remoting_guard_core::domain::operation::{DeclaresScope, Operation};
use remoting_guard_core::domain::policy::{OperationType, PolicySnapshot, PolicyStore};
use remoting_guard_core::domain::scope::{Scope, ScopeRecorder};
use remoting_guard_core::infrastructure::audit::DecisionAuditLogger;

#[derive(Subcommand)]
pub enum PolicyCommand {
    /// Show the effective denylist, bypass allowlist and exemptions
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dry-run an operation type through the interception pipeline
    Check {
        /// Operation type identifier
        #[arg(value_name = "TYPE")]
        type_name: String,

        /// The operation declares its required scope
        #[arg(long, conflicts_with = "legacy")]
        declares_scope: bool,

        /// The operation predates scope declaration entirely
        #[arg(long)]
        legacy: bool,

        /// Let legacy operations through instead of rejecting them
        #[arg(long)]
        allow_legacy: bool,
    },
}

pub fn handle_command(
    command: PolicyCommand,
    config_override: Option<PathBuf>,
) -> Result<ExitCode> {
    let policy = super::load_policy(config_override)?;
    match command {
        PolicyCommand::Show { json } => {
            show(&policy.snapshot(), json)?;
            Ok(ExitCode::SUCCESS)
        }
        PolicyCommand::Check {
            type_name,
            declares_scope,
            legacy,
            allow_legacy,
        } => {
            let operation = DryRunOperation::new(&type_name, declares_scope, legacy)?;
            let fallback = if allow_legacy {
                LegacyFallback::Allow
            } else {
                LegacyFallback::Reject
            };
            match check(policy, fallback, &operation) {
                Ok(()) => {
                    println!(
                        "{}",
                        format!("✓ {} would be allowed", operation.type_name()).green()
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(rejection) => {
                    println!(
                        "{}",
                        format!("✗ Rejected by {} stage", rejection.stage()).red().bold()
                    );
                    println!("  {}", rejection);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn show(snapshot: &PolicySnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    println!("{}", "Effective policy:".bold());
    println!();
    print_list("Denylist", &snapshot.denylist);
    print_list("Role-check bypass allowlist", &snapshot.bypass_allowlist);
    print_list("Protocol exemptions", &snapshot.protocol_exemptions);

    println!("{}", "Role check:".bold());
    if snapshot.global_bypass {
        println!("  {}", "disabled for all operation types".yellow());
    } else {
        println!("  {}", "enforced".green());
    }
    println!();
    println!("Remediation: {}", snapshot.remediation);

    Ok(())
}

fn print_list(title: &str, entries: &[OperationType]) {
    println!("{}", format!("{title}:").bold());
    if entries.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for entry in entries {
        println!("  - {}", entry);
    }
    println!();
}

/// Run `operation` through the standard stages with the given host default.
pub fn check(
    policy: Arc<PolicyStore>,
    fallback: LegacyFallback,
    operation: &dyn Operation,
) -> Result<(), PolicyRejection> {
    InterceptionPipeline::standard_with(policy, DecisionAuditLogger::new(), fallback)
        .evaluate(operation, ())
}

/// Synthetic operation standing in for a type the operator names.
pub struct DryRunOperation {
    type_name: OperationType,
    declares_scope: bool,
    legacy: bool,
}

impl DryRunOperation {
    pub fn new(type_name: &str, declares_scope: bool, legacy: bool) -> Result<Self> {
        Ok(Self {
            type_name: OperationType::parse(type_name)?,
            declares_scope,
            legacy,
        })
    }
}

impl Operation for DryRunOperation {
    fn type_name(&self) -> &str {
        self.type_name.as_str()
    }

    fn scope_declaration(&self) -> Option<&dyn DeclaresScope> {
        if self.legacy {
            None
        } else {
            Some(self)
        }
    }
}

impl DeclaresScope for DryRunOperation {
    fn declare_scope(&self, recorder: &mut ScopeRecorder) {
        if self.declares_scope {
            recorder.require(Scope::TRUSTED_PEER);
        }
    }
}
