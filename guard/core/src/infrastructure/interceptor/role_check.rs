// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Role-Check Enforcement Stage
//!
//! Requires every operation to self-declare the authorization scope it needs by
//! calling into a fresh [`ScopeRecorder`]. An operation that never calls in is
//! either legacy code unaware of the contract or code deliberately skipping its
//! check, and is rejected unless policy exempts it.
//!
//! ## Decision Order
//!
//! 1. `global_bypass` set: allow.
//! 2. No scope-declaration capability (legacy type): abstain.
//! 3. Recorder checked after `declare_scope`: allow.
//! 4. Type is a protocol exemption or on the bypass allowlist: allow.
//! 5. Otherwise: reject.
//!
//! The recorder only witnesses that a declaration happened. Which scopes were
//! declared, and whether the peer grants them, is not judged here.

use std::sync::Arc;

use super::InterceptorStage;
use crate::domain::decision::{Decision, PolicyRejection, StageKind};
use crate::domain::events::AllowReason;
use crate::domain::operation::Operation;
use crate::domain::policy::PolicyStore;
use crate::domain::scope::ScopeRecorder;
use crate::infrastructure::audit::DecisionAuditLogger;

pub struct RoleCheckStage {
    policy: Arc<PolicyStore>,
    audit: DecisionAuditLogger,
}

impl RoleCheckStage {
    pub fn new(policy: Arc<PolicyStore>, audit: DecisionAuditLogger) -> Self {
        Self { policy, audit }
    }

    fn exemption(&self, type_name: &str) -> Option<AllowReason> {
        if self.policy.is_protocol_exempt(type_name) {
            Some(AllowReason::ProtocolExemption)
        } else if self.policy.is_bypassed(type_name) {
            Some(AllowReason::BypassAllowlist)
        } else {
            None
        }
    }
}

impl InterceptorStage for RoleCheckStage {
    fn kind(&self) -> StageKind {
        StageKind::RoleCheck
    }

    fn decide(&self, operation: &dyn Operation) -> Result<Decision, PolicyRejection> {
        let type_name = operation.type_name();

        if self.policy.global_bypass() {
            self.audit
                .allowed(StageKind::RoleCheck, type_name, AllowReason::GlobalBypass);
            return Ok(Decision::Allow);
        }

        let Some(declaring) = operation.scope_declaration() else {
            self.audit.abstained(StageKind::RoleCheck, type_name);
            return Ok(Decision::Abstain);
        };

        let mut recorder = ScopeRecorder::new();
        declaring.declare_scope(&mut recorder);

        if recorder.is_checked() {
            tracing::trace!(
                operation_type = type_name,
                scopes = ?recorder.declared(),
                "Operation declared scopes"
            );
            self.audit
                .allowed(StageKind::RoleCheck, type_name, AllowReason::ScopeDeclared);
            return Ok(Decision::Allow);
        }

        if let Some(reason) = self.exemption(type_name) {
            self.audit.allowed(StageKind::RoleCheck, type_name, reason);
            return Ok(Decision::Allow);
        }

        let rejection = PolicyRejection::ScopeNotDeclared {
            type_name: type_name.to_string(),
            remediation: self.policy.remediation().to_string(),
        };
        self.audit.rejected(&rejection);
        Err(rejection)
    }
}
