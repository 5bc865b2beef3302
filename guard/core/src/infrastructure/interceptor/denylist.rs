// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Rejects operations whose concrete type is on the denylist, whatever their own
//! scope declaration says. This overrides declarations that are buggy, absent, or
//! maliciously self-satisfied.

use std::sync::Arc;

use super::InterceptorStage;
use crate::domain::decision::{Decision, PolicyRejection, StageKind};
use crate::domain::events::AllowReason;
use crate::domain::operation::Operation;
use crate::domain::policy::PolicyStore;
use crate::infrastructure::audit::DecisionAuditLogger;

pub struct DenylistStage {
    policy: Arc<PolicyStore>,
    audit: DecisionAuditLogger,
}

impl DenylistStage {
    pub fn new(policy: Arc<PolicyStore>, audit: DecisionAuditLogger) -> Self {
        Self { policy, audit }
    }
}

impl InterceptorStage for DenylistStage {
    fn kind(&self) -> StageKind {
        StageKind::Denylist
    }

    fn decide(&self, operation: &dyn Operation) -> Result<Decision, PolicyRejection> {
        let type_name = operation.type_name();

        if self.policy.is_denied(type_name) {
            let rejection = PolicyRejection::Denylisted {
                type_name: type_name.to_string(),
                remediation: self.policy.remediation().to_string(),
            };
            self.audit.rejected(&rejection);
            return Err(rejection);
        }

        self.audit
            .allowed(StageKind::Denylist, type_name, AllowReason::NotDenylisted);
        Ok(Decision::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::operation::DeclaresScope;
    use crate::domain::scope::{Scope, ScopeRecorder};

    struct Declaring(&'static str);

    impl Operation for Declaring {
        fn type_name(&self) -> &str {
            self.0
        }

        fn scope_declaration(&self) -> Option<&dyn DeclaresScope> {
            Some(self)
        }
    }

    impl DeclaresScope for Declaring {
        fn declare_scope(&self, recorder: &mut ScopeRecorder) {
            recorder.require(Scope::TRUSTED_PEER);
        }
    }

    fn stage(policy: &Arc<PolicyStore>) -> DenylistStage {
        DenylistStage::new(policy.clone(), DecisionAuditLogger::new())
    }

    #[test]
    fn test_denylisted_type_rejected_despite_scope_declaration() {
        let policy = Arc::new(PolicyStore::empty());
        policy.deny("com.example.Evil").unwrap();

        let result = stage(&policy).evaluate(&Declaring("com.example.Evil"), "continuation");
        match result {
            Err(PolicyRejection::Denylisted { type_name, remediation }) => {
                assert_eq!(type_name, "com.example.Evil");
                assert_eq!(remediation, policy.remediation());
            }
            other => panic!("expected denylist rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_other_types_return_continuation_unchanged() {
        let policy = Arc::new(PolicyStore::with_defaults());
        let result = stage(&policy).evaluate(&Declaring("com.example.Fine"), 42u32);
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn test_removal_takes_effect_for_next_evaluation() {
        let policy = Arc::new(PolicyStore::with_defaults());
        let stage = stage(&policy);
        let op = Declaring("hudson.FilePath$FileCallableWrapper");

        assert!(stage.decide(&op).is_err());
        policy.remove_denied("hudson.FilePath$FileCallableWrapper");
        assert_eq!(stage.decide(&op), Ok(Decision::Allow));
    }
}
