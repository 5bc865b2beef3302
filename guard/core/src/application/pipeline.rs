// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Interception Pipeline
//!
//! Chains [`InterceptorStage`]s and runs them, in installation order, for every
//! inbound operation before it is dispatched.
//!
//! ## Processing
//!
//! ```text
//! InterceptionPipeline::evaluate(op, continuation)
//!   └─ stage 1 .. n: decide(op)
//!         ├─ Err(rejection) → abort, later stages never run
//!         ├─ Abstain        → remembered
//!         └─ Allow          → next stage
//!   └─ any abstention → LegacyFallback (Reject by default)
//!   └─ Ok(continuation)
//! ```

use std::sync::Arc;
use tracing::debug_span;

use crate::domain::decision::{Decision, PolicyRejection, StageKind};
use crate::domain::events::AllowReason;
use crate::domain::operation::Operation;
use crate::domain::policy::{PolicyStore, DEFAULT_REMEDIATION_URL};
use crate::infrastructure::audit::DecisionAuditLogger;
use crate::infrastructure::interceptor::{DenylistStage, InterceptorStage, RoleCheckStage};

/// What the host does with an operation some stage abstained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegacyFallback {
    /// Fail closed: legacy operations never execute.
    #[default]
    Reject,
    /// Let legacy operations through once every stage has had its say.
    Allow,
}

pub struct InterceptionPipeline {
    stages: Vec<Arc<dyn InterceptorStage>>,
    legacy_fallback: LegacyFallback,
    audit: DecisionAuditLogger,
    remediation: String,
}

impl InterceptionPipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Denylist then role-check, both backed by `policy`. Legacy operations are
    /// rejected.
    pub fn standard(policy: Arc<PolicyStore>, audit: DecisionAuditLogger) -> Self {
        Self::standard_with(policy, audit, LegacyFallback::default())
    }

    /// [`InterceptionPipeline::standard`] with an explicit host default for
    /// legacy operations.
    pub fn standard_with(
        policy: Arc<PolicyStore>,
        audit: DecisionAuditLogger,
        legacy_fallback: LegacyFallback,
    ) -> Self {
        PipelineBuilder::new()
            .remediation(policy.remediation())
            .audit(audit.clone())
            .legacy_fallback(legacy_fallback)
            .with(DenylistStage::new(policy.clone(), audit.clone()))
            .with(RoleCheckStage::new(policy, audit))
            .build()
    }

    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|stage| stage.kind()).collect()
    }

    pub fn legacy_fallback(&self) -> LegacyFallback {
        self.legacy_fallback
    }

    /// Run every stage against `operation`. Returns `continuation` only if no
    /// stage rejected and any abstention was resolved in favour of execution.
    pub fn evaluate<C>(
        &self,
        operation: &dyn Operation,
        continuation: C,
    ) -> Result<C, PolicyRejection> {
        let type_name = operation.type_name();
        let _span = debug_span!("intercept", operation_type = type_name).entered();

        let mut abstained = false;
        for stage in &self.stages {
            if stage.decide(operation)? == Decision::Abstain {
                abstained = true;
            }
        }

        if abstained {
            match self.legacy_fallback {
                LegacyFallback::Reject => {
                    let rejection = PolicyRejection::LegacyOperation {
                        type_name: type_name.to_string(),
                        remediation: self.remediation.clone(),
                    };
                    self.audit.rejected(&rejection);
                    return Err(rejection);
                }
                LegacyFallback::Allow => {
                    self.audit
                        .allowed(StageKind::Host, type_name, AllowReason::LegacyFallback);
                }
            }
        }

        Ok(continuation)
    }
}

/// Assembles a pipeline; stages run in the order they are added.
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn InterceptorStage>>,
    legacy_fallback: LegacyFallback,
    audit: DecisionAuditLogger,
    remediation: String,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            legacy_fallback: LegacyFallback::default(),
            audit: DecisionAuditLogger::new(),
            remediation: DEFAULT_REMEDIATION_URL.to_string(),
        }
    }

    pub fn with(mut self, stage: impl InterceptorStage + 'static) -> Self {
        tracing::debug!(
            stage = %stage.kind(),
            position = self.stages.len(),
            "Registering interceptor stage"
        );
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn with_shared(mut self, stage: Arc<dyn InterceptorStage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn legacy_fallback(mut self, fallback: LegacyFallback) -> Self {
        self.legacy_fallback = fallback;
        self
    }

    pub fn audit(mut self, audit: DecisionAuditLogger) -> Self {
        self.audit = audit;
        self
    }

    pub fn remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = remediation.into();
        self
    }

    pub fn build(self) -> InterceptionPipeline {
        InterceptionPipeline {
            stages: self.stages,
            legacy_fallback: self.legacy_fallback,
            audit: self.audit,
            remediation: self.remediation,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Plain(&'static str);

    impl Operation for Plain {
        fn type_name(&self) -> &str {
            self.0
        }
    }

    struct CountingStage {
        kind: StageKind,
        outcome: Result<Decision, ()>,
        calls: Arc<AtomicUsize>,
    }

    impl InterceptorStage for CountingStage {
        fn kind(&self) -> StageKind {
            self.kind
        }

        fn decide(&self, operation: &dyn Operation) -> Result<Decision, PolicyRejection> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.map_err(|_| PolicyRejection::Denylisted {
                type_name: operation.type_name().to_string(),
                remediation: "ref".to_string(),
            })
        }
    }

    fn counting(outcome: Result<Decision, ()>) -> (CountingStage, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let stage = CountingStage {
            kind: StageKind::Denylist,
            outcome,
            calls: calls.clone(),
        };
        (stage, calls)
    }

    #[test]
    fn test_rejection_stops_later_stages() {
        let (first, first_calls) = counting(Err(()));
        let (second, second_calls) = counting(Ok(Decision::Allow));
        let pipeline = PipelineBuilder::new().with(first).with(second).build();

        assert!(pipeline.evaluate(&Plain("com.example.Op"), ()).is_err());
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rejection_after_abstention_wins() {
        let (first, _) = counting(Ok(Decision::Abstain));
        let (second, _) = counting(Err(()));
        let pipeline = PipelineBuilder::new()
            .legacy_fallback(LegacyFallback::Allow)
            .with(first)
            .with(second)
            .build();

        assert!(matches!(
            pipeline.evaluate(&Plain("com.example.Op"), ()),
            Err(PolicyRejection::Denylisted { .. })
        ));
    }

    #[test]
    fn test_abstention_rejected_by_default() {
        let (stage, _) = counting(Ok(Decision::Abstain));
        let pipeline = PipelineBuilder::new()
            .remediation("https://ops.example")
            .with(stage)
            .build();

        match pipeline.evaluate(&Plain("com.example.Legacy"), ()) {
            Err(PolicyRejection::LegacyOperation { type_name, remediation }) => {
                assert_eq!(type_name, "com.example.Legacy");
                assert_eq!(remediation, "https://ops.example");
            }
            other => panic!("expected legacy rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_abstention_allowed_when_configured() {
        let (stage, _) = counting(Ok(Decision::Abstain));
        let pipeline = PipelineBuilder::new()
            .legacy_fallback(LegacyFallback::Allow)
            .with(stage)
            .build();

        assert_eq!(pipeline.evaluate(&Plain("com.example.Legacy"), 7), Ok(7));
    }

    #[test]
    fn test_standard_pipeline_order() {
        let pipeline = InterceptionPipeline::standard(
            Arc::new(PolicyStore::with_defaults()),
            DecisionAuditLogger::new(),
        );
        assert_eq!(
            pipeline.stage_kinds(),
            vec![StageKind::Denylist, StageKind::RoleCheck]
        );
        assert_eq!(pipeline.legacy_fallback(), LegacyFallback::Reject);
    }

    #[test]
    fn test_standard_with_fallback_keeps_stage_order() {
        let policy = Arc::new(PolicyStore::with_defaults());
        let pipeline = InterceptionPipeline::standard_with(
            policy,
            DecisionAuditLogger::new(),
            LegacyFallback::Allow,
        );
        assert_eq!(
            pipeline.stage_kinds(),
            vec![StageKind::Denylist, StageKind::RoleCheck]
        );
        assert_eq!(pipeline.legacy_fallback(), LegacyFallback::Allow);

        // Legacy types pass, denylisted ones still do not.
        assert!(pipeline.evaluate(&Plain("com.example.Legacy"), ()).is_ok());
        assert!(matches!(
            pipeline.evaluate(&Plain("hudson.FilePath$FileCallableWrapper"), ()),
            Err(PolicyRejection::Denylisted { .. })
        ));
    }

    #[test]
    fn test_shared_stage_across_pipelines() {
        let (stage, calls) = counting(Ok(Decision::Allow));
        let shared: Arc<dyn InterceptorStage> = Arc::new(stage);
        let first = PipelineBuilder::new().with_shared(shared.clone()).build();
        let second = PipelineBuilder::new().with_shared(shared).build();

        assert!(first.evaluate(&Plain("com.example.Op"), ()).is_ok());
        assert!(second.evaluate(&Plain("com.example.Op"), ()).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_pipeline_allows() {
        let pipeline = InterceptionPipeline::builder().build();
        assert_eq!(pipeline.evaluate(&Plain("anything"), "go"), Ok("go"));
    }
}
