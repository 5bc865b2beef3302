// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use remoting_guard_core::application::channel::LoopbackChannel;
use remoting_guard_core::application::pipeline::InterceptionPipeline;
use remoting_guard_core::application::self_test::{
    Expectation, SelfTest, SelfTestError, ALLOWED_BY_DEFAULT_PROBE, NON_SCOPE_DECLARING_PROBE,
};
use remoting_guard_core::domain::decision::{PolicyRejection, StageKind};
use remoting_guard_core::domain::events::PolicyEvent;
use remoting_guard_core::domain::policy::{PolicyStore, SELF_TEST_BLOCKED_PROBE};
use remoting_guard_core::infrastructure::audit::DecisionAuditLogger;
use remoting_guard_core::infrastructure::event_bus::EventBus;

fn channel_with(policy: Arc<PolicyStore>, audit: DecisionAuditLogger) -> LoopbackChannel {
    LoopbackChannel::new(Arc::new(InterceptionPipeline::standard(policy, audit)))
}

#[test]
fn test_default_policy_passes() {
    let channel = channel_with(Arc::new(PolicyStore::with_defaults()), DecisionAuditLogger::new());
    let report = SelfTest::run(&channel).unwrap();

    let expectations: Vec<_> = report.probes.iter().map(|p| p.expectation).collect();
    assert_eq!(
        expectations,
        vec![Expectation::Rejected, Expectation::Rejected, Expectation::Executed]
    );
    assert!(report.probes[0].detail.contains(NON_SCOPE_DECLARING_PROBE));
    assert!(report.probes[1].detail.contains(SELF_TEST_BLOCKED_PROBE));
}

#[test]
fn test_bypassed_non_declaring_probe_is_reported() {
    let policy = Arc::new(PolicyStore::with_defaults());
    policy.add_bypass(NON_SCOPE_DECLARING_PROBE).unwrap();
    let channel = channel_with(policy, DecisionAuditLogger::new());

    match SelfTest::run(&channel) {
        Err(SelfTestError::NotRejected { probe, message }) => {
            assert_eq!(probe, "NonScopeDeclaringProbe");
            assert!(message.contains("An operation not declaring its scope successfully executed"));
        }
        other => panic!("expected NotRejected, got {:?}", other),
    }
}

#[test]
fn test_global_bypass_is_reported() {
    let policy = Arc::new(PolicyStore::with_defaults());
    policy.set_global_bypass(true);
    let channel = channel_with(policy, DecisionAuditLogger::new());

    assert!(matches!(
        SelfTest::run(&channel),
        Err(SelfTestError::NotRejected {
            probe: "NonScopeDeclaringProbe",
            ..
        })
    ));
}

#[test]
fn test_customized_denylist_is_reported() {
    let policy = Arc::new(PolicyStore::with_defaults());
    assert!(policy.remove_denied(SELF_TEST_BLOCKED_PROBE));
    let channel = channel_with(policy, DecisionAuditLogger::new());

    match SelfTest::run(&channel) {
        Err(SelfTestError::NotRejected { probe, message }) => {
            assert_eq!(probe, "BlockedByDefaultProbe");
            assert!(message.contains("denylist is ineffective or customized"));
        }
        other => panic!("expected NotRejected, got {:?}", other),
    }
}

#[test]
fn test_denylisted_allowed_probe_is_reported() {
    let policy = Arc::new(PolicyStore::with_defaults());
    policy.deny(ALLOWED_BY_DEFAULT_PROBE).unwrap();
    let channel = channel_with(policy, DecisionAuditLogger::new());

    match SelfTest::run(&channel) {
        Err(SelfTestError::Rejected { probe, rejection }) => {
            assert_eq!(probe, "AllowedByDefaultProbe");
            assert!(matches!(rejection, PolicyRejection::Denylisted { .. }));
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[test]
fn test_self_test_publishes_rejections() {
    let bus = EventBus::new(32);
    let mut rejections = bus.subscribe_rejections();
    let channel = channel_with(
        Arc::new(PolicyStore::with_defaults()),
        DecisionAuditLogger::with_event_bus(bus),
    );

    SelfTest::run(&channel).unwrap();

    let first = rejections.try_recv().unwrap();
    assert_eq!(first.stage(), StageKind::RoleCheck);
    assert_eq!(first.operation_type(), NON_SCOPE_DECLARING_PROBE);

    let second = rejections.try_recv().unwrap();
    assert_eq!(second.stage(), StageKind::Denylist);
    assert_eq!(second.operation_type(), SELF_TEST_BLOCKED_PROBE);
    assert!(matches!(second, PolicyEvent::OperationRejected { .. }));

    assert!(rejections.try_recv().is_err());
}
