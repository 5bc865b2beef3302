// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Decision Audit Logger
//!
//! Records every interception decision so incident review can reconstruct why an
//! operation ran or did not run.
//!
//! Each decision produces:
//! - a structured `tracing` event (`warn` for rejections, `info` for denylist
//!   allows, `debug` otherwise),
//! - an increment of `remoting_guard_decisions_total{stage, outcome}`,
//! - a [`PolicyEvent`] on the optional [`EventBus`].
//!
//! None of these can block or fail the decision path.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::decision::{PolicyRejection, StageKind};
use crate::domain::events::{AllowReason, PolicyEvent};
use crate::infrastructure::event_bus::EventBus;

pub const DECISIONS_METRIC: &str = "remoting_guard_decisions_total";

#[derive(Clone, Default)]
pub struct DecisionAuditLogger {
    event_bus: Option<EventBus>,
}

impl DecisionAuditLogger {
    /// Logger that only writes to tracing and metrics.
    pub fn new() -> Self {
        Self { event_bus: None }
    }

    /// Logger that also publishes every decision on `event_bus`.
    pub fn with_event_bus(event_bus: EventBus) -> Self {
        Self {
            event_bus: Some(event_bus),
        }
    }

    pub fn allowed(&self, stage: StageKind, operation_type: &str, reason: AllowReason) {
        match stage {
            StageKind::Denylist => info!(
                stage = %stage,
                operation_type,
                ?reason,
                "Not rejecting execution of operation"
            ),
            _ => debug!(
                stage = %stage,
                operation_type,
                ?reason,
                "Allowing execution of operation"
            ),
        }
        metrics::counter!(DECISIONS_METRIC, "stage" => stage.as_str(), "outcome" => "allow")
            .increment(1);
        self.publish(PolicyEvent::OperationAllowed {
            stage,
            operation_type: operation_type.to_string(),
            reason,
            decided_at: Utc::now(),
        });
    }

    pub fn abstained(&self, stage: StageKind, operation_type: &str) {
        debug!(
            stage = %stage,
            operation_type,
            "Operation does not implement scope declaration; deferring to host default"
        );
        metrics::counter!(DECISIONS_METRIC, "stage" => stage.as_str(), "outcome" => "abstain")
            .increment(1);
        self.publish(PolicyEvent::OperationAbstained {
            stage,
            operation_type: operation_type.to_string(),
            decided_at: Utc::now(),
        });
    }

    /// Log a rejection. Call before returning the rejection to the host.
    pub fn rejected(&self, rejection: &PolicyRejection) {
        let stage = rejection.stage();
        warn!(
            stage = %stage,
            operation_type = rejection.type_name(),
            remediation = rejection.remediation(),
            "Rejecting operation: {}",
            rejection
        );
        metrics::counter!(DECISIONS_METRIC, "stage" => stage.as_str(), "outcome" => "reject")
            .increment(1);
        self.publish(PolicyEvent::OperationRejected {
            stage,
            operation_type: rejection.type_name().to_string(),
            details: rejection.to_string(),
            rejected_at: Utc::now(),
        });
    }

    fn publish(&self, event: PolicyEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}
