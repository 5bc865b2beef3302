// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Audit events emitted for every interception decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::decision::StageKind;

/// Why a stage let an operation through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowReason {
    NotDenylisted,
    ScopeDeclared,
    GlobalBypass,
    ProtocolExemption,
    BypassAllowlist,
    /// Host fallback let a legacy operation through.
    LegacyFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyEvent {
    OperationAllowed {
        stage: StageKind,
        operation_type: String,
        reason: AllowReason,
        decided_at: DateTime<Utc>,
    },
    OperationAbstained {
        stage: StageKind,
        operation_type: String,
        decided_at: DateTime<Utc>,
    },
    OperationRejected {
        stage: StageKind,
        operation_type: String,
        details: String,
        rejected_at: DateTime<Utc>,
    },
}

impl PolicyEvent {
    pub fn operation_type(&self) -> &str {
        match self {
            Self::OperationAllowed { operation_type, .. }
            | Self::OperationAbstained { operation_type, .. }
            | Self::OperationRejected { operation_type, .. } => operation_type,
        }
    }

    pub fn stage(&self) -> StageKind {
        match self {
            Self::OperationAllowed { stage, .. }
            | Self::OperationAbstained { stage, .. }
            | Self::OperationRejected { stage, .. } => *stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_event_serialization() {
        let event = PolicyEvent::OperationRejected {
            stage: StageKind::Denylist,
            operation_type: "hudson.FilePath$FileCallableWrapper".to_string(),
            details: "denylisted".to_string(),
            rejected_at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "operation_rejected");
        assert_eq!(json["stage"], "denylist");

        let parsed: PolicyEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.operation_type(), "hudson.FilePath$FileCallableWrapper");
        assert_eq!(parsed.stage(), StageKind::Denylist);
    }
}
