// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Stage Decisions
//!
//! Every interceptor stage produces one of three outcomes for an operation:
//!
//! | Outcome | Representation |
//! |---------|----------------|
//! | allowed | `Ok(Decision::Allow)` |
//! | not applicable | `Ok(Decision::Abstain)` |
//! | denied | `Err(PolicyRejection)` |
//!
//! `Abstain` is never a pass: the pipeline host resolves it with its own
//! legacy fallback, which rejects by default.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Non-rejecting outcome of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The stage has no objection; continue to the next stage or dispatch.
    Allow,
    /// The stage cannot judge this operation (legacy type without the
    /// scope-declaration contract) and defers to the host default.
    Abstain,
}

/// Which part of the pipeline produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Denylist,
    RoleCheck,
    /// The pipeline host's own fallback for abstained operations.
    Host,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Denylist => "denylist",
            Self::RoleCheck => "role_check",
            Self::Host => "host",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deliberate, fail-closed security denial of an inbound operation.
///
/// Always names the offending type identifier and a remediation reference an
/// operator can follow. Never retried: the same operation under the same policy
/// is rejected again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyRejection {
    #[error(
        "Custom security configuration prohibits execution of operation type {type_name}: \
         it is on the denylist and is rejected regardless of its scope declaration, \
         see {remediation}"
    )]
    Denylisted {
        type_name: String,
        remediation: String,
    },

    #[error(
        "Security hardening prohibits the operation type {type_name} from skipping its \
         scope declaration, see {remediation}"
    )]
    ScopeNotDeclared {
        type_name: String,
        remediation: String,
    },

    #[error(
        "Operation type {type_name} does not implement scope declaration and this host \
         rejects legacy operations, see {remediation}"
    )]
    LegacyOperation {
        type_name: String,
        remediation: String,
    },
}

impl PolicyRejection {
    pub fn type_name(&self) -> &str {
        match self {
            Self::Denylisted { type_name, .. }
            | Self::ScopeNotDeclared { type_name, .. }
            | Self::LegacyOperation { type_name, .. } => type_name,
        }
    }

    pub fn remediation(&self) -> &str {
        match self {
            Self::Denylisted { remediation, .. }
            | Self::ScopeNotDeclared { remediation, .. }
            | Self::LegacyOperation { remediation, .. } => remediation,
        }
    }

    /// Stage that raised this rejection.
    pub fn stage(&self) -> StageKind {
        match self {
            Self::Denylisted { .. } => StageKind::Denylist,
            Self::ScopeNotDeclared { .. } => StageKind::RoleCheck,
            Self::LegacyOperation { .. } => StageKind::Host,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_names_type_and_remediation() {
        let rejection = PolicyRejection::Denylisted {
            type_name: "Foo".to_string(),
            remediation: "https://example.invalid/fix".to_string(),
        };
        let msg = rejection.to_string();
        assert!(msg.contains("Foo"));
        assert!(msg.contains("denylist"));
        assert!(msg.contains("https://example.invalid/fix"));
        assert_eq!(rejection.stage(), StageKind::Denylist);
    }

    #[test]
    fn test_role_check_message_does_not_mention_denylist() {
        let rejection = PolicyRejection::ScopeNotDeclared {
            type_name: "Foo".to_string(),
            remediation: "ref".to_string(),
        };
        let msg = rejection.to_string();
        assert!(msg.contains("Foo"));
        assert!(!msg.contains("denylist"));
        assert_eq!(rejection.type_name(), "Foo");
        assert_eq!(rejection.stage(), StageKind::RoleCheck);
    }
}
