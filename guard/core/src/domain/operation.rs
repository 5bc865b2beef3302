// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Operation Contract
//!
//! An [`Operation`] is a unit of remotely dispatched work crossing the trust
//! boundary. The interception pipeline only ever observes two things about it:
//!
//! - its **type identifier**, a stable fully-qualified name of the concrete
//!   implementation, compared by exact string equality against policy sets;
//! - its optional **scope-declaration capability** ([`DeclaresScope`]).
//!
//! Operations written before the scope-declaration contract existed simply do
//! not expose the capability; [`Operation::scope_declaration`] returns `None`
//! and the role-check stage abstains instead of guessing.

use crate::domain::scope::ScopeRecorder;

/// Unit of work evaluated by the interception pipeline before dispatch.
pub trait Operation: Send + Sync {
    /// Stable, fully-qualified identifier of the concrete implementation.
    fn type_name(&self) -> &str;

    /// Capability probe for the scope-declaration contract.
    ///
    /// Returns `None` for legacy operations that predate the contract.
    fn scope_declaration(&self) -> Option<&dyn DeclaresScope> {
        None
    }
}

/// Implemented by operations that self-declare the authorization scope they need.
pub trait DeclaresScope {
    /// Record required scopes on `recorder`. Called exactly once per evaluation.
    ///
    /// An implementation that records nothing is treated as skipping its
    /// authorization check.
    fn declare_scope(&self, recorder: &mut ScopeRecorder);
}

/// An operation that can be executed once the pipeline has allowed it.
pub trait RemoteCallable: Operation {
    fn call(&self) -> anyhow::Result<serde_json::Value>;
}
