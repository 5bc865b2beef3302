// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Interceptor Stages
//!
//! Decorator stages the pipeline host runs for every inbound operation before
//! dispatch.
//!
//! ```text
//! inbound operation
//!   └─ DenylistStage::decide   ← type identifier on the denylist? reject
//!   └─ RoleCheckStage::decide  ← scope declared, exempt, or bypassed? else reject
//!         └─ dispatch (continuation)
//! ```
//!
//! Stages are stateless per call: the only shared state is the
//! [`crate::domain::policy::PolicyStore`] they hold. Both stages are
//! commutative with respect to the final outcome.

pub mod denylist;
pub mod role_check;

pub use denylist::DenylistStage;
pub use role_check::RoleCheckStage;

use crate::domain::decision::{Decision, PolicyRejection, StageKind};
use crate::domain::operation::Operation;

/// One decision step of the interception pipeline.
pub trait InterceptorStage: Send + Sync {
    fn kind(&self) -> StageKind;

    /// Judge `operation`. A rejection is already logged when returned.
    fn decide(&self, operation: &dyn Operation) -> Result<Decision, PolicyRejection>;

    /// Hand `continuation` back unchanged unless the stage rejects.
    ///
    /// An abstention also returns the continuation; resolving it is the host's job.
    fn evaluate<C>(&self, operation: &dyn Operation, continuation: C) -> Result<C, PolicyRejection>
    where
        Self: Sized,
    {
        self.decide(operation)?;
        Ok(continuation)
    }
}
