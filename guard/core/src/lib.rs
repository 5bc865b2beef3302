// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Remoting guard core
//!
//! Interception pipeline that vets every operation an untrusted peer asks a
//! trusted peer to execute, rejecting denylisted types and operations that skip
//! their scope declaration.
//!
//! # Architecture
//!
//! - **domain:** operation contract, scopes, policy store, decisions, configuration
//! - **application:** pipeline host, loopback channel, self-test harness
//! - **infrastructure:** interceptor stages, audit logging, event bus

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{InterceptionPipeline, LegacyFallback, LoopbackChannel};
pub use domain::decision::{Decision, PolicyRejection, StageKind};
pub use domain::operation::{DeclaresScope, Operation, RemoteCallable};
pub use domain::policy::PolicyStore;
pub use domain::scope::{Scope, ScopeRecorder};
