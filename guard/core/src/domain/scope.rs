// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Scopes and the Scope-Check Recorder
//!
//! A [`Scope`] names the category of trust an operation claims to need on the
//! receiving peer. Operations declare their scopes by calling into a
//! [`ScopeRecorder`] handed to them during evaluation.
//!
//! The recorder is a witness, not a validator: any of its `require*` entry points
//! marks it as checked, whatever scopes were passed (including none). Matching
//! declared scopes against what the peer actually grants happens elsewhere.
//!
//! ## Lifecycle
//!
//! ```text
//! ScopeRecorder::new()                      ← fresh per evaluation
//!   └─ DeclaresScope::declare_scope(&mut rec) ← exactly one operation
//!   └─ rec.is_checked()                     ← read once, then dropped
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Authorization scope an operation requires on the peer that executes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope(Cow<'static, str>);

impl Scope {
    /// Executing on the trusted side of the boundary (the controller).
    pub const TRUSTED_PEER: Scope = Scope(Cow::Borrowed("trusted-peer"));

    /// Executing on the untrusted side of the boundary (an agent).
    pub const UNTRUSTED_PEER: Scope = Scope(Cow::Borrowed("untrusted-peer"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-evaluation witness that records whether an operation declared any scope.
///
/// Single-use and never shared between threads; the role-check stage creates one,
/// lends it mutably to a single operation, and reads it afterwards.
#[derive(Debug, Default)]
pub struct ScopeRecorder {
    checked: bool,
    declared: Vec<Scope>,
}

impl ScopeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a single required scope.
    pub fn require(&mut self, scope: Scope) {
        self.checked = true;
        self.declared.push(scope);
    }

    /// Declare several required scopes at once.
    pub fn require_many(&mut self, scopes: &[Scope]) {
        self.checked = true;
        self.declared.extend_from_slice(scopes);
    }

    /// Declare a collection of required scopes. An empty collection still counts
    /// as a declaration.
    pub fn require_all<I>(&mut self, scopes: I)
    where
        I: IntoIterator<Item = Scope>,
    {
        self.checked = true;
        self.declared.extend(scopes);
    }

    /// Whether any `require*` entry point was called.
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Scopes passed to the recorder, in call order. Informational only.
    pub fn declared(&self) -> &[Scope] {
        &self.declared
    }
}
