// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! In-process channel that dispatches operations through an
//! [`InterceptionPipeline`], the way a transport would on the receiving peer.
//!
//! A rejection reaches the caller the way it would over a real transport: as an
//! I/O failure (`PermissionDenied`) whose inner error is the [`PolicyRejection`].

use serde_json::Value;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::application::pipeline::InterceptionPipeline;
use crate::domain::decision::PolicyRejection;
use crate::domain::operation::{Operation, RemoteCallable};

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Remote call failed: {0}")]
    Io(#[from] io::Error),

    /// The operation was dispatched and its own body failed.
    #[error("Remote operation failed: {0:#}")]
    Execution(anyhow::Error),
}

impl ChannelError {
    /// The security rejection that caused this failure, if any.
    pub fn rejection(&self) -> Option<&PolicyRejection> {
        match self {
            Self::Io(e) => e
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<PolicyRejection>()),
            Self::Execution(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct LoopbackChannel {
    pipeline: Arc<InterceptionPipeline>,
}

impl LoopbackChannel {
    pub fn new(pipeline: Arc<InterceptionPipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &InterceptionPipeline {
        &self.pipeline
    }

    /// Vet `operation` and, if allowed, execute it.
    pub fn call(&self, operation: &dyn RemoteCallable) -> Result<Value, ChannelError> {
        let as_operation: &dyn Operation = operation;
        let dispatch = self
            .pipeline
            .evaluate(as_operation, || operation.call())
            .map_err(|rejection| io::Error::new(io::ErrorKind::PermissionDenied, rejection))?;

        debug!(operation_type = operation.type_name(), "Dispatching operation");
        dispatch().map_err(ChannelError::Execution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::operation::DeclaresScope;
    use crate::domain::policy::PolicyStore;
    use crate::domain::scope::{Scope, ScopeRecorder};
    use crate::infrastructure::audit::DecisionAuditLogger;

    struct Echo {
        type_name: &'static str,
        declares: bool,
    }

    impl Operation for Echo {
        fn type_name(&self) -> &str {
            self.type_name
        }

        fn scope_declaration(&self) -> Option<&dyn DeclaresScope> {
            Some(self)
        }
    }

    impl DeclaresScope for Echo {
        fn declare_scope(&self, recorder: &mut ScopeRecorder) {
            if self.declares {
                recorder.require(Scope::TRUSTED_PEER);
            }
        }
    }

    impl RemoteCallable for Echo {
        fn call(&self) -> anyhow::Result<Value> {
            Ok(Value::String(self.type_name.to_string()))
        }
    }

    fn channel() -> LoopbackChannel {
        let pipeline = InterceptionPipeline::standard(
            Arc::new(PolicyStore::with_defaults()),
            DecisionAuditLogger::new(),
        );
        LoopbackChannel::new(Arc::new(pipeline))
    }

    #[test]
    fn test_allowed_operation_executes() {
        let result = channel()
            .call(&Echo {
                type_name: "com.example.Echo",
                declares: true,
            })
            .unwrap();
        assert_eq!(result, Value::String("com.example.Echo".to_string()));
    }

    #[test]
    fn test_rejection_surfaces_as_io_error_caused_by_rejection() {
        let err = channel()
            .call(&Echo {
                type_name: "com.example.Echo",
                declares: false,
            })
            .unwrap_err();

        match &err {
            ChannelError::Io(io_err) => assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("expected io error, got {:?}", other),
        }
        let rejection = err.rejection().expect("rejection cause");
        assert_eq!(rejection.type_name(), "com.example.Echo");
    }
}
