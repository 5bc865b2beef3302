// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod audit;
pub mod event_bus;
pub mod interceptor;

pub use audit::DecisionAuditLogger;
pub use event_bus::EventBus;
pub use interceptor::{DenylistStage, InterceptorStage, RoleCheckStage};
