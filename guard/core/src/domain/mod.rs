// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain model: operations, scopes, policy, decisions and configuration.

pub mod decision;
pub mod events;
pub mod guard_config;
pub mod operation;
pub mod policy;
pub mod scope;
