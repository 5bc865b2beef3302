// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod channel;
pub mod pipeline;

pub use channel::{ChannelError, LoopbackChannel};
pub use pipeline::{InterceptionPipeline, LegacyFallback, PipelineBuilder};
pub use self_test::{SelfTest, SelfTestError, SelfTestReport};
