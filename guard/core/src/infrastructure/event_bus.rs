// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Policy Events
//
// In-memory fan-out of interception decisions using tokio broadcast channels.
// Publishing never blocks and never fails: with no subscribers, or with a full
// buffer, events are dropped (slow receivers observe `Lagged`).

use crate::domain::events::PolicyEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Event bus for publishing and subscribing to policy events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<PolicyEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Publish a policy event to all subscribers
    pub fn publish(&self, event: PolicyEvent) {
        // send() only fails when nobody is listening
        if self.sender.send(event).is_err() {
            trace!("No subscribers listening to policy event");
        }
    }

    /// Subscribe to all policy events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to rejections only
    pub fn subscribe_rejections(&self) -> RejectionReceiver {
        RejectionReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiver for all policy events
pub struct EventReceiver {
    receiver: broadcast::Receiver<PolicyEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<PolicyEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<PolicyEvent, EventBusError> {
        self.receiver.try_recv().map_err(map_try_recv_error)
    }

    /// Drain every event currently buffered for this receiver
    pub fn drain(&mut self) -> Vec<PolicyEvent> {
        let mut events = Vec::new();
        loop {
            match self.try_recv() {
                Ok(event) => events.push(event),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }
}

/// Receiver that skips everything except `OperationRejected`
pub struct RejectionReceiver {
    receiver: broadcast::Receiver<PolicyEvent>,
}

impl RejectionReceiver {
    pub async fn recv(&mut self) -> Result<PolicyEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if matches!(event, PolicyEvent::OperationRejected { .. }) {
                return Ok(event);
            }
        }
    }

    pub fn try_recv(&mut self) -> Result<PolicyEvent, EventBusError> {
        loop {
            let event = self.receiver.try_recv().map_err(map_try_recv_error)?;
            if matches!(event, PolicyEvent::OperationRejected { .. }) {
                return Ok(event);
            }
        }
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Policy event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

fn map_try_recv_error(e: broadcast::error::TryRecvError) -> EventBusError {
    match e {
        broadcast::error::TryRecvError::Empty => EventBusError::Empty,
        broadcast::error::TryRecvError::Closed => EventBusError::Closed,
        broadcast::error::TryRecvError::Lagged(n) => {
            warn!("Policy event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
