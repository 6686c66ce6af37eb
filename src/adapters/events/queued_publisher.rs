//! Bounded, non-blocking event publication.
//!
//! `QueuedEventPublisher::publish` never waits: it `try_send`s onto a bounded
//! channel and returns. An `EventQueueWorker` drains the channel into the
//! downstream publisher on a background task. When the queue is full or the
//! worker is gone the event is dropped with a warning; the state change that
//! produced it is already durable.
//!
//! ## Shutdown
//!
//! The worker stops when the `watch` channel flips to `true`, after
//! delivering whatever is already queued.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::EventPublisher;

pub struct QueuedEventPublisher {
    sender: mpsc::Sender<EventEnvelope>,
    dropped: AtomicU64,
}

pub struct EventQueueWorker {
    receiver: mpsc::Receiver<EventEnvelope>,
    downstream: Arc<dyn EventPublisher>,
}

impl QueuedEventPublisher {
    /// Creates the publisher and the worker that must be spawned to drain it.
    pub fn new(capacity: usize, downstream: Arc<dyn EventPublisher>) -> (Self, EventQueueWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                dropped: AtomicU64::new(0),
            },
            EventQueueWorker { receiver, downstream },
        )
    }

    /// Events dropped because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EventPublisher for QueuedEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if let Err(err) = self.sender.try_send(event) {
            let (reason, event) = match err {
                mpsc::error::TrySendError::Full(event) => ("queue full", event),
                mpsc::error::TrySendError::Closed(event) => ("queue closed", event),
            };
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                event_type = %event.event_type,
                aggregate_id = %event.aggregate_id,
                reason,
                "dropping domain event"
            );
        }
        Ok(())
    }
}

impl EventQueueWorker {
    /// Delivers queued events until shutdown or until every sender is gone.
    /// Returns the number delivered successfully.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut delivered = 0;
        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        delivered += self.drain().await;
                        tracing::debug!(delivered, "event queue worker stopped");
                        return delivered;
                    }
                }

                next = self.receiver.recv() => match next {
                    Some(event) => {
                        if self.deliver(event).await {
                            delivered += 1;
                        }
                    }
                    None => return delivered,
                },
            }
        }
    }

    async fn drain(&mut self) -> u64 {
        let mut delivered = 0;
        while let Ok(event) = self.receiver.try_recv() {
            if self.deliver(event).await {
                delivered += 1;
            }
        }
        delivered
    }

    async fn deliver(&self, event: EventEnvelope) -> bool {
        let event_type = event.event_type.clone();
        match self.downstream.publish(event).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(event_type = %event_type, error = %e, "downstream publish failed");
                false
            }
        }
    }
}
