// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job subscriber registry and fan-out.

use parking_lot::Mutex;
use rpk_core::{JobId, JobMessage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Identifies one subscription within the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// A live observer's end of a job's event stream.
///
/// Dropping it disconnects the observer: the next publish to the job fails
/// to reach it and removes it from the registry.
pub struct Subscription {
    pub id: SubscriberId,
    pub job_id: JobId,
    rx: mpsc::UnboundedReceiver<JobMessage>,
}

impl Subscription {
    /// Next message, or `None` once the registry dropped this subscriber.
    pub async fn recv(&mut self) -> Option<JobMessage> {
        self.rx.recv().await
    }

    /// Next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<JobMessage> {
        self.rx.try_recv().ok()
    }

    /// Stop receiving; later publishes will remove this subscriber.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

type Subscribers = Vec<(SubscriberId, mpsc::UnboundedSender<JobMessage>)>;

/// Registry of live subscribers, keyed by job.
///
/// Cheap to clone; clones share the same registry. A job's subscriber set
/// exists only while it is non-empty.
#[derive(Clone, Default)]
pub struct Broadcaster {
    subscribers: Arc<Mutex<HashMap<JobId, Subscribers>>>,
    next_id: Arc<AtomicU64>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer for `job_id`.
    pub fn subscribe(&self, job_id: &JobId) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock();
        let set = subscribers.entry(job_id.clone()).or_default();
        set.push((id, tx));
        tracing::debug!(job_id = %job_id, subscriber = id.0, count = set.len(), "subscribed");
        Subscription {
            id,
            job_id: job_id.clone(),
            rx,
        }
    }

    /// Remove an observer. Unknown ids are ignored.
    pub fn unsubscribe(&self, job_id: &JobId, id: SubscriberId) {
        let mut subscribers = self.subscribers.lock();
        let Some(set) = subscribers.get_mut(job_id) else {
            return;
        };
        let before = set.len();
        set.retain(|(sid, _)| *sid != id);
        if set.len() != before {
            tracing::debug!(job_id = %job_id, subscriber = id.0, "unsubscribed");
        }
        if set.is_empty() {
            subscribers.remove(job_id);
        }
    }

    /// Deliver `message` to every current subscriber of `job_id`.
    ///
    /// Subscribers whose channel is closed are removed; delivery to the rest
    /// continues. Returns the number of subscribers reached.
    ///
    /// Sending happens under the registry lock, so two publishes for the
    /// same job reach each subscriber in call order.
    pub fn publish(&self, job_id: &JobId, message: JobMessage) -> usize {
        let mut subscribers = self.subscribers.lock();
        let Some(set) = subscribers.get_mut(job_id) else {
            return 0;
        };

        let before = set.len();
        set.retain(|(_, tx)| tx.send(message.clone()).is_ok());
        let delivered = set.len();
        if delivered < before {
            tracing::debug!(
                job_id = %job_id,
                dropped = before - delivered,
                "removed disconnected subscribers"
            );
        }
        if set.is_empty() {
            subscribers.remove(job_id);
        }
        delivered
    }

    /// Deliver `message` to every subscriber of every job.
    pub fn broadcast_system(&self, message: JobMessage) -> usize {
        let mut subscribers = self.subscribers.lock();
        let mut delivered = 0;
        subscribers.retain(|_, set| {
            set.retain(|(_, tx)| tx.send(message.clone()).is_ok());
            delivered += set.len();
            !set.is_empty()
        });
        delivered
    }

    pub fn subscriber_count(&self, job_id: &JobId) -> usize {
        self.subscribers.lock().get(job_id).map_or(0, Vec::len)
    }

    pub fn total_subscribers(&self) -> usize {
        self.subscribers.lock().values().map(Vec::len).sum()
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
