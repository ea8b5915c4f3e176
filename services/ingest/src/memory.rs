//! In-process channel with durable-subscription semantics
//!
//! Process-local stand-in for the durable channel, used by tests and
//! local runs without a broker. It honors the same delivery contract as
//! the Postgres-backed channel: monotonically increasing sequence
//! numbers, a per-subscription acknowledgment watermark that survives
//! resubscribing under the same durable name, one in-flight message at
//! a time, and redelivery of an unacknowledged message once its
//! ack-wait elapses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Notify;
use tokio::time::{sleep_until, Duration, Instant};

use crate::channel::{AckHandle, ChannelError, InboundMessage, MessageSource};

const DEFAULT_ACK_WAIT: Duration = Duration::from_secs(30);

struct StoredMessage {
    sequence: u64,
    payload: Bytes,
}

struct Subscription {
    last_acked: u64,
    /// Currently delivered message and its redelivery deadline.
    inflight: Option<(u64, Instant)>,
    notify: Arc<Notify>,
}

struct Inner {
    messages: Vec<StoredMessage>,
    next_sequence: u64,
    subscriptions: HashMap<String, Subscription>,
    closed: bool,
}

struct Shared {
    inner: Mutex<Inner>,
}

/// Process-local at-least-once channel.
///
/// Cheap to clone; clones publish into and subscribe to the same
/// message log.
#[derive(Clone)]
pub struct MemoryChannel {
    shared: Arc<Shared>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    messages: Vec::new(),
                    next_sequence: 0,
                    subscriptions: HashMap::new(),
                    closed: false,
                }),
            }),
        }
    }

    /// Publish a payload, returning its assigned sequence number.
    pub fn publish(&self, payload: impl Into<Bytes>) -> u64 {
        let mut inner = self.lock();
        inner.next_sequence += 1;
        let sequence = inner.next_sequence;
        inner.messages.push(StoredMessage {
            sequence,
            payload: payload.into(),
        });
        for sub in inner.subscriptions.values() {
            sub.notify.notify_one();
        }
        sequence
    }

    /// Open (or re-open) a durable subscription with the default
    /// ack-wait.
    pub fn subscribe(&self, durable: &str) -> MemorySource {
        self.subscribe_with_ack_wait(durable, DEFAULT_ACK_WAIT)
    }

    /// Open (or re-open) a durable subscription.
    ///
    /// A subscription created earlier under the same name keeps its
    /// acknowledgment watermark: only messages past it are delivered.
    pub fn subscribe_with_ack_wait(&self, durable: &str, ack_wait: Duration) -> MemorySource {
        let mut inner = self.lock();
        inner
            .subscriptions
            .entry(durable.to_string())
            .or_insert_with(|| Subscription {
                last_acked: 0,
                inflight: None,
                notify: Arc::new(Notify::new()),
            });
        MemorySource {
            shared: Arc::clone(&self.shared),
            durable: durable.to_string(),
            ack_wait,
        }
    }

    /// Messages not yet acknowledged by the given durable subscription.
    pub fn pending(&self, durable: &str) -> usize {
        let inner = self.lock();
        let watermark = inner
            .subscriptions
            .get(durable)
            .map(|sub| sub.last_acked)
            .unwrap_or(0);
        inner
            .messages
            .iter()
            .filter(|m| m.sequence > watermark)
            .count()
    }

    /// Stop accepting deliveries once existing messages are drained.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        for sub in inner.subscriptions.values() {
            sub.notify.notify_one();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.shared.inner.lock().expect("channel state poisoned")
    }
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

// ── Source ──────────────────────────────────────────────────────────

enum Step {
    Deliver(InboundMessage),
    WaitNotify,
    WaitUntil(Instant),
    Drained,
}

/// Consumer half of a [`MemoryChannel`] subscription.
pub struct MemorySource {
    shared: Arc<Shared>,
    durable: String,
    ack_wait: Duration,
}

impl MemorySource {
    fn poll_step(&self) -> (Arc<Notify>, Step) {
        let mut inner = self.shared.inner.lock().expect("channel state poisoned");
        let Inner {
            messages,
            subscriptions,
            closed,
            ..
        } = &mut *inner;
        let sub = subscriptions
            .get_mut(&self.durable)
            .expect("subscription registered on subscribe");
        let notify = Arc::clone(&sub.notify);

        let head = messages.iter().find(|m| m.sequence > sub.last_acked);
        let step = match head {
            None if *closed => Step::Drained,
            None => Step::WaitNotify,
            Some(msg) => {
                let now = Instant::now();
                match sub.inflight {
                    // The head is already out and its ack-wait has not
                    // elapsed yet; hold off on redelivery.
                    Some((seq, deadline)) if seq == msg.sequence && now < deadline => {
                        Step::WaitUntil(deadline)
                    }
                    _ => {
                        sub.inflight = Some((msg.sequence, now + self.ack_wait));
                        Step::Deliver(InboundMessage::new(
                            msg.sequence,
                            msg.payload.clone(),
                            Box::new(MemoryAck {
                                shared: Arc::clone(&self.shared),
                                durable: self.durable.clone(),
                                sequence: msg.sequence,
                            }),
                        ))
                    }
                }
            }
        };
        (notify, step)
    }
}

#[async_trait]
impl MessageSource for MemorySource {
    async fn next(&mut self) -> Result<Option<InboundMessage>, ChannelError> {
        loop {
            let (notify, step) = self.poll_step();
            match step {
                Step::Deliver(message) => return Ok(Some(message)),
                Step::Drained => return Ok(None),
                Step::WaitNotify => notify.notified().await,
                Step::WaitUntil(deadline) => {
                    tokio::select! {
                        _ = notify.notified() => {}
                        _ = sleep_until(deadline) => {}
                    }
                }
            }
        }
    }
}

struct MemoryAck {
    shared: Arc<Shared>,
    durable: String,
    sequence: u64,
}

#[async_trait]
impl AckHandle for MemoryAck {
    async fn ack(self: Box<Self>) -> Result<(), ChannelError> {
        let mut inner = self.shared.inner.lock().expect("channel state poisoned");
        if let Some(sub) = inner.subscriptions.get_mut(&self.durable) {
            if self.sequence > sub.last_acked {
                sub.last_acked = self.sequence;
            }
            if matches!(sub.inflight, Some((seq, _)) if seq == self.sequence) {
                sub.inflight = None;
            }
            sub.notify.notify_one();
        }
        Ok(())
    }
}
