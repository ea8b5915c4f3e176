//! Ingestion pipeline
//!
//! Drives each delivered message through a small state machine:
//! received → validated → stored → cached → acknowledged. The two
//! terminal states both acknowledge: a message is either Acked after a
//! durable write, or Dropped-and-Acked when it is structurally invalid
//! (redelivery cannot repair malformed content, and leaving it pending
//! would clog the subscription forever). The single non-terminal
//! outcome is an unavailable store: the message stays unacknowledged
//! and the channel redelivers it later.
//!
//! The loop processes one message at a time and never acknowledges
//! before the durable write and the cache update have completed.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use persistence::cache::OrderCache;
use persistence::store::OrderStore;

use crate::channel::{InboundMessage, MessageSource};
use crate::validator;

/// Sequential consumer of the order channel.
pub struct Pipeline<S, T: ?Sized> {
    source: S,
    store: Arc<T>,
    cache: Arc<OrderCache>,
}

impl<S, T> Pipeline<S, T>
where
    S: MessageSource,
    T: OrderStore + ?Sized,
{
    pub fn new(source: S, store: Arc<T>, cache: Arc<OrderCache>) -> Self {
        Self {
            source,
            cache,
            store,
        }
    }

    /// Consume until the channel closes or shutdown is signalled.
    ///
    /// The shutdown check sits between messages: a message already
    /// being processed runs to its terminal state first.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            let message = tokio::select! {
                _ = shutdown.recv() => {
                    info!("ingestion pipeline stopping");
                    break;
                }
                next = self.source.next() => match next {
                    Ok(Some(message)) => message,
                    Ok(None) => {
                        info!("order channel closed");
                        break;
                    }
                    Err(err) => {
                        error!(error = %err, "order channel receive failed");
                        break;
                    }
                }
            };
            self.process(message).await;
        }
    }

    /// Decide the terminal state for one message.
    async fn process(&self, message: InboundMessage) {
        let sequence = message.sequence;
        let payload = message.payload.clone();

        let uid = match validator::validate(&payload) {
            Ok(uid) => uid,
            Err(reason) => {
                warn!(sequence, %reason, "dropping invalid order message");
                ack_or_log(message).await;
                return;
            }
        };

        let Ok(text) = std::str::from_utf8(&payload) else {
            // Validated JSON is UTF-8; a failure here means the payload
            // changed underneath us and redelivery cannot fix it.
            warn!(sequence, order_uid = %uid, "dropping non-utf8 order payload");
            ack_or_log(message).await;
            return;
        };

        match self.store.upsert(&uid, text).await {
            Ok(()) => {
                // Cache strictly after the durable commit, ack strictly
                // after the cache.
                self.cache.set(uid.clone(), payload);
                ack_or_log(message).await;
                info!(order_uid = %uid, sequence, "stored order");
            }
            Err(err) => {
                // Leave the message unacknowledged: the channel will
                // redeliver it, and the upsert is idempotent.
                error!(order_uid = %uid, sequence, error = %err, "order upsert failed");
            }
        }
    }
}

async fn ack_or_log(message: InboundMessage) {
    let sequence = message.sequence;
    if let Err(err) = message.ack().await {
        // At-least-once tolerates a lost ack: the message comes back
        // and reprocessing it is a no-op.
        warn!(sequence, error = %err, "failed to acknowledge message");
    }
}
