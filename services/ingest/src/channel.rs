//! Channel abstraction for at-least-once order delivery
//!
//! The transport is an external collaborator; the pipeline only depends
//! on this contract: messages arrive with a per-subscription sequence
//! number, must be acknowledged explicitly, and are redelivered if the
//! consumer crashes or declines to acknowledge. Sources hand out one
//! unacknowledged message at a time.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("channel unavailable: {0}")]
    Unavailable(String),

    #[error("channel closed")]
    Closed,
}

impl ChannelError {
    /// Wrap any backend failure as an availability error.
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        ChannelError::Unavailable(err.to_string())
    }
}

// ── Messages ────────────────────────────────────────────────────────

/// Transport-specific acknowledgment for a single delivered message.
#[async_trait]
pub trait AckHandle: Send {
    async fn ack(self: Box<Self>) -> Result<(), ChannelError>;
}

/// A message delivered from the order channel.
///
/// Acknowledgment consumes the message; a message that is dropped
/// without `ack` stays pending and will be redelivered.
pub struct InboundMessage {
    /// Monotonically increasing per-subscription sequence number.
    pub sequence: u64,
    /// Opaque payload bytes as published.
    pub payload: Bytes,
    acker: Box<dyn AckHandle>,
}

impl InboundMessage {
    pub fn new(sequence: u64, payload: Bytes, acker: Box<dyn AckHandle>) -> Self {
        Self {
            sequence,
            payload,
            acker,
        }
    }

    /// Acknowledge the message so the channel never redelivers it.
    pub async fn ack(self) -> Result<(), ChannelError> {
        self.acker.ack().await
    }
}

impl std::fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundMessage")
            .field("sequence", &self.sequence)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

// ── Source ──────────────────────────────────────────────────────────

/// A subscription on the order channel.
///
/// `next` resolves when a message is deliverable: either a new message
/// past the acknowledgment watermark, or a redelivery of the current
/// unacknowledged one after its ack-wait elapses. Implementations keep
/// at most one message in flight per subscription.
#[async_trait]
pub trait MessageSource: Send {
    /// Await the next deliverable message; `None` means the channel is
    /// closed and drained.
    async fn next(&mut self) -> Result<Option<InboundMessage>, ChannelError>;
}
