//! Order Ingestion Service
//!
//! Consumes order documents from a durable at-least-once channel and
//! drives them through validate → durable upsert → cache update →
//! acknowledge, one message in flight at a time.
//!
//! # Architecture
//!
//! ```text
//!  Channel (at-least-once, manual ack)
//!        │
//!    ┌───▼────┐
//!    │Validate│  ← structural checks, extracts order_uid
//!    └───┬────┘
//!        │
//!    ┌───▼────┐
//!    │ Upsert │  ← idempotent durable write (source of truth)
//!    └───┬────┘
//!        │
//!    ┌───▼────┐
//!    │ Cache  │  ← derived projection served over HTTP
//!    └───┬────┘
//!        │
//!      ack ✓
//! ```
//!
//! Validation failures are dropped and acknowledged (redelivery cannot
//! repair malformed content); an unavailable store leaves the message
//! unacknowledged so the channel redelivers it later.

pub mod channel;
pub mod memory;
pub mod pg;
pub mod pipeline;
pub mod validator;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
