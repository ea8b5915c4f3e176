//! Persistence & Cache Service
//!
//! Durable keyed storage for order documents with an in-memory read
//! cache on top. The store is the source of truth; the cache is a
//! derived projection rebuilt once at startup and mutated incrementally
//! by the ingestion pipeline.
//!
//! # Architecture
//!
//! ```text
//!            bootstrap (startup, once)
//!   Postgres ─────────────────────────► OrderCache
//!      ▲                                   ▲  │
//!      │ upsert                       set  │  │ get
//!      │                                   │  ▼
//!   Ingestion pipeline ────────────────────┘  HTTP gateway
//! ```

pub mod cache;
pub mod memory;
pub mod pg;
pub mod recovery;
pub mod store;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
