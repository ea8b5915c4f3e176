//! Durable order channel over PostgreSQL
//!
//! At-least-once delivery backed by two tables: an append-only message
//! log with a serial sequence, and per-durable-subscription
//! acknowledgment watermarks. A consumer sees every message above its
//! watermark (including messages published before it first connected),
//! and acknowledging durably advances the watermark, so an
//! unacknowledged message is redelivered after a crash or an elapsed
//! ack-wait. One message is in flight at a time by construction: the
//! head past the watermark is the only message ever handed out.

use async_trait::async_trait;
use bytes::Bytes;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio::time::{sleep, sleep_until, Duration, Instant};
use tokio_postgres::NoTls;
use tracing::{info, warn};

use crate::channel::{AckHandle, ChannelError, InboundMessage, MessageSource};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS channel_messages (
  sequence     BIGSERIAL PRIMARY KEY,
  channel      TEXT NOT NULL,
  payload      BYTEA NOT NULL,
  published_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS idx_channel_messages_channel_sequence
  ON channel_messages (channel, sequence);
CREATE TABLE IF NOT EXISTS channel_subscriptions (
  channel      TEXT NOT NULL,
  durable_name TEXT NOT NULL,
  last_acked   BIGINT NOT NULL DEFAULT 0,
  updated_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
  PRIMARY KEY (channel, durable_name)
);
";

const POOL_SIZE: usize = 4;

/// Settings for one durable consumer.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Postgres connection string for the channel tables.
    pub dsn: String,
    /// Logical channel name messages are published under.
    pub channel: String,
    /// Durable subscription name; the watermark is keyed by it.
    pub durable_name: String,
    /// Consumer identity, used for logging only.
    pub client_id: String,
    /// Delay between polls when the channel is empty.
    pub poll_interval: Duration,
    /// How long a delivered message may stay unacknowledged before it
    /// is redelivered.
    pub ack_wait: Duration,
}

impl ChannelConfig {
    pub fn new(
        dsn: impl Into<String>,
        channel: impl Into<String>,
        durable_name: impl Into<String>,
    ) -> Self {
        Self {
            dsn: dsn.into(),
            channel: channel.into(),
            durable_name: durable_name.into(),
            client_id: "orders-consumer".to_string(),
            poll_interval: Duration::from_millis(250),
            ack_wait: Duration::from_secs(30),
        }
    }
}

// ── Publisher ───────────────────────────────────────────────────────

/// Producer half of the durable channel.
#[derive(Clone)]
pub struct PgPublisher {
    pool: Pool,
}

impl PgPublisher {
    /// Connect and ensure the channel schema exists, so publishing
    /// works before any consumer has ever run.
    pub async fn connect(dsn: &str) -> Result<Self, ChannelError> {
        let pool = build_pool(dsn)?;
        ensure_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Append a payload to the channel, returning its sequence number.
    pub async fn publish(&self, channel: &str, payload: &[u8]) -> Result<u64, ChannelError> {
        let conn = conn(&self.pool).await?;
        let row = conn
            .query_one(
                "INSERT INTO channel_messages (channel, payload) VALUES ($1, $2)
                 RETURNING sequence",
                &[&channel, &payload],
            )
            .await
            .map_err(ChannelError::unavailable)?;
        let sequence: i64 = row.get(0);
        Ok(sequence as u64)
    }

    /// Close the underlying connection pool.
    pub fn close(&self) {
        self.pool.close();
    }
}

// ── Consumer ────────────────────────────────────────────────────────

/// Durable polling consumer implementing [`MessageSource`].
pub struct PgSource {
    pool: Pool,
    channel: String,
    durable_name: String,
    poll_interval: Duration,
    ack_wait: Duration,
    /// Sequence and delivery time of the current in-flight message,
    /// used to pace redelivery.
    last_delivered: Option<(u64, Instant)>,
}

impl PgSource {
    /// Connect, ensure the schema, and register the durable
    /// subscription (a new one starts at watermark 0 and therefore
    /// replays every message already published).
    pub async fn connect(config: ChannelConfig) -> Result<Self, ChannelError> {
        let pool = build_pool(&config.dsn)?;
        ensure_schema(&pool).await?;

        let conn = conn(&pool).await?;
        conn.execute(
            "INSERT INTO channel_subscriptions (channel, durable_name)
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
            &[&config.channel, &config.durable_name],
        )
        .await
        .map_err(ChannelError::unavailable)?;
        let row = conn
            .query_one(
                "SELECT last_acked FROM channel_subscriptions
                 WHERE channel = $1 AND durable_name = $2",
                &[&config.channel, &config.durable_name],
            )
            .await
            .map_err(ChannelError::unavailable)?;
        let last_acked: i64 = row.get(0);
        info!(
            channel = %config.channel,
            durable = %config.durable_name,
            client = %config.client_id,
            last_acked,
            "durable subscription opened"
        );

        Ok(Self {
            pool,
            channel: config.channel,
            durable_name: config.durable_name,
            poll_interval: config.poll_interval,
            ack_wait: config.ack_wait,
            last_delivered: None,
        })
    }

    /// Close the underlying connection pool.
    pub fn close(&self) {
        self.pool.close();
    }

    /// First message past the durable watermark, if any.
    async fn fetch_head(&self) -> Result<Option<(u64, Bytes)>, ChannelError> {
        let conn = conn(&self.pool).await?;
        let row = conn
            .query_opt(
                "SELECT m.sequence, m.payload
                 FROM channel_messages m
                 JOIN channel_subscriptions s ON s.channel = m.channel
                 WHERE m.channel = $1 AND s.durable_name = $2
                   AND m.sequence > s.last_acked
                 ORDER BY m.sequence
                 LIMIT 1",
                &[&self.channel, &self.durable_name],
            )
            .await
            .map_err(ChannelError::unavailable)?;
        Ok(row.map(|row| {
            let sequence: i64 = row.get(0);
            let payload: Vec<u8> = row.get(1);
            (sequence as u64, Bytes::from(payload))
        }))
    }
}

#[async_trait]
impl MessageSource for PgSource {
    async fn next(&mut self) -> Result<Option<InboundMessage>, ChannelError> {
        loop {
            let head = match self.fetch_head().await {
                Ok(head) => head,
                Err(err) => {
                    // Transient backend trouble: keep the subscription
                    // alive and poll again.
                    warn!(error = %err, channel = %self.channel, "channel poll failed");
                    sleep(self.poll_interval).await;
                    continue;
                }
            };

            match head {
                None => sleep(self.poll_interval).await,
                Some((sequence, payload)) => {
                    if let Some((delivered, at)) = self.last_delivered {
                        if delivered == sequence && at.elapsed() < self.ack_wait {
                            // Unacknowledged head; wait out the ack-wait
                            // before redelivering.
                            sleep_until(at + self.ack_wait).await;
                            continue;
                        }
                    }
                    self.last_delivered = Some((sequence, Instant::now()));
                    return Ok(Some(InboundMessage::new(
                        sequence,
                        payload,
                        Box::new(PgAck {
                            pool: self.pool.clone(),
                            channel: self.channel.clone(),
                            durable_name: self.durable_name.clone(),
                            sequence,
                        }),
                    )));
                }
            }
        }
    }
}

struct PgAck {
    pool: Pool,
    channel: String,
    durable_name: String,
    sequence: u64,
}

#[async_trait]
impl AckHandle for PgAck {
    async fn ack(self: Box<Self>) -> Result<(), ChannelError> {
        let conn = conn(&self.pool).await?;
        conn.execute(
            "UPDATE channel_subscriptions
             SET last_acked = GREATEST(last_acked, $3), updated_at = now()
             WHERE channel = $1 AND durable_name = $2",
            &[&self.channel, &self.durable_name, &(self.sequence as i64)],
        )
        .await
        .map_err(ChannelError::unavailable)?;
        Ok(())
    }
}

// ── Pool plumbing ───────────────────────────────────────────────────

fn build_pool(dsn: &str) -> Result<Pool, ChannelError> {
    let pg_config: tokio_postgres::Config = dsn.parse().map_err(ChannelError::unavailable)?;
    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );
    Pool::builder(manager)
        .max_size(POOL_SIZE)
        .build()
        .map_err(ChannelError::unavailable)
}

async fn conn(pool: &Pool) -> Result<Object, ChannelError> {
    pool.get().await.map_err(ChannelError::unavailable)
}

async fn ensure_schema(pool: &Pool) -> Result<(), ChannelError> {
    let conn = conn(pool).await?;
    conn.batch_execute(SCHEMA)
        .await
        .map_err(ChannelError::unavailable)
}
