//! # EventBus Abstraction
//!
//! A platform-level abstraction for durable event messaging between services.
//!
//! ## Why This Lives in Tier 1
//!
//! The EventBus is a **shared runtime capability** that both services depend
//! on. Placing it in `platform/` allows:
//! - Services to depend on a platform crate without depending on each other
//! - Config-driven swap between NATS (production) and InMemory (dev/test)
//! - Publishers and consumers to receive an explicitly owned handle at
//!   construction instead of reaching for process-global state
//!
//! ## Implementations
//!
//! - **NatsBus**: Production implementation using NATS JetStream. Publishes
//!   are acknowledged by the broker before `publish` returns, and durable
//!   consumers deliver messages with manual ack/reject semantics.
//! - **InMemoryBus**: Test/dev implementation using in-memory channels.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use event_bus::{EventBus, NatsBus, InMemoryBus};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Production: NATS
//! let nats_client = async_nats::connect("nats://localhost:4222").await?;
//! let bus: Arc<dyn EventBus> = Arc::new(NatsBus::new(nats_client));
//!
//! // Dev/Test: In-Memory
//! let bus: Arc<dyn EventBus> = Arc::new(InMemoryBus::new());
//!
//! // Publish an event (durably stored before this returns Ok)
//! let payload = serde_json::to_vec(&serde_json::json!({
//!     "event_type": "order.created",
//! }))?;
//! bus.publish("orders.created", payload).await?;
//! # Ok(())
//! # }
//! ```

mod envelope;
mod inmemory_bus;
mod nats_bus;

pub use envelope::{validate_envelope_fields, EventEnvelope};
pub use inmemory_bus::{InMemoryBus, QueueDisposition};
pub use nats_bus::{ensure_stream, NatsBus};

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;

/// A message received from the event bus
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// The subject/routing key this message was published to
    pub subject: String,
    /// The message payload (raw bytes)
    pub payload: Vec<u8>,
    /// Optional headers (e.g. the broker-side dedup id)
    pub headers: Option<std::collections::HashMap<String, String>>,
}

impl BusMessage {
    /// Create a new bus message
    pub fn new(subject: String, payload: Vec<u8>) -> Self {
        Self {
            subject,
            payload,
            headers: None,
        }
    }

    /// Add headers to the message
    pub fn with_headers(mut self, headers: std::collections::HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// Terminal outcome for a durable delivery.
///
/// `Reject` is terminal: the message is not requeued. Consumers that need the
/// common duplicate-redelivery path handle it by acking, not rejecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    Reject,
}

/// Settles a single durable delivery with the broker.
///
/// Implementations must tolerate being called exactly once per delivery;
/// the consumer loop settles every delivery after its handler decides.
#[async_trait]
pub trait Acker: Send + Sync {
    /// Acknowledge the delivery (processing committed).
    async fn ack(&self) -> BusResult<()>;

    /// Terminally reject the delivery (permanently unprocessable, no requeue).
    async fn term(&self) -> BusResult<()>;
}

/// A message delivered from a durable queue, carrying its settlement handle.
pub struct Delivery {
    pub message: BusMessage,
    acker: Box<dyn Acker>,
}

impl Delivery {
    pub fn new(message: BusMessage, acker: Box<dyn Acker>) -> Self {
        Self { message, acker }
    }

    pub async fn ack(&self) -> BusResult<()> {
        self.acker.ack().await
    }

    pub async fn term(&self) -> BusResult<()> {
        self.acker.term().await
    }

    /// Settle this delivery according to the handler's decision.
    pub async fn settle(&self, disposition: Disposition) -> BusResult<()> {
        match disposition {
            Disposition::Ack => self.ack().await,
            Disposition::Reject => self.term().await,
        }
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("message", &self.message)
            .finish()
    }
}

/// Errors that can occur when using the event bus
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("failed to publish message: {0}")]
    PublishError(String),

    #[error("failed to subscribe to subject: {0}")]
    SubscribeError(String),

    #[error("failed to settle delivery: {0}")]
    AckError(String),

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("invalid subject pattern: {0}")]
    InvalidSubject(String),
}

/// Result type for event bus operations
pub type BusResult<T> = Result<T, BusError>;

/// Core event bus abstraction for durable publish-subscribe messaging
///
/// This trait defines the interface that all event bus implementations must
/// satisfy. Publishing is durable: `Ok(())` means the broker has accepted and
/// stored the message, not that any consumer has processed it.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a message to a subject, durably.
    ///
    /// # Arguments
    /// * `subject` - The subject/routing key to publish to (e.g. "orders.created")
    /// * `payload` - The message payload as raw bytes
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()>;

    /// Publish a message stamped with a broker-side deduplication id.
    ///
    /// The id is a hint for broker tooling; consumers do their own
    /// deduplication and must not rely on it.
    async fn publish_with_id(&self, subject: &str, msg_id: &str, payload: Vec<u8>)
        -> BusResult<()>;

    /// Subscribe to messages matching a subject pattern (no queue, no acks).
    ///
    /// # Arguments
    /// * `subject` - The subject pattern to subscribe to (supports wildcards: `*`, `>`)
    ///   - `*` matches a single token (e.g., `orders.*`)
    ///   - `>` matches one or more tokens (e.g., `orders.>`)
    async fn subscribe(&self, subject: &str) -> BusResult<BoxStream<'static, BusMessage>>;

    /// Bind a durable queue to a subject and consume with manual acks.
    ///
    /// Delivery is at-least-once: a message stays in the queue until its
    /// `Delivery` is settled, and may be redelivered after a crash between
    /// processing and acknowledgment. `prefetch` caps the number of
    /// unacknowledged messages in flight per consumer.
    ///
    /// # Arguments
    /// * `stream` - The durable stream (topic exchange) holding the messages
    /// * `queue` - Durable queue / consumer-group name
    /// * `subject` - The subject (routing key) the queue is bound to
    /// * `prefetch` - Maximum unacknowledged deliveries in flight
    async fn subscribe_durable(
        &self,
        stream: &str,
        queue: &str,
        subject: &str,
        prefetch: usize,
    ) -> BusResult<BoxStream<'static, Delivery>>;

    /// Whether the underlying broker connection is currently established.
    ///
    /// Exposed so health endpoints can report degraded messaging without
    /// touching the request path.
    fn is_connected(&self) -> bool;
}

impl fmt::Debug for dyn EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventBus")
    }
}
