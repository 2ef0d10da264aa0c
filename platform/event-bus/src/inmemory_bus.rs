//! In-memory implementation of the EventBus trait for testing and development

use crate::{Acker, BusMessage, BusResult, Delivery, Disposition, EventBus};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// How a durable delivery was settled, recorded by [`InMemoryBus`] so tests
/// can assert on ack/reject decisions without a live broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDisposition {
    pub queue: String,
    pub subject: String,
    pub disposition: Disposition,
}

/// EventBus implementation using in-memory channels
///
/// This implementation is suitable for:
/// - Unit tests (no external dependencies)
/// - Local development without Docker
/// - Integration tests that need fast, isolated message buses
///
/// Messages are broadcast to all subscribers via Tokio broadcast channels.
/// Durable-queue deliveries are simulated: every delivery carries an acker
/// that records its settlement in a disposition log readable via
/// [`InMemoryBus::dispositions`]. Redelivery itself is not simulated; tests
/// exercise it by publishing the same envelope bytes again.
///
/// # Example
/// ```rust
/// use event_bus::{EventBus, InMemoryBus};
/// use futures::StreamExt;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = InMemoryBus::new();
///
/// // Subscribe before publishing
/// let mut stream = bus.subscribe("orders.>").await?;
///
/// // Publish a message
/// bus.publish("orders.created", b"hello".to_vec()).await?;
///
/// // Receive it
/// let msg = stream.next().await.unwrap();
/// assert_eq!(msg.subject, "orders.created");
/// assert_eq!(msg.payload, b"hello");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct InMemoryBus {
    // Global broadcast channel for all messages
    // We use a broadcast channel with a large buffer to avoid dropping messages
    sender: Arc<broadcast::Sender<BusMessage>>,
    dispositions: Arc<Mutex<Vec<QueueDisposition>>>,
}

impl InMemoryBus {
    /// Create a new in-memory event bus
    ///
    /// The bus uses a broadcast channel with a buffer of 1000 messages.
    /// If this buffer is exceeded, the oldest messages will be dropped.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1000);
        Self {
            sender: Arc::new(sender),
            dispositions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a new in-memory event bus with a custom buffer size
    pub fn with_capacity(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self {
            sender: Arc::new(sender),
            dispositions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of every settlement recorded by durable deliveries so far.
    pub async fn dispositions(&self) -> Vec<QueueDisposition> {
        self.dispositions.lock().await.clone()
    }

    /// Check if a subject matches a subscription pattern
    ///
    /// Supports NATS-style wildcards:
    /// - `*` matches exactly one token
    /// - `>` matches one or more tokens
    ///
    /// # Examples
    /// - `orders.>` matches `orders.created`
    /// - `orders.*` matches `orders.created` but not `orders.item.added`
    fn matches_pattern(subject: &str, pattern: &str) -> bool {
        let subject_tokens: Vec<&str> = subject.split('.').collect();
        let pattern_tokens: Vec<&str> = pattern.split('.').collect();

        let mut s_idx = 0;
        let mut p_idx = 0;

        while s_idx < subject_tokens.len() && p_idx < pattern_tokens.len() {
            let pattern_token = pattern_tokens[p_idx];

            if pattern_token == ">" {
                // `>` matches all remaining tokens
                return true;
            } else if pattern_token == "*" {
                // `*` matches exactly one token
                s_idx += 1;
                p_idx += 1;
            } else if subject_tokens[s_idx] == pattern_token {
                // Exact match
                s_idx += 1;
                p_idx += 1;
            } else {
                // No match
                return false;
            }
        }

        // Both must be exhausted for a full match (unless pattern ended with `>`)
        s_idx == subject_tokens.len() && p_idx == pattern_tokens.len()
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

struct InMemoryAcker {
    queue: String,
    subject: String,
    log: Arc<Mutex<Vec<QueueDisposition>>>,
}

#[async_trait]
impl Acker for InMemoryAcker {
    async fn ack(&self) -> BusResult<()> {
        self.log.lock().await.push(QueueDisposition {
            queue: self.queue.clone(),
            subject: self.subject.clone(),
            disposition: Disposition::Ack,
        });
        Ok(())
    }

    async fn term(&self) -> BusResult<()> {
        self.log.lock().await.push(QueueDisposition {
            queue: self.queue.clone(),
            subject: self.subject.clone(),
            disposition: Disposition::Reject,
        });
        Ok(())
    }
}

#[async_trait]
impl EventBus for InMemoryBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        let msg = BusMessage::new(subject.to_string(), payload);

        // Broadcast to all subscribers
        // We ignore the error if there are no receivers (that's fine)
        let _ = self.sender.send(msg);

        Ok(())
    }

    async fn publish_with_id(
        &self,
        subject: &str,
        msg_id: &str,
        payload: Vec<u8>,
    ) -> BusResult<()> {
        let msg = BusMessage::new(subject.to_string(), payload).with_headers(HashMap::from([(
            "Nats-Msg-Id".to_string(),
            msg_id.to_string(),
        )]));

        let _ = self.sender.send(msg);

        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> BusResult<BoxStream<'static, BusMessage>> {
        let mut receiver = self.sender.subscribe();
        let pattern = pattern.to_string();

        // Filter messages based on the subscription pattern
        let stream = async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(msg) => {
                        if Self::matches_pattern(&msg.subject, &pattern) {
                            yield msg;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "InMemoryBus: subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        // Channel closed, end the stream
                        break;
                    }
                }
            }
        };

        Ok(stream.boxed())
    }

    async fn subscribe_durable(
        &self,
        _stream: &str,
        queue: &str,
        subject: &str,
        _prefetch: usize,
    ) -> BusResult<BoxStream<'static, Delivery>> {
        let mut receiver = self.sender.subscribe();
        let pattern = subject.to_string();
        let queue = queue.to_string();
        let log = self.dispositions.clone();

        let stream = async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(msg) => {
                        if Self::matches_pattern(&msg.subject, &pattern) {
                            let acker = InMemoryAcker {
                                queue: queue.clone(),
                                subject: msg.subject.clone(),
                                log: log.clone(),
                            };
                            yield Delivery::new(msg, Box::new(acker));
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, queue = %queue, "InMemoryBus: durable subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        };

        Ok(stream.boxed())
    }

    fn is_connected(&self) -> bool {
        true
    }
}
