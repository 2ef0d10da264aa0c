//! NATS JetStream implementation of the EventBus trait

use crate::{Acker, BusError, BusMessage, BusResult, Delivery, EventBus};
use async_nats::jetstream::consumer::{pull, AckPolicy};
use async_nats::jetstream::{self, stream, AckKind, Context};
use async_nats::Client;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;

/// EventBus implementation using NATS JetStream
///
/// This is the production implementation. Publishes go through JetStream and
/// block until the broker acknowledges durable storage; durable subscriptions
/// are backed by pull consumers with explicit ack policy, so deliveries are
/// at-least-once and unacknowledged messages are redelivered.
///
/// The bus wraps an already-connected `async_nats::Client` owned by the
/// service's startup path; there is no process-global connection.
///
/// # Example
/// ```rust,no_run
/// use event_bus::{EventBus, NatsBus};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let nats_client = async_nats::connect("nats://localhost:4222").await?;
/// let bus = NatsBus::new(nats_client);
///
/// // Durably stored once this returns Ok
/// bus.publish("orders.created", b"hello".to_vec()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NatsBus {
    client: Client,
    jetstream: Context,
}

impl NatsBus {
    /// Create a new NatsBus from an existing NATS client
    ///
    /// # Arguments
    /// * `client` - An already-connected `async_nats::Client`
    pub fn new(client: Client) -> Self {
        let jetstream = jetstream::new(client.clone());
        Self { client, jetstream }
    }

    /// Get a reference to the underlying NATS client
    ///
    /// This is useful for advanced use cases that need direct access to NATS
    /// features not exposed through the EventBus trait.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Ensure a durable stream exists for the given subjects.
///
/// Idempotent: an existing stream is left untouched. Services call this at
/// startup before publishing or binding consumers, so the topology survives
/// broker restarts without manual provisioning.
pub async fn ensure_stream(
    client: Client,
    name: &str,
    subjects: Vec<String>,
) -> BusResult<()> {
    let js = jetstream::new(client);

    let cfg = stream::Config {
        name: name.to_string(),
        subjects,
        max_age: Duration::from_secs(60 * 60 * 24 * 14), // 14 days
        ..Default::default()
    };

    if js.get_stream(name).await.is_err() {
        js.create_stream(cfg)
            .await
            .map_err(|e| BusError::ConnectionError(e.to_string()))?;
        tracing::info!(stream = %name, "Created JetStream stream");
    }

    Ok(())
}

struct JetStreamAcker {
    message: jetstream::Message,
}

#[async_trait]
impl Acker for JetStreamAcker {
    async fn ack(&self) -> BusResult<()> {
        self.message
            .ack()
            .await
            .map_err(|e| BusError::AckError(e.to_string()))
    }

    async fn term(&self) -> BusResult<()> {
        // Term = terminal negative ack: the broker stops redelivering.
        self.message
            .ack_with(AckKind::Term)
            .await
            .map_err(|e| BusError::AckError(e.to_string()))
    }
}

#[async_trait]
impl EventBus for NatsBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        self.jetstream
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| BusError::PublishError(e.to_string()))?
            // Await the PubAck: success means the broker has stored the message
            .await
            .map_err(|e| BusError::PublishError(e.to_string()))?;

        Ok(())
    }

    async fn publish_with_id(
        &self,
        subject: &str,
        msg_id: &str,
        payload: Vec<u8>,
    ) -> BusResult<()> {
        let mut headers = async_nats::HeaderMap::new();
        headers.insert("Nats-Msg-Id", msg_id);

        self.jetstream
            .publish_with_headers(subject.to_string(), headers, payload.into())
            .await
            .map_err(|e| BusError::PublishError(e.to_string()))?
            .await
            .map_err(|e| BusError::PublishError(e.to_string()))?;

        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> BusResult<BoxStream<'static, BusMessage>> {
        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| BusError::SubscribeError(e.to_string()))?;

        // Convert NATS messages to BusMessages
        let stream = subscriber.map(|nats_msg| {
            let mut msg = BusMessage::new(nats_msg.subject.to_string(), nats_msg.payload.to_vec());

            // Extract headers if present
            if let Some(nats_headers) = nats_msg.headers {
                let mut headers = std::collections::HashMap::new();
                for (key, values) in nats_headers.iter() {
                    // Take the first value for each header
                    if let Some(value) = values.first() {
                        headers.insert(key.to_string(), value.to_string());
                    }
                }
                if !headers.is_empty() {
                    msg = msg.with_headers(headers);
                }
            }

            msg
        });

        Ok(stream.boxed())
    }

    async fn subscribe_durable(
        &self,
        stream: &str,
        queue: &str,
        subject: &str,
        prefetch: usize,
    ) -> BusResult<BoxStream<'static, Delivery>> {
        let js_stream = self
            .jetstream
            .get_stream(stream)
            .await
            .map_err(|e| BusError::SubscribeError(e.to_string()))?;

        let consumer = js_stream
            .get_or_create_consumer(
                queue,
                pull::Config {
                    durable_name: Some(queue.to_string()),
                    filter_subject: subject.to_string(),
                    ack_policy: AckPolicy::Explicit,
                    max_ack_pending: prefetch as i64,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| BusError::SubscribeError(e.to_string()))?;

        let messages = consumer
            .messages()
            .await
            .map_err(|e| BusError::SubscribeError(e.to_string()))?;

        let queue = queue.to_string();
        let stream = async_stream::stream! {
            let mut messages = messages;
            while let Some(next) = messages.next().await {
                match next {
                    Ok(msg) => {
                        let bus_msg =
                            BusMessage::new(msg.subject.to_string(), msg.payload.to_vec());
                        yield Delivery::new(bus_msg, Box::new(JetStreamAcker { message: msg }));
                    }
                    Err(e) => {
                        // Transient pull errors; the consumer keeps its cursor
                        tracing::warn!(queue = %queue, error = %e, "JetStream delivery error");
                    }
                }
            }
        };

        Ok(stream.boxed())
    }

    fn is_connected(&self) -> bool {
        self.client.connection_state() == async_nats::connection::State::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: These tests require a running NATS server
    // For CI, use InMemoryBus tests instead
    // For manual testing: docker run -p 4222:4222 nats:2.10-alpine

    #[tokio::test]
    #[ignore] // Requires NATS server
    async fn test_nats_bus_durable_publish_consume() {
        let client = async_nats::connect("nats://localhost:4222")
            .await
            .expect("NATS server must be running on localhost:4222");

        ensure_stream(client.clone(), "TEST_EVENTS", vec!["test.events.created".to_string()])
            .await
            .unwrap();

        let bus = NatsBus::new(client);
        assert!(bus.is_connected());

        let mut deliveries = bus
            .subscribe_durable("TEST_EVENTS", "test_durable", "test.events.created", 10)
            .await
            .unwrap();

        let payload = b"test message".to_vec();
        bus.publish_with_id("test.events.created", "msg-1", payload.clone())
            .await
            .unwrap();

        let delivery = tokio::time::timeout(std::time::Duration::from_secs(2), deliveries.next())
            .await
            .expect("timeout waiting for delivery")
            .expect("stream ended");

        assert_eq!(delivery.message.subject, "test.events.created");
        assert_eq!(delivery.message.payload, payload);
        delivery.ack().await.unwrap();
    }
}
