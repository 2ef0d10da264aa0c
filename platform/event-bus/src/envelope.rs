//! # Event Envelope
//!
//! The canonical wire representation of a domain event.
//!
//! ## Envelope Fields
//!
//! - `event_type`: string tag identifying the event (e.g. "order.created")
//! - `event_id`: unique identifier, the sole deduplication key
//! - `timestamp`: ISO 8601 creation time
//! - `payload`: event-specific data (generic type parameter)
//!
//! The `event_id` is assigned exactly once when the envelope is built and is
//! never regenerated: a redelivered message carries the same envelope bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard event envelope wrapping every event that crosses a service
/// boundary.
///
/// # Type Parameter
///
/// * `T` - The event-specific payload type
///
/// # Examples
///
/// ```rust
/// use event_bus::EventEnvelope;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct OrderCreated {
///     order_id: i64,
///     customer_id: i64,
/// }
///
/// let envelope = EventEnvelope::new(
///     "order.created",
///     OrderCreated {
///         order_id: 42,
///         customer_id: 7,
///     },
/// );
/// assert_eq!(envelope.event_type, "order.created");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Event type tag
    pub event_type: String,

    /// Unique event identifier (idempotency key)
    pub event_id: Uuid,

    /// ISO 8601 timestamp when the event was generated
    pub timestamp: DateTime<Utc>,

    /// Event-specific payload
    pub payload: T,
}

impl<T> EventEnvelope<T> {
    /// Create a new envelope with an auto-generated event_id and timestamp.
    pub fn new(event_type: impl Into<String>, payload: T) -> Self {
        Self {
            event_type: event_type.into(),
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Create an envelope with an explicit event_id (useful for testing
    /// redelivery scenarios, where the same id must appear twice).
    pub fn with_event_id(event_id: Uuid, event_type: impl Into<String>, payload: T) -> Self {
        Self {
            event_type: event_type.into(),
            event_id,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Validate the structural envelope fields of a raw event.
///
/// # Validation Rules
///
/// - `event_type`: must be a non-empty string
/// - `event_id`: must be a string parseable as a UUID
/// - `timestamp`: must be present
/// - `payload`: must be an object
///
/// # Errors
///
/// Returns a descriptive error string if validation fails
pub fn validate_envelope_fields(envelope: &serde_json::Value) -> Result<(), String> {
    let event_type = envelope
        .get("event_type")
        .and_then(|v| v.as_str())
        .ok_or("Missing or invalid event_type")?;

    if event_type.is_empty() {
        return Err("event_type cannot be empty".to_string());
    }

    let event_id = envelope
        .get("event_id")
        .and_then(|v| v.as_str())
        .ok_or("Missing or invalid event_id")?;

    Uuid::parse_str(event_id).map_err(|_| format!("event_id is not a valid UUID: {event_id}"))?;

    envelope
        .get("timestamp")
        .and_then(|v| v.as_str())
        .ok_or("Missing or invalid timestamp")?;

    if !envelope.get("payload").is_some_and(|v| v.is_object()) {
        return Err("Missing or invalid payload".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_creation() {
        let envelope = EventEnvelope::new("order.created", json!({"order_id": 1}));

        assert_eq!(envelope.event_type, "order.created");
        assert_eq!(envelope.payload, json!({"order_id": 1}));
    }

    #[test]
    fn test_envelope_explicit_event_id_is_stable() {
        let event_id = Uuid::new_v4();
        let first = EventEnvelope::with_event_id(event_id, "order.created", json!({}));
        let second = EventEnvelope::with_event_id(event_id, "order.created", json!({}));

        assert_eq!(first.event_id, second.event_id);
    }

    #[test]
    fn test_envelope_wire_format_keys() {
        let envelope = EventEnvelope::new("order.created", json!({"customer_id": 7}));
        let value = serde_json::to_value(&envelope).unwrap();

        assert!(value.get("event_type").is_some());
        assert!(value.get("event_id").is_some());
        assert!(value.get("timestamp").is_some());
        assert_eq!(value.pointer("/payload/customer_id"), Some(&json!(7)));
    }

    #[test]
    fn test_validate_envelope_fields_valid() {
        let envelope = json!({
            "event_type": "order.created",
            "event_id": "550e8400-e29b-41d4-a716-446655440000",
            "timestamp": "2024-01-01T00:00:00Z",
            "payload": {}
        });

        assert!(validate_envelope_fields(&envelope).is_ok());
    }

    #[test]
    fn test_validate_envelope_fields_missing_event_id() {
        let envelope = json!({
            "event_type": "order.created",
            "timestamp": "2024-01-01T00:00:00Z",
            "payload": {}
        });

        assert!(validate_envelope_fields(&envelope).is_err());
    }

    #[test]
    fn test_validate_envelope_fields_garbled_event_id() {
        let envelope = json!({
            "event_type": "order.created",
            "event_id": "not-a-uuid",
            "timestamp": "2024-01-01T00:00:00Z",
            "payload": {}
        });

        assert!(validate_envelope_fields(&envelope).is_err());
    }

    #[test]
    fn test_validate_envelope_fields_payload_not_object() {
        let envelope = json!({
            "event_type": "order.created",
            "event_id": "550e8400-e29b-41d4-a716-446655440000",
            "timestamp": "2024-01-01T00:00:00Z",
            "payload": "nope"
        });

        assert!(validate_envelope_fields(&envelope).is_err());
    }
}
