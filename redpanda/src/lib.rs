//! Kafka-compatible event bus for Aerobook.
//!
//! Admin ingest and the outbox publisher write `flights.created` events
//! through [`FlightEventPublisher`]; the journey precomputer consumes them
//! through [`FlightEventConsumer`]. Any Kafka-protocol broker works
//! (Redpanda in the compose file, Apache Kafka, a managed service).
//!
//! # Delivery semantics
//!
//! At-least-once, ordered per partition:
//!
//! - The producer keys every record by flight id, so all events for one
//!   flight land on one partition in order.
//! - The consumer runs with auto-commit off and commits an offset only
//!   after the handler has processed the event to completion. A crash
//!   mid-event means redelivery, which journey precomputation absorbs
//!   through its idempotent persistence.

use aerobook_core::event::{FlightCreated, FLIGHTS_CREATED_TOPIC};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors from the event bus.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// Client construction or subscription failed.
    #[error("event bus connection failed: {0}")]
    ConnectionFailed(String),

    /// A publish did not reach the broker.
    #[error("event publish failed: {0}")]
    PublishFailed(String),

    /// The consumer stream returned an error.
    #[error("event receive failed: {0}")]
    ReceiveFailed(String),

    /// A payload could not be decoded.
    #[error("event decode failed: {0}")]
    DecodeFailed(String),
}

// ============================================================================
// Producer
// ============================================================================

/// Publisher for `flights.created` events.
#[derive(Clone)]
pub struct FlightEventPublisher {
    producer: FutureProducer,
    timeout: Duration,
}

impl FlightEventPublisher {
    /// Create a publisher with default settings (`acks=all`, 5 s timeout).
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if the producer cannot
    /// be constructed from the broker list.
    pub fn new(brokers: &str) -> Result<Self, EventBusError> {
        Self::with_timeout(brokers, Duration::from_secs(5))
    }

    /// Create a publisher with an explicit delivery timeout.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if the producer cannot
    /// be constructed from the broker list.
    pub fn with_timeout(brokers: &str, timeout: Duration) -> Result<Self, EventBusError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("acks", "all")
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .create()
            .map_err(|e| EventBusError::ConnectionFailed(e.to_string()))?;

        Ok(Self { producer, timeout })
    }

    /// Publish one event, keyed by flight id, waiting for broker acks.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the record is not
    /// acknowledged within the timeout.
    pub async fn publish(&self, event: &FlightCreated) -> Result<(), EventBusError> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| EventBusError::DecodeFailed(format!("encoding event: {e}")))?;
        let key = event.partition_key();

        let record = FutureRecord::to(FLIGHTS_CREATED_TOPIC)
            .key(&key)
            .payload(&payload);

        self.producer
            .send(record, Timeout::After(self.timeout))
            .await
            .map_err(|(error, _message)| EventBusError::PublishFailed(error.to_string()))?;

        tracing::debug!(
            flight_id = %event.flight_id,
            topic = FLIGHTS_CREATED_TOPIC,
            "Published flight-created event"
        );
        Ok(())
    }
}

// ============================================================================
// Consumer
// ============================================================================

/// Consumer for `flights.created` events.
///
/// Each event is handed to the handler exactly once per delivery; the
/// offset is committed only after the handler returns `Ok`, and a failing
/// handler is retried in place with a delay, so an event is never
/// acknowledged half-processed.
pub struct FlightEventConsumer {
    consumer: StreamConsumer,
    retry_delay: Duration,
}

impl FlightEventConsumer {
    /// Create a consumer and subscribe to the `flights.created` topic.
    ///
    /// New consumer groups start from the earliest offset so flights
    /// ingested before the precomputer first came up are still processed.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if the consumer cannot
    /// be constructed or the subscription fails.
    pub fn new(brokers: &str, group_id: &str) -> Result<Self, EventBusError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "45000")
            .create()
            .map_err(|e| EventBusError::ConnectionFailed(e.to_string()))?;

        consumer
            .subscribe(&[FLIGHTS_CREATED_TOPIC])
            .map_err(|e| EventBusError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            consumer,
            retry_delay: Duration::from_secs(5),
        })
    }

    /// Override the delay between handler retries.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Consume until the shutdown signal fires.
    ///
    /// For every delivered event the handler runs to completion before the
    /// offset is committed. Undecodable payloads are logged and committed
    /// past (they would never become decodable); receive errors back off
    /// and retry.
    pub async fn run<H, Fut, E>(self, handler: H, mut shutdown: broadcast::Receiver<()>)
    where
        H: Fn(FlightCreated) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        tracing::info!(topic = FLIGHTS_CREATED_TOPIC, "Flight event consumer started");

        loop {
            let message = tokio::select! {
                received = self.consumer.recv() => received,
                _ = shutdown.recv() => {
                    tracing::info!("Flight event consumer shutting down");
                    return;
                }
            };

            let message = match message {
                Ok(message) => message,
                Err(error) => {
                    tracing::warn!(%error, "Event receive failed; backing off");
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
            };

            let event: FlightCreated = match message
                .payload()
                .ok_or_else(|| EventBusError::DecodeFailed("empty payload".to_string()))
                .and_then(|bytes| {
                    serde_json::from_slice(bytes)
                        .map_err(|e| EventBusError::DecodeFailed(e.to_string()))
                }) {
                Ok(event) => event,
                Err(error) => {
                    tracing::error!(%error, offset = message.offset(), "Skipping undecodable event");
                    if let Err(commit_error) =
                        self.consumer.commit_message(&message, CommitMode::Async)
                    {
                        tracing::warn!(%commit_error, "Failed to commit past poison message");
                    }
                    continue;
                }
            };

            // Process to completion before acknowledging. A handler failure
            // is retried in place; giving up here would acknowledge an event
            // that was never applied.
            loop {
                match handler(event.clone()).await {
                    Ok(()) => break,
                    Err(error) => {
                        tracing::warn!(
                            flight_id = %event.flight_id,
                            %error,
                            "Event handler failed; retrying"
                        );
                        tokio::select! {
                            () = tokio::time::sleep(self.retry_delay) => {}
                            _ = shutdown.recv() => {
                                tracing::info!("Flight event consumer shutting down mid-retry");
                                return;
                            }
                        }
                    }
                }
            }

            if let Err(error) = self.consumer.commit_message(&message, CommitMode::Async) {
                tracing::warn!(%error, "Offset commit failed; event may be redelivered");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use aerobook_core::types::{AirportCode, FlightId};
    use chrono::Utc;

    fn event() -> FlightCreated {
        FlightCreated {
            flight_id: FlightId::new(),
            source_airport: AirportCode::parse("JFK").unwrap(),
            destination_airport: AirportCode::parse("LAX").unwrap(),
            departure_instant: Utc::now(),
            emitted_at: Utc::now(),
        }
    }

    #[test]
    fn partition_key_is_the_flight_id() {
        let event = event();
        assert_eq!(event.partition_key(), event.flight_id.to_string());
    }

    #[test]
    fn payload_survives_the_wire_encoding() {
        let event = event();
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: FlightCreated = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn publisher_construction_accepts_broker_list() {
        // librdkafka validates brokers lazily, so construction succeeds
        // even without a live broker.
        let publisher = FlightEventPublisher::new("localhost:9092");
        assert!(publisher.is_ok());
    }
}
