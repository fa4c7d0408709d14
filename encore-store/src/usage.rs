use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};

use encore_core::repository::UsageReporter;
use encore_shared::models::usage::{BookingUsageEvent, ImpressionUsageEvent};

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
    ) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                let partition = delivery.partition;
                let offset = delivery.offset;
                info!("Sent message to {}/{}: partition {} offset {}", topic, key, partition, offset);
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }
}

/// Usage metering over the billing topic. All calls are best-effort; the
/// booking flows spawn them and only log failures.
pub struct KafkaUsageReporter {
    producer: EventProducer,
    topic: String,
}

impl KafkaUsageReporter {
    pub fn new(producer: EventProducer, topic: &str) -> Self {
        Self {
            producer,
            topic: topic.to_string(),
        }
    }

    async fn publish<T: serde::Serialize>(&self, kind: &str, payload: &T) -> Result<(), String> {
        let json = serde_json::to_string(payload).map_err(|e| e.to_string())?;
        self.producer
            .publish(&self.topic, kind, &json)
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl UsageReporter for KafkaUsageReporter {
    async fn report_booking_usage(&self, event: BookingUsageEvent) -> Result<(), String> {
        self.publish("booking_usage", &event).await
    }

    async fn report_impression_usage(&self, event: ImpressionUsageEvent) -> Result<(), String> {
        self.publish("impression_usage", &event).await
    }
}
