// src/mqtt_publisher.rs
//
// A single long-lived MQTT client per sampling loop. A background task
// continuously drives the event loop (rumqttc handles reconnection
// internally) and flips a connectivity flag on connect/disconnect; publish
// is gated on that flag rather than queued or retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Serialize;
use tokio::time::Duration;

use crate::config::MqttBrokerConfig;
use crate::error::FlushFault;
use crate::logging::WorkerLog;
use crate::model::Reading;

#[derive(Serialize)]
struct Payload {
    data_source_id: i64,
    point_id: i64,
    value: f64,
}

pub struct MqttPublisher {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
}

impl MqttPublisher {
    /// Connect to the broker and start the background driver task. The
    /// client ID is the data source ID plus the connect-time Unix
    /// timestamp, unique enough across this worker's own reconnects.
    pub fn connect(config: &MqttBrokerConfig, data_source_id: i64) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let client_id = format!("{data_source_id}-{now}");

        let mut options = MqttOptions::new(client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_credentials(&config.username, &config.password);

        let (client, mut eventloop) = AsyncClient::new(options, 100);
        let connected = Arc::new(AtomicBool::new(false));

        let connected_writer = connected.clone();
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        connected_writer.store(true, Ordering::Relaxed);
                    }
                    Ok(_) => {}
                    Err(_) => {
                        connected_writer.store(false, Ordering::Relaxed);
                    }
                }
            }
        });

        Self { client, connected }
    }

    /// Publish every reading in the cycle, in order. Silently drops all of
    /// them if the connectivity flag is currently clear.
    pub async fn publish_cycle<'a>(
        &self,
        readings: impl Iterator<Item = &'a Reading>,
        log: &WorkerLog,
    ) {
        if !self.connected.load(Ordering::Relaxed) {
            return;
        }

        for reading in readings {
            if let Err(fault) = self.publish_one(reading).await {
                log.warn(fault.to_string());
            }
        }
    }

    async fn publish_one(&self, reading: &Reading) -> Result<(), FlushFault> {
        let topic = format!("myems/point/{}", reading.point_id);
        let payload = Payload {
            data_source_id: reading.data_source_id,
            point_id: reading.point_id,
            value: reading.value,
        };
        // Readings only ever hold finite values (format::decode rejects
        // NaN/infinite results before a Reading is built).
        let body = serde_json::to_vec(&payload).unwrap_or_default();

        self.client
            .publish(topic, QoS::AtMostOnce, true, body)
            .await
            .map_err(|source| FlushFault::MqttPublish {
                point_id: reading.point_id,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_with_expected_keys() {
        let payload = Payload {
            data_source_id: 7,
            point_id: 1,
            value: 7.0,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"data_source_id\":7"));
        assert!(json.contains("\"point_id\":1"));
        assert!(json.contains("\"value\":7.0"));
    }
}
