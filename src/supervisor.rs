// src/supervisor.rs
//
// The two nested loops: outer (reachability -> catalog -> sampling) and
// inner (one sampling cycle per iteration). This is what `main` calls; it
// runs until the process is torn down.

use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;

use crate::config::Config;
use crate::historical_writer::HistoricalWriter;
use crate::logging::WorkerLog;
use crate::model::{CycleBatches, Point};
use crate::mqtt_publisher::MqttPublisher;
use crate::{address, catalog, classify, modbus_session, reachability};

const CATALOG_RETRY_DELAY: Duration = Duration::from_secs(60);
const REACHABILITY_RETRY_DELAY: Duration = Duration::from_secs(300);
const TIMEOUT_RECOVERY_DELAY: Duration = Duration::from_secs(60);

/// Run the acquisition worker for one data source, forever.
pub async fn run(config: &Config, data_source_id: i64, host: &str, port: u16, log: &WorkerLog) -> ! {
    loop {
        if let Err(fault) = reachability::probe(host, port).await {
            log.warn(fault.to_string());
            sleep(REACHABILITY_RETRY_DELAY).await;
            continue;
        }

        let points = match catalog::load(&config.myems_system_db, data_source_id).await {
            Ok(points) => points,
            Err(fault) => {
                log.warn(fault.to_string());
                sleep(CATALOG_RETRY_DELAY).await;
                continue;
            }
        };

        sample(config, data_source_id, host, port, &points, log).await;
    }
}

/// Rebuild the sampling-loop transports and run cycles, looping here
/// (without touching reachability or the catalog) whenever the historical
/// connection needs to be rebuilt from scratch. Only returns to the outer
/// loop on a MODBUS timeout or an initial MODBUS/historical connect
/// failure.
async fn sample(config: &Config, data_source_id: i64, host: &str, port: u16, points: &[Point], log: &WorkerLog) {
    'rebuild: loop {
        let mut session = match modbus_session::ModbusSession::connect(host, port).await {
            Ok(session) => session,
            Err(fault) => {
                log.warn(fault.to_string());
                sleep(TIMEOUT_RECOVERY_DELAY).await;
                return;
            }
        };

        let mut writer = match HistoricalWriter::connect(&config.myems_historical_db).await {
            Ok(writer) => writer,
            Err(e) => {
                log.warn(format!("failed to connect to historical database: {e}"));
                sleep(TIMEOUT_RECOVERY_DELAY).await;
                return;
            }
        };

        let publisher = MqttPublisher::connect(&config.myems_mqtt_broker, data_source_id);

        let mut batches = CycleBatches::default();

        loop {
            batches.clear();
            let timed_out = run_cycle(data_source_id, points, &mut session, &mut batches, log).await;

            if timed_out {
                log.warn("modbus request timed out, tearing down transports".to_string());
                sleep(TIMEOUT_RECOVERY_DELAY).await;
                return;
            }

            publisher.publish_cycle(batches.all(), log).await;

            if let Err(fault) = writer.ensure_connected().await {
                log.warn(fault.to_string());
                sleep(TIMEOUT_RECOVERY_DELAY).await;
                continue 'rebuild;
            }
            writer.flush_cycle(&batches, Utc::now(), log).await;

            sleep(Duration::from_secs(config.periods.save_to_database)).await;
        }
    }
}

/// Sample every point once, in order. Returns `true` if a timeout occurred
/// partway through, meaning the remaining points were not attempted.
async fn run_cycle(
    data_source_id: i64,
    points: &[Point],
    session: &mut modbus_session::ModbusSession,
    batches: &mut CycleBatches,
    log: &WorkerLog,
) -> bool {
    for point in points {
        let decoded_address = match address::decode(&point.address_raw) {
            Ok(addr) => addr,
            Err(fault) => {
                log.warn(format!("point {}: {}", point.id, fault));
                continue;
            }
        };

        match session.read(&decoded_address).await {
            modbus_session::ReadOutcome::Value(decoded) => {
                classify::classify(data_source_id, point, decoded, batches);
            }
            modbus_session::ReadOutcome::Fault(fault) => {
                log.warn(format!("point {}: {}", point.id, fault));
            }
            modbus_session::ReadOutcome::Timeout => {
                return true;
            }
        }
    }
    false
}
