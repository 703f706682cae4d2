// src/historical_writer.rs
//
// Holds one connection to the historical database for the life of the
// sampling loop, and bulk-inserts each cycle's trend-flagged readings.

use chrono::{DateTime, Utc};
use tokio_postgres::{Client, NoTls};

use crate::config::DbConfig;
use crate::error::FlushFault;
use crate::logging::WorkerLog;
use crate::model::{CycleBatches, ObjectType};

struct Kind {
    table: &'static str,
    object_type: ObjectType,
    wants_integral: bool,
}

const KINDS: [Kind; 3] = [
    Kind { table: "tbl_analog_value", object_type: ObjectType::Analog, wants_integral: false },
    Kind { table: "tbl_energy_value", object_type: ObjectType::Energy, wants_integral: false },
    Kind { table: "tbl_digital_value", object_type: ObjectType::Digital, wants_integral: true },
];

pub struct HistoricalWriter {
    config: DbConfig,
    client: Client,
}

impl HistoricalWriter {
    pub async fn connect(config: &DbConfig) -> Result<Self, tokio_postgres::Error> {
        let client = open(config).await?;
        Ok(Self { config: config.clone(), client })
    }

    /// Probe liveness with a trivial query; on failure, reconnect once.
    /// Returns `HistoricalDisconnected` only when the reconnect itself
    /// fails, signalling the caller to tear the sampling loop down.
    pub async fn ensure_connected(&mut self) -> Result<(), FlushFault> {
        if self.client.simple_query("SELECT 1").await.is_ok() {
            return Ok(());
        }
        match open(&self.config).await {
            Ok(client) => {
                self.client = client;
                Ok(())
            }
            Err(e) => Err(FlushFault::HistoricalDisconnected(e)),
        }
    }

    /// Insert this cycle's qualifying rows, one transaction per kind.
    /// Failures for one kind are logged and swallowed; other kinds still
    /// attempt.
    pub async fn flush_cycle(&mut self, batches: &CycleBatches, captured_at: DateTime<Utc>, log: &WorkerLog) {
        for kind in &KINDS {
            let rows = select_rows(batches, kind);

            if rows.is_empty() {
                continue;
            }

            if let Err(e) = insert_rows(&mut self.client, kind, &rows, captured_at).await {
                log.warn(
                    FlushFault::HistoricalWrite {
                        table: kind.table,
                        source: e,
                    }
                    .to_string(),
                );
            }
        }
    }
}

fn select_rows<'a>(batches: &'a CycleBatches, kind: &Kind) -> Vec<&'a crate::model::Reading> {
    batches
        .of_kind(kind.object_type)
        .filter(|r| r.is_trend && r.is_integral == kind.wants_integral)
        .collect()
}

async fn open(config: &DbConfig) -> Result<Client, tokio_postgres::Error> {
    let (client, connection) = tokio_postgres::connect(&config.to_connection_string(), NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("historical database connection error: {e}");
        }
    });
    Ok(client)
}

async fn insert_rows(
    client: &mut Client,
    kind: &Kind,
    rows: &[&crate::model::Reading],
    captured_at: DateTime<Utc>,
) -> Result<(), tokio_postgres::Error> {
    let tx = client.transaction().await?;

    let mut query = format!("INSERT INTO {} (point_id, utc_date_time, actual_value) VALUES ", kind.table);
    let mut params: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = Vec::with_capacity(rows.len() * 3);

    // `actual_value` is FLOAT8 for analog/energy and an integral type for
    // digital; tokio-postgres infers the bind type from the target column,
    // so the bound Rust value must match or the insert fails outright.
    let values: Vec<Box<dyn tokio_postgres::types::ToSql + Sync>> = rows
        .iter()
        .map(|r| -> Box<dyn tokio_postgres::types::ToSql + Sync> {
            if kind.wants_integral {
                Box::new(r.value as i64)
            } else {
                Box::new(r.value)
            }
        })
        .collect();

    for (i, reading) in rows.iter().enumerate() {
        if i > 0 {
            query.push(',');
        }
        let base = i * 3;
        query.push_str(&format!("(${}, ${}, ${})", base + 1, base + 2, base + 3));
        params.push(&reading.point_id);
        params.push(&captured_at);
        params.push(values[i].as_ref());
    }

    tx.execute(query.as_str(), &params).await?;
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reading;

    #[tokio::test]
    async fn connect_to_unreachable_host_fails() {
        let config = DbConfig {
            host: "127.0.0.1".into(),
            port: 1,
            database: "nope".into(),
            username: "nope".into(),
            password: "nope".into(),
        };
        assert!(HistoricalWriter::connect(&config).await.is_err());
    }

    fn reading(point_id: i64, object_type: ObjectType, is_trend: bool, is_integral: bool) -> Reading {
        Reading {
            data_source_id: 1,
            point_id,
            is_trend,
            object_type,
            value: 1.0,
            is_integral,
        }
    }

    #[test]
    fn non_trend_points_are_never_selected() {
        let mut batches = CycleBatches::default();
        batches.push(reading(1, ObjectType::Analog, false, false));
        let rows = select_rows(&batches, &KINDS[0]);
        assert!(rows.is_empty());
    }

    #[test]
    fn analog_insert_skips_readings_that_decoded_as_integral() {
        let mut batches = CycleBatches::default();
        batches.push(reading(1, ObjectType::Analog, true, true));
        let rows = select_rows(&batches, &KINDS[0]);
        assert!(rows.is_empty(), "an analog reading that decoded as integral must be dropped, not coerced");
    }

    #[test]
    fn digital_insert_only_takes_integral_readings() {
        let mut batches = CycleBatches::default();
        batches.push(reading(1, ObjectType::Digital, true, false));
        batches.push(reading(2, ObjectType::Digital, true, true));
        let rows = select_rows(&batches, &KINDS[2]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].point_id, 2);
    }

    #[test]
    fn mqtt_connectivity_has_no_bearing_on_which_rows_are_selected() {
        // select_rows never looks at the MQTT connectivity flag; trend
        // inserts happen regardless of whether publication succeeded.
        let mut batches = CycleBatches::default();
        batches.push(reading(1, ObjectType::Energy, true, false));
        let rows = select_rows(&batches, &KINDS[1]);
        assert_eq!(rows.len(), 1);
    }
}
