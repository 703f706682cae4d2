// src/error.rs
//
// Typed error taxonomy for the acquisition worker: every fault the
// supervisor needs to act on is its own variant instead of a string to
// pattern-match against.

use thiserror::Error;

/// Outer-loop faults: every one of these restarts the worker from the
/// reachability probe (after its associated cooldown).
#[derive(Debug, Error)]
pub enum OuterFault {
    #[error("failed to reach {host}:{port}: {source}")]
    Unreachable {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("system database unavailable: {0}")]
    CatalogUnavailable(#[source] tokio_postgres::Error),

    #[error("data source has no points in the catalog")]
    CatalogEmpty,

    #[error("modbus request timed out: {0}")]
    ModbusTimeout(String),
}

/// Per-point faults: every one of these causes the offending point to be
/// skipped for the current cycle; the cycle continues.
#[derive(Debug, Error)]
pub enum PointFault {
    #[error("invalid address: {0}")]
    AddressInvalid(String),

    #[error("modbus error: {0}")]
    ModbusOther(String),

    #[error("malformed modbus response: {0}")]
    MalformedResponse(String),
}

/// Faults raised while flushing a cycle's readings. Logged and swallowed;
/// they never interrupt the sampling loop.
#[derive(Debug, Error)]
pub enum FlushFault {
    #[error("mqtt publish failed for point {point_id}: {source}")]
    MqttPublish {
        point_id: i64,
        #[source]
        source: rumqttc::ClientError,
    },

    #[error("historical insert failed for {table}: {source}")]
    HistoricalWrite {
        table: &'static str,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("historical database connection lost and reconnect failed: {0}")]
    HistoricalDisconnected(#[source] tokio_postgres::Error),
}

/// Startup-time configuration failure. The only error that ever bubbles out
/// of the worker — `main` logs it and exits before any worker runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
