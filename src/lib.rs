// src/lib.rs
//
// Acquisition worker for a single MODBUS/TCP data source: polls points on
// a schedule, publishes every reading to MQTT, and trends the subset
// marked for historical storage.

pub mod address;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod format;
pub mod historical_writer;
pub mod logging;
pub mod model;
pub mod modbus_session;
pub mod mqtt_publisher;
pub mod reachability;
pub mod supervisor;

pub use supervisor::run;
