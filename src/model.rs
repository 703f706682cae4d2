// src/model.rs
//
// Core data model: points loaded from the system DB, their decoded
// addresses, and the readings produced from sampling them each cycle.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ObjectType {
    #[serde(rename = "ANALOG_VALUE")]
    Analog,
    #[serde(rename = "ENERGY_VALUE")]
    Energy,
    #[serde(rename = "DIGITAL_VALUE")]
    Digital,
}

impl ObjectType {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "ANALOG_VALUE" => Some(Self::Analog),
            "ENERGY_VALUE" => Some(Self::Energy),
            "DIGITAL_VALUE" => Some(Self::Digital),
            _ => None,
        }
    }
}

/// A point row as loaded from `tbl_points`, frozen for the life of the
/// catalog (refreshed only by an outer-loop restart).
#[derive(Debug, Clone)]
pub struct Point {
    pub id: i64,
    #[allow(dead_code)] // informational only, not used for decoding
    pub name: String,
    pub object_type: ObjectType,
    pub is_trend: bool,
    pub ratio: Option<f64>,
    pub address_raw: String,
}

/// A point's address blob, decoded and validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub slave_id: u8,
    pub function_code: u8,
    pub offset: u16,
    pub number_of_registers: u16,
    pub format: String,
}

/// One numeric sample obtained for one point in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub data_source_id: i64,
    pub point_id: i64,
    pub is_trend: bool,
    pub object_type: ObjectType,
    pub value: f64,
    /// Whether the decoded source type was integral (drives the
    /// digital-vs-real type-match check in the historical writer).
    pub is_integral: bool,
}

/// One cycle's readings, in the order points were sampled (ascending
/// Point-ID). Readings are stored as a single
/// sequence rather than three pre-split vectors so that both the MQTT
/// publisher (which needs the whole cycle in Point-ID order) and the
/// historical writer (which needs only one kind at a time, still in
/// Point-ID order since it is a subsequence) see a consistent order.
#[derive(Debug, Default, Clone)]
pub struct CycleBatches {
    readings: Vec<Reading>,
}

impl CycleBatches {
    pub fn clear(&mut self) {
        self.readings.clear();
    }

    pub fn push(&mut self, reading: Reading) {
        self.readings.push(reading);
    }

    /// All readings in the cycle, in Point-ID ascending order.
    pub fn all(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    /// Readings of a single object type, still in Point-ID ascending order.
    pub fn of_kind(&self, kind: ObjectType) -> impl Iterator<Item = &Reading> {
        self.readings.iter().filter(move |r| r.object_type == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(point_id: i64, object_type: ObjectType) -> Reading {
        Reading {
            data_source_id: 1,
            point_id,
            is_trend: true,
            object_type,
            value: 1.0,
            is_integral: false,
        }
    }

    #[test]
    fn of_kind_preserves_point_id_order_across_interleaved_types() {
        let mut batches = CycleBatches::default();
        batches.push(reading(1, ObjectType::Digital));
        batches.push(reading(2, ObjectType::Analog));
        batches.push(reading(3, ObjectType::Digital));

        let digital_ids: Vec<_> = batches.of_kind(ObjectType::Digital).map(|r| r.point_id).collect();
        assert_eq!(digital_ids, vec![1, 3]);

        let all_ids: Vec<_> = batches.all().map(|r| r.point_id).collect();
        assert_eq!(all_ids, vec![1, 2, 3]);
    }

    #[test]
    fn clear_empties_every_kind() {
        let mut batches = CycleBatches::default();
        batches.push(reading(1, ObjectType::Energy));
        batches.clear();
        assert_eq!(batches.all().count(), 0);
    }
}
