// src/classify.rs
//
// Applies the ratio and routes a decoded value into the cycle's batch,
// keyed by the point's object type.

use crate::format::Decoded;
use crate::model::{CycleBatches, Point, Reading};

/// Scale `decoded` by `point.ratio` (when present) and append the
/// resulting Reading to `batches`.
pub fn classify(data_source_id: i64, point: &Point, decoded: Decoded, batches: &mut CycleBatches) {
    let value = match point.ratio {
        Some(ratio) => decoded.value * ratio,
        None => decoded.value,
    };

    batches.push(Reading {
        data_source_id,
        point_id: point.id,
        is_trend: point.is_trend,
        object_type: point.object_type,
        value,
        is_integral: decoded.is_integral,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectType;

    fn point(ratio: Option<f64>) -> Point {
        Point {
            id: 1,
            name: "p".into(),
            object_type: ObjectType::Analog,
            is_trend: true,
            ratio,
            address_raw: String::new(),
        }
    }

    #[test]
    fn ratio_is_applied_when_present() {
        let mut batches = CycleBatches::default();
        classify(1, &point(Some(2.0)), Decoded { value: 3.5, is_integral: false }, &mut batches);
        let reading = batches.all().next().unwrap();
        assert_eq!(reading.value, 7.0);
    }

    #[test]
    fn no_ratio_leaves_value_unchanged() {
        let mut batches = CycleBatches::default();
        classify(1, &point(None), Decoded { value: 3.5, is_integral: false }, &mut batches);
        let reading = batches.all().next().unwrap();
        assert_eq!(reading.value, 3.5);
    }
}
