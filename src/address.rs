// src/address.rs
//
// Parses a point's `address` blob (a JSON object) into a validated
// `Address`, or reports exactly which field made it invalid.

use serde::Deserialize;

use crate::error::PointFault;
use crate::model::Address;

#[derive(Debug, Deserialize)]
struct RawAddress {
    slave_id: i64,
    function_code: i64,
    offset: i64,
    number_of_registers: i64,
    #[serde(default)]
    format: String,
}

/// Parse and validate a point's address blob.
///
/// Every rejection is a `PointFault::AddressInvalid` naming the offending
/// field; callers skip the point and continue the cycle.
pub fn decode(address_raw: &str) -> Result<Address, PointFault> {
    let raw: RawAddress = serde_json::from_str(address_raw)
        .map_err(|e| PointFault::AddressInvalid(format!("not a valid address object: {e}")))?;

    if raw.slave_id < 1 || raw.slave_id > u8::MAX as i64 {
        return Err(PointFault::AddressInvalid(format!(
            "slave_id {} out of range",
            raw.slave_id
        )));
    }
    if !(1..=4).contains(&raw.function_code) {
        return Err(PointFault::AddressInvalid(format!(
            "function_code {} not in {{1,2,3,4}}",
            raw.function_code
        )));
    }
    if raw.offset < 0 || raw.offset > u16::MAX as i64 {
        return Err(PointFault::AddressInvalid(format!(
            "offset {} out of range",
            raw.offset
        )));
    }
    if raw.number_of_registers < 0 || raw.number_of_registers > u16::MAX as i64 {
        return Err(PointFault::AddressInvalid(format!(
            "number_of_registers {} out of range",
            raw.number_of_registers
        )));
    }
    if raw.format.trim().is_empty() {
        return Err(PointFault::AddressInvalid("empty format descriptor".into()));
    }

    Ok(Address {
        slave_id: raw.slave_id as u8,
        function_code: raw.function_code as u8,
        offset: raw.offset as u16,
        number_of_registers: raw.number_of_registers as u16,
        format: raw.format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(function_code: i64, number_of_registers: i64, format: &str) -> String {
        format!(
            r#"{{"slave_id":1,"function_code":{},"offset":0,"number_of_registers":{},"format":"{}"}}"#,
            function_code, number_of_registers, format
        )
    }

    #[test]
    fn valid_address_decodes() {
        let addr = decode(&blob(3, 2, ">f")).unwrap();
        assert_eq!(addr.function_code, 3);
        assert_eq!(addr.number_of_registers, 2);
        assert_eq!(addr.format, ">f");
    }

    #[test]
    fn function_code_out_of_range_is_rejected() {
        let err = decode(&blob(9, 1, ">H")).unwrap_err();
        assert!(matches!(err, PointFault::AddressInvalid(_)));
    }

    #[test]
    fn empty_format_is_rejected() {
        let err = decode(&blob(3, 1, "")).unwrap_err();
        assert!(matches!(err, PointFault::AddressInvalid(_)));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = decode("not json").unwrap_err();
        assert!(matches!(err, PointFault::AddressInvalid(_)));
    }

    #[test]
    fn negative_offset_is_rejected() {
        let raw = r#"{"slave_id":1,"function_code":3,"offset":-1,"number_of_registers":1,"format":">H"}"#;
        let err = decode(raw).unwrap_err();
        assert!(matches!(err, PointFault::AddressInvalid(_)));
    }
}
