// src/format.rs
//
// Reassembles raw MODBUS register words into a scalar per a point's format
// descriptor: an optional byte-order character (`>` big-endian, the
// default; `<` little-endian) followed by one of `H h I i Q q f d`,
// mirroring the `modbus_tk` struct-format convention the original worker
// passed straight through to `struct.unpack`.

use crate::error::PointFault;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Big,
    Little,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl Kind {
    fn registers(self) -> usize {
        match self {
            Kind::U16 | Kind::I16 => 1,
            Kind::U32 | Kind::I32 | Kind::F32 => 2,
            Kind::U64 | Kind::I64 | Kind::F64 => 4,
        }
    }

    fn is_integral(self) -> bool {
        !matches!(self, Kind::F32 | Kind::F64)
    }
}

struct Descriptor {
    order: ByteOrder,
    kind: Kind,
}

fn parse_descriptor(format: &str) -> Result<Descriptor, PointFault> {
    let mut chars = format.chars();
    let first = chars
        .next()
        .ok_or_else(|| PointFault::MalformedResponse("empty format descriptor".into()))?;

    let (order, type_char) = match first {
        '>' => (
            ByteOrder::Big,
            chars
                .next()
                .ok_or_else(|| PointFault::MalformedResponse("missing type character".into()))?,
        ),
        '<' => (
            ByteOrder::Little,
            chars
                .next()
                .ok_or_else(|| PointFault::MalformedResponse("missing type character".into()))?,
        ),
        other => (ByteOrder::Big, other),
    };

    if chars.next().is_some() {
        return Err(PointFault::MalformedResponse(format!(
            "trailing characters in format {format:?}"
        )));
    }

    let kind = match type_char {
        'H' => Kind::U16,
        'h' => Kind::I16,
        'I' => Kind::U32,
        'i' => Kind::I32,
        'Q' => Kind::U64,
        'q' => Kind::I64,
        'f' => Kind::F32,
        'd' => Kind::F64,
        other => {
            return Err(PointFault::MalformedResponse(format!(
                "unknown type character '{other}'"
            )))
        }
    };

    Ok(Descriptor { order, kind })
}

/// A successfully decoded value, tagged with whether its source type was
/// integral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoded {
    pub value: f64,
    pub is_integral: bool,
}

/// Reassemble `registers` (as returned by a MODBUS read, one `u16` per
/// register in protocol order) into a scalar per `format`.
pub fn decode(registers: &[u16], format: &str) -> Result<Decoded, PointFault> {
    let descriptor = parse_descriptor(format)?;

    if registers.len() != descriptor.kind.registers() {
        return Err(PointFault::MalformedResponse(format!(
            "format {format:?} expects {} register(s), got {}",
            descriptor.kind.registers(),
            registers.len()
        )));
    }

    let mut bytes = Vec::with_capacity(registers.len() * 2);
    match descriptor.order {
        ByteOrder::Big => {
            for reg in registers {
                bytes.extend_from_slice(&reg.to_be_bytes());
            }
        }
        ByteOrder::Little => {
            for reg in registers.iter().rev() {
                bytes.extend_from_slice(&reg.to_le_bytes());
            }
        }
    }

    // The register swap above already put `bytes` in big-endian-of-the-
    // whole-value order regardless of the requested byte order, so every
    // width reads big-endian from here on.
    let value = match descriptor.kind {
        Kind::U16 => u16::from_be_bytes(bytes.try_into().unwrap()) as f64,
        Kind::I16 => i16::from_be_bytes(bytes.try_into().unwrap()) as f64,
        Kind::U32 => u32::from_be_bytes(bytes.try_into().unwrap()) as f64,
        Kind::I32 => i32::from_be_bytes(bytes.try_into().unwrap()) as f64,
        Kind::U64 => u64::from_be_bytes(bytes.try_into().unwrap()) as f64,
        Kind::I64 => i64::from_be_bytes(bytes.try_into().unwrap()) as f64,
        Kind::F32 => f32::from_be_bytes(bytes.try_into().unwrap()) as f64,
        Kind::F64 => f64::from_be_bytes(bytes.try_into().unwrap()),
    };

    if !value.is_finite() {
        return Err(PointFault::MalformedResponse(format!(
            "decoded value {value} is not finite"
        )));
    }

    Ok(Decoded {
        value,
        is_integral: descriptor.kind.is_integral(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_big_endian_u16() {
        let d = decode(&[0x1234], ">H").unwrap();
        assert_eq!(d.value, 0x1234 as f64);
        assert!(d.is_integral);
    }

    #[test]
    fn defaults_to_big_endian_without_order_char() {
        let d = decode(&[0x1234], "H").unwrap();
        assert_eq!(d.value, 0x1234 as f64);
    }

    #[test]
    fn decodes_little_endian_register_order_u32() {
        // Registers swapped, each register itself little-endian.
        let big = decode(&[0x0001, 0x0000], ">I").unwrap();
        assert_eq!(big.value, 0x0001_0000 as f64);

        let little = decode(&[0x0000, 0x0001], "<I").unwrap();
        assert_eq!(little.value, 0x0001_0000 as f64);
    }

    #[test]
    fn decodes_ieee754_float() {
        // 3.0f32 = 0x40400000
        let d = decode(&[0x4040, 0x0000], ">f").unwrap();
        assert_eq!(d.value, 3.0);
        assert!(!d.is_integral);
    }

    #[test]
    fn register_count_mismatch_is_malformed() {
        let err = decode(&[0x0001], ">I").unwrap_err();
        assert!(matches!(err, PointFault::MalformedResponse(_)));
    }

    #[test]
    fn unknown_type_char_is_malformed() {
        let err = decode(&[0x0001], ">Z").unwrap_err();
        assert!(matches!(err, PointFault::MalformedResponse(_)));
    }

    #[test]
    fn empty_descriptor_is_malformed() {
        let err = decode(&[0x0001], "").unwrap_err();
        assert!(matches!(err, PointFault::MalformedResponse(_)));
    }
}
