//! Compact binary encoder
//!
//! The encoder walks a message's ordered field list and emits each value
//! into a single bit stream using the exact width its constraint allows,
//! then pads to a byte boundary. Three framing modes layer on top of the
//! resulting body:
//!
//! - Mode 1 ([`encode`]): the body alone, for point-to-point links where
//!   both ends know the schema.
//! - Mode 2 ([`encode_with_id`]): a varid-prefixed body, self-describing
//!   against a registry.
//! - Mode 3 ([`encode_routed`]): a 3-byte routing header, then the varid,
//!   then the body.
//!
//! Encoding is a pure function of the descriptor and values: identical
//! inputs produce byte-identical output on every platform. On any error
//! no bytes are produced.

use crate::bitpack::BitPacker;
use crate::error::{EncodeError, Result, SchemaError};
use crate::protocol::{encode_message_id, FieldValue, RoutingHeader};
use crate::schema::{round_half_even, scaled_span, FieldDescriptor, FieldKind, MessageDescriptor};

/// Encode a message body (mode 1): field encodings concatenated in
/// declaration order, zero-padded to the next byte boundary.
pub fn encode(descriptor: &MessageDescriptor, values: &[FieldValue]) -> Result<Vec<u8>> {
    // The body size is a pure function of the descriptor, so the advisory
    // limit can be enforced before any bits are produced.
    if let Some(max) = descriptor.max_bytes() {
        let size = descriptor.body_bytes();
        if size > max {
            return Err(EncodeError::Oversize { size, max }.into());
        }
    }
    if values.len() != descriptor.fields().len() {
        return Err(EncodeError::FieldCountMismatch {
            expected: descriptor.fields().len(),
            actual: values.len(),
        }
        .into());
    }

    let mut packer = BitPacker::new();
    for (field, value) in descriptor.fields().iter().zip(values) {
        encode_field(&mut packer, field, value)?;
    }
    let (bytes, _) = packer.finish();
    Ok(bytes)
}

/// Encode a self-describing message (mode 2): `varid(id) ‖ body`. The
/// descriptor must declare an id.
pub fn encode_with_id(descriptor: &MessageDescriptor, values: &[FieldValue]) -> Result<Vec<u8>> {
    let id = descriptor.id().ok_or_else(|| SchemaError::MissingId {
        name: descriptor.name().to_string(),
    })?;
    let body = encode(descriptor, values)?;
    let mut out = encode_message_id(id)?;
    out.extend_from_slice(&body);
    Ok(out)
}

/// Encode a routed message (mode 3): `routing ‖ varid(id) ‖ body`.
pub fn encode_routed(
    descriptor: &MessageDescriptor,
    values: &[FieldValue],
    routing: &RoutingHeader,
) -> Result<Vec<u8>> {
    let tagged = encode_with_id(descriptor, values)?;
    let mut out = Vec::with_capacity(RoutingHeader::SIZE + tagged.len());
    out.extend_from_slice(&routing.to_bytes());
    out.extend_from_slice(&tagged);
    Ok(out)
}

fn encode_field(
    packer: &mut BitPacker,
    field: &FieldDescriptor,
    value: &FieldValue,
) -> Result<()> {
    let width = field.width_bits() as u32;
    match (field.kind(), value) {
        (FieldKind::Bool, FieldValue::Bool(v)) => {
            packer.write_bool(*v);
        }
        (FieldKind::UInt { lo, hi }, FieldValue::UInt(v)) => {
            if v < lo || v > hi {
                return Err(out_of_range(field, *v as i128, *lo as i128, *hi as i128));
            }
            packer.write(v - lo, width)?;
        }
        (FieldKind::SInt { lo, hi }, FieldValue::SInt(v)) => {
            if v < lo || v > hi {
                return Err(out_of_range(field, *v as i128, *lo as i128, *hi as i128));
            }
            // The shifted offset is always non-negative and fits u64.
            let offset = (*v as i128 - *lo as i128) as u64;
            packer.write(offset, width)?;
        }
        (FieldKind::Enum { values }, FieldValue::Enum(v)) => {
            let ordinal = values
                .iter()
                .position(|candidate| candidate == v)
                .ok_or_else(|| EncodeError::UnknownEnumValue {
                    field: field.name().to_string(),
                    value: v.clone(),
                })?;
            packer.write(ordinal as u64, width)?;
        }
        (FieldKind::FixedBytes { len }, FieldValue::Bytes(v)) => {
            write_padded(packer, field, v, *len)?;
        }
        (FieldKind::FixedString { len }, FieldValue::Str(v)) => {
            // Rejecting over-length input up front also guarantees no
            // multi-byte code point is ever split at the boundary.
            write_padded(packer, field, v.as_bytes(), *len)?;
        }
        (
            FieldKind::BoundedFloat {
                min,
                max,
                precision,
            },
            FieldValue::Float(v),
        ) => {
            // Bounds are checked on the real value, before rounding; the
            // negated comparison also rejects NaN.
            if !(*v >= *min && *v <= *max) {
                return Err(EncodeError::FloatOutOfRange {
                    field: field.name().to_string(),
                    value: *v,
                    min: *min,
                    max: *max,
                }
                .into());
            }
            let scale = 10f64.powi(*precision as i32);
            let scaled = round_half_even((v - min) * scale) as u64;
            // A value equal to max may round one step past the span.
            let scaled = scaled.min(scaled_span(*min, *max, *precision));
            packer.write(scaled, width)?;
        }
        (kind, value) => {
            return Err(EncodeError::TypeMismatch {
                field: field.name().to_string(),
                expected: kind_label(kind),
                actual: value.kind_name(),
            }
            .into());
        }
    }
    Ok(())
}

fn write_padded(
    packer: &mut BitPacker,
    field: &FieldDescriptor,
    data: &[u8],
    len: usize,
) -> Result<()> {
    if data.len() > len {
        return Err(EncodeError::TooLong {
            field: field.name().to_string(),
            len: data.len(),
            max: len,
        }
        .into());
    }
    packer.write_bytes(data);
    for _ in data.len()..len {
        packer.write_bytes(&[0x00]);
    }
    Ok(())
}

fn out_of_range(field: &FieldDescriptor, value: i128, lo: i128, hi: i128) -> crate::SublinkError {
    EncodeError::IntOutOfRange {
        field: field.name().to_string(),
        value,
        lo,
        hi,
    }
    .into()
}

pub(crate) fn kind_label(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Bool => "bool",
        FieldKind::UInt { .. } => "uint",
        FieldKind::SInt { .. } => "int",
        FieldKind::Enum { .. } => "enum",
        FieldKind::FixedBytes { .. } => "bytes",
        FieldKind::FixedString { .. } => "string",
        FieldKind::BoundedFloat { .. } => "float",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SublinkError;

    fn status_descriptor() -> MessageDescriptor {
        MessageDescriptor::builder("Status")
            .uint("vehicle_id", 0, 255)
            .uint("depth_dm", 0, 10000)
            .uint("battery_pct", 0, 100)
            .boolean("active")
            .build()
            .unwrap()
    }

    #[test]
    fn test_known_byte_layout() {
        // 42 in 8 bits, 2500 in 14, 87 in 7, true in 1, then 2 pad bits.
        let body = encode(
            &status_descriptor(),
            &[
                FieldValue::UInt(42),
                FieldValue::UInt(2500),
                FieldValue::UInt(87),
                FieldValue::Bool(true),
            ],
        )
        .unwrap();
        assert_eq!(body, vec![0x2A, 0x27, 0x12, 0xBC]);
    }

    #[test]
    fn test_determinism() {
        let values = [
            FieldValue::UInt(17),
            FieldValue::UInt(9999),
            FieldValue::UInt(3),
            FieldValue::Bool(false),
        ];
        let a = encode(&status_descriptor(), &values).unwrap();
        let b = encode(&status_descriptor(), &values).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_uint_out_of_range() {
        let desc = MessageDescriptor::builder("M").uint("x", 10, 20).build().unwrap();
        let err = encode(&desc, &[FieldValue::UInt(21)]).unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Encode(EncodeError::IntOutOfRange { .. })
        ));
        let err = encode(&desc, &[FieldValue::UInt(9)]).unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Encode(EncodeError::IntOutOfRange { .. })
        ));
    }

    #[test]
    fn test_sint_offset_encoding() {
        let desc = MessageDescriptor::builder("M").int("t", -40, 85).build().unwrap();
        // span 125 -> 7 bits; -40 encodes as offset 0
        let body = encode(&desc, &[FieldValue::SInt(-40)]).unwrap();
        assert_eq!(body, vec![0x00]);
        let body = encode(&desc, &[FieldValue::SInt(0)]).unwrap();
        assert_eq!(body, vec![40 << 1]);
    }

    #[test]
    fn test_enum_ordinal_encoding() {
        let desc = MessageDescriptor::builder("M")
            .enumeration("mode", ["idle", "transit", "survey", "surface"])
            .build()
            .unwrap();
        let body = encode(&desc, &[FieldValue::Enum("survey".to_string())]).unwrap();
        assert_eq!(body, vec![0b1000_0000]);

        let err = encode(&desc, &[FieldValue::Enum("dive".to_string())]).unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Encode(EncodeError::UnknownEnumValue { .. })
        ));
    }

    #[test]
    fn test_zero_width_fields_emit_nothing() {
        let desc = MessageDescriptor::builder("M")
            .uint("constant", 7, 7)
            .enumeration("only", ["single"])
            .boolean("flag")
            .build()
            .unwrap();
        let body = encode(
            &desc,
            &[
                FieldValue::UInt(7),
                FieldValue::Enum("single".to_string()),
                FieldValue::Bool(true),
            ],
        )
        .unwrap();
        assert_eq!(body, vec![0b1000_0000]);
    }

    #[test]
    fn test_bytes_padding_and_limit() {
        let desc = MessageDescriptor::builder("M").bytes("tag", 4).build().unwrap();
        let body = encode(&desc, &[FieldValue::Bytes(vec![0xAA, 0xBB])]).unwrap();
        assert_eq!(body, vec![0xAA, 0xBB, 0x00, 0x00]);

        let err = encode(&desc, &[FieldValue::Bytes(vec![0; 5])]).unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Encode(EncodeError::TooLong { .. })
        ));
    }

    #[test]
    fn test_string_padding_and_limit() {
        let desc = MessageDescriptor::builder("M").string("name", 6).build().unwrap();
        let body = encode(&desc, &[FieldValue::Str("alvin".to_string())]).unwrap();
        assert_eq!(body, b"alvin\x00");

        // four 2-byte code points exceed a 6-byte field by UTF-8 length
        let err = encode(&desc, &[FieldValue::Str("αβγδ".to_string())]).unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Encode(EncodeError::TooLong { .. })
        ));
    }

    #[test]
    fn test_float_scaling() {
        let desc = MessageDescriptor::builder("M")
            .float("depth", -5.0, 100.0, 2)
            .build()
            .unwrap();
        // 25.75 -> scaled 3075 in 14 bits: 00110000000011 + 2 pad bits
        let body = encode(&desc, &[FieldValue::Float(25.75)]).unwrap();
        assert_eq!(body, vec![0b0011_0000, 0b0000_1100]);
    }

    #[test]
    fn test_float_bounds_checked_before_rounding() {
        let desc = MessageDescriptor::builder("M")
            .float("x", 0.0, 10.0, 0)
            .build()
            .unwrap();
        // 10.4 would round into range, but the real value is out of bounds.
        let err = encode(&desc, &[FieldValue::Float(10.4)]).unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Encode(EncodeError::FloatOutOfRange { .. })
        ));
        let err = encode(&desc, &[FieldValue::Float(f64::NAN)]).unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Encode(EncodeError::FloatOutOfRange { .. })
        ));
    }

    #[test]
    fn test_float_max_value_encodes() {
        let desc = MessageDescriptor::builder("M")
            .float("x", -0.05, 0.25, 1)
            .build()
            .unwrap();
        // Rounding jitter near max must not push the scaled value out.
        encode(&desc, &[FieldValue::Float(0.25)]).unwrap();
    }

    #[test]
    fn test_type_mismatch() {
        let desc = MessageDescriptor::builder("M").boolean("flag").build().unwrap();
        let err = encode(&desc, &[FieldValue::UInt(1)]).unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Encode(EncodeError::TypeMismatch {
                expected: "bool",
                actual: "uint",
                ..
            })
        ));
    }

    #[test]
    fn test_field_count_mismatch() {
        let err = encode(&status_descriptor(), &[FieldValue::UInt(1)]).unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Encode(EncodeError::FieldCountMismatch {
                expected: 4,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_max_bytes_pre_encode_check() {
        let desc = MessageDescriptor::builder("M")
            .max_bytes(2)
            .uint("a", 0, 255)
            .uint("b", 0, 255)
            .uint("c", 0, 255)
            .build()
            .unwrap();
        let err = encode(
            &desc,
            &[FieldValue::UInt(1), FieldValue::UInt(2), FieldValue::UInt(3)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Encode(EncodeError::Oversize { size: 3, max: 2 })
        ));
    }

    #[test]
    fn test_mode2_prefix() {
        let desc = MessageDescriptor::builder("Ping").id(42).build().unwrap();
        assert_eq!(encode_with_id(&desc, &[]).unwrap(), vec![0x2A]);

        let desc = MessageDescriptor::builder("Ping").id(200).build().unwrap();
        assert_eq!(encode_with_id(&desc, &[]).unwrap(), vec![0x80, 0xC8]);
    }

    #[test]
    fn test_mode2_requires_id() {
        let desc = MessageDescriptor::builder("Anon").build().unwrap();
        let err = encode_with_id(&desc, &[]).unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Schema(SchemaError::MissingId { .. })
        ));
    }

    #[test]
    fn test_mode3_wire_layout() {
        let desc = MessageDescriptor::builder("Ping").id(10).build().unwrap();
        let routing = RoutingHeader::new(3, 0, 2, true).unwrap();
        let wire = encode_routed(&desc, &[], &routing).unwrap();
        assert_eq!(wire, vec![0x03, 0x00, 0xA0, 0x0A]);
    }

    #[test]
    fn test_mode_prefix_independence() {
        let desc = MessageDescriptor::builder("Status")
            .id(300)
            .uint("x", 0, 4095)
            .build()
            .unwrap();
        let values = [FieldValue::UInt(1234)];
        let body = encode(&desc, &values).unwrap();
        let mode2 = encode_with_id(&desc, &values).unwrap();
        let routing = RoutingHeader::new(1, 2, 0, false).unwrap();
        let mode3 = encode_routed(&desc, &values, &routing).unwrap();

        assert!(mode2.ends_with(&body));
        assert!(mode3.ends_with(&body));
        assert_eq!(&mode3[RoutingHeader::SIZE..], &mode2[..]);
    }
}
