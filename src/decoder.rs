//! Compact binary decoder
//!
//! The exact inverse of the encoder: walks the descriptor's field list in
//! declaration order, reading each field's fixed width from the bit
//! stream. Three entry points mirror the three framing modes:
//!
//! - Mode 1 ([`decode`]): the caller supplies the schema out of band.
//! - Mode 2 ([`decode_with_id`]): reads the leading varid and, when the
//!   descriptor declares an id, verifies it matches.
//! - Mode 3 ([`decode_routed`]): reads the routing header, then proceeds
//!   as mode 2 and returns the header alongside the values.
//!
//! Padding bits after the last field are never read; a strict writer pairs
//! with a lenient reader. Decoding never panics on wire input: truncation
//! and corruption surface as typed errors.

use crate::bitpack::BitUnpacker;
use crate::error::{DecodeError, Result};
use crate::protocol::{decode_message_id, FieldValue, RoutingHeader};
use crate::schema::{scaled_span, FieldDescriptor, FieldKind, MessageDescriptor};

/// Decode a message body (mode 1) against a known descriptor.
pub fn decode(descriptor: &MessageDescriptor, data: &[u8]) -> Result<Vec<FieldValue>> {
    let mut unpacker = BitUnpacker::new(data);
    let mut values = Vec::with_capacity(descriptor.fields().len());
    for field in descriptor.fields() {
        values.push(decode_field(&mut unpacker, field)?);
    }
    Ok(values)
}

/// Decode a self-describing message (mode 2). When the descriptor declares
/// an id, a mismatching wire id is an error rather than silently accepted.
pub fn decode_with_id(descriptor: &MessageDescriptor, data: &[u8]) -> Result<Vec<FieldValue>> {
    let (wire_id, consumed) = decode_message_id(data)?;
    if let Some(expected) = descriptor.id() {
        if wire_id != expected {
            return Err(DecodeError::IdMismatch {
                decoded: wire_id,
                expected,
            }
            .into());
        }
    }
    decode(descriptor, &data[consumed..])
}

/// Decode a routed message (mode 3), returning the routing header together
/// with the field values.
pub fn decode_routed(
    descriptor: &MessageDescriptor,
    data: &[u8],
) -> Result<(RoutingHeader, Vec<FieldValue>)> {
    let routing = RoutingHeader::from_bytes(data)?;
    let values = decode_with_id(descriptor, &data[RoutingHeader::SIZE..])?;
    Ok((routing, values))
}

fn decode_field(unpacker: &mut BitUnpacker, field: &FieldDescriptor) -> Result<FieldValue> {
    let width = field.width_bits() as u32;
    let value = match field.kind() {
        FieldKind::Bool => FieldValue::Bool(unpacker.read_bool()?),
        FieldKind::UInt { lo, hi } => {
            let offset = unpacker.read(width)?;
            let value = lo.checked_add(offset).filter(|v| v <= hi).ok_or_else(|| {
                DecodeError::CorruptValue {
                    field: field.name().to_string(),
                }
            })?;
            FieldValue::UInt(value)
        }
        FieldKind::SInt { lo, hi } => {
            let offset = unpacker.read(width)?;
            let value = *lo as i128 + offset as i128;
            if value > *hi as i128 {
                return Err(DecodeError::CorruptValue {
                    field: field.name().to_string(),
                }
                .into());
            }
            FieldValue::SInt(value as i64)
        }
        FieldKind::Enum { values } => {
            let ordinal = unpacker.read(width)?;
            let value = values.get(ordinal as usize).ok_or_else(|| {
                DecodeError::CorruptEnumOrdinal {
                    field: field.name().to_string(),
                    ordinal,
                    cardinality: values.len(),
                }
            })?;
            FieldValue::Enum(value.clone())
        }
        FieldKind::FixedBytes { len } => FieldValue::Bytes(unpacker.read_bytes(*len)?),
        FieldKind::FixedString { len } => {
            let mut raw = unpacker.read_bytes(*len)?;
            while raw.last() == Some(&0) {
                raw.pop();
            }
            let text = String::from_utf8(raw).map_err(|_| DecodeError::CorruptUtf8 {
                field: field.name().to_string(),
            })?;
            FieldValue::Str(text)
        }
        FieldKind::BoundedFloat {
            min,
            max,
            precision,
        } => {
            let scaled = unpacker.read(width)?;
            if scaled > scaled_span(*min, *max, *precision) {
                return Err(DecodeError::CorruptValue {
                    field: field.name().to_string(),
                }
                .into());
            }
            let scale = 10f64.powi(*precision as i32);
            FieldValue::Float(min + scaled as f64 / scale)
        }
    };
    Ok(value)
}
