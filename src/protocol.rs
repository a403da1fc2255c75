//! Wire-format types
//!
//! This module defines the core types shared by the encoder and decoder:
//! - Dynamic field values
//! - The 3-byte routing header used by mode 3
//! - The 1-or-2-byte variable-length message id ("varid") used by modes 2
//!   and 3
//!
//! The framing mode itself is never carried on the wire: sender and
//! receiver must agree out of band, per channel, which mode is in use.

use crate::error::{DecodeError, EncodeError};

/// Destination id denoting a broadcast to all vehicles.
pub const BROADCAST_ID: u8 = 255;

/// A field value paired with a descriptor at encode time.
///
/// The variant must match the field's [`FieldKind`](crate::FieldKind); a
/// mismatch is an encode error, never a silent coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Boolean value
    Bool(bool),
    /// Unsigned integer value
    UInt(u64),
    /// Signed integer value
    SInt(i64),
    /// Enum value by symbolic name
    Enum(String),
    /// Raw bytes for a fixed-length byte field
    Bytes(Vec<u8>),
    /// UTF-8 string for a fixed-length string field
    Str(String),
    /// Real value for a bounded float field
    Float(f64),
}

impl FieldValue {
    /// Short label of the value kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::UInt(_) => "uint",
            FieldValue::SInt(_) => "int",
            FieldValue::Enum(_) => "enum",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::Str(_) => "string",
            FieldValue::Float(_) => "float",
        }
    }
}

/// Routing header for multi-vehicle communication (mode 3).
///
/// Wire form is exactly [`RoutingHeader::SIZE`] bytes:
///
/// ```text
/// byte 0: source_id
/// byte 1: dest_id (255 = broadcast)
/// byte 2: (priority << 6) | (ack_requested << 5), bits 4..0 reserved
/// ```
///
/// Reserved bits are zero on encode and ignored on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingHeader {
    /// Source vehicle id (0-255)
    pub source_id: u8,
    /// Destination vehicle id (0-255, 255 = broadcast)
    pub dest_id: u8,
    /// Message priority (0 = low, 3 = high)
    pub priority: u8,
    /// Whether an acknowledgment is requested (advisory only)
    pub ack_requested: bool,
}

impl RoutingHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 3;

    /// Create a routing header, validating the 2-bit priority.
    pub fn new(
        source_id: u8,
        dest_id: u8,
        priority: u8,
        ack_requested: bool,
    ) -> Result<Self, EncodeError> {
        if priority > 3 {
            return Err(EncodeError::IntOutOfRange {
                field: "priority".to_string(),
                value: priority as i128,
                lo: 0,
                hi: 3,
            });
        }
        Ok(Self {
            source_id,
            dest_id,
            priority,
            ack_requested,
        })
    }

    /// Whether this header addresses all vehicles.
    pub fn is_broadcast(&self) -> bool {
        self.dest_id == BROADCAST_ID
    }

    /// Serialize to the 3-byte wire form.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let flags = (self.priority << 6) | ((self.ack_requested as u8) << 5);
        [self.source_id, self.dest_id, flags]
    }

    /// Parse the 3-byte wire form. Reserved bits in the flags byte are
    /// ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < Self::SIZE {
            return Err(DecodeError::Truncated {
                needed: Self::SIZE * 8,
                available: data.len() * 8,
            });
        }
        Ok(Self {
            source_id: data[0],
            dest_id: data[1],
            priority: (data[2] >> 6) & 0x03,
            ack_requested: (data[2] >> 5) & 0x01 != 0,
        })
    }
}

/// Encode a message id as a varid: ids 0-127 take one byte `0xxxxxxx`, ids
/// 128-32767 take two bytes `1xxxxxxx xxxxxxxx` with the remaining 15 bits
/// big-endian. This is not a general varint: exactly one or two bytes.
pub fn encode_message_id(id: u16) -> Result<Vec<u8>, EncodeError> {
    if id > crate::MAX_MESSAGE_ID {
        return Err(EncodeError::IdOutOfRange { id: id as u32 });
    }
    if id < 128 {
        Ok(vec![id as u8])
    } else {
        Ok(vec![0x80 | (id >> 8) as u8, (id & 0xFF) as u8])
    }
}

/// Decode a leading varid, returning the id and the number of bytes it
/// occupied.
pub fn decode_message_id(data: &[u8]) -> Result<(u16, usize), DecodeError> {
    let first = *data.first().ok_or(DecodeError::Truncated {
        needed: 8,
        available: 0,
    })?;
    if first & 0x80 == 0 {
        return Ok((first as u16, 1));
    }
    let second = *data.get(1).ok_or(DecodeError::Truncated {
        needed: 16,
        available: 8,
    })?;
    Ok(((((first & 0x7F) as u16) << 8) | second as u16, 2))
}
