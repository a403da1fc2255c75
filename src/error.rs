//! Error types for sublink
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for sublink operations
pub type Result<T> = std::result::Result<T, SublinkError>;

/// Main error type for sublink operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SublinkError {
    /// Schema rejected at construction or registration
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Encoding error
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// Decoding error
    #[error("Decoding error: {0}")]
    Decode(#[from] DecodeError),

    /// Framing error
    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),

    /// Modem transport error
    #[error("Modem error: {0}")]
    Modem(#[from] ModemError),
}

/// Errors raised when a descriptor is rejected at construction time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Integer bounds are inverted
    #[error("field {field}: invalid bounds [{lo}, {hi}]")]
    InvalidBounds { field: String, lo: i128, hi: i128 },

    /// Float bounds are inverted, equal, or not finite
    #[error("field {field}: invalid float bounds [{min}, {max}]")]
    InvalidFloatBounds { field: String, min: f64, max: f64 },

    /// Float precision above the supported maximum
    #[error("field {field}: precision {precision} exceeds maximum of 6")]
    PrecisionTooLarge { field: String, precision: u32 },

    /// Enum declared with no values
    #[error("field {field}: enum must declare at least one value")]
    EmptyEnum { field: String },

    /// Enum declared the same value twice
    #[error("field {field}: duplicate enum value {value:?}")]
    DuplicateEnumValue { field: String, value: String },

    /// Two fields share a name
    #[error("duplicate field name {name:?}")]
    DuplicateFieldName { name: String },

    /// Message id outside the representable range
    #[error("message id {id} out of range 0-32767")]
    IdOutOfRange { id: u32 },

    /// Self-describing operation on a descriptor without an id
    #[error("message {name:?} has no id; self-describing modes require one")]
    MissingId { name: String },

    /// A different descriptor is already registered under this id
    #[error("message id {id} already registered with a different descriptor")]
    ConflictingRegistration { id: u16 },

    /// Schema definition file could not be parsed
    #[error("unreadable schema definition: {reason}")]
    Unreadable { reason: String },
}

/// Errors during encoding
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// Integer value outside the field's declared bounds
    #[error("field {field}: value {value} out of range [{lo}, {hi}]")]
    IntOutOfRange {
        field: String,
        value: i128,
        lo: i128,
        hi: i128,
    },

    /// Float value outside the field's declared bounds
    #[error("field {field}: value {value} out of range [{min}, {max}]")]
    FloatOutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Value is not a member of the field's enum
    #[error("field {field}: {value:?} is not a declared enum value")]
    UnknownEnumValue { field: String, value: String },

    /// Bytes or string longer than the fixed field length
    #[error("field {field}: {len} bytes exceeds fixed length {max}")]
    TooLong {
        field: String,
        len: usize,
        max: usize,
    },

    /// Value kind does not match the field kind
    #[error("field {field}: expected {expected} value, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Value count does not match the descriptor's field count
    #[error("field count mismatch: descriptor has {expected} fields, got {actual} values")]
    FieldCountMismatch { expected: usize, actual: usize },

    /// Raw bit-level write of a value wider than the requested width
    #[error("value {value} does not fit in {bits} bits")]
    ValueTooWide { value: u64, bits: u32 },

    /// Message id outside the varid range
    #[error("message id {id} out of range 0-32767")]
    IdOutOfRange { id: u32 },

    /// Encoded body exceeds the declared maximum size
    #[error("encoded size {size} bytes exceeds limit of {max} bytes")]
    Oversize { size: usize, max: usize },
}

/// Errors during decoding
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Ran out of bits mid-decode
    #[error("truncated data: need {needed} bits, have {available}")]
    Truncated { needed: usize, available: usize },

    /// Enum ordinal beyond the declared value set
    #[error("field {field}: enum ordinal {ordinal} out of range ({cardinality} values)")]
    CorruptEnumOrdinal {
        field: String,
        ordinal: u64,
        cardinality: usize,
    },

    /// Fixed string holds invalid UTF-8
    #[error("field {field}: invalid UTF-8 in fixed string")]
    CorruptUtf8 { field: String },

    /// Decoded value lands outside the field's declared bounds
    #[error("field {field}: decoded value outside declared bounds")]
    CorruptValue { field: String },

    /// Decoded message id does not match the expected descriptor
    #[error("message id mismatch: decoded {decoded}, expected {expected}")]
    IdMismatch { decoded: u16, expected: u16 },

    /// Decoded message id is not in the registry
    #[error("unknown message id: {id}")]
    UnknownMessageId { id: u16 },
}

/// Errors during framing and unframing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FramingError {
    /// Frame shorter than its fixed overhead or declared length
    #[error("frame too short: need at least {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    /// Length prefix disagrees with the bytes actually carried
    #[error("length mismatch: prefix declares {declared} bytes, frame carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// CRC verification failed
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    BadChecksum { expected: u32, actual: u32 },

    /// Payload too large for the 16-bit length prefix
    #[error("payload of {size} bytes exceeds framing limit of {max} bytes")]
    Oversize { size: usize, max: usize },
}

/// Errors raised by modem transports
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModemError {
    /// Operation requires a connected modem
    #[error("modem is not connected")]
    NotConnected,

    /// Frame larger than the modem MTU
    #[error("frame of {size} bytes exceeds modem MTU of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },
}
