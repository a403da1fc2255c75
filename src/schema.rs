//! Message schemas
//!
//! A [`MessageDescriptor`] is the immutable schema object consumed by the
//! codec: an ordered list of [`FieldDescriptor`]s, each carrying a concrete
//! domain constraint from which its exact bit width follows. Descriptors are
//! built through [`MessageDescriptor::builder`], which validates every
//! constraint up front so that encode and decode never see an invalid
//! schema.
//!
//! Field ordering is part of the wire contract: bodies are the
//! concatenation of field encodings in declaration order.

use crate::error::SchemaError;

/// Domain constraint of a single field, from which its bit width follows.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Single bit, 0 or 1
    Bool,
    /// Unsigned integer in `lo..=hi`
    UInt { lo: u64, hi: u64 },
    /// Signed integer in `lo..=hi`
    SInt { lo: i64, hi: i64 },
    /// One of an ordered set of symbolic values, encoded by position
    Enum { values: Vec<String> },
    /// Exactly `len` bytes on the wire, short inputs zero-padded
    FixedBytes { len: usize },
    /// `len` UTF-8 code units, NUL-padded on encode, NULs stripped on decode
    FixedString { len: usize },
    /// Real value in `min..=max` discretized to `precision` decimal places
    BoundedFloat { min: f64, max: f64, precision: u32 },
}

impl FieldKind {
    /// Exact wire width in bits. A pure function of the constraint; no
    /// value ever changes it. Degenerate single-value domains take 0 bits.
    pub fn width_bits(&self) -> u64 {
        match self {
            FieldKind::Bool => 1,
            FieldKind::UInt { lo, hi } => bits_for_span(hi - lo),
            FieldKind::SInt { lo, hi } => bits_for_span((*hi as i128 - *lo as i128) as u64),
            FieldKind::Enum { values } => bits_for_span((values.len() as u64).saturating_sub(1)),
            FieldKind::FixedBytes { len } | FieldKind::FixedString { len } => *len as u64 * 8,
            FieldKind::BoundedFloat {
                min,
                max,
                precision,
            } => bits_for_span(scaled_span(*min, *max, *precision)),
        }
    }

    /// Human-readable constraint annotation for size reports.
    pub fn describe(&self) -> String {
        match self {
            FieldKind::Bool => "bool".to_string(),
            FieldKind::UInt { lo, hi } => format!("[{}-{}]", lo, hi),
            FieldKind::SInt { lo, hi } => format!("[{}-{}]", lo, hi),
            FieldKind::Enum { values } => format!("(enum: {} values)", values.len()),
            FieldKind::FixedBytes { len } => format!("(bytes[{}])", len),
            FieldKind::FixedString { len } => format!("(utf8[{}])", len),
            FieldKind::BoundedFloat {
                min,
                max,
                precision,
            } => format!("[{}-{}] @ 10^-{}", min, max, precision),
        }
    }

    fn validate(&self, field: &str) -> Result<(), SchemaError> {
        match self {
            FieldKind::Bool | FieldKind::FixedBytes { .. } | FieldKind::FixedString { .. } => Ok(()),
            FieldKind::UInt { lo, hi } => {
                if lo > hi {
                    return Err(SchemaError::InvalidBounds {
                        field: field.to_string(),
                        lo: *lo as i128,
                        hi: *hi as i128,
                    });
                }
                Ok(())
            }
            FieldKind::SInt { lo, hi } => {
                if lo > hi {
                    return Err(SchemaError::InvalidBounds {
                        field: field.to_string(),
                        lo: *lo as i128,
                        hi: *hi as i128,
                    });
                }
                Ok(())
            }
            FieldKind::Enum { values } => {
                if values.is_empty() {
                    return Err(SchemaError::EmptyEnum {
                        field: field.to_string(),
                    });
                }
                for (i, value) in values.iter().enumerate() {
                    if values[..i].contains(value) {
                        return Err(SchemaError::DuplicateEnumValue {
                            field: field.to_string(),
                            value: value.clone(),
                        });
                    }
                }
                Ok(())
            }
            FieldKind::BoundedFloat {
                min,
                max,
                precision,
            } => {
                if !min.is_finite() || !max.is_finite() || min >= max {
                    return Err(SchemaError::InvalidFloatBounds {
                        field: field.to_string(),
                        min: *min,
                        max: *max,
                    });
                }
                if *precision > 6 {
                    return Err(SchemaError::PrecisionTooLarge {
                        field: field.to_string(),
                        precision: *precision,
                    });
                }
                Ok(())
            }
        }
    }
}

/// A named field with its domain constraint. The name exists for
/// diagnostics and reports only; it is never carried on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
}

impl FieldDescriptor {
    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field constraint.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Wire width in bits.
    pub fn width_bits(&self) -> u64 {
        self.kind.width_bits()
    }
}

/// Immutable message schema: ordered fields plus optional id and size bound.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDescriptor {
    name: String,
    id: Option<u16>,
    max_bytes: Option<usize>,
    fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    /// Start building a descriptor with the given message name.
    pub fn builder(name: impl Into<String>) -> MessageBuilder {
        MessageBuilder {
            name: name.into(),
            id: None,
            max_bytes: None,
            fields: Vec::new(),
        }
    }

    /// Message name (diagnostics only).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Numeric message id, if declared. Required for modes 2 and 3.
    pub fn id(&self) -> Option<u16> {
        self.id
    }

    /// Advisory upper bound on the encoded body size in bytes.
    pub fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    /// Ordered field list.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Sum of all field widths in bits.
    pub fn body_bits(&self) -> u64 {
        self.fields.iter().map(|f| f.width_bits()).sum()
    }

    /// Encoded body size in bytes, after padding to a byte boundary.
    pub fn body_bytes(&self) -> usize {
        ((self.body_bits() + 7) / 8) as usize
    }
}

/// Builder for [`MessageDescriptor`]. All constraints are validated in
/// [`MessageBuilder::build`]; the codec consumes only valid descriptors.
#[derive(Debug)]
pub struct MessageBuilder {
    name: String,
    id: Option<u16>,
    max_bytes: Option<usize>,
    fields: Vec<FieldDescriptor>,
}

impl MessageBuilder {
    /// Set the numeric message id (0-32767).
    pub fn id(mut self, id: u16) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the advisory maximum body size in bytes.
    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Append a boolean field.
    pub fn boolean(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Bool)
    }

    /// Append an unsigned integer field bounded to `lo..=hi`.
    pub fn uint(self, name: impl Into<String>, lo: u64, hi: u64) -> Self {
        self.field(name, FieldKind::UInt { lo, hi })
    }

    /// Append a signed integer field bounded to `lo..=hi`.
    pub fn int(self, name: impl Into<String>, lo: i64, hi: i64) -> Self {
        self.field(name, FieldKind::SInt { lo, hi })
    }

    /// Append an enum field over an ordered value set.
    pub fn enumeration<I, S>(self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.field(name, FieldKind::Enum { values })
    }

    /// Append a fixed-length byte field.
    pub fn bytes(self, name: impl Into<String>, len: usize) -> Self {
        self.field(name, FieldKind::FixedBytes { len })
    }

    /// Append a fixed-length UTF-8 string field.
    pub fn string(self, name: impl Into<String>, len: usize) -> Self {
        self.field(name, FieldKind::FixedString { len })
    }

    /// Append a bounded float field with `precision` decimal places.
    pub fn float(self, name: impl Into<String>, min: f64, max: f64, precision: u32) -> Self {
        self.field(
            name,
            FieldKind::BoundedFloat {
                min,
                max,
                precision,
            },
        )
    }

    /// Append a field with an explicit kind.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            kind,
        });
        self
    }

    /// Validate every constraint and produce the immutable descriptor.
    pub fn build(self) -> Result<MessageDescriptor, SchemaError> {
        if let Some(id) = self.id {
            if id > crate::MAX_MESSAGE_ID {
                return Err(SchemaError::IdOutOfRange { id: id as u32 });
            }
        }
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateFieldName {
                    name: field.name.clone(),
                });
            }
            field.kind.validate(&field.name)?;
        }
        Ok(MessageDescriptor {
            name: self.name,
            id: self.id,
            max_bytes: self.max_bytes,
            fields: self.fields,
        })
    }
}

/// Bits needed to represent `0..=span`: `ceil(log2(span + 1))`, with a span
/// of 0 taking no bits at all.
pub(crate) fn bits_for_span(span: u64) -> u64 {
    (64 - span.leading_zeros()) as u64
}

/// Scaled integer span of a bounded float: `round((max - min) * 10^p)`.
pub(crate) fn scaled_span(min: f64, max: f64, precision: u32) -> u64 {
    round_half_even((max - min) * 10f64.powi(precision as i32)) as u64
}

/// Round half-to-even ("banker's rounding") on a non-negative value.
///
/// The only rounding mode the codec uses: a value exactly on a half-step
/// rounds to the nearest even integer, so independently built encoders
/// agree on the scaled representation.
pub(crate) fn round_half_even(x: f64) -> f64 {
    let floor = x.floor();
    let frac = x - floor;
    if frac > 0.5 {
        floor + 1.0
    } else if frac < 0.5 {
        floor
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}
