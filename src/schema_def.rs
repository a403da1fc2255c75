//! External schema definitions
//!
//! Descriptors are normally built in code through the builder API. For
//! tooling such as the analyzer CLI, schemas can also be declared in JSON
//! and translated into validated [`MessageDescriptor`]s here:
//!
//! ```json
//! {
//!   "name": "Heartbeat",
//!   "id": 105,
//!   "max_bytes": 32,
//!   "fields": [
//!     { "type": "uint", "name": "depth_dm", "lo": 0, "hi": 10000 },
//!     { "type": "enum", "name": "mode", "values": ["idle", "survey"] },
//!     { "type": "float", "name": "temp_c", "min": -5.0, "max": 40.0, "precision": 1 },
//!     { "type": "bool", "name": "leak" }
//!   ]
//! }
//! ```
//!
//! A file may hold a single message object or an array of them. All bounds
//! validation happens in the builder; this module only changes the shape.

use serde::Deserialize;

use crate::error::{Result, SchemaError};
use crate::schema::{MessageDescriptor, MessageBuilder};

/// Serialized form of a message schema.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageDef {
    /// Message name
    pub name: String,
    /// Optional numeric message id
    #[serde(default)]
    pub id: Option<u16>,
    /// Optional advisory size limit in bytes
    #[serde(default)]
    pub max_bytes: Option<usize>,
    /// Ordered field definitions
    pub fields: Vec<FieldDef>,
}

/// Serialized form of a single field, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldDef {
    /// Boolean field
    Bool {
        /// Field name
        name: String,
    },
    /// Bounded unsigned integer field
    Uint {
        /// Field name
        name: String,
        /// Inclusive lower bound
        lo: u64,
        /// Inclusive upper bound
        hi: u64,
    },
    /// Bounded signed integer field
    Int {
        /// Field name
        name: String,
        /// Inclusive lower bound
        lo: i64,
        /// Inclusive upper bound
        hi: i64,
    },
    /// Enum field over an ordered value set
    Enum {
        /// Field name
        name: String,
        /// Ordered, distinct symbolic values
        values: Vec<String>,
    },
    /// Fixed-length byte field
    Bytes {
        /// Field name
        name: String,
        /// Length in bytes
        length: usize,
    },
    /// Fixed-length UTF-8 string field
    String {
        /// Field name
        name: String,
        /// Length in UTF-8 code units
        length: usize,
    },
    /// Bounded float field
    Float {
        /// Field name
        name: String,
        /// Inclusive lower bound
        min: f64,
        /// Inclusive upper bound
        max: f64,
        /// Decimal places to preserve (0-6)
        precision: u32,
    },
}

impl MessageDef {
    /// Translate into a validated descriptor.
    pub fn into_descriptor(self) -> Result<MessageDescriptor> {
        let mut builder = MessageDescriptor::builder(self.name);
        if let Some(id) = self.id {
            builder = builder.id(id);
        }
        if let Some(max_bytes) = self.max_bytes {
            builder = builder.max_bytes(max_bytes);
        }
        for field in self.fields {
            builder = field.apply(builder);
        }
        Ok(builder.build()?)
    }
}

impl FieldDef {
    fn apply(self, builder: MessageBuilder) -> MessageBuilder {
        match self {
            FieldDef::Bool { name } => builder.boolean(name),
            FieldDef::Uint { name, lo, hi } => builder.uint(name, lo, hi),
            FieldDef::Int { name, lo, hi } => builder.int(name, lo, hi),
            FieldDef::Enum { name, values } => builder.enumeration(name, values),
            FieldDef::Bytes { name, length } => builder.bytes(name, length),
            FieldDef::String { name, length } => builder.string(name, length),
            FieldDef::Float {
                name,
                min,
                max,
                precision,
            } => builder.float(name, min, max, precision),
        }
    }
}

/// Parse a JSON schema source holding one message definition or an array
/// of them, and translate every definition into a descriptor.
pub fn parse_schema_file(source: &str) -> Result<Vec<MessageDescriptor>> {
    let defs: Vec<MessageDef> = if source.trim_start().starts_with('[') {
        serde_json::from_str(source).map_err(unreadable)?
    } else {
        vec![serde_json::from_str(source).map_err(unreadable)?]
    };
    defs.into_iter().map(MessageDef::into_descriptor).collect()
}

fn unreadable(err: serde_json::Error) -> SchemaError {
    SchemaError::Unreadable {
        reason: err.to_string(),
    }
}
