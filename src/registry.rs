//! Process-wide message registry
//!
//! Modes 2 and 3 carry a numeric message id on the wire; the registry maps
//! those ids back to descriptors so a receiver can decode frames without
//! knowing the type in advance. Registration normally happens once at
//! program start; reads during decode are safe under any number of
//! concurrent readers.
//!
//! Registration is idempotent: re-registering an identical descriptor
//! under the same id is a no-op, while a conflicting descriptor is
//! rejected. Entries live for the process.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use tracing::debug;

use crate::decoder;
use crate::error::{DecodeError, Result, SchemaError};
use crate::protocol::{decode_message_id, FieldValue, RoutingHeader};
use crate::schema::MessageDescriptor;

lazy_static! {
    static ref REGISTRY: RwLock<HashMap<u16, Arc<MessageDescriptor>>> = RwLock::new(HashMap::new());
}

/// A message decoded through the registry: the descriptor it was matched
/// against plus its field values in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    /// Descriptor the wire id resolved to
    pub descriptor: Arc<MessageDescriptor>,
    /// Field values in declaration order
    pub values: Vec<FieldValue>,
}

impl DecodedMessage {
    /// Message id the frame carried.
    pub fn id(&self) -> u16 {
        // Registered descriptors always carry an id.
        self.descriptor.id().unwrap_or_default()
    }

    /// Look up a field value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        let index = self
            .descriptor
            .fields()
            .iter()
            .position(|f| f.name() == name)?;
        self.values.get(index)
    }
}

/// Register a descriptor for auto-decode by id.
///
/// The descriptor must declare an id. Registering the same descriptor
/// twice succeeds; registering a different descriptor under an occupied id
/// fails.
pub fn register_message(descriptor: Arc<MessageDescriptor>) -> Result<()> {
    let id = descriptor.id().ok_or_else(|| SchemaError::MissingId {
        name: descriptor.name().to_string(),
    })?;

    let mut map = REGISTRY.write().expect("message registry lock poisoned");
    match map.get(&id) {
        Some(existing) if **existing == *descriptor => Ok(()),
        Some(_) => Err(SchemaError::ConflictingRegistration { id }.into()),
        None => {
            debug!("registered message {:?} under id {}", descriptor.name(), id);
            map.insert(id, descriptor);
            Ok(())
        }
    }
}

/// Look up a registered descriptor by id.
pub fn lookup(id: u16) -> Option<Arc<MessageDescriptor>> {
    REGISTRY
        .read()
        .expect("message registry lock poisoned")
        .get(&id)
        .cloned()
}

/// Ids currently registered, sorted. Useful in diagnostics when an unknown
/// id shows up on a link.
pub fn registered_ids() -> Vec<u16> {
    let mut ids: Vec<u16> = REGISTRY
        .read()
        .expect("message registry lock poisoned")
        .keys()
        .copied()
        .collect();
    ids.sort_unstable();
    ids
}

/// Auto-decode a mode-2 frame: read the leading varid, resolve the
/// descriptor, decode the body.
pub fn decode_by_id(data: &[u8]) -> Result<DecodedMessage> {
    let (id, consumed) = decode_message_id(data)?;
    let descriptor = lookup(id).ok_or(DecodeError::UnknownMessageId { id })?;
    let values = decoder::decode(&descriptor, &data[consumed..])?;
    Ok(DecodedMessage { descriptor, values })
}

/// Auto-decode a mode-3 frame: strip the routing header, then proceed as
/// [`decode_by_id`].
pub fn decode_routed_by_id(data: &[u8]) -> Result<(RoutingHeader, DecodedMessage)> {
    let routing = RoutingHeader::from_bytes(data)?;
    let message = decode_by_id(&data[RoutingHeader::SIZE..])?;
    Ok((routing, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode_routed, encode_with_id};
    use crate::error::SublinkError;

    // Each test registers under ids no other test uses: the registry is
    // process-wide and tests run in parallel.

    fn heartbeat(id: u16) -> Arc<MessageDescriptor> {
        Arc::new(
            MessageDescriptor::builder("Heartbeat")
                .id(id)
                .uint("depth_dm", 0, 10000)
                .uint("battery_pct", 0, 100)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_register_idempotent() {
        let desc = heartbeat(9001);
        register_message(desc.clone()).unwrap();
        register_message(desc).unwrap();
        register_message(heartbeat(9001)).unwrap();
    }

    #[test]
    fn test_register_conflict() {
        register_message(heartbeat(9002)).unwrap();
        let other = Arc::new(
            MessageDescriptor::builder("Heartbeat")
                .id(9002)
                .boolean("active")
                .build()
                .unwrap(),
        );
        let err = register_message(other).unwrap_err();
        assert_eq!(
            err,
            SublinkError::Schema(SchemaError::ConflictingRegistration { id: 9002 })
        );
    }

    #[test]
    fn test_register_requires_id() {
        let desc = Arc::new(MessageDescriptor::builder("Anon").build().unwrap());
        let err = register_message(desc).unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Schema(SchemaError::MissingId { .. })
        ));
    }

    #[test]
    fn test_decode_by_id_roundtrip() {
        let desc = heartbeat(9003);
        register_message(desc.clone()).unwrap();

        let values = vec![FieldValue::UInt(2500), FieldValue::UInt(87)];
        let wire = encode_with_id(&desc, &values).unwrap();
        let decoded = decode_by_id(&wire).unwrap();

        assert_eq!(decoded.id(), 9003);
        assert_eq!(decoded.values, values);
        assert_eq!(decoded.get("battery_pct"), Some(&FieldValue::UInt(87)));
        assert_eq!(decoded.get("missing"), None);
    }

    #[test]
    fn test_decode_by_id_unknown() {
        let wire = encode_with_id(
            &MessageDescriptor::builder("Ghost").id(9004).build().unwrap(),
            &[],
        )
        .unwrap();
        let err = decode_by_id(&wire).unwrap_err();
        assert_eq!(
            err,
            SublinkError::Decode(DecodeError::UnknownMessageId { id: 9004 })
        );
    }

    #[test]
    fn test_decode_by_id_empty_data() {
        let err = decode_by_id(&[]).unwrap_err();
        assert!(matches!(
            err,
            SublinkError::Decode(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_routed_by_id() {
        let desc = heartbeat(9005);
        register_message(desc.clone()).unwrap();

        let values = vec![FieldValue::UInt(100), FieldValue::UInt(50)];
        let routing = RoutingHeader::new(7, 0, 3, false).unwrap();
        let wire = encode_routed(&desc, &values, &routing).unwrap();

        let (header, message) = decode_routed_by_id(&wire).unwrap();
        assert_eq!(header, routing);
        assert_eq!(message.values, values);
    }

    #[test]
    fn test_registered_ids_contains_registrations() {
        register_message(heartbeat(9006)).unwrap();
        register_message(heartbeat(9007)).unwrap();
        let ids = registered_ids();
        assert!(ids.contains(&9006));
        assert!(ids.contains(&9007));
        // sorted
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_lookup_multiple_types() {
        let hb = heartbeat(9008);
        let report = Arc::new(
            MessageDescriptor::builder("BatteryReport")
                .id(9009)
                .uint("pct", 0, 100)
                .build()
                .unwrap(),
        );
        register_message(hb.clone()).unwrap();
        register_message(report.clone()).unwrap();

        assert_eq!(lookup(9008).unwrap().name(), "Heartbeat");
        assert_eq!(lookup(9009).unwrap().name(), "BatteryReport");
        assert!(lookup(9999).is_none());
    }
}
