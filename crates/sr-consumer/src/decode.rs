//! Decoding of raw queue payloads into typed product events.

use sr_common::ProductEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid event payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse one delivery payload.
///
/// Malformed JSON and missing required fields both fail; the caller requeues
/// the original delivery so the broker can retry or dead-letter it. A decode
/// failure is never fatal to the consumer loop.
pub fn decode(payload: &[u8]) -> Result<ProductEvent, DecodeError> {
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sr_common::EventKind;

    #[test]
    fn decodes_well_formed_event() {
        let payload = br#"{"event":"product_updated","sku":42,"name":"Desk","responsible_email":"ops@example.com"}"#;
        let event = decode(payload).unwrap();
        assert_eq!(event.kind, EventKind::Updated);
        assert_eq!(event.sku, 42);
        assert_eq!(event.name, "Desk");
        assert_eq!(event.notify_address, "ops@example.com");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(decode(b"not json at all").is_err());
    }

    #[test]
    fn rejects_missing_required_fields() {
        // no sku
        let payload = br#"{"event":"product_created","name":"Desk"}"#;
        assert!(decode(payload).is_err());
    }

    #[test]
    fn unknown_kind_is_not_a_decode_failure() {
        let payload = br#"{"event":"product_restocked","sku":1,"name":"Desk"}"#;
        let event = decode(payload).unwrap();
        assert_eq!(event.kind, EventKind::Unknown);
    }
}
