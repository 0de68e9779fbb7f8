use serde::{Deserialize, Serialize};

/// Default queue the platform publishes product events to and the notifier
/// consumes from.
pub const DEFAULT_EVENTS_QUEUE: &str = "product_events";

// ============================================================================
// Product Events
// ============================================================================

/// What happened to a product. Wire values match the platform's publishers;
/// anything else deserializes to `Unknown` rather than failing the delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "product_created")]
    Created,
    #[serde(rename = "product_updated")]
    Updated,
    #[serde(rename = "product_deleted")]
    Deleted,
    #[serde(other, rename = "unknown")]
    Unknown,
}

impl EventKind {
    /// Past-participle label used in notification text. Exhaustive on
    /// purpose: a new kind does not compile until it has a label.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Deleted => "deleted",
            EventKind::Unknown => "changed",
        }
    }
}

/// One product change as published to the events queue.
///
/// The same type is serialized by the platform services and decoded by the
/// batching consumer, so the wire schema lives in exactly one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEvent {
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub sku: i64,
    pub name: String,
    /// Recipient for the batched summary email. Empty when the producer had
    /// no authenticated user to attribute the change to.
    #[serde(rename = "responsible_email", default)]
    pub notify_address: String,
}

impl ProductEvent {
    pub fn new(
        kind: EventKind,
        sku: i64,
        name: impl Into<String>,
        notify_address: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            sku,
            name: name.into(),
            notify_address: notify_address.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_round_trips_wire_names() {
        let json = serde_json::to_string(&EventKind::Created).unwrap();
        assert_eq!(json, "\"product_created\"");
        let kind: EventKind = serde_json::from_str("\"product_deleted\"").unwrap();
        assert_eq!(kind, EventKind::Deleted);
    }

    #[test]
    fn unrecognized_kind_falls_back_to_unknown() {
        let kind: EventKind = serde_json::from_str("\"product_archived\"").unwrap();
        assert_eq!(kind, EventKind::Unknown);
        assert_eq!(kind.label(), "changed");
    }

    #[test]
    fn missing_notify_address_defaults_to_empty() {
        let event: ProductEvent =
            serde_json::from_str(r#"{"event":"product_created","sku":7,"name":"Lamp"}"#).unwrap();
        assert_eq!(event.sku, 7);
        assert!(event.notify_address.is_empty());
    }
}
