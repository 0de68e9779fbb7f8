//! Pure composition of the summary email text.

use sr_common::{EventKind, ProductEvent};

/// Subject line aggregating counts per event kind, in first-appearance
/// order: `Product activity summary: 2 products created, 1 product deleted`.
pub fn subject(events: &[ProductEvent]) -> String {
    let mut counts: Vec<(EventKind, usize)> = Vec::new();
    for event in events {
        match counts.iter_mut().find(|(kind, _)| *kind == event.kind) {
            Some((_, count)) => *count += 1,
            None => counts.push((event.kind, 1)),
        }
    }

    let parts: Vec<String> = counts
        .iter()
        .map(|(kind, count)| {
            if *count == 1 {
                format!("1 product {}", kind.label())
            } else {
                format!("{} products {}", count, kind.label())
            }
        })
        .collect();

    format!("Product activity summary: {}", parts.join(", "))
}

/// Plain-text body with one line per event, in delivery order.
pub fn body(events: &[ProductEvent]) -> String {
    let mut body = String::from(if events.len() == 1 {
        "Hello,\n\nHere is the latest change in the catalog:\n\n"
    } else {
        "Hello,\n\nHere are the latest changes in the catalog:\n\n"
    });

    for event in events {
        body.push_str(&format!(
            "- Product {} (SKU {}) was {}\n",
            event.name,
            event.sku,
            event.kind.label()
        ));
    }

    body.push_str("\nRegards,\nThe Stockroom team\n");
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, sku: i64, name: &str) -> ProductEvent {
        ProductEvent::new(kind, sku, name, "ops@example.com")
    }

    #[test]
    fn subject_counts_kinds_with_plural_wording() {
        let events = vec![
            event(EventKind::Created, 1, "Desk"),
            event(EventKind::Created, 2, "Lamp"),
            event(EventKind::Deleted, 3, "Chair"),
        ];
        assert_eq!(
            subject(&events),
            "Product activity summary: 2 products created, 1 product deleted"
        );
    }

    #[test]
    fn subject_groups_in_first_appearance_order() {
        let events = vec![
            event(EventKind::Deleted, 3, "Chair"),
            event(EventKind::Created, 1, "Desk"),
            event(EventKind::Deleted, 4, "Stool"),
        ];
        assert_eq!(
            subject(&events),
            "Product activity summary: 2 products deleted, 1 product created"
        );
    }

    #[test]
    fn body_lists_events_in_delivery_order() {
        let events = vec![
            event(EventKind::Updated, 10, "Desk"),
            event(EventKind::Created, 20, "Lamp"),
        ];
        let text = body(&events);
        let desk = text.find("Product Desk (SKU 10) was updated").unwrap();
        let lamp = text.find("Product Lamp (SKU 20) was created").unwrap();
        assert!(desk < lamp);
    }

    #[test]
    fn unknown_kind_gets_the_fallback_label() {
        let events = vec![event(EventKind::Unknown, 5, "Crate")];
        assert!(body(&events).contains("Product Crate (SKU 5) was changed"));
        assert_eq!(subject(&events), "Product activity summary: 1 product changed");
    }
}
