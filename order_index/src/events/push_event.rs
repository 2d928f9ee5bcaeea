use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::order_types::Order;

/// A single message from the order push channel: `{ "type": "CONFIRMED", "order": { ... } }`.
///
/// The order is kept as raw JSON until [`PushEvent::into_order`] is called, so that an event with a broken order
/// payload can still be recognised (and discarded) without failing the whole message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub order: Option<Value>,
}

impl PushEvent {
    pub fn for_order(order: &Order) -> Self {
        Self { event_type: None, order: serde_json::to_value(order).ok() }
    }

    /// Parses a raw message body. Anything that is not a JSON object yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str::<PushEvent>(text)
            .map_err(|e| trace!("📬️ Discarding unparseable push message: {e}"))
            .ok()
    }

    /// Extracts the order carried by this event. Events without a usable order (missing, not an object, without an id
    /// or a status) yield `None`.
    pub fn into_order(self) -> Option<Order> {
        let Some(value) = self.order else {
            trace!("📬️ Discarding push event without an order");
            return None;
        };
        Order::from_value(value).map_err(|e| trace!("📬️ Discarding push event. {e}")).ok()
    }

    /// Convenience for `parse` followed by `into_order`.
    pub fn decode_order(text: &str) -> Option<Order> {
        Self::parse(text).and_then(Self::into_order)
    }
}
