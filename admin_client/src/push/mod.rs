//! The live order update channel
//!
//! Order events are pushed over a WebSocket, either wrapped in STOMP frames (a broker topic) or as bare JSON text
//! messages. Either way each event decodes to an order that is published into an [`order_index::events::UpdateFeed`].
pub mod stomp;
mod subscription;

pub use subscription::subscribe;
