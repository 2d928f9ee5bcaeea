//! Order Status Index
//!
//! The in-memory model behind the order triage dashboard. It keeps every order the operator can see partitioned by
//! status, reconciles live updates against that partition, and drives a view through a small view-model.
//!
//! The library is divided into a few sections:
//! 1. The order data types ([`mod@order_types`]) as they arrive from the order service, and the display projections
//!    built from them ([`mod@board`]).
//! 2. The index itself ([`OrderStatusIndex`]). Each order id lives in exactly one bucket, the one matching its
//!    current status. Updates are reconciled by id, so an event never needs to say where the order used to be.
//! 3. The update feed ([`mod@events`]). Transports publish decoded orders into a [`events::FeedProducer`]; the
//!    dashboard drains the matching [`events::UpdateFeed`].
//! 4. The view-model ([`Dashboard`]) and the [`OrderActions`] seam used to confirm or cancel orders.
mod actions;
pub mod board;
mod dashboard;
pub mod events;
mod index;
pub mod order_types;

pub use actions::{
    normalize_comment,
    normalize_reason,
    ActionError,
    ActionReceipt,
    OrderActions,
    GENERIC_FAILURE_MESSAGE,
    MISSING_REASON_PROMPT,
};
pub use dashboard::{Dashboard, DashboardView};
pub use index::{IndexError, OrderStatusIndex, UpdateOutcome};
