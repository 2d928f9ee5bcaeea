//! Operator actions on new orders
//!
//! The dashboard never talks HTTP itself. It validates what it can locally and hands the request to an
//! [`OrderActions`] implementation (the admin API client in production, a mock in tests). The outcome of an action
//! never touches the index: the status change is only observed when it comes back through the update feed.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order_types::{Order, OrderId, OrderStatus};

pub const MISSING_REASON_PROMPT: &str = "Please describe why the order is canceled.";
/// Shown when the server rejects an action without saying why.
pub const GENERIC_FAILURE_MESSAGE: &str = "Operation failed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Please describe why the order is canceled.")]
    MissingReason,
    #[error("Order {id} is {status} and can no longer be confirmed or canceled")]
    NotActionable { id: OrderId, status: OrderStatus },
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
}

impl ActionError {
    /// Builds a rejection from the server's error text, falling back to a generic message when there is none.
    pub fn rejected(status: u16, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        Self::Rejected { status, message }
    }
}

/// The body of a successful confirm or cancel call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub order: Option<Order>,
}

#[allow(async_fn_in_trait)]
pub trait OrderActions {
    /// Confirms a new order. `comment` has already been trimmed, and is `None` when the operator left it empty.
    async fn confirm_order(&self, order_id: &OrderId, comment: Option<String>) -> Result<ActionReceipt, ActionError>;

    /// Cancels a new order. `reason` has already been trimmed and is never empty.
    async fn cancel_order(&self, order_id: &OrderId, reason: String) -> Result<ActionReceipt, ActionError>;
}

/// Trims an optional operator comment, treating whitespace as no comment at all.
pub fn normalize_comment(comment: Option<&str>) -> Option<String> {
    comment.map(str::trim).filter(|c| !c.is_empty()).map(String::from)
}

/// Trims a cancellation reason. Blank reasons are refused.
pub fn normalize_reason(reason: &str) -> Result<String, ActionError> {
    let reason = reason.trim();
    if reason.is_empty() {
        Err(ActionError::MissingReason)
    } else {
        Ok(reason.to_string())
    }
}
