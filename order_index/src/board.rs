//! Display projections of the index: the three-column board and the single-order detail view.
use otd_common::Money;
use serde::Serialize;

use crate::order_types::{Order, OrderId, OrderStatus};

pub const EMPTY_BUCKET_PLACEHOLDER: &str = "No orders";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub columns: Vec<StatusColumn>,
}

impl BoardView {
    pub fn column(&self, status: &OrderStatus) -> Option<&StatusColumn> {
        self.columns.iter().find(|c| &c.status == status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusColumn {
    pub status: OrderStatus,
    pub entries: ColumnEntries,
}

/// An empty bucket renders as a single placeholder, never as an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ColumnEntries {
    Placeholder(&'static str),
    Cards(Vec<OrderCard>),
}

impl StatusColumn {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.entries, ColumnEntries::Placeholder(_))
    }

    pub fn cards(&self) -> &[OrderCard] {
        match &self.entries {
            ColumnEntries::Placeholder(_) => &[],
            ColumnEntries::Cards(cards) => cards,
        }
    }

    pub fn order_ids(&self) -> Vec<&OrderId> {
        self.cards().iter().map(|c| &c.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderCard {
    pub id: OrderId,
    pub customer_name: String,
    pub total: String,
    pub total_quantity: u32,
    pub status: OrderStatus,
}

impl OrderCard {
    /// `Total: $42.50 • 3 items`
    pub fn summary(&self) -> String {
        format!("Total: {} • {} items", self.total, self.total_quantity)
    }
}

impl From<&Order> for OrderCard {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            customer_name: order.customer_name.clone().unwrap_or_default(),
            total: Money::display_or_dash(order.total_price),
            total_quantity: order.total_quantity.unwrap_or_default(),
            status: order.status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemLine {
    pub product_name: String,
    pub quantity: u32,
    pub subtotal: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetail {
    pub id: OrderId,
    pub status: OrderStatus,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub delivery_method: String,
    pub payment_method: String,
    pub created_at: String,
    pub total: String,
    pub total_quantity: u32,
    pub notes: Option<String>,
    /// Only shown for canceled orders that carry a reason.
    pub cancellation_reason: Option<String>,
    pub items: Vec<ItemLine>,
    /// Confirm/cancel are offered for new orders only.
    pub actionable: bool,
}

impl From<&Order> for OrderDetail {
    fn from(order: &Order) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let cancellation_reason = match order.status {
            OrderStatus::Canceled => order.cancellation_reason.clone().filter(|r| !r.trim().is_empty()),
            _ => None,
        };
        let items = order
            .items
            .iter()
            .map(|item| ItemLine {
                product_name: text(&item.product_name),
                quantity: item.quantity.unwrap_or_default(),
                subtotal: Money::display_or_dash(item.subtotal),
            })
            .collect();
        Self {
            id: order.id.clone(),
            status: order.status.clone(),
            customer_name: text(&order.customer_name),
            email: text(&order.email),
            phone: text(&order.phone),
            address: text(&order.address),
            city: text(&order.city),
            delivery_method: text(&order.delivery_method),
            payment_method: text(&order.payment_method),
            created_at: text(&order.created_at),
            total: Money::display_or_dash(order.total_price),
            total_quantity: order.total_quantity.unwrap_or_default(),
            notes: order.notes.clone().filter(|n| !n.trim().is_empty()),
            cancellation_reason,
            items,
            actionable: order.is_actionable(),
        }
    }
}
