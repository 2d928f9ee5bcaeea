use std::{
    convert::Infallible,
    fmt::{self, Display},
    str::FromStr,
};

use log::*;
use otd_common::Money;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The order service hands out string ids, but older payloads (and hand-written fixtures) use integers. Both decode
/// to the same textual id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl FromStr for OrderId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for OrderId {
    fn from(v: u64) -> Self {
        Self(v.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderIdVisitor;

        impl<'de> de::Visitor<'de> for OrderIdVisitor {
            type Value = OrderId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an order id string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<OrderId, E> {
                Ok(OrderId(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<OrderId, E> {
                Ok(OrderId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<OrderId, E> {
                Ok(OrderId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<OrderId, E> {
                Ok(OrderId(v.to_string()))
            }
        }

        deserializer.deserialize_any(OrderIdVisitor)
    }
}

//--------------------------------------      OrderStatus      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Placed by a customer and waiting for an operator decision.
    New,
    /// Accepted by an operator. Terminal.
    Confirmed,
    /// Rejected by an operator, with a reason. Terminal.
    Canceled,
    /// A status this build does not know about. Orders carrying it are still indexed, under their own bucket.
    Other(String),
}

impl OrderStatus {
    /// The statuses that make up the dashboard, in display order.
    pub const BOARD: [OrderStatus; 3] = [OrderStatus::New, OrderStatus::Confirmed, OrderStatus::Canceled];

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Other(s) => s.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, OrderStatus::Other(_))
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for OrderStatus {
    fn from(value: &str) -> Self {
        match value {
            "NEW" => Self::New,
            "CONFIRMED" => Self::Confirmed,
            "CANCELED" => Self::Canceled,
            s => {
                trace!("Unrecognised order status: {s}");
                Self::Other(s.to_string())
            },
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub subtotal: Option<Money>,
}

impl OrderItem {
    pub fn new<S: Into<String>>(product_name: S, quantity: u32, subtotal: Money) -> Self {
        Self { product_id: None, product_name: Some(product_name.into()), quantity: Some(quantity), subtotal: Some(subtotal) }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
/// The dashboard's read-only projection of an order. Only `id` and `status` mean anything to the index; every other
/// field is carried for display and may be missing or `null` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub delivery_method: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub total_price: Option<Money>,
    #[serde(default)]
    pub total_quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn new<I: Into<OrderId>>(id: I, status: OrderStatus) -> Self {
        Self {
            id: id.into(),
            status,
            customer_name: None,
            email: None,
            phone: None,
            address: None,
            city: None,
            delivery_method: None,
            payment_method: None,
            created_at: None,
            total_price: None,
            total_quantity: None,
            notes: None,
            cancellation_reason: None,
            items: Vec::new(),
        }
    }

    pub fn with_customer<S: Into<String>>(mut self, name: S) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_item(mut self, item: OrderItem) -> Self {
        self.items.push(item);
        self.total_price = Some(self.items.iter().filter_map(|i| i.subtotal).sum());
        self.total_quantity = Some(self.items.iter().filter_map(|i| i.quantity).sum());
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    /// Only new orders can be confirmed or canceled.
    pub fn is_actionable(&self) -> bool {
        self.status == OrderStatus::New
    }

    /// Decodes one order from raw JSON. The index only accepts orders with a non-blank id and status.
    pub fn from_value(value: Value) -> Result<Self, OrderDecodeError> {
        if !value.is_object() {
            return Err(OrderDecodeError::NotAnObject(value.to_string()));
        }
        let order = serde_json::from_value::<Order>(value).map_err(|e| OrderDecodeError::Incomplete(e.to_string()))?;
        if order.id.is_blank() || order.status.is_blank() {
            return Err(OrderDecodeError::Blank);
        }
        Ok(order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderDecodeError {
    #[error("Expected an order object, got {0}")]
    NotAnObject(String),
    #[error("Incomplete order. {0}")]
    Incomplete(String),
    #[error("Order has a blank id or status")]
    Blank,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Snapshot lists are decoded entry by entry so that one broken order does not lose the rest.
fn valid_orders<'de, D>(deserializer: D) -> Result<Vec<Order>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(keep_valid_orders(values))
}

fn keep_valid_orders(values: Vec<Value>) -> Vec<Order> {
    values
        .into_iter()
        .filter_map(|v| Order::from_value(v).map_err(|e| warn!("🗂️ Skipping snapshot entry. {e}")).ok())
        .collect()
}

//--------------------------------------   DashboardSnapshot   ---------------------------------------------------------
/// The bulk load the dashboard starts from. Missing keys are empty buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    #[serde(default, deserialize_with = "valid_orders")]
    pub new_orders: Vec<Order>,
    #[serde(default, deserialize_with = "valid_orders")]
    pub confirmed_orders: Vec<Order>,
    #[serde(default, deserialize_with = "valid_orders")]
    pub canceled_orders: Vec<Order>,
    /// Orders whose status is not one of the board statuses. Only populated by [`DashboardSnapshot::from_orders`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_orders: Vec<Order>,
}

impl DashboardSnapshot {
    /// Partitions a flat order listing by status.
    pub fn from_orders(orders: Vec<Order>) -> Self {
        let mut snapshot = Self::default();
        for order in orders {
            match order.status {
                OrderStatus::New => snapshot.new_orders.push(order),
                OrderStatus::Confirmed => snapshot.confirmed_orders.push(order),
                OrderStatus::Canceled => snapshot.canceled_orders.push(order),
                OrderStatus::Other(_) => snapshot.other_orders.push(order),
            }
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.new_orders.len() + self.confirmed_orders.len() + self.canceled_orders.len() + self.other_orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Yields each order together with the status of the list it was delivered in. `None` for `other_orders`.
    pub fn into_entries(self) -> impl Iterator<Item = (Option<OrderStatus>, Order)> {
        let tag = |status: Option<OrderStatus>| move |o: Order| (status.clone(), o);
        self.new_orders
            .into_iter()
            .map(tag(Some(OrderStatus::New)))
            .chain(self.confirmed_orders.into_iter().map(tag(Some(OrderStatus::Confirmed))))
            .chain(self.canceled_orders.into_iter().map(tag(Some(OrderStatus::Canceled))))
            .chain(self.other_orders.into_iter().map(tag(None)))
    }
}

/// Snapshot endpoints either return the grouped object or a flat order listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SnapshotPayload {
    Flat(Vec<Value>),
    Grouped(DashboardSnapshot),
}

impl From<SnapshotPayload> for DashboardSnapshot {
    fn from(payload: SnapshotPayload) -> Self {
        match payload {
            SnapshotPayload::Flat(values) => DashboardSnapshot::from_orders(keep_valid_orders(values)),
            SnapshotPayload::Grouped(snapshot) => snapshot,
        }
    }
}
