//! The order status index
//!
//! Orders are partitioned into one bucket per status. Each bucket is keyed by order id and remembers the order in
//! which entries were last touched, which is the order the board displays them in. A side table maps every known id
//! to the bucket currently holding it, so reconciliation never has to trust the status an event claims the order
//! used to have.
use std::collections::{BTreeMap, HashMap};

use log::*;
use thiserror::Error;

use crate::{
    board::{BoardView, ColumnEntries, OrderCard, StatusColumn, EMPTY_BUCKET_PLACEHOLDER},
    order_types::{DashboardSnapshot, Order, OrderId, OrderStatus},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// First sighting of this id.
    Inserted { status: OrderStatus },
    /// The id moved between buckets.
    Moved { from: OrderStatus, to: OrderStatus },
    /// Same bucket, new value. The order moves to the end of its bucket.
    Refreshed { status: OrderStatus },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("Order {id} is filed under {bucket} but has status {status}")]
    WrongBucket { id: OrderId, bucket: OrderStatus, status: OrderStatus },
    #[error("Order {0} appears in more than one bucket")]
    Duplicate(OrderId),
    #[error("Order {0} is held by a bucket but not tracked")]
    Untracked(OrderId),
    #[error("Order {0} is tracked but no bucket holds it")]
    Dangling(OrderId),
}

#[derive(Debug, Clone)]
struct Bucket {
    status: OrderStatus,
    entries: BTreeMap<u64, Order>,
    slots: HashMap<OrderId, u64>,
    next_slot: u64,
}

impl Bucket {
    fn new(status: OrderStatus) -> Self {
        Self { status, entries: BTreeMap::new(), slots: HashMap::new(), next_slot: 0 }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn get(&self, id: &OrderId) -> Option<&Order> {
        self.slots.get(id).and_then(|slot| self.entries.get(slot))
    }

    fn get_mut(&mut self, id: &OrderId) -> Option<&mut Order> {
        let slot = self.slots.get(id)?;
        self.entries.get_mut(slot)
    }

    fn remove(&mut self, id: &OrderId) -> Option<Order> {
        let slot = self.slots.remove(id)?;
        self.entries.remove(&slot)
    }

    fn append(&mut self, order: Order) {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.slots.insert(order.id.clone(), slot);
        self.entries.insert(slot, order);
    }

    fn orders(&self) -> impl Iterator<Item = &Order> {
        self.entries.values()
    }
}

#[derive(Debug, Clone)]
pub struct OrderStatusIndex {
    /// The board statuses come first, in display order. Buckets for unrecognised statuses are appended on first sight.
    buckets: Vec<Bucket>,
    locations: HashMap<OrderId, usize>,
}

impl Default for OrderStatusIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStatusIndex {
    pub fn new() -> Self {
        let buckets = OrderStatus::BOARD.into_iter().map(Bucket::new).collect();
        Self { buckets, locations: HashMap::new() }
    }

    /// Fills the index from the initial bulk load. Orders are filed under their own status; the list they arrived in
    /// is only used to flag inconsistent snapshots. Returns the number of orders loaded.
    pub fn load_snapshot(&mut self, snapshot: DashboardSnapshot) -> usize {
        let mut count = 0;
        for (listed_as, order) in snapshot.into_entries() {
            if let Some(listed_as) = listed_as.filter(|s| s != &order.status) {
                warn!(
                    "🗂️ Snapshot lists order {} under {listed_as}, but its status is {}. Filing it under {}.",
                    order.id, order.status, order.status
                );
            }
            let target = self.bucket_position_or_insert(&order.status);
            match self.locations.get(&order.id).copied() {
                Some(pos) if pos == target => {
                    // A repeated id within one bucket keeps its place and takes the later value
                    if let Some(entry) = self.buckets[pos].get_mut(&order.id) {
                        *entry = order;
                    }
                },
                Some(pos) => {
                    self.buckets[pos].remove(&order.id);
                    self.locations.insert(order.id.clone(), target);
                    self.buckets[target].append(order);
                },
                None => {
                    self.locations.insert(order.id.clone(), target);
                    self.buckets[target].append(order);
                },
            }
            count += 1;
        }
        debug!("🗂️ Loaded {count} orders from snapshot. Index now holds {} orders", self.len());
        count
    }

    /// Reconciles one incoming order. Whatever bucket currently holds the id loses it, and the bucket named by the
    /// order's status gains it at the end.
    pub fn apply_update(&mut self, order: Order) -> UpdateOutcome {
        let target = self.bucket_position_or_insert(&order.status);
        let id = order.id.clone();
        let outcome = match self.locations.get(&id).copied() {
            Some(pos) => {
                self.buckets[pos].remove(&id);
                if pos == target {
                    UpdateOutcome::Refreshed { status: order.status.clone() }
                } else {
                    UpdateOutcome::Moved { from: self.buckets[pos].status.clone(), to: order.status.clone() }
                }
            },
            None => UpdateOutcome::Inserted { status: order.status.clone() },
        };
        self.buckets[target].append(order);
        self.locations.insert(id.clone(), target);
        trace!("🗂️ Order {id}: {outcome:?}");
        outcome
    }

    pub fn get_order(&self, id: &OrderId) -> Option<&Order> {
        self.locations.get(id).and_then(|pos| self.buckets[*pos].get(id))
    }

    pub fn contains(&self, id: &OrderId) -> bool {
        self.locations.contains_key(id)
    }

    pub fn status_of(&self, id: &OrderId) -> Option<&OrderStatus> {
        self.locations.get(id).map(|pos| &self.buckets[*pos].status)
    }

    /// The orders in the given bucket, in display order. Unknown statuses yield an empty list.
    pub fn orders_in(&self, status: &OrderStatus) -> Vec<&Order> {
        self.bucket_position(status).map(|pos| self.buckets[pos].orders().collect()).unwrap_or_default()
    }

    pub fn bucket_len(&self, status: &OrderStatus) -> usize {
        self.bucket_position(status).map(|pos| self.buckets[pos].len()).unwrap_or_default()
    }

    /// Every status that has a bucket, board statuses first.
    pub fn statuses(&self) -> impl Iterator<Item = &OrderStatus> {
        self.buckets.iter().map(|b| &b.status)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Projects the three board buckets into display columns.
    pub fn render_all(&self) -> BoardView {
        let columns = OrderStatus::BOARD
            .into_iter()
            .map(|status| {
                let cards = self.orders_in(&status).into_iter().map(OrderCard::from).collect::<Vec<_>>();
                let entries = if cards.is_empty() {
                    ColumnEntries::Placeholder(EMPTY_BUCKET_PLACEHOLDER)
                } else {
                    ColumnEntries::Cards(cards)
                };
                StatusColumn { status, entries }
            })
            .collect();
        BoardView { columns }
    }

    /// Checks that every known order sits in exactly one bucket and that the bucket matches its status.
    pub fn verify(&self) -> Result<(), IndexError> {
        let mut seen = HashMap::<&OrderId, usize>::new();
        for (pos, bucket) in self.buckets.iter().enumerate() {
            for order in bucket.orders() {
                if seen.insert(&order.id, pos).is_some() {
                    return Err(IndexError::Duplicate(order.id.clone()));
                }
                if order.status != bucket.status {
                    return Err(IndexError::WrongBucket {
                        id: order.id.clone(),
                        bucket: bucket.status.clone(),
                        status: order.status.clone(),
                    });
                }
                if self.locations.get(&order.id) != Some(&pos) {
                    return Err(IndexError::Untracked(order.id.clone()));
                }
            }
        }
        match self.locations.keys().find(|id| !seen.contains_key(id)) {
            Some(id) => Err(IndexError::Dangling(id.clone())),
            None => Ok(()),
        }
    }

    fn bucket_position(&self, status: &OrderStatus) -> Option<usize> {
        self.buckets.iter().position(|b| &b.status == status)
    }

    fn bucket_position_or_insert(&mut self, status: &OrderStatus) -> usize {
        self.bucket_position(status).unwrap_or_else(|| {
            info!("🗂️ Creating a bucket for previously unseen status {status}");
            self.buckets.push(Bucket::new(status.clone()));
            self.buckets.len() - 1
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ids(index: &OrderStatusIndex, status: &OrderStatus) -> Vec<String> {
        index.orders_in(status).iter().map(|o| o.id.as_str().to_string()).collect()
    }

    #[test]
    fn new_index_has_the_board_buckets() {
        let index = OrderStatusIndex::new();
        let statuses = index.statuses().cloned().collect::<Vec<_>>();
        assert_eq!(statuses, OrderStatus::BOARD.to_vec());
        assert!(index.is_empty());
        assert!(index.verify().is_ok());
    }

    #[test]
    fn updates_move_to_the_end_of_their_bucket() {
        let mut index = OrderStatusIndex::new();
        for id in ["a", "b", "c"] {
            index.apply_update(Order::new(id, OrderStatus::New));
        }
        let outcome = index.apply_update(Order::new("a", OrderStatus::New).with_customer("later"));
        assert_eq!(outcome, UpdateOutcome::Refreshed { status: OrderStatus::New });
        assert_eq!(ids(&index, &OrderStatus::New), vec!["b", "c", "a"]);
        let order = index.get_order(&"a".into()).unwrap();
        assert_eq!(order.customer_name.as_deref(), Some("later"));
    }

    #[test]
    fn reconciliation_ignores_the_claimed_previous_status() {
        let mut index = OrderStatusIndex::new();
        index.apply_update(Order::new("a", OrderStatus::Canceled));
        // The server corrected the order straight to CONFIRMED; nothing claims it was ever CANCELED
        let outcome = index.apply_update(Order::new("a", OrderStatus::Confirmed));
        assert_eq!(outcome, UpdateOutcome::Moved { from: OrderStatus::Canceled, to: OrderStatus::Confirmed });
        assert_eq!(index.bucket_len(&OrderStatus::Canceled), 0);
        assert_eq!(ids(&index, &OrderStatus::Confirmed), vec!["a"]);
        assert!(index.verify().is_ok());
    }

    #[test]
    fn snapshot_duplicates_keep_their_position() {
        let mut index = OrderStatusIndex::new();
        let snapshot = DashboardSnapshot {
            new_orders: vec![
                Order::new("1", OrderStatus::New),
                Order::new("2", OrderStatus::New),
                Order::new("1", OrderStatus::New).with_customer("second copy"),
            ],
            ..Default::default()
        };
        assert_eq!(index.load_snapshot(snapshot), 3);
        assert_eq!(ids(&index, &OrderStatus::New), vec!["1", "2"]);
        assert_eq!(index.get_order(&"1".into()).unwrap().customer_name.as_deref(), Some("second copy"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn snapshot_files_orders_by_their_own_status() {
        let mut index = OrderStatusIndex::new();
        let snapshot = DashboardSnapshot {
            new_orders: vec![Order::new("1", OrderStatus::Confirmed)],
            canceled_orders: vec![Order::new("2", OrderStatus::Canceled)],
            confirmed_orders: vec![Order::new("2", OrderStatus::Confirmed)],
            ..Default::default()
        };
        index.load_snapshot(snapshot);
        assert_eq!(index.bucket_len(&OrderStatus::New), 0);
        // Lists are read new, confirmed, canceled, so the canceled copy of order 2 is the later one
        assert_eq!(ids(&index, &OrderStatus::Confirmed), vec!["1"]);
        assert_eq!(ids(&index, &OrderStatus::Canceled), vec!["2"]);
        assert_eq!(index.len(), 2);
        assert!(index.verify().is_ok());
    }

    #[test]
    fn render_uses_placeholders_for_empty_buckets() {
        let mut index = OrderStatusIndex::new();
        index.apply_update(Order::new("1", OrderStatus::Canceled));
        index.apply_update(Order::new("2", OrderStatus::Other("ARCHIVED".into())));
        let board = index.render_all();
        assert_eq!(board.columns.len(), 3);
        assert!(board.column(&OrderStatus::New).unwrap().is_placeholder());
        assert!(board.column(&OrderStatus::Confirmed).unwrap().is_placeholder());
        let canceled = board.column(&OrderStatus::Canceled).unwrap();
        assert_eq!(canceled.order_ids(), vec![&OrderId::from("1")]);
        assert!(board.column(&OrderStatus::Other("ARCHIVED".into())).is_none());
        assert_eq!(index.status_of(&"2".into()), Some(&OrderStatus::Other("ARCHIVED".into())));
    }
}
