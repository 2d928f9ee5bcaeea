//! The dashboard view-model
//!
//! [`Dashboard`] owns the order index, the active selection and the view it draws on. Every mutation re-renders
//! synchronously, so whatever the view shows always reflects the index as it is right now. The selection is held as
//! an id and the order is looked up again every time it is needed, so an open detail view follows the order from
//! bucket to bucket.
use log::*;

use crate::{
    actions::{normalize_comment, normalize_reason, ActionError, ActionReceipt, OrderActions, MISSING_REASON_PROMPT},
    board::{BoardView, OrderDetail},
    events::{PushEvent, UpdateFeed},
    index::{OrderStatusIndex, UpdateOutcome},
    order_types::{DashboardSnapshot, Order, OrderId},
};

/// Anything the dashboard can draw on.
pub trait DashboardView {
    fn render_board(&mut self, board: &BoardView);
    fn show_detail(&mut self, detail: &OrderDetail);
    fn close_detail(&mut self);
    /// Surface a failed action to the operator. The message is shown as is.
    fn show_error(&mut self, message: &str);
    /// Ask the operator for missing input.
    fn prompt(&mut self, message: &str);
}

pub struct Dashboard<V> {
    index: OrderStatusIndex,
    active: Option<OrderId>,
    view: V,
}

impl<V: DashboardView> Dashboard<V> {
    pub fn new(view: V) -> Self {
        Self { index: OrderStatusIndex::new(), active: None, view }
    }

    pub fn index(&self) -> &OrderStatusIndex {
        &self.index
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    pub fn active_order_id(&self) -> Option<&OrderId> {
        self.active.as_ref()
    }

    /// The order behind the active selection, as the index currently has it.
    pub fn active_order(&self) -> Option<&Order> {
        self.active.as_ref().and_then(|id| self.index.get_order(id))
    }

    pub fn load_snapshot(&mut self, snapshot: DashboardSnapshot) -> usize {
        let count = self.index.load_snapshot(snapshot);
        info!("📋️ Dashboard loaded with {count} orders");
        self.render();
        self.refresh_detail();
        count
    }

    pub fn apply_update(&mut self, order: Order) -> UpdateOutcome {
        let id = order.id.clone();
        let outcome = self.index.apply_update(order);
        debug!("📋️ Order {id} updated: {outcome:?}");
        self.render();
        if self.active.as_ref() == Some(&id) {
            self.refresh_detail();
        }
        outcome
    }

    /// Applies a decoded push event. Events without a usable order are dropped and leave everything untouched.
    pub fn apply_event(&mut self, event: PushEvent) -> Option<UpdateOutcome> {
        if let Some(kind) = &event.event_type {
            trace!("📋️ Received {kind} event");
        }
        event.into_order().map(|order| self.apply_update(order))
    }

    /// Applies a raw push message body.
    pub fn apply_message(&mut self, text: &str) -> Option<UpdateOutcome> {
        PushEvent::parse(text).and_then(|event| self.apply_event(event))
    }

    /// Drains the feed until it ends, applying every update. Returns the number of updates applied.
    pub async fn follow(&mut self, feed: &mut UpdateFeed) -> usize {
        let mut count = 0;
        while let Some(order) = feed.next_update().await {
            self.apply_update(order);
            count += 1;
        }
        debug!("📋️ Update feed ended after {count} updates");
        count
    }

    pub fn render(&mut self) {
        let board = self.index.render_all();
        self.view.render_board(&board);
    }

    /// Opens the detail view for a known order. Unknown ids are ignored and leave the current selection alone.
    pub fn open_order(&mut self, id: &OrderId) -> bool {
        match self.index.get_order(id) {
            Some(order) => {
                let detail = OrderDetail::from(order);
                self.active = Some(id.clone());
                self.view.show_detail(&detail);
                true
            },
            None => {
                debug!("📋️ Order {id} is not on the board. Not opening it.");
                false
            },
        }
    }

    pub fn close_detail(&mut self) {
        self.active = None;
        self.view.close_detail();
    }

    /// Confirms an order. On success the detail view closes; the index only changes once the confirmation comes back
    /// through the update feed.
    pub async fn confirm<A: OrderActions>(
        &mut self,
        actions: &A,
        id: &OrderId,
        comment: Option<&str>,
    ) -> Result<ActionReceipt, ActionError> {
        if let Err(e) = self.check_actionable(id) {
            self.view.show_error(&e.to_string());
            return Err(e);
        }
        let comment = normalize_comment(comment);
        info!("📋️ Confirming order {id}");
        let result = actions.confirm_order(id, comment).await;
        self.finish_action(id, result)
    }

    /// Cancels an order. A blank reason prompts the operator and nothing is sent.
    pub async fn cancel<A: OrderActions>(
        &mut self,
        actions: &A,
        id: &OrderId,
        reason: &str,
    ) -> Result<ActionReceipt, ActionError> {
        let reason = match normalize_reason(reason) {
            Ok(r) => r,
            Err(e) => {
                self.view.prompt(MISSING_REASON_PROMPT);
                return Err(e);
            },
        };
        if let Err(e) = self.check_actionable(id) {
            self.view.show_error(&e.to_string());
            return Err(e);
        }
        info!("📋️ Canceling order {id}");
        let result = actions.cancel_order(id, reason).await;
        self.finish_action(id, result)
    }

    fn finish_action(
        &mut self,
        id: &OrderId,
        result: Result<ActionReceipt, ActionError>,
    ) -> Result<ActionReceipt, ActionError> {
        match &result {
            Ok(receipt) => {
                let kind = receipt.event_type.as_deref().unwrap_or("action");
                info!("📋️ Server accepted {kind} for order {id}");
                self.close_detail();
            },
            Err(e) => {
                warn!("📋️ Action on order {id} failed. {e}");
                self.view.show_error(&e.to_string());
            },
        }
        result
    }

    /// Orders the index knows about must still be new. Unknown ids are left for the server to judge.
    fn check_actionable(&self, id: &OrderId) -> Result<(), ActionError> {
        match self.index.get_order(id) {
            Some(order) if !order.is_actionable() => {
                Err(ActionError::NotActionable { id: id.clone(), status: order.status.clone() })
            },
            _ => Ok(()),
        }
    }

    fn refresh_detail(&mut self) {
        if let Some(order) = self.active_order() {
            let detail = OrderDetail::from(order);
            self.view.show_detail(&detail);
        }
    }
}
