//! Cancellable order update subscription
//!
//! The push connector (see the `admin_client` crate) owns a [`FeedProducer`] and publishes every decoded order into
//! it. The dashboard owns the matching [`UpdateFeed`], a lazy and potentially infinite stream of orders that it drains
//! in its own loop. Closing or dropping the feed cancels the producer side, so the socket task can shut down.
use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures_util::Stream;
use log::*;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::order_types::Order;

pub fn update_feed(buffer_size: usize) -> (FeedProducer, UpdateFeed) {
    let (sender, receiver) = mpsc::channel(buffer_size.max(1));
    let cancel = CancellationToken::new();
    (FeedProducer { sender, cancel: cancel.clone() }, UpdateFeed { receiver, cancel })
}

pub struct UpdateFeed {
    receiver: mpsc::Receiver<Order>,
    cancel: CancellationToken,
}

impl UpdateFeed {
    /// Waits for the next order update. `None` means the feed has ended: either every producer is gone or the feed
    /// was closed.
    pub async fn next_update(&mut self) -> Option<Order> {
        self.receiver.recv().await
    }

    /// Tears the subscription down. Updates already buffered can still be drained.
    pub fn close(&mut self) {
        if !self.cancel.is_cancelled() {
            debug!("📬️ Closing update feed");
        }
        self.cancel.cancel();
        self.receiver.close();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for UpdateFeed {
    type Item = Order;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for UpdateFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Clone)]
pub struct FeedProducer {
    sender: mpsc::Sender<Order>,
    cancel: CancellationToken,
}

impl FeedProducer {
    /// Hands an order to the subscriber. Returns `false` once the subscriber has gone away, which is the producer's
    /// signal to stop.
    pub async fn publish(&self, order: Order) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        match self.sender.send(order).await {
            Ok(()) => true,
            Err(e) => {
                debug!("📬️ Update feed subscriber is gone. Dropping order {}", e.0.id);
                false
            },
        }
    }

    /// Resolves when the subscriber closes or drops its feed.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.sender.is_closed()
    }
}
