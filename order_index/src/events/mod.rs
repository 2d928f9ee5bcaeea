mod feed;
mod push_event;

pub use feed::{update_feed, FeedProducer, UpdateFeed};
pub use push_event::PushEvent;
