mod api;
mod config;
mod error;
pub mod push;

pub use api::{error_message_from_body, AdminApi};
pub use config::{AdminApiConfig, PushConfig, PushProtocol, UserIdentity};
pub use error::{AdminApiError, FeedError};
