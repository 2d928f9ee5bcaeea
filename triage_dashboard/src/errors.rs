use admin_client::{AdminApiError, FeedError};
use order_index::ActionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Could not load orders from the admin service. {0}")]
    ApiError(#[from] AdminApiError),
    #[error("{0}")]
    FeedError(#[from] FeedError),
    #[error("{0}")]
    ActionError(#[from] ActionError),
    #[error("Invalid configuration. {0}")]
    ConfigurationError(String),
    #[error("An I/O error happened in the dashboard. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not serialize the board. {0}")]
    SerializationError(#[from] serde_json::Error),
}
