use order_index::ActionError;
use thiserror::Error;

use crate::api::error_message_from_body;

#[derive(Debug, Error)]
pub enum AdminApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("{0}")]
    RequestError(String),
    #[error("Invalid response: {0}")]
    ResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl From<AdminApiError> for ActionError {
    fn from(e: AdminApiError) -> Self {
        match e {
            AdminApiError::QueryError { status, message } => {
                ActionError::rejected(status, error_message_from_body(&message))
            },
            AdminApiError::RequestError(msg) => ActionError::Transport(msg),
            other => ActionError::Transport(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Could not connect to the push channel: {0}")]
    Connect(String),
    #[error("The push channel refused the subscription: {0}")]
    Refused(String),
    #[error("Push channel protocol error: {0}")]
    Protocol(String),
    #[error("The push channel closed before the subscription was set up")]
    Closed,
}
