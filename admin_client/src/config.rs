use std::{
    fmt::{self, Display},
    str::FromStr,
    time::Duration,
};

use log::*;
use otd_common::{
    helpers::{env_or_default, optional_env},
    Secret,
};

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_SNAPSHOT_PATH: &str = "/api/orders";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PUSH_URL: &str = "ws://localhost:8080/ws/websocket";
pub const DEFAULT_PUSH_TOPIC: &str = "/topic/orders";
pub const DEFAULT_FEED_BUFFER: usize = 64;

/// The identity the gateway would normally forward to the admin service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: Option<String>,
    pub role: Option<String>,
    pub name: Option<String>,
}

impl UserIdentity {
    pub fn from_env() -> Self {
        Self {
            user_id: optional_env("OTD_USER_ID"),
            role: optional_env("OTD_USER_ROLE"),
            name: optional_env("OTD_USER_NAME"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.role.is_none() && self.name.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct AdminApiConfig {
    /// e.g. `http://localhost:8080`. Paths are appended to it verbatim.
    pub base_url: String,
    pub snapshot_path: String,
    pub request_timeout: Duration,
    /// Sent as a bearer token when set.
    pub access_token: Secret<String>,
    pub identity: UserIdentity,
}

impl Default for AdminApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            snapshot_path: DEFAULT_SNAPSHOT_PATH.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            access_token: Secret::default(),
            identity: UserIdentity::default(),
        }
    }
}

impl AdminApiConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let base_url = env_or_default("OTD_API_URL", DEFAULT_API_URL.to_string());
        let snapshot_path = env_or_default("OTD_SNAPSHOT_PATH", DEFAULT_SNAPSHOT_PATH.to_string());
        let timeout = env_or_default("OTD_REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS);
        let access_token = Secret::new(optional_env("OTD_ACCESS_TOKEN").unwrap_or_default());
        if !access_token.is_set() {
            info!("🪛️ OTD_ACCESS_TOKEN is not set. Requests will be sent without an Authorization header.");
        }
        let identity = UserIdentity::from_env();
        Self { base_url, snapshot_path, request_timeout: Duration::from_secs(timeout), access_token, identity }
    }

    pub fn with_identity(mut self, identity: UserIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_access_token<S: Into<String>>(mut self, token: S) -> Self {
        self.access_token = Secret::new(token.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PushProtocol {
    /// STOMP 1.2 frames over a WebSocket, as served by a SockJS/STOMP broker endpoint.
    #[default]
    Stomp,
    /// One JSON event per text message.
    Json,
}

impl FromStr for PushProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stomp" => Ok(Self::Stomp),
            "json" | "raw" => Ok(Self::Json),
            other => Err(format!("Unknown push protocol '{other}'. Expected 'stomp' or 'json'.")),
        }
    }
}

impl Display for PushProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stomp => f.write_str("stomp"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PushConfig {
    /// A `ws://` or `wss://` endpoint.
    pub url: String,
    /// The STOMP destination to subscribe to. Ignored for the json protocol.
    pub topic: String,
    pub protocol: PushProtocol,
    /// How many decoded updates may queue up before the socket task waits for the dashboard.
    pub buffer_size: usize,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PUSH_URL.to_string(),
            topic: DEFAULT_PUSH_TOPIC.to_string(),
            protocol: PushProtocol::default(),
            buffer_size: DEFAULT_FEED_BUFFER,
        }
    }
}

impl PushConfig {
    pub fn new<S: Into<String>>(url: S, protocol: PushProtocol) -> Self {
        Self { url: url.into(), protocol, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let url = env_or_default("OTD_PUSH_URL", DEFAULT_PUSH_URL.to_string());
        let topic = env_or_default("OTD_PUSH_TOPIC", DEFAULT_PUSH_TOPIC.to_string());
        let protocol = env_or_default("OTD_PUSH_PROTOCOL", PushProtocol::default());
        let buffer_size = env_or_default("OTD_FEED_BUFFER", DEFAULT_FEED_BUFFER).max(1);
        Self { url, topic, protocol, buffer_size }
    }
}
