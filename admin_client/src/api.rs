use std::sync::Arc;

use log::*;
use order_index::{
    order_types::{DashboardSnapshot, OrderId, SnapshotPayload},
    ActionError,
    ActionReceipt,
    OrderActions,
};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::{config::AdminApiConfig, AdminApiError};

/// Client for the admin service's order endpoints.
#[derive(Clone)]
pub struct AdminApi {
    config: AdminApiConfig,
    base_url: Url,
    client: Arc<Client>,
}

impl AdminApi {
    pub fn new(config: AdminApiConfig) -> Result<Self, AdminApiError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| AdminApiError::Initialization(format!("Invalid API URL {}. {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(AdminApiError::Initialization(format!("{base_url} cannot be used as a base URL")));
        }
        let headers = default_headers(&config)?;
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AdminApiError::Initialization(e.to_string()))?;
        Ok(Self { config, base_url, client: Arc::new(client) })
    }

    pub fn config(&self) -> &AdminApiConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    /// Sends a request and returns the raw response body. Non-success statuses become
    /// [`AdminApiError::QueryError`], carrying the response body as the message.
    pub async fn rest_query<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<String, AdminApiError> {
        let url = self.url(path);
        trace!("📡️ Sending {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| AdminApiError::RequestError(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| AdminApiError::ResponseError(e.to_string()))?;
        if status.is_success() {
            trace!("📡️ Request successful. {status}");
            Ok(text)
        } else {
            debug!("📡️ Request failed. {status}. {text}");
            Err(AdminApiError::QueryError { status: status.as_u16(), message: text })
        }
    }

    pub async fn query_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, AdminApiError> {
        let text = self.rest_query(method, path, body).await?;
        serde_json::from_str(&text).map_err(|e| AdminApiError::JsonError(e.to_string()))
    }

    /// Fetches the initial set of orders, grouped by status.
    pub async fn fetch_snapshot(&self) -> Result<DashboardSnapshot, AdminApiError> {
        let path = self.config.snapshot_path.clone();
        debug!("📡️ Fetching order snapshot from {path}");
        let payload = self.query_json::<SnapshotPayload, ()>(Method::GET, &path, None).await?;
        let snapshot = DashboardSnapshot::from(payload);
        info!("📡️ Fetched snapshot with {} orders", snapshot.len());
        Ok(snapshot)
    }

    pub async fn confirm_order(
        &self,
        order_id: &OrderId,
        comment: Option<String>,
    ) -> Result<ActionReceipt, AdminApiError> {
        let body = match comment {
            Some(comment) => json!({ "comment": comment }),
            None => json!({}),
        };
        let path = order_path(order_id, "confirm")?;
        debug!("📡️ Confirming order {order_id}");
        let receipt = self.post_action(&path, body).await?;
        info!("📡️ Order {order_id} confirmed");
        Ok(receipt)
    }

    pub async fn cancel_order(&self, order_id: &OrderId, reason: String) -> Result<ActionReceipt, AdminApiError> {
        let path = order_path(order_id, "cancel")?;
        debug!("📡️ Canceling order {order_id}");
        let receipt = self.post_action(&path, json!({ "reason": reason })).await?;
        info!("📡️ Order {order_id} canceled");
        Ok(receipt)
    }

    /// The status change itself is picked up from the push channel, so a success body that does not parse is only
    /// worth a warning.
    async fn post_action(&self, path: &str, body: Value) -> Result<ActionReceipt, AdminApiError> {
        let text = self.rest_query(Method::POST, path, Some(body)).await?;
        if text.trim().is_empty() {
            return Ok(ActionReceipt::default());
        }
        Ok(serde_json::from_str::<ActionReceipt>(&text).unwrap_or_else(|e| {
            warn!("📡️ Could not read the action receipt. {e}. Body: {text}");
            ActionReceipt::default()
        }))
    }
}

impl OrderActions for AdminApi {
    async fn confirm_order(&self, order_id: &OrderId, comment: Option<String>) -> Result<ActionReceipt, ActionError> {
        AdminApi::confirm_order(self, order_id, comment).await.map_err(ActionError::from)
    }

    async fn cancel_order(&self, order_id: &OrderId, reason: String) -> Result<ActionReceipt, ActionError> {
        AdminApi::cancel_order(self, order_id, reason).await.map_err(ActionError::from)
    }
}

/// Order ids are free-form, so they are percent-encoded into a single path segment. Dot segments would be collapsed
/// by URL normalisation, and are refused.
fn order_path(order_id: &OrderId, action: &str) -> Result<String, AdminApiError> {
    let id = order_id.as_str();
    if id.is_empty() || id == "." || id == ".." {
        return Err(AdminApiError::RequestError(format!("Order id '{id}' cannot be used in a request path")));
    }
    Ok(format!("/api/orders/{}/{action}", urlencoding::encode(id)))
}

/// Pulls the `error` field out of an error response body, if there is one.
pub fn error_message_from_body(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    match &value["error"] {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn default_headers(config: &AdminApiConfig) -> Result<HeaderMap, AdminApiError> {
    let mut headers = HeaderMap::with_capacity(6);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if config.access_token.is_set() {
        let mut val = HeaderValue::from_str(&format!("Bearer {}", config.access_token.reveal().trim()))
            .map_err(|e| AdminApiError::Initialization(format!("Invalid access token. {e}")))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
    }
    let identity = [
        ("x-user-id", &config.identity.user_id),
        ("x-user-role", &config.identity.role),
        ("x-user-name", &config.identity.name),
    ];
    for (name, value) in identity {
        if let Some(value) = value {
            let val = HeaderValue::from_str(value)
                .map_err(|e| AdminApiError::Initialization(format!("Invalid value for {name}. {e}")))?;
            headers.insert(HeaderName::from_static(name), val);
        }
    }
    Ok(headers)
}
