use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::backend::kick::{
    create_subscription, default_events, EventSubscription, Result, SubscriptionRequest,
    EVENT_SUBSCRIPTIONS_URL,
};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Header Kick sets on deliveries to name the event type
const EVENT_TYPE_HEADER: &str = "kick-event-type";

/// Settings for the webhook receiver
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub broadcaster_user_id: u64,
    /// Public URL Kick delivers to, configured on the Kick app
    pub webhook_url: String,
    pub events: Vec<EventSubscription>,
    pub subscriptions_url: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "0.0.0.0".to_string(),
            port: 3000,
            broadcaster_user_id: 0,
            webhook_url: String::new(),
            events: default_events(),
            subscriptions_url: EVENT_SUBSCRIPTIONS_URL.to_string(),
        }
    }
}

/// Handle to a webhook server accepting connections in the background
pub struct RunningServer {
    local_addr: SocketAddr,
    task: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolve once the serving task ends, which only happens on failure
    pub async fn wait(&mut self) -> std::io::Result<()> {
        match (&mut self.task).await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::other(format!("webhook server task failed: {}", e))),
        }
    }

    pub fn shutdown(self) {
        self.task.abort();
        log::info!("Webhook server on {} stopped", self.local_addr);
    }
}

/// Receives Kick event deliveries and registers the subscriptions for them
pub struct WebhookServer {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookServer {
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn subscription_request(&self) -> SubscriptionRequest {
        SubscriptionRequest::webhook(self.config.broadcaster_user_id, self.config.events.clone())
    }

    /// Register the configured events once; failures are logged and returned
    pub async fn subscribe_to_events(&self, access_token: &str) -> Result<serde_json::Value> {
        let request = self.subscription_request();
        let result = create_subscription(
            &self.client,
            &self.config.subscriptions_url,
            access_token,
            &request,
        )
        .await;

        match &result {
            Ok(response) => log::info!("✅ Subscribed to Kick events: {}", response),
            Err(e) => log::error!("❌ Failed to subscribe to Kick events: {}", e),
        }
        result
    }

    /// Bind the listener, then register subscriptions
    ///
    /// A failed registration leaves the server running without subscriptions.
    pub async fn start(
        &self,
        access_token: &str,
    ) -> std::result::Result<RunningServer, Box<dyn std::error::Error>> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        log::info!("🚀 Webhook server running on http://{}", local_addr);
        if !self.config.webhook_url.is_empty() {
            log::info!("Expecting Kick deliveries at {}", self.config.webhook_url);
        }

        let task = tokio::spawn(async move { axum::serve(listener, create_router()).await });

        if self.subscribe_to_events(access_token).await.is_err() {
            log::warn!("Webhook server is up but not subscribed to any events");
        }

        Ok(RunningServer { local_addr, task })
    }
}

/// Create the axum router with all routes
pub fn create_router() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhook", post(handle_webhook))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// Event delivery endpoint, payloads are not verified
async fn handle_webhook(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let event_type = headers
        .get(EVENT_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(payload) => match payload.get("content") {
            Some(content) => log::info!("🔔 Webhook received [{}]: {}", event_type, content),
            None => log::info!("🔔 Webhook received [{}] without content", event_type),
        },
        Err(e) => log::warn!(
            "Webhook [{}] body is not JSON ({} bytes): {}",
            event_type,
            body.len(),
            e
        ),
    }

    (StatusCode::OK, "Webhook received")
}
