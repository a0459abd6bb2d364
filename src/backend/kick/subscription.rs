use serde::{Deserialize, Serialize};

use super::error::{KickError, Result};

pub const EVENT_SUBSCRIPTIONS_URL: &str = "https://api.kick.com/public/v1/events/subscriptions";

/// Events registered when no explicit list is configured
pub const DEFAULT_EVENTS: [&str; 5] = [
    "chat.message.sent",
    "channel.followed",
    "channel.subscription.new",
    "channel.subscription.renewal",
    "channel.subscription.gifts",
];

/// A single event type with its schema version
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EventSubscription {
    pub name: String,
    #[serde(default = "default_event_version")]
    pub version: u32,
}

fn default_event_version() -> u32 {
    1
}

impl EventSubscription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_event_version(),
        }
    }
}

pub fn default_events() -> Vec<EventSubscription> {
    DEFAULT_EVENTS.iter().copied().map(EventSubscription::new).collect()
}

/// Body of the subscription registration call
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRequest {
    pub broadcaster_user_id: u64,
    pub events: Vec<EventSubscription>,
    pub method: String,
}

impl SubscriptionRequest {
    pub fn webhook(broadcaster_user_id: u64, events: Vec<EventSubscription>) -> Self {
        Self {
            broadcaster_user_id,
            events,
            method: "webhook".to_string(),
        }
    }
}

/// Register event subscriptions for webhook delivery
///
/// # Arguments
/// * `client` - HTTP client used for the registration call
/// * `url` - Subscriptions endpoint
/// * `access_token` - App access token sent as the bearer
/// * `request` - Broadcaster id, events and delivery method
///
/// # Returns
/// The endpoint's JSON response as-is, or `KickError::SubscriptionError`
/// carrying the status and body when Kick rejects the registration
pub async fn create_subscription(
    client: &reqwest::Client,
    url: &str,
    access_token: &str,
    request: &SubscriptionRequest,
) -> Result<serde_json::Value> {
    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", access_token))
        .header("Content-Type", "application/json")
        .json(request)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(KickError::SubscriptionError(format!(
            "HTTP {}: {}",
            status, error_text
        )));
    }

    let subscription_response = response.json::<serde_json::Value>().await?;
    Ok(subscription_response)
}
