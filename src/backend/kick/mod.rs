//! Kick public API integration
//!
//! Covers the app-token lifecycle (client-credentials grant with lazy
//! refresh), authenticated read queries and event subscription registration.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use kickbot::backend::kick::{KickApi, KickCredentials};
//!
//! #[tokio::main]
//! async fn main() {
//!     let api = KickApi::new(KickCredentials {
//!         client_id: "your_client_id".to_string(),
//!         client_secret: "your_client_secret".to_string(),
//!         token_url: "https://id.kick.com/oauth/token".to_string(),
//!         api_base_url: "https://api.kick.com/public/v1".to_string(),
//!     });
//!
//!     api.authenticate().await.unwrap();
//!     let channel = api.get_channel("some_channel").await.unwrap();
//!     println!("{} has {} followers", channel.username(), channel.followers_count);
//! }
//! ```

mod api;
mod auth;
mod error;
mod models;
mod subscription;

// Re-export public types
pub use api::{KickApi, RequestOptions, StreamLookup, DEFAULT_API_BASE_URL};
pub use auth::{
    request_app_token, AccessToken, Clock, KickCredentials, SystemClock, TokenManager,
    TokenResponse, DEFAULT_TOKEN_LIFETIME_SECS, DEFAULT_TOKEN_URL,
};
pub use error::{KickError, Result};
pub use models::{Category, ChannelInfo, ImageUrl, Listing, LiveStream, StreamInfo, UserInfo};
pub use subscription::{
    create_subscription, default_events, EventSubscription, SubscriptionRequest, DEFAULT_EVENTS,
    EVENT_SUBSCRIPTIONS_URL,
};
