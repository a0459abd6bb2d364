use serde::{Deserialize, Serialize};

/// `{ "data": [...] }` envelope returned by list endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Listing<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Channel as returned by `/channels`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChannelInfo {
    pub id: u64,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub playback_url: Option<String>,
    #[serde(default)]
    pub vod_enabled: bool,
    #[serde(default)]
    pub subscription_enabled: bool,
    #[serde(default, rename = "followersCount")]
    pub followers_count: u64,
    #[serde(default)]
    pub banner_image: Option<ImageUrl>,
    #[serde(default)]
    pub offline_banner_image: Option<ImageUrl>,
    #[serde(default)]
    pub livestream: Option<StreamInfo>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub can_host: bool,
    #[serde(default)]
    pub subscriber_badges: Vec<serde_json::Value>,
    #[serde(default)]
    pub follower_badges: Vec<serde_json::Value>,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

impl ChannelInfo {
    pub fn username(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.username.as_str())
            .unwrap_or(&self.slug)
    }

    pub fn is_live(&self) -> bool {
        self.livestream.as_ref().is_some_and(|s| s.is_live)
    }

    pub fn viewer_count(&self) -> u64 {
        self.livestream.as_ref().map_or(0, |s| s.viewer_count)
    }
}

/// A channel's current live session
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamInfo {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub channel_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub session_title: String,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub risk_level_id: Option<u64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub twitch_category: Option<String>,
    /// Seconds
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub is_mature: bool,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub thumbnail: Option<ImageUrl>,
    #[serde(default)]
    pub viewers: u64,
}

impl StreamInfo {
    pub fn duration_minutes(&self) -> u64 {
        self.duration / 60
    }
}

/// Entry of the `/channels/live` and `/categories/{id}/streams` listings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LiveStream {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub session_title: String,
    #[serde(default)]
    pub viewer_count: u64,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

impl LiveStream {
    pub fn username(&self) -> &str {
        self.user.as_ref().map_or("unknown", |u| u.username.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<u64>,
    pub username: String,
    #[serde(default)]
    pub agreed_to_terms: bool,
    #[serde(default)]
    pub email_verified_at: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub youtube: Option<String>,
    #[serde(default)]
    pub discord: Option<String>,
    #[serde(default)]
    pub tiktok: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}
