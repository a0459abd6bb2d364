use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use urlencoding::encode;

use super::auth::{AccessToken, Clock, KickCredentials, SystemClock, TokenManager};
use super::error::{KickError, Result};
use super::models::{Category, ChannelInfo, Listing, LiveStream, StreamInfo, UserInfo};

pub const DEFAULT_API_BASE_URL: &str = "https://api.kick.com/public/v1";

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIVE_LIMIT: u32 = 20;

/// Per-call overrides for [`KickApi::make_request`]
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Merged over the default headers, replacing any with the same name
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn post(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Outcome of a stream lookup
///
/// Keeps "the channel has no live session" apart from "the channel could not
/// be fetched"; [`StreamLookup::into_option`] folds both into `None`.
#[derive(Debug)]
pub enum StreamLookup {
    Live(StreamInfo),
    Offline,
    Failed(KickError),
}

impl StreamLookup {
    pub fn into_option(self) -> Option<StreamInfo> {
        match self {
            StreamLookup::Live(stream) => Some(stream),
            StreamLookup::Offline | StreamLookup::Failed(_) => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, StreamLookup::Live(stream) if stream.is_live)
    }
}

/// Kick public API client for authenticated read operations
pub struct KickApi {
    client: reqwest::Client,
    credentials: Arc<KickCredentials>,
    tokens: TokenManager,
}

impl KickApi {
    pub fn new(credentials: KickCredentials) -> Self {
        Self::with_clock(credentials, Arc::new(SystemClock))
    }

    pub fn with_clock(credentials: KickCredentials, clock: Arc<dyn Clock>) -> Self {
        let client = reqwest::Client::new();
        let credentials = Arc::new(credentials);
        let tokens = TokenManager::new(client.clone(), credentials.clone(), clock);

        Self {
            client,
            credentials,
            tokens,
        }
    }

    /// Obtain a new app access token, replacing any held one
    pub async fn authenticate(&self) -> Result<AccessToken> {
        self.tokens.authenticate().await
    }

    /// Re-authenticate if no token is held or the held one has expired
    pub async fn ensure_valid_token(&self) -> Result<AccessToken> {
        self.tokens.valid_token().await
    }

    /// Currently held bearer string, if any
    pub async fn access_token(&self) -> Option<String> {
        self.tokens
            .current()
            .await
            .map(|token| token.value().to_string())
    }

    /// Perform an authenticated call against `api_base_url + endpoint`
    pub async fn make_request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let token = self.ensure_valid_token().await?;
        let url = format!("{}{}", self.credentials.api_base_url, endpoint);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token.value()))
            .map_err(|e| KickError::AuthError(format!("Token is not a valid header: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);

        let mut request = self
            .client
            .request(options.method, &url)
            .headers(headers)
            .headers(options.headers);
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        log::debug!("Kick API request: {}", url);
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(KickError::RequestError {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let parsed = response.json::<T>().await?;
        Ok(parsed)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.make_request(endpoint, RequestOptions::default()).await
    }

    /// Get channel information by slug
    pub async fn get_channel(&self, slug: &str) -> Result<ChannelInfo> {
        self.get(&format!("/channels?slug={}", encode(slug))).await
    }

    /// Get currently live streams, defaulting to page 1 with 20 entries
    pub async fn get_live_streams(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Listing<LiveStream>> {
        self.get(&format!(
            "/channels/live?page={}&limit={}",
            page.unwrap_or(DEFAULT_PAGE),
            limit.unwrap_or(DEFAULT_LIVE_LIMIT)
        ))
        .await
    }

    /// Look up a channel's live session without propagating failures
    pub async fn get_stream_info(&self, slug: &str) -> StreamLookup {
        match self.get_channel(slug).await {
            Ok(channel) => match channel.livestream {
                Some(stream) => StreamLookup::Live(stream),
                None => StreamLookup::Offline,
            },
            Err(e) => {
                log::error!("Error getting stream info for {}: {}", slug, e);
                StreamLookup::Failed(e)
            }
        }
    }

    pub async fn search_channels(
        &self,
        query: &str,
        page: Option<u32>,
    ) -> Result<Listing<ChannelInfo>> {
        self.get(&format!(
            "/search/channels?query={}&page={}",
            encode(query),
            page.unwrap_or(DEFAULT_PAGE)
        ))
        .await
    }

    /// Followers of a channel; the response shape is passed through untouched
    pub async fn get_channel_followers(
        &self,
        slug: &str,
        page: Option<u32>,
    ) -> Result<serde_json::Value> {
        self.get(&format!(
            "/channels/{}/followers?page={}",
            encode(slug),
            page.unwrap_or(DEFAULT_PAGE)
        ))
        .await
    }

    pub async fn get_user_info(&self, username: &str) -> Result<UserInfo> {
        self.get(&format!("/users/{}", encode(username))).await
    }

    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        self.get("/categories").await
    }

    pub async fn get_streams_by_category(
        &self,
        category_id: u64,
        page: Option<u32>,
    ) -> Result<Listing<LiveStream>> {
        self.get(&format!(
            "/categories/{}/streams?page={}",
            category_id,
            page.unwrap_or(DEFAULT_PAGE)
        ))
        .await
    }
}
