use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::api::DEFAULT_API_BASE_URL;
use super::error::{KickError, Result};

pub const DEFAULT_TOKEN_URL: &str = "https://id.kick.com/oauth/token";

/// Lifetime assumed when the token endpoint does not report `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Application credentials for the client-credentials grant
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KickCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub api_base_url: String,
}

impl Default for KickCredentials {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Response from the token endpoint
///
/// Kick has returned the bearer under both `access_token` and `token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    /// Seconds; Kick has sent this as a number, a numeric string or not at all
    #[serde(default)]
    pub expires_in: Option<serde_json::Value>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// The bearer string, preferring `access_token` over `token`
    pub fn bearer(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.token.as_deref().filter(|t| !t.is_empty()))
    }

    /// Reported lifetime rounded down, or the default when absent, zero or unparsable
    pub fn lifetime_secs(&self) -> u64 {
        let secs = match &self.expires_in {
            Some(serde_json::Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().map(floor_secs)),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok().map(floor_secs),
            _ => None,
        };
        secs.filter(|&s| s > 0).unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
    }
}

fn floor_secs(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    }
}

/// A bearer token together with the instant it stops being usable
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, issued_at: DateTime<Utc>, lifetime_secs: u64) -> Self {
        let lifetime = i64::try_from(lifetime_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        let expires_at = issued_at
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Build a token from an endpoint response, `None` if it carries no bearer
    pub fn from_response(response: &TokenResponse, issued_at: DateTime<Utc>) -> Option<Self> {
        let value = response.bearer()?;
        Some(Self::new(value, issued_at, response.lifetime_secs()))
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Exact comparison, no grace period
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of the current time for token expiry decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Request an app access token with the client-credentials grant
///
/// # Arguments
/// * `client` - HTTP client used for the token request
/// * `credentials` - Client id, secret and token endpoint
/// * `clock` - Source of the issuance time the expiry is computed from
///
/// # Returns
/// An `AccessToken` expiring `expires_in` seconds after issuance (3600 when
/// unreported), or `KickError::AuthError` on a non-success status or a
/// response without a token field
pub async fn request_app_token(
    client: &reqwest::Client,
    credentials: &KickCredentials,
    clock: &dyn Clock,
) -> Result<AccessToken> {
    let params = [
        ("grant_type", "client_credentials"),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
    ];

    let response = client
        .post(&credentials.token_url)
        .form(&params)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(KickError::AuthError(format!(
            "HTTP {} - {}",
            status, error_text
        )));
    }

    let token_response = response.json::<TokenResponse>().await?;

    AccessToken::from_response(&token_response, clock.now()).ok_or_else(|| {
        KickError::AuthError("No access token received from authentication".to_string())
    })
}

/// Sole owner of the client's token
///
/// The lock is held across a refresh, so callers racing past expiry wait for
/// one re-authentication instead of each issuing their own.
pub struct TokenManager {
    client: reqwest::Client,
    credentials: Arc<KickCredentials>,
    clock: Arc<dyn Clock>,
    token: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(
        client: reqwest::Client,
        credentials: Arc<KickCredentials>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            credentials,
            clock,
            token: Mutex::new(None),
        }
    }

    /// Fetch a fresh token and replace the held one
    pub async fn authenticate(&self) -> Result<AccessToken> {
        let mut slot = self.token.lock().await;
        self.authenticate_locked(&mut slot).await
    }

    /// Return the held token, re-authenticating first if it is absent or stale
    pub async fn valid_token(&self) -> Result<AccessToken> {
        let mut slot = self.token.lock().await;

        let now = self.clock.now();
        if let Some(token) = slot.as_ref().filter(|t| !t.is_stale(now)) {
            return Ok(token.clone());
        }

        if slot.is_some() {
            log::debug!("Access token expired, re-authenticating");
        }
        self.authenticate_locked(&mut slot).await
    }

    /// Currently held token, stale or not
    pub async fn current(&self) -> Option<AccessToken> {
        self.token.lock().await.clone()
    }

    async fn authenticate_locked(&self, slot: &mut Option<AccessToken>) -> Result<AccessToken> {
        match request_app_token(&self.client, &self.credentials, self.clock.as_ref()).await {
            Ok(token) => {
                log::info!(
                    "Authentication successful, token valid until {}",
                    token.expires_at()
                );
                *slot = Some(token.clone());
                Ok(token)
            }
            Err(e) => {
                log::error!("Authentication error: {}", e);
                Err(e)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn start_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn manager(server: &MockServer, clock: Arc<ManualClock>) -> TokenManager {
        let credentials = KickCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            token_url: format!("{}/oauth/token", server.uri()),
            api_base_url: server.uri(),
        };
        TokenManager::new(reqwest::Client::new(), Arc::new(credentials), clock)
    }

    #[test]
    fn test_bearer_prefers_access_token() {
        let response: TokenResponse =
            serde_json::from_value(json!({"access_token": "a", "token": "b"})).unwrap();
        assert_eq!(response.bearer(), Some("a"));

        let response: TokenResponse = serde_json::from_value(json!({"token": "b"})).unwrap();
        assert_eq!(response.bearer(), Some("b"));

        let response: TokenResponse =
            serde_json::from_value(json!({"access_token": "", "expires_in": 5})).unwrap();
        assert_eq!(response.bearer(), None);
    }

    #[test]
    fn test_expiry_defaults_to_one_hour() {
        let response: TokenResponse =
            serde_json::from_value(json!({"access_token": "abc"})).unwrap();
        let token = AccessToken::from_response(&response, start_time()).unwrap();
        assert_eq!(token.value(), "abc");
        assert_eq!(token.expires_at(), start_time() + TimeDelta::seconds(3600));
    }

    #[test]
    fn test_lifetime_falls_back_like_a_missing_value() {
        let lifetime = |body: serde_json::Value| {
            serde_json::from_value::<TokenResponse>(body)
                .unwrap()
                .lifetime_secs()
        };

        assert_eq!(lifetime(json!({"access_token": "a", "expires_in": 0})), 3600);
        assert_eq!(lifetime(json!({"access_token": "a", "expires_in": null})), 3600);
        assert_eq!(lifetime(json!({"access_token": "a", "expires_in": -5})), 3600);
        assert_eq!(lifetime(json!({"access_token": "a", "expires_in": "soon"})), 3600);
        assert_eq!(lifetime(json!({"access_token": "a", "expires_in": "3600"})), 3600);
        assert_eq!(lifetime(json!({"access_token": "a", "expires_in": " 120 "})), 120);
        assert_eq!(lifetime(json!({"access_token": "a", "expires_in": 3599.5})), 3599);
        assert_eq!(lifetime(json!({"access_token": "a", "expires_in": 10})), 10);
    }

    #[tokio::test]
    async fn test_authenticate_with_zero_or_string_lifetime() {
        for (expires_in, expected_secs) in [(json!(0), 3600), (json!("3600"), 3600), (json!(3599.5), 3599)] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/oauth/token"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"access_token": "abc", "expires_in": expires_in})),
                )
                .mount(&server)
                .await;

            let tokens = manager(&server, Arc::new(ManualClock::new(start_time())));
            let token = tokens.authenticate().await.unwrap();

            assert_eq!(
                token.expires_at(),
                start_time() + TimeDelta::seconds(expected_secs)
            );
            assert!(!token.is_stale(start_time()));
        }
    }

    #[test]
    fn test_staleness_is_exact() {
        let token = AccessToken::new("abc", start_time(), 10);
        assert!(!token.is_stale(start_time() + TimeDelta::seconds(9)));
        assert!(token.is_stale(start_time() + TimeDelta::seconds(10)));
        assert!(token.is_stale(start_time() + TimeDelta::seconds(11)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = AccessToken::new("supersecret", start_time(), 10);
        assert!(!format!("{:?}", token).contains("supersecret"));
    }

    #[tokio::test]
    async fn test_authenticate_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=id"))
            .and(body_string_contains("client_secret=secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "abc", "expires_in": 10})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let clock = Arc::new(ManualClock::new(start_time()));
        let tokens = manager(&server, clock);
        let token = tokens.authenticate().await.unwrap();

        assert_eq!(token.value(), "abc");
        assert_eq!(token.expires_at(), start_time() + TimeDelta::seconds(10));
        assert_eq!(tokens.current().await, Some(token));
    }

    #[tokio::test]
    async fn test_authenticate_rejected_stores_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&server)
            .await;

        let tokens = manager(&server, Arc::new(ManualClock::new(start_time())));
        let err = tokens.authenticate().await.unwrap_err();

        assert!(matches!(err, KickError::AuthError(_)));
        assert!(tokens.current().await.is_none());
    }

    #[tokio::test]
    async fn test_authenticate_without_token_field_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"expires_in": 3600})))
            .mount(&server)
            .await;

        let tokens = manager(&server, Arc::new(ManualClock::new(start_time())));
        let err = tokens.authenticate().await.unwrap_err();

        assert!(matches!(err, KickError::AuthError(_)));
        assert!(tokens.current().await.is_none());
    }

    #[tokio::test]
    async fn test_valid_token_refreshes_only_when_stale() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"token": "abc", "expires_in": 10})),
            )
            .expect(2)
            .mount(&server)
            .await;

        let clock = Arc::new(ManualClock::new(start_time()));
        let tokens = manager(&server, clock.clone());

        // absent -> first request
        tokens.valid_token().await.unwrap();
        clock.advance(9);
        tokens.valid_token().await.unwrap();
        clock.advance(1);
        tokens.valid_token().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_single_flight() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "abc", "expires_in": 60}))
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tokens = Arc::new(manager(&server, Arc::new(ManualClock::new(start_time()))));
        let handles: Vec<_> = (0..5)
            .map(|_| {
                let tokens = tokens.clone();
                tokio::spawn(async move { tokens.valid_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().value(), "abc");
        }
    }
}
