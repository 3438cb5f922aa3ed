//! Supabase REST client implementing the client capabilities.

use crate::error::{error_message, SupabaseError, SupabaseResult};
use async_trait::async_trait;
use chrono::Utc;
use client_config_and_utils::Config;
use parking_lot::RwLock;
use remote_capabilities::{
    AuthService, CounterAction, CounterService, EventKind, RemoteResult, RemoteSession,
    TelemetrySink, User,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Token endpoint response (password grant and sign-up with autoconfirm).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: User,
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: Option<String>,
}

impl AccessToken {
    fn from_response(response: &TokenResponse) -> Self {
        Self {
            token: response.access_token.clone(),
            expires_at: response
                .expires_in
                .map(|secs| (Utc::now() + chrono::Duration::seconds(secs)).to_rfc3339()),
        }
    }
}

/// `event_type` value written to the `Stats` table.
pub fn stats_event_type(kind: EventKind) -> String {
    format!("coupon_{}", kind.as_str())
}

struct Inner {
    http_client: reqwest::Client,
    api_url: String,
    anon_key: String,
    counter_function: String,
    /// Access token of the signed-in user, kept in memory only.
    session: RwLock<Option<AccessToken>>,
}

/// Supabase-backed auth, counter and telemetry capabilities.
///
/// Cheap to clone; clones share the HTTP client and the session token.
#[derive(Clone)]
pub struct SupabaseRemote {
    inner: Arc<Inner>,
}

impl SupabaseRemote {
    /// Create a client for a Supabase project.
    ///
    /// # Arguments
    /// * `api_url` - project URL, e.g. `https://xyz.supabase.co`
    /// * `anon_key` - publishable (anon) API key
    /// * `counter_function` - edge function applying favourite counter deltas
    pub fn new(
        api_url: impl Into<String>,
        anon_key: impl Into<String>,
        counter_function: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http_client: reqwest::Client::new(),
                api_url: api_url.into().trim_end_matches('/').to_string(),
                anon_key: anon_key.into(),
                counter_function: counter_function.into(),
                session: RwLock::new(None),
            }),
        }
    }

    pub fn from_config(config: &Config) -> SupabaseResult<Self> {
        let url = config
            .supabase_url()
            .map_err(|e| SupabaseError::Config(e.to_string()))?;
        Ok(Self::new(
            url.as_str(),
            &config.supabase_publishable_key,
            &config.counter_function,
        ))
    }

    pub fn api_url(&self) -> &str {
        &self.inner.api_url
    }

    pub fn has_session(&self) -> bool {
        self.inner.session.read().is_some()
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.inner.api_url, path)
    }

    fn function_url(&self) -> String {
        format!(
            "{}/functions/v1/{}",
            self.inner.api_url, self.inner.counter_function
        )
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.inner.api_url, table)
    }

    /// Bearer token for data calls: the user's token, else the anon key.
    fn bearer(&self) -> String {
        match self.inner.session.read().as_ref() {
            Some(session) => session.token.clone(),
            None => self.inner.anon_key.clone(),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> SupabaseResult<String> {
        let response = self
            .inner
            .http_client
            .post(url)
            .header("apikey", &self.inner.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        Self::read_body(response).await
    }

    async fn read_body(response: reqwest::Response) -> SupabaseResult<String> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = %status, body = %body, "Supabase request failed");
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(body)
    }

    fn store_token(&self, response: &TokenResponse) {
        *self.inner.session.write() = Some(AccessToken::from_response(response));
    }

    async fn password_grant(&self, email: &str, password: &str) -> SupabaseResult<User> {
        let url = self.auth_url("token?grant_type=password");
        debug!(url = %url, email = %email, "Attempting email/password login");

        let body = self
            .post_json(
                &url,
                &self.inner.anon_key,
                &serde_json::json!({ "email": email, "password": password }),
            )
            .await?;
        let data: TokenResponse = serde_json::from_str(&body)?;
        self.store_token(&data);

        info!(user_id = %data.user.id, "Login successful");
        Ok(data.user)
    }

    async fn signup(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> SupabaseResult<User> {
        let url = self.auth_url("signup");
        debug!(url = %url, email = %email, "Attempting sign-up");

        let body = self
            .post_json(
                &url,
                &self.inner.anon_key,
                &serde_json::json!({ "email": email, "password": password, "data": metadata }),
            )
            .await?;

        // With email confirmation enabled the response is the bare user and
        // carries no session.
        let value: serde_json::Value = serde_json::from_str(&body)?;
        let user = if value.get("access_token").is_some() {
            let data: TokenResponse = serde_json::from_value(value)?;
            self.store_token(&data);
            data.user
        } else {
            serde_json::from_value(value)?
        };

        info!(user_id = %user.id, "Sign-up successful");
        Ok(user)
    }

    async fn logout(&self) -> SupabaseResult<()> {
        let Some(session) = self.inner.session.read().clone() else {
            debug!("No access token held, nothing to revoke");
            return Ok(());
        };

        let url = self.auth_url("logout");
        self.post_json(&url, &session.token, &serde_json::json!({}))
            .await?;

        *self.inner.session.write() = None;
        info!("Logged out");
        Ok(())
    }

    async fn current_session(&self) -> SupabaseResult<Option<RemoteSession>> {
        let Some(session) = self.inner.session.read().clone() else {
            return Ok(None);
        };

        let url = self.auth_url("user");
        debug!(url = %url, "Verifying session with Supabase");

        let response = self
            .inner
            .http_client
            .get(&url)
            .header("apikey", &self.inner.anon_key)
            .header("Authorization", format!("Bearer {}", session.token))
            .send()
            .await?;

        match Self::read_body(response).await {
            Ok(body) => {
                let user: User = serde_json::from_str(&body)?;
                debug!(user_id = %user.id, "Session verified with server");
                Ok(Some(RemoteSession {
                    user,
                    expires_at: session.expires_at,
                }))
            }
            Err(SupabaseError::Api { status, .. }) if status == 401 || status == 403 => {
                info!(status, "Server rejected session, dropping token");
                *self.inner.session.write() = None;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn counter_mutation(&self, entity_id: &str, action: CounterAction) -> SupabaseResult<()> {
        let url = self.function_url();
        debug!(id = entity_id, action = action.as_str(), "Invoking counter function");

        self.post_json(
            &url,
            &self.bearer(),
            &serde_json::json!({ "id": entity_id, "action": action.as_str() }),
        )
        .await?;
        Ok(())
    }

    /// Insert one row into the `Stats` table.
    pub async fn insert_stat(&self, entity_id: &str, kind: EventKind) -> SupabaseResult<()> {
        let url = self.rest_url("Stats");
        let body = serde_json::json!({
            "event_type": stats_event_type(kind),
            "reference": entity_id,
        });

        let response = self
            .inner
            .http_client
            .post(&url)
            .header("apikey", &self.inner.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;

        Self::read_body(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for SupabaseRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseRemote")
            .field("api_url", &self.inner.api_url)
            .field("counter_function", &self.inner.counter_function)
            .field("has_session", &self.has_session())
            .finish()
    }
}

#[async_trait]
impl AuthService for SupabaseRemote {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> RemoteResult<User> {
        self.password_grant(email, password)
            .await
            .map_err(|e| e.into_remote(true))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> RemoteResult<User> {
        self.signup(email, password, metadata)
            .await
            .map_err(|e| e.into_remote(true))
    }

    async fn sign_out(&self) -> RemoteResult<()> {
        self.logout().await.map_err(|e| e.into_remote(true))
    }

    async fn get_session(&self) -> RemoteResult<Option<RemoteSession>> {
        self.current_session()
            .await
            .map_err(|e| e.into_remote(true))
    }
}

#[async_trait]
impl CounterService for SupabaseRemote {
    async fn invoke_counter_mutation(
        &self,
        entity_id: &str,
        action: CounterAction,
    ) -> RemoteResult<()> {
        self.counter_mutation(entity_id, action)
            .await
            .map_err(|e| e.into_remote(false))
    }
}

impl TelemetrySink for SupabaseRemote {
    /// Spawns the insert on the current runtime; outside a runtime the event
    /// is dropped.
    fn record(&self, entity_id: &str, kind: EventKind) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(id = entity_id, kind = kind.as_str(), "No runtime, dropping stat");
            return;
        };

        let client = self.clone();
        let entity_id = entity_id.to_string();
        runtime.spawn(async move {
            if let Err(e) = client.insert_stat(&entity_id, kind).await {
                warn!(id = %entity_id, kind = kind.as_str(), error = %e, "Failed to record stat");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_capabilities::RemoteError;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (url, handle)
    }

    const TOKEN_BODY: &str = r#"{"access_token":"tok-1","refresh_token":"r","expires_in":3600,"user":{"id":"u1","email":"a@b.com"}}"#;

    #[test]
    fn test_endpoint_urls() {
        let remote = SupabaseRemote::new("https://xyz.supabase.co/", "anon", "favourite-counter");
        assert_eq!(remote.api_url(), "https://xyz.supabase.co");
        assert_eq!(
            remote.auth_url("token?grant_type=password"),
            "https://xyz.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            remote.function_url(),
            "https://xyz.supabase.co/functions/v1/favourite-counter"
        );
        assert_eq!(remote.rest_url("Stats"), "https://xyz.supabase.co/rest/v1/Stats");
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            supabase_url: "https://abc.supabase.co".to_string(),
            counter_function: "counter".to_string(),
            ..Config::default()
        };
        let remote = SupabaseRemote::from_config(&config).unwrap();
        assert_eq!(remote.api_url(), "https://abc.supabase.co");
        assert_eq!(remote.function_url(), "https://abc.supabase.co/functions/v1/counter");
    }

    #[test]
    fn test_stats_event_types() {
        assert_eq!(stats_event_type(EventKind::Click), "coupon_click");
        assert_eq!(
            stats_event_type(EventKind::AddToFavourite),
            "coupon_add_to_favourite"
        );
        assert_eq!(
            stats_event_type(EventKind::RemoveFromFavourite),
            "coupon_remove_from_favourite"
        );
    }

    #[tokio::test]
    async fn test_without_token_session_and_logout_are_local() {
        let remote = SupabaseRemote::new("http://127.0.0.1:9", "anon", "counter");
        assert_eq!(remote.get_session().await, Ok(None));
        assert_eq!(remote.sign_out().await, Ok(()));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let remote = SupabaseRemote::new(format!("http://{}", addr), "anon", "counter");
        let result = remote
            .invoke_counter_mutation("c1", CounterAction::Increment)
            .await;
        assert!(matches!(result, Err(RemoteError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_sign_in_stores_token() {
        let (url, server) = serve_once("200 OK", TOKEN_BODY).await;
        let remote = SupabaseRemote::new(url, "anon", "counter");

        let user = remote.sign_in_with_password("a@b.com", "secret").await.unwrap();
        assert_eq!(user.id, "u1");
        assert!(remote.has_session());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /auth/v1/token?grant_type=password"));
        assert!(request.contains(r#""email":"a@b.com""#));
    }

    #[tokio::test]
    async fn test_rejected_credentials_map_to_auth() {
        let (url, server) = serve_once(
            "400 Bad Request",
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .await;
        let remote = SupabaseRemote::new(url, "anon", "counter");

        let result = remote.sign_in_with_password("a@b.com", "wrong").await;
        assert_eq!(result, Err(RemoteError::Auth("Invalid login credentials".into())));
        assert!(!remote.has_session());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_up_without_session() {
        let (url, server) = serve_once("200 OK", r#"{"id":"u2","email":"new@b.com"}"#).await;
        let remote = SupabaseRemote::new(url, "anon", "counter");

        let user = remote
            .sign_up("new@b.com", "secret", serde_json::json!({ "name": "Ala" }))
            .await
            .unwrap();
        assert_eq!(user.id, "u2");
        assert!(!remote.has_session());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /auth/v1/signup"));
        assert!(request.contains(r#""data":{"name":"Ala"}"#));
    }

    #[tokio::test]
    async fn test_counter_failure_maps_to_service() {
        let (url, server) =
            serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let remote = SupabaseRemote::new(url, "anon", "counter");

        let result = remote
            .invoke_counter_mutation("c1", CounterAction::Decrement)
            .await;
        assert_eq!(
            result,
            Err(RemoteError::Service {
                status: 500,
                message: "boom".into()
            })
        );

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /functions/v1/counter"));
        assert!(request.contains(r#""action":"decrement""#));
    }
}
