//! HTTPS client for the SBHS student API.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::error::{ErrorContext, UpstreamError, UpstreamResult};
use super::{TokenSet, UpstreamApi};
use crate::config::{OAuthSettings, UpstreamSettings};
use crate::models::TimetablePayload;

/// Longest upstream error body echoed into an error message.
const MAX_ERROR_BODY: usize = 200;

/// SBHS API client. Cheap to clone; the connection pool is shared.
#[derive(Clone)]
pub struct SbhsClient {
    http: Client,
    upstream: UpstreamSettings,
    oauth: OAuthSettings,
}

impl SbhsClient {
    pub fn new(upstream: &UpstreamSettings, oauth: &OAuthSettings) -> UpstreamResult<Self> {
        if upstream.base_url.trim().is_empty() {
            return Err(UpstreamError::Configuration(
                "upstream.base_url must not be empty".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(upstream.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            upstream: upstream.clone(),
            oauth: oauth.clone(),
        })
    }

    /// Absolute URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.upstream.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET with bearer auth, repeated up to `upstream.retries` more times
    /// while the failure is retryable.
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        access_token: &str,
    ) -> UpstreamResult<T> {
        let mut attempt = 0;
        loop {
            match self.get_json_once(operation, path, access_token).await {
                Err(e) if e.is_retryable() && attempt < self.upstream.retries => {
                    attempt += 1;
                    log::warn!("{} failed, retrying ({}/{}): {}", operation, attempt, self.upstream.retries, e);
                    tokio::time::sleep(Duration::from_millis(self.upstream.retry_backoff_ms)).await;
                }
                result => return result,
            }
        }
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        access_token: &str,
    ) -> UpstreamResult<T> {
        let url = self.endpoint(path);
        let context = ErrorContext::new(operation).with_endpoint(path);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| UpstreamError::transport(e.to_string(), context.clone()))?;

        Self::decode(response, context).await
    }

    async fn token_request(&self, operation: &str, form: &[(&str, &str)]) -> UpstreamResult<TokenSet> {
        let context = ErrorContext::new(operation).with_endpoint(self.oauth.token_url.clone());

        let response = self
            .http
            .post(&self.oauth.token_url)
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(e.to_string(), context.clone()))?;

        Self::decode(response, context).await
    }

    async fn decode<T: DeserializeOwned>(response: Response, context: ErrorContext) -> UpstreamResult<T> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(UpstreamError::unauthorized("upstream rejected token", context));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(UpstreamError::status(status.as_u16(), message, context));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::decode(e.to_string(), context))
    }
}

#[async_trait]
impl UpstreamApi for SbhsClient {
    fn name(&self) -> &'static str {
        "sbhs"
    }

    async fn health_check(&self) -> UpstreamResult<bool> {
        let context = ErrorContext::new("health_check").with_endpoint(self.upstream.base_url.clone());
        let response = self
            .http
            .get(&self.upstream.base_url)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(e.to_string(), context))?;
        Ok(!response.status().is_server_error())
    }

    async fn fetch_timetable(&self, access_token: &str) -> UpstreamResult<TimetablePayload> {
        self.get_json("fetch_timetable", &self.upstream.timetable_path, access_token)
            .await
    }

    async fn fetch_notices(&self, access_token: &str) -> UpstreamResult<Value> {
        self.get_json("fetch_notices", &self.upstream.notices_path, access_token)
            .await
    }

    async fn fetch_userinfo(&self, access_token: &str) -> UpstreamResult<Value> {
        self.get_json("fetch_userinfo", &self.upstream.userinfo_path, access_token)
            .await
    }

    async fn exchange_code(&self, code: &str) -> UpstreamResult<TokenSet> {
        self.token_request(
            "exchange_code",
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.oauth.redirect_uri.as_str()),
                ("client_id", self.oauth.client_id.as_str()),
                ("client_secret", self.oauth.client_secret.as_str()),
            ],
        )
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> UpstreamResult<TokenSet> {
        self.token_request(
            "refresh_token",
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.oauth.client_id.as_str()),
                ("client_secret", self.oauth.client_secret.as_str()),
            ],
        )
        .await
    }
}
