//! HTTP client for the evaluation service, with bearer injection.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, header::AUTHORIZATION};
use serde_json::Value;
use url::Url;

use crate::application::directory::{DirectoryError, UserDirectory};
use crate::config::UpstreamSettings;
use crate::domain::entities::{Comment, Post, User};
use crate::infra::error::InfraError;

use super::schema;
use super::token::CredentialProvider;

pub struct EvaluationClient {
    http: Client,
    base: Url,
    credentials: Arc<CredentialProvider>,
}

impl EvaluationClient {
    /// Build a client from validated settings. Fails when the base URL or
    /// the credential set is missing, since every proxied read needs both.
    pub fn from_settings(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let base_url = settings
            .base_url
            .as_deref()
            .ok_or_else(|| InfraError::configuration("upstream.base_url is not configured"))?;
        // Trailing slash keeps `Url::join` appending instead of replacing
        // the last path segment.
        let base = Url::parse(&format!("{base_url}/")).map_err(|err| {
            InfraError::configuration(format!("upstream.base_url is not a valid URL: {err}"))
        })?;

        let credentials = settings.credentials.clone().ok_or_else(|| {
            InfraError::configuration("upstream.credentials are not configured")
        })?;

        let http = Client::builder()
            .user_agent(concat!("pulseboard/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build upstream client: {err}"))
            })?;

        let auth_url = base.join("auth").map_err(|err| {
            InfraError::configuration(format!("failed to derive auth endpoint: {err}"))
        })?;

        Ok(Self {
            http: http.clone(),
            base,
            credentials: Arc::new(CredentialProvider::new(http, auth_url, credentials)),
        })
    }

    /// Forward an authenticated GET and return the upstream JSON body.
    /// Error statuses become `Unavailable` carrying the status and payload
    /// so proxy handlers can relay them verbatim.
    pub async fn forward_get(&self, path: &str) -> Result<Value, DirectoryError> {
        let token = self.credentials.bearer().await?;
        let url = self.url(path)?;

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .map_err(|err| DirectoryError::unavailable(format!("request failed: {err}")))?;

        let status = response.status();
        let body = read_body_value(response)
            .await
            .map_err(|err| DirectoryError::unavailable(format!("failed to read body: {err}")))?;

        if !status.is_success() {
            return Err(DirectoryError::Unavailable {
                status: Some(status.as_u16()),
                detail: format!("upstream returned status {status}"),
                payload: Some(body),
            });
        }

        Ok(body)
    }

    /// Relay a registration payload without token injection; the upstream
    /// accepts `/register` unauthenticated.
    pub async fn register(&self, payload: Value) -> Result<Value, DirectoryError> {
        let url = self.url("register")?;

        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| DirectoryError::unavailable(format!("request failed: {err}")))?;

        let status = response.status();
        let body = read_body_value(response)
            .await
            .map_err(|err| DirectoryError::unavailable(format!("failed to read body: {err}")))?;

        if !status.is_success() {
            return Err(DirectoryError::Unavailable {
                status: Some(status.as_u16()),
                detail: format!("upstream returned status {status}"),
                payload: Some(body),
            });
        }

        Ok(body)
    }

    /// Re-authenticate, refreshing the cached token, and return the full
    /// token response for relay.
    pub async fn refresh_auth(&self) -> Result<Value, DirectoryError> {
        self.credentials.refresh().await
    }

    fn url(&self, path: &str) -> Result<Url, DirectoryError> {
        self.base
            .join(path)
            .map_err(|err| DirectoryError::unavailable(format!("invalid upstream path: {err}")))
    }
}

#[async_trait]
impl UserDirectory for EvaluationClient {
    async fn list_users(&self) -> Result<Vec<User>, DirectoryError> {
        let body = self.forward_get("users").await?;
        schema::users_from_value(body)
    }

    async fn list_posts(&self, user_id: &str) -> Result<Vec<Post>, DirectoryError> {
        let body = self.forward_get(&format!("users/{user_id}/posts")).await?;
        schema::posts_from_value(body)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, DirectoryError> {
        let body = self
            .forward_get(&format!("posts/{post_id}/comments"))
            .await?;
        schema::comments_from_value(body)
    }
}

/// Read a response body as JSON, falling back to a string value when the
/// upstream answers with a non-JSON payload.
pub(super) async fn read_body_value(response: reqwest::Response) -> Result<Value, reqwest::Error> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned())))
}
