//! Injectable credential provider with a single-flight token cell.

use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::application::directory::DirectoryError;
use crate::config::CredentialSet;

use super::client::read_body_value;

/// Obtains and caches the upstream bearer token.
///
/// The cell is guarded by an async mutex that stays held across the `/auth`
/// exchange, so concurrent first callers wait for the in-flight exchange
/// instead of each issuing their own.
pub struct CredentialProvider {
    http: Client,
    auth_url: Url,
    credentials: CredentialSet,
    token: Mutex<Option<String>>,
}

impl CredentialProvider {
    pub fn new(http: Client, auth_url: Url, credentials: CredentialSet) -> Self {
        Self {
            http,
            auth_url,
            credentials,
            token: Mutex::new(None),
        }
    }

    /// The cached bearer token, exchanging credentials on first use.
    pub async fn bearer(&self) -> Result<String, DirectoryError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }

        let (token, _body) = self.exchange().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    /// Force a fresh exchange, replacing the cached token. Returns the full
    /// upstream response body so the proxy can relay it.
    pub async fn refresh(&self) -> Result<Value, DirectoryError> {
        let mut guard = self.token.lock().await;
        let (token, body) = self.exchange().await?;
        *guard = Some(token);
        Ok(body)
    }

    async fn exchange(&self) -> Result<(String, Value), DirectoryError> {
        let response = self
            .http
            .post(self.auth_url.clone())
            .json(&self.credentials)
            .send()
            .await
            .map_err(|err| DirectoryError::auth(format!("token endpoint unreachable: {err}")))?;

        let status = response.status();
        let body = read_body_value(response).await.map_err(|err| {
            DirectoryError::auth(format!("failed to read token response: {err}"))
        })?;

        if !status.is_success() {
            return Err(DirectoryError::Auth {
                status: Some(status.as_u16()),
                detail: format!("token endpoint returned status {status}"),
                payload: Some(body),
            });
        }

        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DirectoryError::Auth {
                status: None,
                detail: "token response did not contain an access_token".to_string(),
                payload: Some(body.clone()),
            })?;

        debug!(target = "pulseboard::upstream", "bearer token obtained");
        Ok((token, body))
    }
}
