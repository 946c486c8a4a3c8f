//! Token endpoint client: code exchange, client credentials, refresh and
//! revocation.
//!
//! Every call authenticates with HTTP basic auth using the app's client id
//! and secret, and sends a JSON body.

use std::time::Duration;

use chrono::Utc;
use lyft_client::{RawResponse, Response, StatusError};
use reqwest::StatusCode;
use serde_json::json;

use crate::credential::{Credential, TokenResponse};
use crate::error::{OAuthError, Result};
use crate::oauth::{OAuthConfig, SCOPE_PUBLIC};

/// Default timeout for token requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the `/oauth/*` endpoints.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl TokenClient {
    /// Create a client with an internally built HTTP client.
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("lyft-oauth/{}", env!("CARGO_PKG_VERSION")))
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self::with_http_client(config, http))
    }

    /// Create a client that reuses an existing HTTP client.
    pub fn with_http_client(config: OAuthConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Exchange an authorization code from the redirect for a credential.
    pub async fn exchange_code(&self, code: &str) -> Result<Response<Credential>> {
        let mut body = json!({
            "grant_type": "authorization_code",
            "code": code,
        });
        if let Some(redirect) = &self.config.redirect_uri {
            body["redirect_uri"] = json!(redirect);
        }
        let raw = self.post("oauth/token", &body).await?;
        let issued_at = Utc::now();
        Ok(raw
            .expect::<TokenResponse>(StatusCode::OK)?
            .map(|t| t.into_credential(issued_at)))
    }

    /// Obtain an app-only credential with the `public` scope.
    pub async fn client_credentials(&self) -> Result<Response<Credential>> {
        let body = json!({
            "grant_type": "client_credentials",
            "scope": SCOPE_PUBLIC,
        });
        let raw = self.post("oauth/token", &body).await?;
        let issued_at = Utc::now();
        Ok(raw
            .expect::<TokenResponse>(StatusCode::OK)?
            .map(|t| t.into_credential(issued_at)))
    }

    /// Trade a credential's refresh token for a new access token.
    ///
    /// The returned credential keeps the old refresh token unless the server
    /// issued a new one.
    pub async fn refresh(&self, credential: &Credential) -> Result<Response<Credential>> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or(OAuthError::MissingRefreshToken)?;
        let body = json!({
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
        });
        let raw = self.post("oauth/token", &body).await?;
        let issued_at = Utc::now();
        Ok(raw
            .expect::<TokenResponse>(StatusCode::OK)?
            .map(|t| t.refresh(credential, issued_at)))
    }

    /// Revoke a token.
    pub async fn revoke(&self, token: &str) -> Result<Response<()>> {
        let raw = self
            .post("oauth/revoke_refresh_token", &json!({ "token": token }))
            .await?;
        if raw.status() == StatusCode::OK {
            Ok(Response {
                data: (),
                meta: raw.meta,
            })
        } else {
            Err(lyft_client::Error::from(StatusError::generic(raw)).into())
        }
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<RawResponse> {
        let url = self.config.endpoint(path)?;
        tracing::debug!(%url, "token request");
        let response = self
            .http
            .post(url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .json(body)
            .send()
            .await?;
        Ok(RawResponse::read(response).await?)
    }
}
