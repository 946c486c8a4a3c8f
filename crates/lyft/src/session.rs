//! An authorized API session.
//!
//! Loads the stored credential (authorizing interactively when there is
//! none, or when it belongs to a different app), and retries a call once
//! after refreshing when the API reports an expired token.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use lyft_client::LyftClient;
use lyft_oauth::{
    Credential, OAuthError, SCOPE_OFFLINE, SCOPE_PROFILE, SCOPE_PUBLIC, SCOPE_RIDES_READ,
    SCOPE_RIDES_REQUEST, TokenClient, authorization_code, generate_state,
};

use crate::config::Settings;
use crate::prompt;
use crate::store::{CredentialStore, StoredCredential};

/// Scopes requested when authorizing the CLI.
pub const SCOPES: &[&str] = &[
    SCOPE_PUBLIC,
    SCOPE_RIDES_READ,
    SCOPE_OFFLINE,
    SCOPE_RIDES_REQUEST,
    SCOPE_PROFILE,
];

pub struct Session {
    client: LyftClient,
    tokens: TokenClient,
    store: Arc<dyn CredentialStore>,
    stored: StoredCredential,
}

impl Session {
    /// Open a session, authorizing first if needed.
    pub async fn open(
        settings: &Settings,
        store: Arc<dyn CredentialStore>,
        http: reqwest::Client,
        debug: bool,
    ) -> Result<Self> {
        let tokens = TokenClient::with_http_client(settings.oauth_config()?, http.clone());
        let client_id = tokens.config().client_id.clone();

        let stored = match store.load_credential().await? {
            Some(stored) if stored.matches(&client_id) => stored,
            existing => {
                if let Some(stale) = existing {
                    tracing::info!(
                        stored = %stale.client_id,
                        configured = %client_id,
                        "stored credential belongs to another app; re-authorizing"
                    );
                    if let Err(e) = tokens.revoke(&stale.credential.access_token).await {
                        tracing::warn!(error = %e, "failed to revoke stale credential");
                    }
                    store.delete_credential().await?;
                }
                let stored = StoredCredential {
                    client_id,
                    credential: authorize(&tokens).await?,
                };
                store.save_credential(&stored).await?;
                stored
            }
        };

        let client = LyftClient::builder()
            .access_token(&stored.credential.access_token)
            .base_url(&settings.base_url)
            .http_client(http)
            .debug(debug)
            .build()?;

        let mut session = Self {
            client,
            tokens,
            store,
            stored,
        };
        if session.stored.credential.is_expired()
            && session.stored.credential.refresh_token.is_some()
        {
            session.refresh().await?;
        }
        Ok(session)
    }

    pub fn client(&self) -> &LyftClient {
        &self.client
    }

    pub fn credential(&self) -> &Credential {
        &self.stored.credential
    }

    /// Trade the refresh token for a new access token and persist it.
    pub async fn refresh(&mut self) -> Result<()> {
        let refreshed = self
            .tokens
            .refresh(&self.stored.credential)
            .await
            .map_err(|e| match e {
                OAuthError::MissingRefreshToken => anyhow::anyhow!(
                    "access token expired and no refresh token is stored; run 'lyft auth login'"
                ),
                other => anyhow::Error::new(other).context("Failed to refresh access token"),
            })?
            .into_data();

        self.client = self.client.with_access_token(&refreshed.access_token)?;
        self.stored.credential = refreshed;
        self.store.save_credential(&self.stored).await?;
        tracing::info!("access token refreshed");
        Ok(())
    }

    /// Run `op`, refreshing and retrying once if the token has expired.
    pub async fn call<T, F, Fut>(&mut self, op: F) -> Result<T>
    where
        F: Fn(LyftClient) -> Fut,
        Fut: Future<Output = lyft_client::Result<T>>,
    {
        match op(self.client.clone()).await {
            Err(err) if err.is_token_expired() => {
                tracing::debug!(error = %err, "token expired");
                self.refresh().await?;
                Ok(op(self.client.clone()).await?)
            }
            other => Ok(other?),
        }
    }
}

/// Run the three-legged flow on the terminal.
pub async fn authorize(tokens: &TokenClient) -> Result<Credential> {
    let state = generate_state();
    let url = tokens.config().authorization_url(SCOPES, &state)?;

    println!("Open this link in your browser and click Accept:");
    println!();
    println!("  {url}");
    println!();
    if open_url(&url).is_err() {
        println!("(Could not open browser automatically)");
        println!();
    }

    let redirect = prompt::read_line("Copy and paste the URL you were redirected to: ")?;
    if redirect.is_empty() {
        anyhow::bail!("No URL entered, aborting.");
    }
    let code = authorization_code(&redirect, Some(&state))
        .context("Failed to get authorization code; did you enter the correct URL?")?;

    let credential = tokens
        .exchange_code(&code)
        .await
        .context("Token exchange failed")?
        .into_data();
    tracing::info!(scopes = ?credential.scopes, "authorized");
    Ok(credential)
}

/// Try to open a URL in the default browser.
fn open_url(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).status()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).status()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .status()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileConfig, Overrides};
    use crate::store::FileStore;
    use chrono::Utc;
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(dir: &Path, base_url: String) -> Settings {
        Settings::resolve(
            dir.to_path_buf(),
            FileConfig::default(),
            Overrides {
                client_id: Some("app".to_string()),
                client_secret: Some("secret".to_string()),
                base_url: Some(base_url),
                ..Default::default()
            },
        )
    }

    fn stored(access: &str, issued_ago: Duration) -> StoredCredential {
        StoredCredential {
            client_id: "app".to_string(),
            credential: Credential {
                access_token: access.to_string(),
                refresh_token: Some("refresh".to_string()),
                token_type: "Bearer".to_string(),
                expires_in: Duration::from_secs(3600),
                scopes: vec!["public".to_string()],
                issued_at: Utc::now() - chrono::TimeDelta::from_std(issued_ago).unwrap(),
            },
        }
    }

    async fn mount_refresh(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_partial_json(json!({"grant_type": "refresh_token"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh",
                "token_type": "Bearer",
                "expires_in": 3600,
                "scope": "public"
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_call_refreshes_once_on_expired_token() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path()));
        store
            .save_credential(&stored("stale", Duration::ZERO))
            .await
            .unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/profile"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/profile"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        mount_refresh(&server).await;

        let mut session = Session::open(
            &settings(dir.path(), server.uri()),
            store.clone(),
            reqwest::Client::new(),
            false,
        )
        .await
        .unwrap();
        let profile = session
            .call(|client| async move { client.users().profile().await })
            .await
            .unwrap();

        assert_eq!(profile.data.id, "u1");
        assert_eq!(session.credential().access_token, "fresh");
        let saved = store.load_credential().await.unwrap().unwrap();
        assert_eq!(saved.credential.access_token, "fresh");
        assert_eq!(saved.credential.refresh_token.as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn test_expired_credential_refreshed_on_open() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path()));
        store
            .save_credential(&stored("old", Duration::from_secs(7200)))
            .await
            .unwrap();
        mount_refresh(&server).await;

        let session = Session::open(
            &settings(dir.path(), server.uri()),
            store,
            reqwest::Client::new(),
            false,
        )
        .await
        .unwrap();
        assert_eq!(session.credential().access_token, "fresh");
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path()));
        store
            .save_credential(&stored("token", Duration::ZERO))
            .await
            .unwrap();

        Mock::given(method("GET"))
            .and(path("/v1/profile"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "forbidden"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut session = Session::open(
            &settings(dir.path(), server.uri()),
            store,
            reqwest::Client::new(),
            false,
        )
        .await
        .unwrap();
        let err = session
            .call(|client| async move { client.users().profile().await })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("forbidden"));
    }
}
