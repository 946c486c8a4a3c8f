//! Authorization URL construction and redirect handling for the
//! three-legged flow.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use url::Url;

use crate::error::{OAuthError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Scopes
// ─────────────────────────────────────────────────────────────────────────────

/// Ride types, estimates and nearby drivers.
pub const SCOPE_PUBLIC: &str = "public";
/// Ride history and details.
pub const SCOPE_RIDES_READ: &str = "rides.read";
/// Issue refresh tokens.
pub const SCOPE_OFFLINE: &str = "offline";
/// Request and cancel rides.
pub const SCOPE_RIDES_REQUEST: &str = "rides.request";
/// The user's profile.
pub const SCOPE_PROFILE: &str = "profile";

/// Every scope the API defines.
pub fn all_scopes() -> Vec<&'static str> {
    vec![
        SCOPE_PUBLIC,
        SCOPE_RIDES_READ,
        SCOPE_OFFLINE,
        SCOPE_RIDES_REQUEST,
        SCOPE_PROFILE,
    ]
}

/// The sandbox form of a client secret.
pub fn sandbox_secret(client_secret: &str) -> String {
    format!("SANDBOX-{client_secret}")
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

/// OAuth application credentials and endpoints.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// API root; `/oauth/...` paths are resolved against it.
    pub base_url: String,
    /// Must match the redirect URI registered for the app, when set.
    pub redirect_uri: Option<String>,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl OAuthConfig {
    /// Config for the production API.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: lyft_client::DEFAULT_BASE_URL.to_string(),
            redirect_uri: None,
        }
    }

    /// Override the API root.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the redirect URI sent with authorization requests.
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Use the sandbox form of the client secret.
    pub fn sandbox(mut self) -> Self {
        self.client_secret = sandbox_secret(&self.client_secret);
        self
    }

    /// Resolve an `/oauth/...` path against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        let mut base = Url::parse(&self.base_url)?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    /// The URL a user visits to grant `scopes` to the app.
    pub fn authorization_url(&self, scopes: &[&str], state: &str) -> Result<String> {
        let scope = scopes.join(" ");
        let mut params = vec![
            ("client_id", self.client_id.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
        ];
        if let Some(redirect) = &self.redirect_uri {
            params.push(("redirect_uri", redirect.as_str()));
        }

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!("{}?{}", self.endpoint("oauth/authorize")?, query))
    }
}

/// Generate a random state string for CSRF protection.
pub fn generate_state() -> String {
    let mut state_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut state_bytes);
    URL_SAFE_NO_PAD.encode(state_bytes)
}

/// Extract the authorization code from the URL the user was redirected to.
///
/// When `expected_state` is given, the redirect's `state` must match it.
pub fn authorization_code(redirect_url: &str, expected_state: Option<&str>) -> Result<String> {
    let url = Url::parse(redirect_url.trim())
        .map_err(|e| OAuthError::InvalidRedirect(format!("{e}")))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(OAuthError::InvalidRedirect(format!(
            "authorization denied: {error}"
        )));
    }
    if let Some(expected) = expected_state
        && state.as_deref() != Some(expected)
    {
        return Err(OAuthError::StateMismatch);
    }
    code.filter(|c| !c.is_empty())
        .ok_or_else(|| OAuthError::InvalidRedirect("missing code".to_string()))
}
