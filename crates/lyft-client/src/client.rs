//! Main client implementation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use url::Url;

use crate::api::{AvailabilityApi, RidesApi, UsersApi};
use crate::error::{Error, Result};
use crate::response::RawResponse;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.lyft.com";

/// Default timeout for requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const TRANSPORT_TARGET: &str = "lyft_client::transport";

/// Lyft API client.
///
/// Cheap to clone; clones share the underlying connection pool. The
/// configuration is read-only once built, so a client can be used from many
/// tasks at once.
///
/// # Example
///
/// ```no_run
/// use lyft_client::LyftClient;
///
/// # async fn example() -> lyft_client::Result<()> {
/// let client = LyftClient::builder()
///     .access_token("my-token")
///     .build()?;
///
/// let profile = client.users().profile().await?;
/// println!("Hello, {}", profile.data.first_name);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LyftClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
    /// Prepared `Bearer` header value.
    authorization: HeaderValue,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// HTTP client.
    pub(crate) http: reqwest::Client,
    /// Base URL for API requests.
    pub(crate) base_url: Url,
    /// Extra headers added to every request.
    pub(crate) headers: HeaderMap,
    /// Request timeout.
    pub(crate) timeout: Duration,
    /// Dump requests and responses.
    pub(crate) debug: bool,
}

impl fmt::Debug for LyftClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LyftClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("access_token", &"[redacted]")
            .field("timeout", &self.inner.timeout)
            .field("debug", &self.inner.debug)
            .finish()
    }
}

impl LyftClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client for the production API with default settings.
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::builder().access_token(access_token).build()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// A client using a different access token, sharing this client's
    /// transport and configuration.
    pub fn with_access_token(&self, token: &str) -> Result<Self> {
        Ok(Self {
            inner: Arc::clone(&self.inner),
            authorization: bearer(token)?,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the rides API.
    pub fn rides(&self) -> RidesApi {
        RidesApi::new(self.clone())
    }

    /// Access the availability API (ride types, cost, ETA, drivers).
    pub fn availability(&self) -> AvailabilityApi {
        AvailabilityApi::new(self.clone())
    }

    /// Access the users API.
    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a request and buffer the whole response.
    ///
    /// Appends the configured extra headers, sets the bearer token, and
    /// bounds the call with the configured timeout unless the request carries
    /// its own. Status codes are not inspected.
    pub async fn execute(&self, mut request: reqwest::Request) -> Result<RawResponse> {
        let headers = request.headers_mut();
        for (name, value) in &self.inner.headers {
            headers.append(name.clone(), value.clone());
        }
        headers.insert(AUTHORIZATION, self.authorization.clone());

        if request.timeout().is_none() {
            *request.timeout_mut() = Some(self.inner.timeout);
        }

        if self.inner.debug {
            log_request(&request);
        }

        let response = self.inner.http.execute(request).await?;
        let raw = RawResponse::read(response).await?;

        if self.inner.debug {
            log_response(&raw);
        }

        Ok(raw)
    }

    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(Error::from)
    }

    /// Build a URL from path segments. Each segment is percent-encoded, so
    /// `/` or `?` inside one cannot change the path.
    pub(crate) fn segments_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::Config(format!("base URL cannot take a path: {}", self.inner.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request without a body.
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self.request_to(method, self.url(path)?))
    }

    /// Start a request without a body to a prepared URL.
    pub(crate) fn request_to(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner.http.request(method, url)
    }

    /// Start a request with a JSON body.
    pub(crate) fn json_request<B>(&self, method: Method, path: &str, body: &B) -> Result<RequestBuilder>
    where
        B: Serialize + ?Sized,
    {
        self.json_request_to(method, self.url(path)?, body)
    }

    /// Start a request with a JSON body to a prepared URL.
    pub(crate) fn json_request_to<B>(&self, method: Method, url: Url, body: &B) -> Result<RequestBuilder>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body)?;
        Ok(self
            .request_to(method, url)
            .header(CONTENT_TYPE, "application/json")
            .body(body))
    }

    /// Build and execute a request.
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<RawResponse> {
        self.execute(builder.build()?).await
    }
}

fn bearer(token: &str) -> Result<HeaderValue> {
    if token.is_empty() {
        return Err(Error::Config("access token is required".to_string()));
    }
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| Error::Config("access token contains invalid characters".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

fn redacted_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if name == AUTHORIZATION {
                "Bearer [redacted]".to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.to_string(), shown)
        })
        .collect()
}

fn log_request(request: &reqwest::Request) {
    let body = request
        .body()
        .and_then(|b| b.as_bytes())
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default();
    tracing::debug!(
        target: TRANSPORT_TARGET,
        method = %request.method(),
        url = %request.url(),
        headers = ?redacted_headers(request.headers()),
        body = %body,
        "request"
    );
}

fn log_response(raw: &RawResponse) {
    tracing::debug!(
        target: TRANSPORT_TARGET,
        status = raw.meta.status.as_u16(),
        headers = ?redacted_headers(&raw.meta.headers),
        body = %String::from_utf8_lossy(&raw.body),
        "response"
    );
}

/// Builder for creating a [`LyftClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    access_token: Option<String>,
    base_url: Option<String>,
    http: Option<reqwest::Client>,
    headers: Vec<(String, String)>,
    timeout: Duration,
    user_agent: Option<String>,
    debug: bool,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            access_token: None,
            base_url: None,
            http: None,
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            debug: false,
        }
    }

    /// Set the OAuth access token. Required.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Override the API root. Defaults to [`DEFAULT_BASE_URL`].
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Use a preconfigured HTTP client (proxy, TLS, pool settings).
    ///
    /// The builder's user agent is ignored in that case.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Add a header to every request. Repeated names add further values.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Log full requests and responses at debug level.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<LyftClient> {
        let token = self
            .access_token
            .ok_or_else(|| Error::Config("access token is required".to_string()))?;
        let authorization = bearer(&token)?;

        // Parse and normalize base URL
        let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::Config(format!("invalid header name: {name}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::Config(format!("invalid value for header {name}")))?;
            headers.append(name, value);
        }

        let http = match self.http {
            Some(http) => http,
            None => {
                let user_agent = self
                    .user_agent
                    .unwrap_or_else(|| format!("lyft-client/{}", env!("CARGO_PKG_VERSION")));
                reqwest::Client::builder().user_agent(user_agent).build()?
            }
        };

        Ok(LyftClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                headers,
                timeout: self.timeout,
                debug: self.debug,
            }),
            authorization,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
