//! Error types for the OAuth flows.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur during an OAuth flow.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Transport failure, unexpected status, or undecodable response.
    #[error(transparent)]
    Client(#[from] lyft_client::Error),

    /// The redirect URL could not be parsed or carried an error.
    #[error("Invalid redirect: {0}")]
    InvalidRedirect(String),

    /// The redirect's `state` does not match the one that was sent.
    #[error("OAuth state mismatch")]
    StateMismatch,

    /// A refresh was attempted on a credential without a refresh token.
    #[error("Credential has no refresh token")]
    MissingRefreshToken,
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Client(lyft_client::Error::Http(e))
    }
}

impl From<url::ParseError> for OAuthError {
    fn from(e: url::ParseError) -> Self {
        OAuthError::Client(lyft_client::Error::InvalidUrl(e))
    }
}

impl OAuthError {
    /// The API status error, if the server rejected the request.
    pub fn status_error(&self) -> Option<&lyft_client::StatusError> {
        match self {
            OAuthError::Client(e) => e.status_error(),
            _ => None,
        }
    }
}
