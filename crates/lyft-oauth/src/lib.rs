//! OAuth 2.0 flows for the Lyft API.
//!
//! # Components
//!
//! - [`oauth`]: scopes, authorization URL, state generation, redirect parsing
//! - [`token`]: code exchange, client credentials, refresh and revocation
//! - [`credential`]: the resulting access/refresh token pair

pub mod credential;
pub mod error;
pub mod oauth;
pub mod token;

pub use credential::Credential;
pub use error::{OAuthError, Result};
pub use oauth::{
    OAuthConfig, SCOPE_OFFLINE, SCOPE_PROFILE, SCOPE_PUBLIC, SCOPE_RIDES_READ,
    SCOPE_RIDES_REQUEST, all_scopes, authorization_code, generate_state, sandbox_secret,
};
pub use token::TokenClient;
