//! Users API.

use reqwest::{Method, StatusCode};

use crate::client::LyftClient;
use crate::error::Result;
use crate::response::Response;
use crate::types::UserProfile;

/// Users API client.
pub struct UsersApi {
    client: LyftClient,
}

impl UsersApi {
    pub(crate) fn new(client: LyftClient) -> Self {
        Self { client }
    }

    /// The authenticated user's profile.
    pub async fn profile(&self) -> Result<Response<UserProfile>> {
        let builder = self.client.request(Method::GET, "v1/profile")?;
        self.client.send(builder).await?.expect(StatusCode::OK)
    }
}
