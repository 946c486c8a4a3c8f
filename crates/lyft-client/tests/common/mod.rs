#![allow(dead_code)]

use lyft_client::LyftClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const TOKEN: &str = "test-access-token";

/// A mock Lyft API built on `wiremock`.
pub struct MockLyftApi {
    server: MockServer,
}

impl MockLyftApi {
    /// Start a new mock server on a random available port.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// A client pointed at the mock server.
    pub fn client(&self) -> LyftClient {
        LyftClient::builder()
            .access_token(TOKEN)
            .base_url(self.url())
            .build()
            .unwrap()
    }

    /// Mount a response for `verb route`.
    pub async fn respond(&self, verb: &str, route: &str, response: ResponseTemplate) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Mount a JSON response for `verb route`.
    pub async fn respond_json(&self, verb: &str, route: &str, status: u16, body: serde_json::Value) {
        self.respond(verb, route, ResponseTemplate::new(status).set_body_json(body))
            .await;
    }

    /// All requests the server has seen, in order.
    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// The most recent request.
    pub async fn last_request(&self) -> Request {
        self.requests().await.pop().expect("no requests received")
    }
}
