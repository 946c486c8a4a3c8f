mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::{MockLyftApi, TOKEN};
use lyft_client::{
    CancelFlow, CancelOutcome, Error, FlowState, LyftClient, Location, RequestOutcome,
    RideHistoryQuery, RideRequest, RideRequestFlow, RideStatus, StatusErrorKind, ride_type,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn ride_request() -> RideRequest {
    RideRequest::new(Location::new(37.7763, -122.3918), ride_type::LYFT)
        .destination(Location::new(37.7972, -122.4533).with_address("Fort Mason"))
}

#[tokio::test]
async fn test_request_ride_created() {
    let api = MockLyftApi::start().await;
    api.respond_json(
        "POST",
        "/v1/rides",
        201,
        json!({
            "ride_id": "123",
            "status": "pending",
            "ride_type": "lyft",
            "origin": {"lat": 37.7763, "lng": -122.3918, "address": ""},
            "passenger": {"first_name": "Ada"}
        }),
    )
    .await;

    let created = api.client().rides().request(&ride_request()).await.unwrap();
    assert_eq!(created.data.ride_id, "123");
    assert_eq!(created.data.status, RideStatus::Pending);
    assert_eq!(created.meta.status.as_u16(), 201);

    let sent: serde_json::Value = api.last_request().await.body_json().unwrap();
    assert_eq!(sent["ride_type"], "lyft");
    assert_eq!(sent["destination"]["address"], "Fort Mason");
    assert!(sent.get("cost_token").is_none());
}

#[tokio::test]
async fn test_request_ride_needs_cost_confirmation() {
    let api = MockLyftApi::start().await;
    api.respond_json(
        "POST",
        "/v1/rides",
        400,
        json!({"error": "confirmation_required", "cost_token": "abc"}),
    )
    .await;

    let err = api.client().rides().request(&ride_request()).await.unwrap_err();
    let status = err.status_error().unwrap();
    assert_eq!(status.reason(), "confirmation_required");
    assert!(matches!(status.kind, StatusErrorKind::RideRequest { .. }));
    assert_eq!(err.cost_token_info().unwrap().cost_token, "abc");
}

#[tokio::test]
async fn test_request_ride_other_status_is_generic() {
    let api = MockLyftApi::start().await;
    api.respond_json("POST", "/v1/rides", 403, json!({"error": "insufficient_scope"}))
        .await;

    let err = api.client().rides().request(&ride_request()).await.unwrap_err();
    let status = err.status_error().unwrap();
    assert_eq!(status.kind, StatusErrorKind::Generic);
    assert_eq!(err.to_string(), "insufficient_scope: status code=403");
}

#[tokio::test]
async fn test_cancel_ride_without_token_sends_no_body() {
    let api = MockLyftApi::start().await;
    api.respond("POST", "/v1/rides/42/cancel", ResponseTemplate::new(204))
        .await;

    let response = api.client().rides().cancel("42", None).await.unwrap();
    assert_eq!(response.meta.status.as_u16(), 204);
    assert!(api.last_request().await.body.is_empty());
}

#[tokio::test]
async fn test_cancel_ride_fee() {
    let api = MockLyftApi::start().await;
    api.respond_json(
        "POST",
        "/v1/rides/42/cancel",
        400,
        json!({"amount": 5.0, "currency": "USD", "token": "tok123", "token_duration": 300}),
    )
    .await;

    let err = api.client().rides().cancel("42", None).await.unwrap_err();
    let fee = err.cancellation_fee().unwrap();
    assert_eq!(fee.amount, 5.0);
    assert_eq!(fee.currency, "USD");
    assert_eq!(fee.token, "tok123");
    assert_eq!(fee.token_duration, Duration::from_secs(300));
}

#[tokio::test]
async fn test_cancel_ride_with_token() {
    let api = MockLyftApi::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/rides/42/cancel"))
        .and(body_json(json!({"cancel_confirmation_token": "tok123"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(api.server())
        .await;

    api.client()
        .rides()
        .cancel("42", Some("tok123"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ride_detail() {
    let api = MockLyftApi::start().await;
    api.respond_json(
        "GET",
        "/v1/rides/42",
        200,
        json!({
            "ride_id": "42",
            "status": "accepted",
            "origin": {"lat": 1.0, "lng": 2.0, "eta_seconds": 90},
            "requested_at": "2017-11-05T14:20:00Z",
            "generated_at": ""
        }),
    )
    .await;

    let ride = api.client().rides().detail("42").await.unwrap().data;
    assert_eq!(ride.status, RideStatus::Accepted);
    assert_eq!(ride.pickup_eta(), Some(Duration::from_secs(90)));
    assert_eq!(
        ride.requested_at,
        Some(Utc.with_ymd_and_hms(2017, 11, 5, 14, 20, 0).unwrap())
    );
    assert_eq!(ride.generated_at, None);
}

#[tokio::test]
async fn test_ride_detail_decode_failure_keeps_headers() {
    let api = MockLyftApi::start().await;
    api.respond(
        "GET",
        "/v1/rides/42",
        ResponseTemplate::new(200)
            .insert_header("Request-ID", "req-7")
            .set_body_string(r#"{"ride_id":"42","requested_at":"not a time"}"#),
    )
    .await;

    let err = api.client().rides().detail("42").await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
    assert_eq!(err.meta().unwrap().request_id(), Some("req-7"));
}

#[tokio::test]
async fn test_history_negative_limit_sends_max() {
    let api = MockLyftApi::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/rides"))
        .and(query_param("start_time", "2018-01-01T00:00:00Z"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ride_history": [{"ride_id": "1", "status": "droppedOff"}, {"ride_id": "2", "status": "canceled"}]
        })))
        .expect(1)
        .mount(api.server())
        .await;

    let start = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();
    let rides = api
        .client()
        .rides()
        .history(&RideHistoryQuery::since(start).limit(-1))
        .await
        .unwrap()
        .data;
    assert_eq!(rides.len(), 2);
    assert_eq!(rides[1].status, RideStatus::Canceled);

    let request = api.last_request().await;
    assert!(!request.url.query().unwrap_or_default().contains("end_time"));
}

#[tokio::test]
async fn test_history_with_end_time() {
    let api = MockLyftApi::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/rides"))
        .and(query_param("end_time", "2018-02-01T08:00:00Z"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ride_history": null})))
        .mount(api.server())
        .await;

    let start = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2018, 2, 1, 8, 0, 0).unwrap();
    let rides = api
        .client()
        .rides()
        .history(&RideHistoryQuery::since(start).until(end).limit(5))
        .await
        .unwrap();
    assert!(rides.data.is_empty());
}

#[tokio::test]
async fn test_receipt() {
    let api = MockLyftApi::start().await;
    api.respond_json(
        "GET",
        "/v1/rides/42/receipt",
        200,
        json!({
            "ride_id": "42",
            "price": {"amount": 1250, "currency": "USD", "description": "Total"},
            "line_items": [{"amount": 1250, "currency": "USD", "type": "Ride"}],
            "charges": [{"amount": 1250, "currency": "USD", "payment_method": "Visa"}],
            "requested_at": "2017-11-05T14:20:00Z",
            "ride_profile": "personal"
        }),
    )
    .await;

    let receipt = api.client().rides().receipt("42").await.unwrap().data;
    assert_eq!(receipt.price.unwrap().amount, 1250);
    assert_eq!(receipt.charges[0].payment_method, "Visa");
    assert_eq!(receipt.ride_profile, lyft_client::PROFILE_PERSONAL);
}

#[tokio::test]
async fn test_set_destination() {
    let api = MockLyftApi::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/rides/42/destination"))
        .and(body_json(json!({"lat": 37.8, "lng": -122.4})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"lat": 37.8, "lng": -122.4, "address": "Pier 39"})),
        )
        .mount(api.server())
        .await;

    let location = api
        .client()
        .rides()
        .set_destination("42", &Location::new(37.8, -122.4))
        .await
        .unwrap()
        .data;
    assert_eq!(location.address.as_deref(), Some("Pier 39"));
}

#[tokio::test]
async fn test_ride_id_is_one_path_segment() {
    let api = MockLyftApi::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/rides/..%2Fprofile%3Fx%3D1/receipt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ride_id": "odd"})))
        .expect(1)
        .mount(api.server())
        .await;

    let receipt = api
        .client()
        .rides()
        .receipt("../profile?x=1")
        .await
        .unwrap()
        .data;
    assert_eq!(receipt.ride_id, "odd");

    let request = api.last_request().await;
    assert_eq!(request.url.query(), None);
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport and classification
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_authorization_and_extra_headers() {
    let api = MockLyftApi::start().await;
    api.respond_json("GET", "/v1/profile", 200, json!({"id": "u1"}))
        .await;

    let client = LyftClient::builder()
        .access_token(TOKEN)
        .base_url(api.url())
        .header("X-Session", "a")
        .header("X-Session", "b")
        .header("X-Other", "c")
        .build()
        .unwrap();
    client.users().profile().await.unwrap();

    let request = api.last_request().await;
    assert_eq!(
        request.headers.get("authorization").unwrap(),
        &format!("Bearer {TOKEN}")
    );
    let sessions: Vec<_> = request
        .headers
        .get_all("x-session")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(sessions, vec!["a", "b"]);
    assert_eq!(request.headers.get("x-other").unwrap(), "c");
}

#[tokio::test]
async fn test_refreshed_token_is_used() {
    let api = MockLyftApi::start().await;
    api.respond_json("GET", "/v1/profile", 200, json!({"id": "u1"}))
        .await;

    let client = api.client().with_access_token("fresh").unwrap();
    client.users().profile().await.unwrap();

    let request = api.last_request().await;
    assert_eq!(request.headers.get("authorization").unwrap(), "Bearer fresh");
}

#[tokio::test]
async fn test_rate_limit_headers_surfaced() {
    let api = MockLyftApi::start().await;
    api.respond(
        "GET",
        "/v1/profile",
        ResponseTemplate::new(200)
            .insert_header("X-Ratelimit-Remaining", "42")
            .insert_header("X-Ratelimit-Limit", "100")
            .set_body_json(json!({"id": "u1", "first_name": "Ada", "has_taken_a_ride": true})),
    )
    .await;

    let profile = api.client().users().profile().await.unwrap();
    assert!(profile.data.has_taken_a_ride);
    assert_eq!(profile.meta.rate_remaining(), Some(42));
    assert_eq!(profile.meta.rate_limit(), Some(100));
    assert_eq!(profile.meta.request_id(), None);
}

#[tokio::test]
async fn test_error_body_captured_verbatim() {
    let api = MockLyftApi::start().await;
    let body = "{\"error\": \"ride_not_found\",\n  \"error_description\": \"no such ride\"}  ";
    api.respond(
        "GET",
        "/v1/rides/nope",
        ResponseTemplate::new(404).set_body_string(body),
    )
    .await;

    let err = api.client().rides().detail("nope").await.unwrap_err();
    assert!(err.is_not_found());
    let status = err.status_error().unwrap();
    assert_eq!(&status.body[..], body.as_bytes());
    assert_eq!(status.reason(), "ride_not_found");
    assert_eq!(status.description(), "no such ride");
}

#[tokio::test]
async fn test_empty_401_is_token_expired() {
    let api = MockLyftApi::start().await;
    api.respond("GET", "/v1/profile", ResponseTemplate::new(401))
        .await;

    let err = api.client().users().profile().await.unwrap_err();
    assert!(err.is_token_expired());
    assert!(!err.is_rate_limited());
    assert_eq!(err.to_string(), "status code=401");
}

#[tokio::test]
async fn test_error_header_overrides_body_reason() {
    let api = MockLyftApi::start().await;
    api.respond(
        "GET",
        "/v1/profile",
        ResponseTemplate::new(401)
            .insert_header("error", "token_expired")
            .set_body_json(json!({"error": "invalid_token"})),
    )
    .await;

    let err = api.client().users().profile().await.unwrap_err();
    assert_eq!(err.status_error().unwrap().reason(), "token_expired");
    assert!(err.is_token_expired());
}

#[tokio::test]
async fn test_429_is_rate_limited() {
    let api = MockLyftApi::start().await;
    api.respond_json(
        "GET",
        "/v1/rides/42",
        429,
        json!({"error": "rate_limit_exceeded"}),
    )
    .await;

    let err = api.client().rides().detail("42").await.unwrap_err();
    assert!(err.is_rate_limited());
    assert!(!err.is_token_expired());
}

// ─────────────────────────────────────────────────────────────────────────────
// Confirmation flows
// ─────────────────────────────────────────────────────────────────────────────

async fn mount_cancel_fee(api: &MockLyftApi) {
    Mock::given(method("POST"))
        .and(path("/v1/rides/42/cancel"))
        .and(body_json(json!({"cancel_confirmation_token": "tok123"})))
        .respond_with(ResponseTemplate::new(204))
        .mount(api.server())
        .await;
    api.respond_json(
        "POST",
        "/v1/rides/42/cancel",
        400,
        json!({"error": "cancel_confirmation_required", "amount": 5.0, "currency": "USD", "token": "tok123", "token_duration": 300}),
    )
    .await;
}

#[tokio::test]
async fn test_cancel_flow_confirmed() {
    let api = MockLyftApi::start().await;
    mount_cancel_fee(&api).await;

    let mut asked = 0;
    let mut flow = CancelFlow::new(&api.client(), "42");
    let outcome = flow
        .run(|fee| {
            asked += 1;
            assert_eq!(fee.amount, 5.0);
            true
        })
        .await
        .unwrap();

    assert!(matches!(outcome, CancelOutcome::Canceled(_)));
    assert_eq!(asked, 1);
    assert_eq!(flow.state(), &FlowState::Completed);
    assert_eq!(api.requests().await.len(), 2);
}

#[tokio::test]
async fn test_cancel_flow_declined() {
    let api = MockLyftApi::start().await;
    mount_cancel_fee(&api).await;

    let mut flow = CancelFlow::new(&api.client(), "42");
    let outcome = flow.run(|_| false).await.unwrap();

    match outcome {
        CancelOutcome::Declined(fee) => assert_eq!(fee.token, "tok123"),
        other => panic!("expected decline, got {other:?}"),
    }
    assert_eq!(flow.state(), &FlowState::Declined);
    assert_eq!(api.requests().await.len(), 1);
}

#[tokio::test]
async fn test_cancel_flow_budget_exhausted() {
    let api = MockLyftApi::start().await;
    api.respond_json(
        "POST",
        "/v1/rides/42/cancel",
        400,
        json!({"amount": 5.0, "currency": "USD", "token": "again", "token_duration": 60}),
    )
    .await;

    let mut flow = CancelFlow::new(&api.client(), "42");
    let err = flow.run(|_| true).await.unwrap_err();

    assert_eq!(err.cancellation_fee().unwrap().token, "again");
    assert_eq!(flow.state(), &FlowState::Failed);
    assert_eq!(api.requests().await.len(), 2);
}

#[tokio::test]
async fn test_ride_request_flow_confirms_cost() {
    let api = MockLyftApi::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/rides"))
        .and(body_partial_json(json!({"cost_token": "abc"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"ride_id": "77", "status": "pending"})),
        )
        .mount(api.server())
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/rides"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "primetime_confirmation_required",
            "primetime_percentage": "50%",
            "cost_token": "abc",
            "token_duration": "120"
        })))
        .up_to_n_times(1)
        .mount(api.server())
        .await;

    let mut flow = RideRequestFlow::new(&api.client(), ride_request());
    let outcome = flow
        .run(|cost| cost.primetime_percentage == "50%")
        .await
        .unwrap();

    match outcome {
        RequestOutcome::Created(created) => assert_eq!(created.data.ride_id, "77"),
        other => panic!("expected a ride, got {other:?}"),
    }
    assert_eq!(flow.state(), &FlowState::Completed);
}

#[tokio::test]
async fn test_ride_request_flow_without_token_fails() {
    let api = MockLyftApi::start().await;
    api.respond_json("POST", "/v1/rides", 400, json!({"error": "no_drivers"}))
        .await;

    let mut flow = RideRequestFlow::new(&api.client(), ride_request());
    let err = flow
        .run(|_| panic!("nothing to confirm"))
        .await
        .unwrap_err();

    assert_eq!(err.status_error().unwrap().reason(), "no_drivers");
    assert_eq!(flow.state(), &FlowState::Failed);
}

// ─────────────────────────────────────────────────────────────────────────────
// Debug logging
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

async fn set_destination_with(api: &MockLyftApi, debug: bool) -> (Location, wiremock::Request) {
    let client = LyftClient::builder()
        .access_token(TOKEN)
        .base_url(api.url())
        .debug(debug)
        .build()
        .unwrap();
    let location = client
        .rides()
        .set_destination("42", &Location::new(37.8, -122.4).with_address("Pier 39"))
        .await
        .unwrap()
        .data;
    (location, api.last_request().await)
}

#[tokio::test]
async fn test_debug_mode_leaves_traffic_unchanged() {
    let api = MockLyftApi::start().await;
    api.respond(
        "PUT",
        "/v1/rides/42/destination",
        ResponseTemplate::new(200)
            .insert_header("Request-ID", "req-9")
            .set_body_json(json!({"lat": 37.8, "lng": -122.4, "address": "Pier 39"})),
    )
    .await;

    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (plain, plain_request) = set_destination_with(&api, false).await;
    let (logged, logged_request) = set_destination_with(&api, true).await;

    assert_eq!(plain, logged);
    assert_eq!(plain_request.body, logged_request.body);
    assert_eq!(
        logged_request.headers.get("authorization").unwrap(),
        &format!("Bearer {TOKEN}")
    );
    assert_eq!(
        plain_request.headers.get("content-type"),
        logged_request.headers.get("content-type")
    );

    let logs = capture.contents();
    assert!(logs.contains("Pier 39"));
    assert!(logs.contains("req-9"));
    assert!(logs.contains("Bearer [redacted]"));
    assert!(!logs.contains(TOKEN));
}
