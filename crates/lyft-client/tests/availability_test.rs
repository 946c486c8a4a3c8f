mod common;

use std::time::Duration;

use common::MockLyftApi;
use lyft_client::{CostQuery, EtaQuery, ride_type};
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_ride_types() {
    let api = MockLyftApi::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/ridetypes"))
        .and(query_param("lat", "37.7763"))
        .and(query_param("lng", "-122.3918"))
        .and(query_param_is_missing("ride_type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ride_types": [{
                "ride_type": "lyft",
                "display_name": "Lyft",
                "seats": 4,
                "pricing_details": {"base_charge": 200, "cost_per_mile": 115, "currency": "USD"}
            }]
        })))
        .expect(1)
        .mount(api.server())
        .await;

    let types = api
        .client()
        .availability()
        .ride_types(37.7763, -122.3918, None)
        .await
        .unwrap()
        .data;
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].seats, 4);
    let pricing = types[0].pricing.as_ref().unwrap();
    assert_eq!(pricing.base, 200);
    assert_eq!(pricing.per_mile, 115);
}

#[tokio::test]
async fn test_ride_types_unavailable() {
    let api = MockLyftApi::start().await;
    api.respond_json(
        "GET",
        "/v1/ridetypes",
        404,
        json!({"error": "no_service_in_area", "error_description": "Lyft is not available here"}),
    )
    .await;

    let err = api
        .client()
        .availability()
        .ride_types(0.0, 0.0, Some(ride_type::LYFT))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status_error().unwrap().reason(), "no_service_in_area");
}

#[tokio::test]
async fn test_cost_estimates() {
    let api = MockLyftApi::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/cost"))
        .and(query_param("start_lat", "37.7763"))
        .and(query_param("end_lat", "37.7972"))
        .and(query_param("end_lng", "-122.4533"))
        .and(query_param("ride_type", "lyft_plus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cost_estimates": [{
                "ride_type": "lyft_plus",
                "display_name": "Lyft Plus",
                "estimated_cost_cents_min": 1500,
                "estimated_cost_cents_max": 2200,
                "estimated_distance_miles": 3.3,
                "estimated_duration_seconds": 913,
                "cost_token": null,
                "is_valid_estimate": true
            }]
        })))
        .expect(1)
        .mount(api.server())
        .await;

    let query = CostQuery::new(37.7763, -122.3918)
        .destination(37.7972, -122.4533)
        .ride_type(ride_type::PLUS);
    let estimates = api.client().availability().cost(&query).await.unwrap().data;
    assert_eq!(estimates[0].duration, Duration::from_secs(913));
    assert_eq!(estimates[0].min_cost_cents, 1500);
    assert_eq!(estimates[0].cost_token, "");
    assert!(estimates[0].valid);
}

#[tokio::test]
async fn test_eta_without_destination() {
    let api = MockLyftApi::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/eta"))
        .and(query_param("lat", "37.7763"))
        .and(query_param_is_missing("destination_lat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "eta_estimates": [
                {"ride_type": "lyft", "display_name": "Lyft", "eta_seconds": 120, "is_valid_estimate": true},
                {"ride_type": "lyft_line", "display_name": "Lyft Line", "eta_seconds": null, "is_valid_estimate": false}
            ]
        })))
        .mount(api.server())
        .await;

    let etas = api
        .client()
        .availability()
        .eta(&EtaQuery::new(37.7763, -122.3918))
        .await
        .unwrap()
        .data;
    assert_eq!(etas[0].eta, Duration::from_secs(120));
    assert_eq!(etas[1].eta, Duration::ZERO);
    assert!(!etas[1].valid);
}

#[tokio::test]
async fn test_nearby_drivers() {
    let api = MockLyftApi::start().await;
    api.respond_json(
        "GET",
        "/v1/drivers",
        200,
        json!({
            "nearby_drivers": [{
                "ride_type": "lyft",
                "drivers": [{"locations": [{"lat": 37.1, "lng": -122.1}, {"lat": 37.2, "lng": -122.2}]}]
            }]
        }),
    )
    .await;

    let nearby = api
        .client()
        .availability()
        .drivers(37.7763, -122.3918)
        .await
        .unwrap()
        .data;
    assert_eq!(nearby[0].ride_type, "lyft");
    assert_eq!(nearby[0].drivers[0].locations.len(), 2);
    assert_eq!(nearby[0].drivers[0].locations[1].lat, 37.2);
}
