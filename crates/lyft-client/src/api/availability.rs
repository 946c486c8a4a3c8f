//! Availability API: ride types, cost and ETA estimates, nearby drivers.

use reqwest::{Method, StatusCode};

use crate::client::LyftClient;
use crate::error::Result;
use crate::response::Response;
use crate::types::{
    CostEstimate, CostEstimatesResponse, CostQuery, EtaEstimate, EtaEstimatesResponse, EtaQuery,
    NearbyDrivers, NearbyDriversResponse, RideTypeInfo, RideTypesResponse,
};

/// Availability API client.
pub struct AvailabilityApi {
    client: LyftClient,
}

impl AvailabilityApi {
    pub(crate) fn new(client: LyftClient) -> Self {
        Self { client }
    }

    /// Ride types offered at a location, optionally narrowed to one type.
    pub async fn ride_types(
        &self,
        lat: f64,
        lng: f64,
        ride_type: Option<&str>,
    ) -> Result<Response<Vec<RideTypeInfo>>> {
        let mut query = vec![("lat", lat.to_string()), ("lng", lng.to_string())];
        if let Some(ride_type) = ride_type {
            query.push(("ride_type", ride_type.to_string()));
        }
        let builder = self
            .client
            .request(Method::GET, "v1/ridetypes")?
            .query(&query);
        let response = self
            .client
            .send(builder)
            .await?
            .expect::<RideTypesResponse>(StatusCode::OK)?;
        Ok(response.map(|r| r.ride_types))
    }

    /// Estimated cost, distance and duration of a ride.
    pub async fn cost(&self, query: &CostQuery) -> Result<Response<Vec<CostEstimate>>> {
        let builder = self
            .client
            .request(Method::GET, "v1/cost")?
            .query(&query.to_query());
        let response = self
            .client
            .send(builder)
            .await?
            .expect::<CostEstimatesResponse>(StatusCode::OK)?;
        Ok(response.map(|r| r.cost_estimates))
    }

    /// Time for the nearest driver to reach a location.
    pub async fn eta(&self, query: &EtaQuery) -> Result<Response<Vec<EtaEstimate>>> {
        let builder = self
            .client
            .request(Method::GET, "v1/eta")?
            .query(&query.to_query());
        let response = self
            .client
            .send(builder)
            .await?
            .expect::<EtaEstimatesResponse>(StatusCode::OK)?;
        Ok(response.map(|r| r.eta_estimates))
    }

    /// Locations of drivers near a point, grouped by ride type.
    pub async fn drivers(&self, lat: f64, lng: f64) -> Result<Response<Vec<NearbyDrivers>>> {
        let builder = self
            .client
            .request(Method::GET, "v1/drivers")?
            .query(&[("lat", lat.to_string()), ("lng", lng.to_string())]);
        let response = self
            .client
            .send(builder)
            .await?
            .expect::<NearbyDriversResponse>(StatusCode::OK)?;
        Ok(response.map(|r| r.nearby_drivers))
    }
}
