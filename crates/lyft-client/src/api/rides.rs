//! Rides API.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use url::Url;

use crate::client::LyftClient;
use crate::error::{Result, StatusError};
use crate::response::Response;
use crate::types::{
    CreatedRide, Location, RideDetail, RideHistoryQuery, RideHistoryResponse, RideReceipt,
    RideRequest,
};

#[derive(Serialize)]
struct CancelBody<'a> {
    cancel_confirmation_token: &'a str,
}

/// Rides API client.
pub struct RidesApi {
    client: LyftClient,
}

impl RidesApi {
    pub(crate) fn new(client: LyftClient) -> Self {
        Self { client }
    }

    /// `v1/rides/{ride_id}[/{action}]` with the ride ID as one escaped segment.
    fn ride_url(&self, ride_id: &str, action: Option<&str>) -> Result<Url> {
        let mut segments = vec!["v1", "rides", ride_id];
        segments.extend(action);
        self.client.segments_url(&segments)
    }

    /// Request a ride.
    ///
    /// A 400 means the request needs confirmation; the error then carries
    /// [`CostTokenInfo`](crate::CostTokenInfo) when the server supplied it.
    pub async fn request(&self, request: &RideRequest) -> Result<Response<CreatedRide>> {
        let builder = self
            .client
            .json_request(Method::POST, "v1/rides", request)?;
        let raw = self.client.send(builder).await?;
        match raw.status() {
            StatusCode::CREATED => raw.decode(),
            StatusCode::BAD_REQUEST => Err(StatusError::ride_request(raw).into()),
            _ => Err(StatusError::generic(raw).into()),
        }
    }

    /// Cancel a ride, optionally echoing a cancellation confirmation token.
    ///
    /// A 400 means a fee applies; the error then carries the
    /// [`CancellationFee`](crate::CancellationFee) and its token.
    pub async fn cancel(&self, ride_id: &str, token: Option<&str>) -> Result<Response<()>> {
        let url = self.ride_url(ride_id, Some("cancel"))?;
        let builder = match token {
            Some(token) => self.client.json_request_to(
                Method::POST,
                url,
                &CancelBody {
                    cancel_confirmation_token: token,
                },
            )?,
            None => self.client.request_to(Method::POST, url),
        };
        let raw = self.client.send(builder).await?;
        match raw.status() {
            StatusCode::NO_CONTENT => raw.expect_empty(StatusCode::NO_CONTENT),
            StatusCode::BAD_REQUEST => Err(StatusError::cancel_ride(raw).into()),
            _ => Err(StatusError::generic(raw).into()),
        }
    }

    /// Get the details of a ride.
    pub async fn detail(&self, ride_id: &str) -> Result<Response<RideDetail>> {
        let builder = self
            .client
            .request_to(Method::GET, self.ride_url(ride_id, None)?);
        self.client.send(builder).await?.expect(StatusCode::OK)
    }

    /// List the user's current and past rides.
    pub async fn history(&self, query: &RideHistoryQuery) -> Result<Response<Vec<RideDetail>>> {
        let builder = self
            .client
            .request(Method::GET, "v1/rides")?
            .query(&query.to_query());
        let response = self
            .client
            .send(builder)
            .await?
            .expect::<RideHistoryResponse>(StatusCode::OK)?;
        Ok(response.map(|r| r.ride_history))
    }

    /// Get the receipt of a completed ride.
    pub async fn receipt(&self, ride_id: &str) -> Result<Response<RideReceipt>> {
        let builder = self
            .client
            .request_to(Method::GET, self.ride_url(ride_id, Some("receipt"))?);
        self.client.send(builder).await?.expect(StatusCode::OK)
    }

    /// Change the destination of a ride in progress.
    pub async fn set_destination(
        &self,
        ride_id: &str,
        destination: &Location,
    ) -> Result<Response<Location>> {
        let builder = self.client.json_request_to(
            Method::PUT,
            self.ride_url(ride_id, Some("destination"))?,
            destination,
        )?;
        self.client.send(builder).await?.expect(StatusCode::OK)
    }
}
