//! Confirmation flows for ride requests and cancellations.
//!
//! Both endpoints answer 400 when the user must first accept a cost or a
//! fee; the error carries a token to echo back on the retry. A flow drives
//! that exchange with an explicit confirmation budget so a server that keeps
//! asking cannot loop forever.

use reqwest::StatusCode;

use crate::client::LyftClient;
use crate::error::{CancellationFee, CostTokenInfo, Error, Result};
use crate::response::{Response, ResponseMeta};
use crate::types::{CreatedRide, RideRequest};

/// Number of confirmations a flow asks for before giving up.
pub const DEFAULT_CONFIRMATION_BUDGET: u32 = 1;

/// Where a confirmation flow currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState<P> {
    /// Nothing sent yet.
    Initial,
    /// The server asked for confirmation of this payload.
    AwaitingConfirmation(P),
    /// The operation succeeded.
    Completed,
    /// The caller declined the confirmation.
    Declined,
    /// The operation failed or the budget ran out.
    Failed,
}

impl<P> FlowState<P> {
    /// Whether the flow has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowState::Completed | FlowState::Declined | FlowState::Failed
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cancellation
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a cancellation flow that did not error.
#[derive(Debug, Clone)]
pub enum CancelOutcome {
    /// The ride was canceled.
    Canceled(ResponseMeta),
    /// The caller refused the fee.
    Declined(CancellationFee),
}

/// Cancels a ride, asking before accepting a cancellation fee.
pub struct CancelFlow {
    client: LyftClient,
    ride_id: String,
    budget: u32,
    state: FlowState<CancellationFee>,
}

impl CancelFlow {
    pub fn new(client: &LyftClient, ride_id: impl Into<String>) -> Self {
        Self {
            client: client.clone(),
            ride_id: ride_id.into(),
            budget: DEFAULT_CONFIRMATION_BUDGET,
            state: FlowState::Initial,
        }
    }

    /// Set how many confirmations may be requested.
    pub fn budget(mut self, budget: u32) -> Self {
        self.budget = budget;
        self
    }

    pub fn state(&self) -> &FlowState<CancellationFee> {
        &self.state
    }

    /// Run the flow. `confirm` is asked whether to accept each fee.
    pub async fn run<F>(&mut self, mut confirm: F) -> Result<CancelOutcome>
    where
        F: FnMut(&CancellationFee) -> bool,
    {
        let rides = self.client.rides();
        let mut remaining = self.budget;
        let mut token: Option<String> = None;

        loop {
            let err = match rides.cancel(&self.ride_id, token.as_deref()).await {
                Ok(response) => {
                    self.state = FlowState::Completed;
                    return Ok(CancelOutcome::Canceled(response.meta));
                }
                Err(err) => err,
            };

            let fee = match confirmable(&err, remaining, Error::cancellation_fee) {
                Some(fee) if !fee.token.is_empty() => fee.clone(),
                _ => {
                    self.state = FlowState::Failed;
                    return Err(err);
                }
            };
            remaining -= 1;

            tracing::debug!(ride_id = %self.ride_id, amount = fee.amount, "cancellation fee requires confirmation");
            self.state = FlowState::AwaitingConfirmation(fee.clone());
            if !confirm(&fee) {
                self.state = FlowState::Declined;
                return Ok(CancelOutcome::Declined(fee));
            }
            token = Some(fee.token);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ride request
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a ride request flow that did not error.
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    /// The ride was created.
    Created(Response<CreatedRide>),
    /// The caller refused the cost.
    Declined(CostTokenInfo),
}

/// Requests a ride, asking before accepting a cost (e.g. Prime Time).
pub struct RideRequestFlow {
    client: LyftClient,
    request: RideRequest,
    budget: u32,
    state: FlowState<CostTokenInfo>,
}

impl RideRequestFlow {
    pub fn new(client: &LyftClient, request: RideRequest) -> Self {
        Self {
            client: client.clone(),
            request,
            budget: DEFAULT_CONFIRMATION_BUDGET,
            state: FlowState::Initial,
        }
    }

    /// Set how many confirmations may be requested.
    pub fn budget(mut self, budget: u32) -> Self {
        self.budget = budget;
        self
    }

    pub fn state(&self) -> &FlowState<CostTokenInfo> {
        &self.state
    }

    /// Run the flow. `confirm` is asked whether to accept each cost.
    pub async fn run<F>(&mut self, mut confirm: F) -> Result<RequestOutcome>
    where
        F: FnMut(&CostTokenInfo) -> bool,
    {
        let rides = self.client.rides();
        let mut remaining = self.budget;

        loop {
            let err = match rides.request(&self.request).await {
                Ok(response) => {
                    self.state = FlowState::Completed;
                    return Ok(RequestOutcome::Created(response));
                }
                Err(err) => err,
            };

            let cost = match confirmable(&err, remaining, Error::cost_token_info) {
                Some(cost) if confirmation_token(cost).is_some() => cost.clone(),
                _ => {
                    self.state = FlowState::Failed;
                    return Err(err);
                }
            };
            remaining -= 1;

            tracing::debug!(
                ride_type = %self.request.ride_type,
                primetime = %cost.primetime_percentage,
                "ride request requires cost confirmation"
            );
            self.state = FlowState::AwaitingConfirmation(cost.clone());
            if !confirm(&cost) {
                self.state = FlowState::Declined;
                return Ok(RequestOutcome::Declined(cost));
            }
            self.request.cost_token = confirmation_token(&cost).map(str::to_string);
        }
    }
}

/// The token to echo back: the cost token, or the older Prime Time token.
fn confirmation_token(cost: &CostTokenInfo) -> Option<&str> {
    [&cost.cost_token, &cost.primetime_token]
        .into_iter()
        .find(|t| !t.is_empty())
        .map(String::as_str)
}

/// The confirmation payload of a 400 error, if the budget allows another try.
fn confirmable<'e, P>(
    err: &'e Error,
    remaining: u32,
    payload: impl FnOnce(&'e Error) -> Option<&'e P>,
) -> Option<&'e P> {
    let status = err.status_error()?.status();
    if remaining == 0 || status != StatusCode::BAD_REQUEST {
        return None;
    }
    payload(err)
}
