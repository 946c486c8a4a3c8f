//! HTTP client for the Lyft ride-hailing API.
//!
//! This crate provides a typed client for the v1 REST API: ride requests,
//! cancellation, details, history and receipts; ride types, cost and ETA
//! estimates; the user profile; and webhook verification.
//!
//! # Example
//!
//! ```no_run
//! use lyft_client::{CostQuery, LyftClient, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = LyftClient::builder()
//!     .access_token("my-token")
//!     .build()?;
//!
//! let estimates = client
//!     .availability()
//!     .cost(&CostQuery::new(37.7763, -122.3918).destination(37.7972, -122.4533))
//!     .await?;
//! for estimate in &estimates.data {
//!     println!("{}: {}-{} cents", estimate.display_name, estimate.min_cost_cents, estimate.max_cost_cents);
//! }
//! if let Some(remaining) = estimates.meta.rate_remaining() {
//!     println!("{remaining} requests left");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! When the round trip succeeds but the status code signals a failure, the
//! error is [`Error::Status`] holding a [`StatusError`] with the raw body,
//! the parsed reason and description, and for ride requests and
//! cancellations the confirmation payload. See [`flow`] for driving those
//! confirmations.

pub mod api;
pub mod client;
pub mod de;
pub mod error;
pub mod flow;
pub mod response;
pub mod types;
pub mod webhook;

pub use client::{ClientBuilder, DEFAULT_BASE_URL, LyftClient};
pub use error::{
    CancellationFee, CostTokenInfo, Error, ErrorInfo, Result, StatusError, StatusErrorKind,
    token_expired,
};
pub use flow::{CancelFlow, CancelOutcome, FlowState, RequestOutcome, RideRequestFlow};
pub use response::{RawResponse, Response, ResponseMeta};
pub use types::*;
