//! API endpoint implementations.
//!
//! Every operation builds a request, sends it through
//! [`LyftClient::execute`](crate::LyftClient::execute), and then either
//! decodes the buffered body or classifies the failure.

mod availability;
mod rides;
mod users;

pub use availability::AvailabilityApi;
pub use rides::RidesApi;
pub use users::UsersApi;
