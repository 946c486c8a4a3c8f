//! Request and response types for the Lyft API.
//!
//! Wire units are normalized on decode: seconds become [`Duration`]s,
//! RFC 3339 strings become timestamps (empty means absent), and `null`
//! lists become empty.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::de;

// ─────────────────────────────────────────────────────────────────────────────
// Ride types and profiles
// ─────────────────────────────────────────────────────────────────────────────

/// Known ride types. Not exhaustive; the API may return others.
pub mod ride_type {
    pub const LYFT: &str = "lyft";
    pub const PLUS: &str = "lyft_plus";
    pub const LINE: &str = "lyft_line";
    pub const PREMIER: &str = "lyft_premier";
    pub const LUX: &str = "lyft_lux";
    pub const LUX_SUV: &str = "lyft_luxsuv";

    /// All known ride types.
    pub const ALL: &[&str] = &[LYFT, PLUS, LINE, PREMIER, LUX, LUX_SUV];

    /// Human-friendly name for a ride type; unknown types pass through.
    pub fn display_name(ride_type: &str) -> &str {
        match ride_type {
            LYFT => "Lyft",
            PLUS => "Lyft Plus",
            LINE => "Lyft Line",
            PREMIER => "Lyft Premier",
            LUX => "Lyft Lux",
            LUX_SUV => "Lyft Lux SUV",
            other => other,
        }
    }
}

/// Ride profile for business rides.
pub const PROFILE_BUSINESS: &str = "business";
/// Ride profile for personal rides.
pub const PROFILE_PERSONAL: &str = "personal";

// ─────────────────────────────────────────────────────────────────────────────
// Ride status
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle status of a ride.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RideStatus {
    Pending,
    Accepted,
    Arrived,
    PickedUp,
    DroppedOff,
    Canceled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RideStatus {
    /// The wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            RideStatus::Pending => "pending",
            RideStatus::Accepted => "accepted",
            RideStatus::Arrived => "arrived",
            RideStatus::PickedUp => "pickedUp",
            RideStatus::DroppedOff => "droppedOff",
            RideStatus::Canceled => "canceled",
            RideStatus::Unknown => "unknown",
        }
    }

    /// Human-friendly name.
    pub fn display_name(self) -> &'static str {
        match self {
            RideStatus::Pending => "Pending",
            RideStatus::Accepted => "Accepted",
            RideStatus::Arrived => "Arrived",
            RideStatus::PickedUp => "Picked up",
            RideStatus::DroppedOff => "Dropped off",
            RideStatus::Canceled => "Canceled",
            RideStatus::Unknown => "Unknown",
        }
    }

    /// Whether the ride is still waiting for, or being approached by, a driver.
    pub fn is_awaiting_pickup(self) -> bool {
        matches!(self, RideStatus::Pending | RideStatus::Accepted)
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Locations
// ─────────────────────────────────────────────────────────────────────────────

/// A point with an optional address, as sent in request bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(deserialize_with = "de::null_default")]
    pub lat: f64,
    #[serde(deserialize_with = "de::null_default")]
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    /// A location without an address.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            address: None,
        }
    }

    /// Attach an address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// A requested origin or destination. Carries an ETA, never a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestedLocation {
    #[serde(deserialize_with = "de::null_default")]
    pub lat: f64,
    #[serde(deserialize_with = "de::null_default")]
    pub lng: f64,
    #[serde(deserialize_with = "de::null_default")]
    pub address: String,
    #[serde(
        rename = "eta_seconds",
        deserialize_with = "de::opt_seconds",
        serialize_with = "de::serialize_opt_seconds"
    )]
    pub eta: Option<Duration>,
}

/// An actual pickup or dropoff. Carries a time, never an ETA.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActualLocation {
    #[serde(deserialize_with = "de::null_default")]
    pub lat: f64,
    #[serde(deserialize_with = "de::null_default")]
    pub lng: f64,
    #[serde(deserialize_with = "de::null_default")]
    pub address: String,
    #[serde(deserialize_with = "de::timestamp")]
    pub time: Option<DateTime<Utc>>,
}

/// Current position of the vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleLocation {
    #[serde(deserialize_with = "de::null_default")]
    pub lat: f64,
    #[serde(deserialize_with = "de::null_default")]
    pub lng: f64,
    /// Bearing of the car in degrees.
    #[serde(deserialize_with = "de::null_default")]
    pub bearing: f64,
}

/// A bare coordinate pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatLng {
    #[serde(deserialize_with = "de::null_default")]
    pub lat: f64,
    #[serde(deserialize_with = "de::null_default")]
    pub lng: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// People, vehicles, money
// ─────────────────────────────────────────────────────────────────────────────

/// A passenger or driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    #[serde(deserialize_with = "de::null_default")]
    pub user_id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub first_name: String,
    #[serde(deserialize_with = "de::null_default")]
    pub last_name: String,
    #[serde(deserialize_with = "de::null_default")]
    pub image_url: String,
    #[serde(deserialize_with = "de::null_default")]
    pub rating: String,
    /// Not set for passengers.
    #[serde(rename = "phone_number", deserialize_with = "de::null_default")]
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vehicle {
    #[serde(deserialize_with = "de::null_default")]
    pub make: String,
    #[serde(deserialize_with = "de::null_default")]
    pub model: String,
    #[serde(deserialize_with = "de::null_default")]
    pub year: i32,
    #[serde(deserialize_with = "de::null_default")]
    pub license_plate: String,
    #[serde(deserialize_with = "de::null_default")]
    pub license_plate_state: String,
    #[serde(deserialize_with = "de::null_default")]
    pub color: String,
    #[serde(deserialize_with = "de::null_default")]
    pub image_url: String,
}

/// Amounts are in the currency's minor unit (cents for USD).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Price {
    #[serde(deserialize_with = "de::null_default")]
    pub amount: i64,
    #[serde(deserialize_with = "de::null_default")]
    pub currency: String,
    #[serde(deserialize_with = "de::null_default")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    #[serde(deserialize_with = "de::null_default")]
    pub amount: i64,
    #[serde(deserialize_with = "de::null_default")]
    pub currency: String,
    #[serde(rename = "type", deserialize_with = "de::null_default")]
    pub item_type: String,
}

/// A payment applied to a ride.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Charge {
    #[serde(deserialize_with = "de::null_default")]
    pub amount: i64,
    #[serde(deserialize_with = "de::null_default")]
    pub currency: String,
    #[serde(deserialize_with = "de::null_default")]
    pub payment_method: String,
}

/// Fee that applies if the ride is canceled now.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CancellationPrice {
    #[serde(deserialize_with = "de::null_default")]
    pub amount: i64,
    #[serde(deserialize_with = "de::null_default")]
    pub currency: String,
    #[serde(deserialize_with = "de::null_default")]
    pub token: String,
    #[serde(deserialize_with = "de::seconds", serialize_with = "de::serialize_seconds")]
    pub token_duration: Duration,
}

// ─────────────────────────────────────────────────────────────────────────────
// Rides
// ─────────────────────────────────────────────────────────────────────────────

/// Full details of a ride.
///
/// Which fields are set depends on the ride's state; webhook payloads omit
/// several of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideDetail {
    #[serde(deserialize_with = "de::null_default")]
    pub ride_id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub status: RideStatus,
    #[serde(deserialize_with = "de::null_default")]
    pub ride_type: String,
    /// Requested pickup location.
    pub origin: Option<RequestedLocation>,
    /// Requested dropoff location.
    pub destination: Option<RequestedLocation>,
    /// Actual pickup.
    pub pickup: Option<ActualLocation>,
    /// Actual dropoff.
    pub dropoff: Option<ActualLocation>,
    /// Vehicle position.
    pub location: Option<VehicleLocation>,
    pub passenger: Option<Person>,
    pub driver: Option<Person>,
    pub vehicle: Option<Vehicle>,
    #[serde(deserialize_with = "de::null_default")]
    pub primetime_percentage: String,
    #[serde(deserialize_with = "de::null_default")]
    pub distance_miles: f64,
    #[serde(
        rename = "duration_seconds",
        deserialize_with = "de::opt_seconds",
        serialize_with = "de::serialize_opt_seconds"
    )]
    pub duration: Option<Duration>,
    pub price: Option<Price>,
    #[serde(deserialize_with = "de::null_default")]
    pub line_items: Vec<LineItem>,
    #[serde(deserialize_with = "de::timestamp")]
    pub requested_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "de::null_default")]
    pub ride_profile: String,
    #[serde(rename = "beacon_string", deserialize_with = "de::null_default")]
    pub beacon_color: String,
    #[serde(deserialize_with = "de::null_default")]
    pub pricing_details_url: String,
    #[serde(deserialize_with = "de::null_default")]
    pub route_url: String,
    /// Parties allowed to cancel the ride.
    #[serde(deserialize_with = "de::null_default")]
    pub can_cancel: Vec<String>,
    #[serde(deserialize_with = "de::null_default")]
    pub canceled_by: String,
    pub cancellation_price: Option<CancellationPrice>,
    pub rating: Option<i32>,
    #[serde(deserialize_with = "de::null_default")]
    pub feedback: String,
    #[serde(deserialize_with = "de::timestamp")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl RideDetail {
    /// Time until the driver reaches the origin, if known.
    pub fn pickup_eta(&self) -> Option<Duration> {
        self.origin.as_ref().and_then(|o| o.eta)
    }
}

/// Parameters for requesting a ride.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideRequest {
    pub origin: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Location>,
    pub ride_type: String,
    /// Token from a previous cost confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_token: Option<String>,
}

impl RideRequest {
    pub fn new(origin: Location, ride_type: impl Into<String>) -> Self {
        Self {
            origin,
            destination: None,
            ride_type: ride_type.into(),
            cost_token: None,
        }
    }

    pub fn destination(mut self, destination: Location) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn cost_token(mut self, token: impl Into<String>) -> Self {
        self.cost_token = Some(token.into());
        self
    }
}

/// A newly requested ride.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatedRide {
    #[serde(deserialize_with = "de::null_default")]
    pub ride_id: String,
    /// `Pending` for newly requested rides.
    #[serde(deserialize_with = "de::null_default")]
    pub status: RideStatus,
    #[serde(deserialize_with = "de::null_default")]
    pub ride_type: String,
    pub origin: Option<RequestedLocation>,
    pub destination: Option<RequestedLocation>,
    /// The phone number is not set.
    pub passenger: Option<Person>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideReceipt {
    #[serde(deserialize_with = "de::null_default")]
    pub ride_id: String,
    pub price: Option<Price>,
    #[serde(deserialize_with = "de::null_default")]
    pub line_items: Vec<LineItem>,
    #[serde(deserialize_with = "de::null_default")]
    pub charges: Vec<Charge>,
    #[serde(deserialize_with = "de::timestamp")]
    pub requested_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "de::null_default")]
    pub ride_profile: String,
}

/// Largest page size the history endpoint accepts.
pub const MAX_HISTORY_LIMIT: i32 = 50;

/// Parameters for listing past and current rides.
#[derive(Debug, Clone, PartialEq)]
pub struct RideHistoryQuery {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// Maximum number of rides. Negative means [`MAX_HISTORY_LIMIT`].
    pub limit: i32,
}

impl RideHistoryQuery {
    /// Rides since `start`, up to the maximum page size.
    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            limit: -1,
        }
    }

    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = limit;
        self
    }

    /// The limit actually sent to the server.
    pub fn effective_limit(&self) -> i32 {
        if self.limit < 0 {
            MAX_HISTORY_LIMIT
        } else {
            self.limit
        }
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("start_time", de::format_query_time(&self.start))];
        if let Some(end) = &self.end {
            query.push(("end_time", de::format_query_time(end)));
        }
        query.push(("limit", self.effective_limit().to_string()));
        query
    }
}

#[derive(Deserialize)]
pub(crate) struct RideHistoryResponse {
    #[serde(default, deserialize_with = "de::null_default")]
    pub ride_history: Vec<RideDetail>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// The authenticated user's profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    #[serde(deserialize_with = "de::null_default")]
    pub id: String,
    #[serde(deserialize_with = "de::null_default")]
    pub first_name: String,
    #[serde(deserialize_with = "de::null_default")]
    pub last_name: String,
    /// Whether the user has taken at least one ride.
    #[serde(deserialize_with = "de::null_default")]
    pub has_taken_a_ride: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Availability
// ─────────────────────────────────────────────────────────────────────────────

/// A ride type offered at a location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideTypeInfo {
    #[serde(deserialize_with = "de::null_default")]
    pub display_name: String,
    #[serde(deserialize_with = "de::null_default")]
    pub ride_type: String,
    #[serde(deserialize_with = "de::null_default")]
    pub image_url: String,
    #[serde(rename = "pricing_details")]
    pub pricing: Option<Pricing>,
    #[serde(deserialize_with = "de::null_default")]
    pub seats: i32,
}

/// Pricing for a ride type, in minor currency units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    #[serde(rename = "base_charge", deserialize_with = "de::null_default")]
    pub base: i64,
    #[serde(rename = "cost_per_mile", deserialize_with = "de::null_default")]
    pub per_mile: i64,
    #[serde(rename = "cost_per_minute", deserialize_with = "de::null_default")]
    pub per_minute: i64,
    #[serde(rename = "cost_minimum", deserialize_with = "de::null_default")]
    pub minimum: i64,
    #[serde(deserialize_with = "de::null_default")]
    pub trust_and_service: i64,
    #[serde(deserialize_with = "de::null_default")]
    pub currency: String,
    #[serde(rename = "cancel_penalty_amount", deserialize_with = "de::null_default")]
    pub cancel_penalty: i64,
}

/// Estimated cost, distance and duration of a ride.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostEstimate {
    #[serde(deserialize_with = "de::null_default")]
    pub ride_type: String,
    #[serde(deserialize_with = "de::null_default")]
    pub display_name: String,
    #[serde(rename = "estimated_cost_cents_max", deserialize_with = "de::null_default")]
    pub max_cost_cents: i64,
    #[serde(rename = "estimated_cost_cents_min", deserialize_with = "de::null_default")]
    pub min_cost_cents: i64,
    #[serde(rename = "estimated_distance_miles", deserialize_with = "de::null_default")]
    pub distance_miles: f64,
    #[serde(
        rename = "estimated_duration_seconds",
        deserialize_with = "de::seconds",
        serialize_with = "de::serialize_seconds"
    )]
    pub duration: Duration,
    /// Deprecated in favor of `cost_token`.
    #[serde(
        rename = "primetime_confirmation_token",
        deserialize_with = "de::null_default"
    )]
    pub primetime_token: String,
    #[serde(deserialize_with = "de::null_default")]
    pub cost_token: String,
    /// If false, the cost bounds may be invalid.
    #[serde(rename = "is_valid_estimate", deserialize_with = "de::null_default")]
    pub valid: bool,
}

/// Estimated time for the nearest driver to arrive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtaEstimate {
    #[serde(deserialize_with = "de::null_default")]
    pub ride_type: String,
    #[serde(deserialize_with = "de::null_default")]
    pub display_name: String,
    #[serde(
        rename = "eta_seconds",
        deserialize_with = "de::seconds",
        serialize_with = "de::serialize_seconds"
    )]
    pub eta: Duration,
    /// If false, the ETA may be invalid.
    #[serde(rename = "is_valid_estimate", deserialize_with = "de::null_default")]
    pub valid: bool,
}

/// Drivers of one ride type near a location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NearbyDrivers {
    #[serde(deserialize_with = "de::null_default")]
    pub drivers: Vec<Driver>,
    #[serde(deserialize_with = "de::null_default")]
    pub ride_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Driver {
    /// Most recent coordinates.
    #[serde(deserialize_with = "de::null_default")]
    pub locations: Vec<LatLng>,
}

/// Parameters for a cost estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct CostQuery {
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_lat: Option<f64>,
    pub end_lng: Option<f64>,
    pub ride_type: Option<String>,
}

impl CostQuery {
    pub fn new(start_lat: f64, start_lng: f64) -> Self {
        Self {
            start_lat,
            start_lng,
            end_lat: None,
            end_lng: None,
            ride_type: None,
        }
    }

    pub fn destination(mut self, lat: f64, lng: f64) -> Self {
        self.end_lat = Some(lat);
        self.end_lng = Some(lng);
        self
    }

    pub fn ride_type(mut self, ride_type: impl Into<String>) -> Self {
        self.ride_type = Some(ride_type.into());
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("start_lat", self.start_lat.to_string()),
            ("start_lng", self.start_lng.to_string()),
        ];
        if let Some(lat) = self.end_lat {
            query.push(("end_lat", lat.to_string()));
        }
        if let Some(lng) = self.end_lng {
            query.push(("end_lng", lng.to_string()));
        }
        if let Some(ride_type) = &self.ride_type {
            query.push(("ride_type", ride_type.clone()));
        }
        query
    }
}

/// Parameters for a driver ETA estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct EtaQuery {
    pub lat: f64,
    pub lng: f64,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub ride_type: Option<String>,
}

impl EtaQuery {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            destination_lat: None,
            destination_lng: None,
            ride_type: None,
        }
    }

    pub fn destination(mut self, lat: f64, lng: f64) -> Self {
        self.destination_lat = Some(lat);
        self.destination_lng = Some(lng);
        self
    }

    pub fn ride_type(mut self, ride_type: impl Into<String>) -> Self {
        self.ride_type = Some(ride_type.into());
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("lat", self.lat.to_string()),
            ("lng", self.lng.to_string()),
        ];
        if let Some(lat) = self.destination_lat {
            query.push(("destination_lat", lat.to_string()));
        }
        if let Some(lng) = self.destination_lng {
            query.push(("destination_lng", lng.to_string()));
        }
        if let Some(ride_type) = &self.ride_type {
            query.push(("ride_type", ride_type.clone()));
        }
        query
    }
}

#[derive(Deserialize)]
pub(crate) struct RideTypesResponse {
    #[serde(default, deserialize_with = "de::null_default")]
    pub ride_types: Vec<RideTypeInfo>,
}

#[derive(Deserialize)]
pub(crate) struct CostEstimatesResponse {
    #[serde(default, deserialize_with = "de::null_default")]
    pub cost_estimates: Vec<CostEstimate>,
}

#[derive(Deserialize)]
pub(crate) struct EtaEstimatesResponse {
    #[serde(default, deserialize_with = "de::null_default")]
    pub eta_estimates: Vec<EtaEstimate>,
}

#[derive(Deserialize)]
pub(crate) struct NearbyDriversResponse {
    #[serde(default, deserialize_with = "de::null_default")]
    pub nearby_drivers: Vec<NearbyDrivers>,
}
