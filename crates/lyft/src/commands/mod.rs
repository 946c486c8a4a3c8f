//! CLI command handlers.

pub mod auth;
pub mod estimate;
pub mod place;
pub mod ride;

use std::fmt::Display;
use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;
use console::Style;
use lyft_client::{Location, ride_type};
use serde::Serialize;

use crate::config::Settings;
use crate::geocode::{self, GoogleGeocoder};
use crate::prompt;
use crate::session::Session;
use crate::store::{FileStore, PlaceStore};

/// Ride type accepted by `-c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RideTypeArg {
    Line,
    Lyft,
    Plus,
    Premier,
    Lux,
    Luxsuv,
}

impl RideTypeArg {
    /// The API's name for the ride type.
    pub fn api_name(self) -> &'static str {
        match self {
            RideTypeArg::Line => ride_type::LINE,
            RideTypeArg::Lyft => ride_type::LYFT,
            RideTypeArg::Plus => ride_type::PLUS,
            RideTypeArg::Premier => ride_type::PREMIER,
            RideTypeArg::Lux => ride_type::LUX,
            RideTypeArg::Luxsuv => ride_type::LUX_SUV,
        }
    }
}

/// Flags that shape ride commands.
#[derive(Debug, Clone, Default)]
pub struct RideOptions {
    /// Explicit `-c` value; ride creation falls back to Line.
    pub ride_type: Option<RideTypeArg>,
    pub dry_run: bool,
    /// Saved place to start from.
    pub start: Option<String>,
    /// Saved place to end at.
    pub end: Option<String>,
    pub notify: bool,
    pub watch: bool,
}

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
    pub ride: RideOptions,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled; also dumps API traffic.
    pub verbose: bool,
    pub http: reqwest::Client,
}

impl Context {
    pub fn store(&self) -> Arc<FileStore> {
        Arc::new(FileStore::new(&self.settings.data_dir))
    }

    /// An authorized session, prompting for authorization if needed.
    pub async fn session(&self) -> Result<Session> {
        Session::open(&self.settings, self.store(), self.http.clone(), self.verbose).await
    }

    pub fn geocoder(&self) -> Result<GoogleGeocoder> {
        Ok(GoogleGeocoder::new(
            self.http.clone(),
            self.settings.geocode_key()?,
        ))
    }

    /// A saved place by name.
    pub async fn place(&self, name: &str) -> Result<Location> {
        self.store()
            .load_place(name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("place {name:?} not found"))
    }

    /// Prompt for a location; empty input yields `None`.
    pub async fn prompt_location(&self, question: &str) -> Result<Option<Location>> {
        let input = prompt::read_line(question)?;
        if input.is_empty() {
            return Ok(None);
        }
        geocode::parse_location_input(&input, || self.geocoder())
            .await
            .map(Some)
    }

    /// The `--start` place, or a prompted location.
    pub async fn start_location(&self) -> Result<Location> {
        if let Some(name) = &self.ride.start {
            return self.place(name).await;
        }
        self.prompt_location("Enter start location (street address or lat,lng): ")
            .await?
            .ok_or_else(|| anyhow::anyhow!("a start location is required"))
    }

    /// The `--end` place, or a prompted location that may be left empty.
    pub async fn end_location(&self, question: &str) -> Result<Option<Location>> {
        match &self.ride.end {
            Some(name) => self.place(name).await.map(Some),
            None => self.prompt_location(question).await,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A dimmed, aligned label followed by a value.
pub fn field(label: &str, value: impl Display) {
    let dim = Style::new().dim();
    println!("  {} {}", dim.apply_to(format!("{label:<12}")), value);
}

/// A continuation line under the previous field.
pub fn continuation(value: impl Display) {
    println!("  {:<12} {}", "", value);
}

/// Print a location as a map link and its address.
pub fn print_location(label: &str, location: &Location) {
    field(label, geocode::google_maps_url(location.lat, location.lng));
    if let Some(address) = location.address.as_deref().filter(|a| !a.is_empty()) {
        continuation(address);
    }
}

pub fn print_route(start: &Location, end: Option<&Location>) {
    print_location("Start:", start);
    if let Some(end) = end {
        print_location("End:", end);
    }
}

/// Format an amount in minor units, e.g. `USD 12.50`.
pub fn format_cents(amount: i64, currency: &str) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let amount = amount.unsigned_abs();
    format!("{currency} {sign}{}.{:02}", amount / 100, amount % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ride_type_names() {
        assert_eq!(RideTypeArg::Line.api_name(), "lyft_line");
        assert_eq!(RideTypeArg::Luxsuv.api_name(), "lyft_luxsuv");
        assert_eq!(
            RideTypeArg::from_str("premier", true).unwrap(),
            RideTypeArg::Premier
        );
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(1250, "USD"), "USD 12.50");
        assert_eq!(format_cents(5, "USD"), "USD 0.05");
        assert_eq!(format_cents(-300, "USD"), "USD -3.00");
    }
}
