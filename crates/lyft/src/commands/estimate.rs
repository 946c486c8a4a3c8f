//! Estimate command - ride types, prices and pickup times near a location.

use anyhow::Result;
use clap::Args;
use console::Style;
use lyft_client::{CostEstimate, CostQuery, EtaEstimate, EtaQuery, RideTypeInfo};
use serde::Serialize;

use super::{Context, format_cents, print_json, print_route};

/// Arguments for the estimate command.
#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// Also list nearby drivers
    #[arg(long)]
    pub drivers: bool,
}

/// Estimates for JSON output.
#[derive(Debug, Serialize)]
struct EstimateOutput {
    ride_types: Vec<RideTypeInfo>,
    cost: Vec<CostEstimate>,
    eta: Vec<EtaEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    drivers: Option<Vec<lyft_client::NearbyDrivers>>,
}

/// Run the estimate command.
pub async fn run(args: EstimateArgs, ctx: &Context) -> Result<()> {
    let start = ctx.start_location().await?;
    let end = ctx
        .end_location("Enter end location (street address or lat,lng; can be empty): ")
        .await?;
    let ride_type = ctx.ride.ride_type.map(|r| r.api_name());
    let (lat, lng) = (start.lat, start.lng);

    let mut cost_query = CostQuery::new(lat, lng);
    let mut eta_query = EtaQuery::new(lat, lng);
    if let Some(end) = &end {
        cost_query = cost_query.destination(end.lat, end.lng);
        eta_query = eta_query.destination(end.lat, end.lng);
    }
    if let Some(ride_type) = ride_type {
        cost_query = cost_query.ride_type(ride_type);
        eta_query = eta_query.ride_type(ride_type);
    }

    let mut session = ctx.session().await?;
    let ride_types = session
        .call(|client| async move {
            client
                .availability()
                .ride_types(lat, lng, ride_type)
                .await
        })
        .await?
        .into_data();
    let cost = session
        .call(|client| {
            let query = cost_query.clone();
            async move { client.availability().cost(&query).await }
        })
        .await?
        .into_data();
    let eta = session
        .call(|client| {
            let query = eta_query.clone();
            async move { client.availability().eta(&query).await }
        })
        .await?
        .into_data();
    let drivers = if args.drivers {
        Some(
            session
                .call(|client| async move {
                    client.availability().drivers(lat, lng).await
                })
                .await?
                .into_data(),
        )
    } else {
        None
    };

    if ctx.json_output {
        return print_json(&EstimateOutput {
            ride_types,
            cost,
            eta,
            drivers,
        });
    }

    println!();
    print_route(&start, end.as_ref());
    println!();

    if ride_types.is_empty() {
        println!("Lyft is not available here.");
        return Ok(());
    }

    let bold = Style::new().bold();
    let dim = Style::new().dim();
    println!(
        "  {}",
        bold.apply_to(format!(
            "{:<16} {:>6} {:>24} {:>8}",
            "Ride type", "Seats", "Cost", "Pickup"
        ))
    );
    for info in &ride_types {
        let price = cost
            .iter()
            .find(|c| c.ride_type == info.ride_type && c.valid)
            .map(|c| {
                let range = format!(
                    "{} - {}",
                    format_cents(c.min_cost_cents, &currency(info)),
                    format_cents(c.max_cost_cents, &currency(info))
                );
                if c.primetime_percentage.is_empty() || c.primetime_percentage == "0%" {
                    range
                } else {
                    format!("{range} (+{})", c.primetime_percentage)
                }
            })
            .unwrap_or_else(|| "-".to_string());
        let pickup = eta
            .iter()
            .find(|e| e.ride_type == info.ride_type && e.valid)
            .map(|e| format!("{} min", e.eta.as_secs().div_ceil(60)))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<16} {:>6} {:>24} {:>8}",
            info.display_name, info.seats, price, pickup
        );
    }

    if let Some(drivers) = drivers {
        println!();
        for nearby in &drivers {
            println!(
                "  {} {} nearby",
                dim.apply_to(format!("{:<16}", lyft_client::ride_type::display_name(&nearby.ride_type))),
                nearby.drivers.len()
            );
        }
    }
    println!();
    Ok(())
}

fn currency(info: &RideTypeInfo) -> String {
    info.pricing
        .as_ref()
        .map(|p| p.currency.clone())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "USD".to_string())
}
