//! Ride command - create, cancel and track rides.

use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::{DateTime, TimeDelta, Utc};
use clap::{Args, Subcommand};
use console::{Style, style};
use lyft_client::{
    CancelFlow, CancelOutcome, CancellationFee, CostTokenInfo, RequestOutcome, RideDetail,
    RideHistoryQuery, RideRequest, RideRequestFlow, RideStatus, ride_type,
};
use serde::Serialize;

use super::{
    Context, RideTypeArg, continuation, field, format_cents, print_json, print_location,
    print_route,
};
use crate::notify::{Notifier, NotifyOnce, SystemNotifier};
use crate::prompt;
use crate::session::Session;

/// Poll interval while waiting for a driver.
const PENDING_POLL: Duration = Duration::from_secs(20);
/// Poll interval once a driver is on the way.
const ACCEPTED_POLL: Duration = Duration::from_secs(10);
/// Poll interval when the driver is about to arrive.
const NEAR_PICKUP_POLL: Duration = Duration::from_secs(5);
/// Pickup ETA under which the driver counts as about to arrive.
const NEAR_PICKUP: Duration = Duration::from_secs(120);

/// Arguments for the ride command.
#[derive(Args, Debug)]
pub struct RideArgs {
    #[command(subcommand)]
    pub command: RideCommand,
}

#[derive(Subcommand, Debug)]
pub enum RideCommand {
    /// Request a ride
    Create,

    /// Cancel a ride
    Cancel {
        /// Ride to cancel
        ride_id: String,
    },

    /// Show ride status
    Status {
        /// Ride to show
        ride_id: String,
    },

    /// List recent rides
    History {
        /// How many days back to look
        #[arg(long, default_value_t = 30)]
        days: i64,

        /// Maximum number of rides to list (up to 50)
        #[arg(long, default_value_t = 10)]
        limit: i32,
    },

    /// Show the receipt for a completed ride
    Receipt {
        /// Ride to show
        ride_id: String,
    },
}

/// Run the ride command.
pub async fn run(args: RideArgs, ctx: &Context) -> Result<()> {
    match args.command {
        RideCommand::Create => cmd_create(ctx).await,
        RideCommand::Cancel { ride_id } => cmd_cancel(&ride_id, ctx).await,
        RideCommand::Status { ride_id } => cmd_status(&ride_id, ctx).await,
        RideCommand::History { days, limit } => cmd_history(days, limit, ctx).await,
        RideCommand::Receipt { ride_id } => cmd_receipt(&ride_id, ctx).await,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Create
// ─────────────────────────────────────────────────────────────────────────────

async fn cmd_create(ctx: &Context) -> Result<()> {
    let ride_type = ctx.ride.ride_type.unwrap_or(RideTypeArg::Line).api_name();

    let start = ctx.start_location().await?;
    let end = if ride_type == ride_type::LINE {
        let end = ctx.end_location("Enter end location: ").await?;
        Some(end.ok_or_else(|| anyhow::anyhow!("Lyft Line rides need an end location"))?)
    } else {
        ctx.end_location("Enter end location (street address or lat,lng; can be empty): ")
            .await?
    };

    let mut request = RideRequest::new(start, ride_type);
    if let Some(end) = end {
        request = request.destination(end);
    }

    if ctx.json_output && ctx.ride.dry_run {
        return print_json(&request);
    }
    println!();
    print_route(&request.origin, request.destination.as_ref());
    println!();

    if ctx.ride.dry_run {
        println!("Dry run; not requesting a ride.");
        return Ok(());
    }

    let mut session = ctx.session().await?;
    let outcome = session
        .call(|client| {
            let request = request.clone();
            async move {
                RideRequestFlow::new(&client, request)
                    .run(confirm_cost)
                    .await
            }
        })
        .await?;

    let created = match outcome {
        RequestOutcome::Created(created) => created.into_data(),
        RequestOutcome::Declined(_) => {
            println!("Not requesting a ride.");
            return Ok(());
        }
    };

    if ctx.json_output {
        print_json(&created)?;
    } else {
        field("Ride ID:", &created.ride_id);
        field("Status:", created.status);
        println!();
        println!("Cancel the ride: lyft ride cancel {}", created.ride_id);
    }

    if ctx.ride.watch {
        ride_status(&mut session, &created.ride_id, ctx).await
    } else {
        if !ctx.json_output {
            println!("Watch ride status: lyft --watch ride status {}", created.ride_id);
        }
        Ok(())
    }
}

fn confirm_cost(cost: &CostTokenInfo) -> bool {
    let question = if cost.primetime_percentage.is_empty() {
        "The cost of this ride must be confirmed. Continue?".to_string()
    } else {
        format!(
            "Prime Time pricing of {} is in effect. Continue?",
            cost.primetime_percentage
        )
    };
    prompt::confirm(&question)
}

// ─────────────────────────────────────────────────────────────────────────────
// Cancel
// ─────────────────────────────────────────────────────────────────────────────

async fn cmd_cancel(ride_id: &str, ctx: &Context) -> Result<()> {
    if ctx.ride.dry_run {
        println!("Dry run; not canceling ride {ride_id}.");
        return Ok(());
    }

    let mut session = ctx.session().await?;
    let outcome = session
        .call(|client| {
            let ride_id = ride_id.to_string();
            async move { CancelFlow::new(&client, ride_id).run(confirm_fee).await }
        })
        .await?;

    match outcome {
        CancelOutcome::Canceled(_) => println!("Canceled ride {ride_id}."),
        CancelOutcome::Declined(_) => println!("Not making any changes."),
    }
    Ok(())
}

fn confirm_fee(fee: &CancellationFee) -> bool {
    prompt::confirm(&format!(
        "You will be charged {} {:.2} for canceling. Continue?",
        fee.currency, fee.amount
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

async fn cmd_status(ride_id: &str, ctx: &Context) -> Result<()> {
    let mut session = ctx.session().await?;
    ride_status(&mut session, ride_id, ctx).await
}

/// How long to wait before polling a ride again, or `None` to stop.
pub fn poll_interval(detail: &RideDetail) -> Option<Duration> {
    match detail.status {
        RideStatus::Pending => Some(PENDING_POLL),
        RideStatus::Accepted => match detail.pickup_eta() {
            Some(eta) if !eta.is_zero() && eta < NEAR_PICKUP => Some(NEAR_PICKUP_POLL),
            _ => Some(ACCEPTED_POLL),
        },
        _ => None,
    }
}

/// Notification text for a status change worth announcing.
pub fn status_message(detail: &RideDetail) -> Option<String> {
    match detail.status {
        RideStatus::Accepted => Some(format!("Ride {} has been accepted", detail.ride_id)),
        RideStatus::Canceled => Some(format!("Ride {} has been canceled", detail.ride_id)),
        RideStatus::Arrived => Some(match &detail.vehicle {
            Some(v) => format!("{} {} {} ({})", v.color, v.make, v.model, v.license_plate),
            None => format!("Your driver for ride {} has arrived", detail.ride_id),
        }),
        _ => None,
    }
}

/// Show a ride, and with `--watch` keep polling until it leaves the
/// pending/accepted states.
async fn ride_status(session: &mut Session, ride_id: &str, ctx: &Context) -> Result<()> {
    let watch = ctx.ride.watch;
    let notifier = SystemNotifier;
    let mut notified = NotifyOnce::new(&notifier as &dyn Notifier);
    let mut first = true;

    loop {
        let detail = session
            .call(|client| {
                let ride_id = ride_id.to_string();
                async move { client.rides().detail(&ride_id).await }
            })
            .await?
            .into_data();

        if ctx.json_output {
            print_json(&detail)?;
        } else {
            if first {
                println!();
                field("Ride ID:", &detail.ride_id);
                field("Ride Type:", ride_type::display_name(&detail.ride_type));
            }
            print_detail(&detail);
            println!();
        }
        first = false;

        if ctx.ride.notify
            && let Some(message) = status_message(&detail)
        {
            let title = format!("Lyft Ride {}", detail.status);
            notified.notify(detail.status.as_str(), &message, &title);
        }

        if !watch {
            return Ok(());
        }
        let Some(wait) = poll_interval(&detail) else {
            if !ctx.json_output {
                println!("No more updates.");
            }
            return Ok(());
        };
        tracing::debug!(status = %detail.status, wait_secs = wait.as_secs(), "polling ride");
        tokio::time::sleep(wait).await;
    }
}

fn print_detail(detail: &RideDetail) {
    field("Status:", style(detail.status).bold());
    match detail.status {
        RideStatus::Pending => {
            print_requested("Start:", detail.origin.as_ref(), false);
            print_requested("End:", detail.destination.as_ref(), false);
        }
        RideStatus::Accepted | RideStatus::Arrived => {
            print_requested("Start:", detail.origin.as_ref(), true);
            print_requested("End:", detail.destination.as_ref(), true);
            if let Some(location) = &detail.location {
                print_location("Location:", &lyft_client::Location::new(location.lat, location.lng));
            }
            if let Some(driver) = &detail.driver {
                field(
                    "Driver:",
                    format!("{} {}, {}", driver.first_name, driver.last_name, driver.rating),
                );
            }
            if let Some(v) = &detail.vehicle {
                field("Vehicle:", format!("{} {} {}", v.color, v.make, v.model));
                continuation(format!("{} ({})", v.license_plate, v.year));
            }
        }
        RideStatus::Canceled => {
            if let Some(price) = &detail.cancellation_price {
                field("Fee:", format_cents(price.amount, &price.currency));
            }
            if !detail.canceled_by.is_empty() {
                field("Canceled by:", &detail.canceled_by);
            }
        }
        _ => {
            if let Some(price) = &detail.price {
                field("Price:", format_cents(price.amount, &price.currency));
            }
        }
    }
}

fn print_requested(
    label: &str,
    location: Option<&lyft_client::RequestedLocation>,
    with_eta: bool,
) {
    let Some(location) = location else {
        return;
    };
    let point = lyft_client::Location::new(location.lat, location.lng);
    print_location(label, &point);
    if with_eta && let Some(eta) = location.eta {
        continuation(format!("ETA {}", format_eta(eta)));
    }
}

fn format_eta(eta: Duration) -> String {
    let secs = eta.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// History and receipts
// ─────────────────────────────────────────────────────────────────────────────

/// History row for JSON output.
#[derive(Debug, Serialize)]
struct HistoryOutput<'a> {
    rides: &'a [RideDetail],
}

/// Start of the history window, `days` before `now`. Negative counts as zero.
fn history_start(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    TimeDelta::try_days(days.max(0))
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| anyhow!("--days {days} reaches past the earliest supported date"))
}

async fn cmd_history(days: i64, limit: i32, ctx: &Context) -> Result<()> {
    let since = history_start(Utc::now(), days)?;
    let query = RideHistoryQuery::since(since).limit(limit);

    let mut session = ctx.session().await?;
    let rides = session
        .call(|client| {
            let query = query.clone();
            async move { client.rides().history(&query).await }
        })
        .await?
        .into_data();

    if ctx.json_output {
        return print_json(&HistoryOutput { rides: &rides });
    }
    if rides.is_empty() {
        println!("No rides in the last {days} days.");
        return Ok(());
    }

    let dim = Style::new().dim();
    println!();
    for ride in &rides {
        let when = ride
            .requested_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let price = ride
            .price
            .as_ref()
            .map(|p| format_cents(p.amount, &p.currency))
            .unwrap_or_default();
        println!(
            "  {} {}  {:<14} {:<12} {}",
            dim.apply_to(format!("{when:<16}")),
            ride.ride_id,
            ride_type::display_name(&ride.ride_type),
            ride.status.display_name(),
            price
        );
    }
    println!();
    Ok(())
}

async fn cmd_receipt(ride_id: &str, ctx: &Context) -> Result<()> {
    let mut session = ctx.session().await?;
    let receipt = session
        .call(|client| {
            let ride_id = ride_id.to_string();
            async move { client.rides().receipt(&ride_id).await }
        })
        .await?
        .into_data();

    if ctx.json_output {
        return print_json(&receipt);
    }

    println!();
    field("Ride ID:", &receipt.ride_id);
    if let Some(requested_at) = receipt.requested_at {
        field("Requested:", requested_at.format("%Y-%m-%d %H:%M UTC"));
    }
    for item in &receipt.line_items {
        field(
            &format!("{}:", item.item_type),
            format_cents(item.amount, &item.currency),
        );
    }
    if let Some(price) = &receipt.price {
        field("Total:", style(format_cents(price.amount, &price.currency)).bold());
    }
    for charge in &receipt.charges {
        field(
            "Charged:",
            format!(
                "{} to {}",
                format_cents(charge.amount, &charge.currency),
                charge.payment_method
            ),
        );
    }
    println!();
    Ok(())
}
