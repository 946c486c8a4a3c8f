//! Place command - named start and end locations.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use super::{Context, print_json, print_location};
use crate::geocode;
use crate::store::PlaceStore;

/// Arguments for the place command.
#[derive(Args, Debug)]
pub struct PlaceArgs {
    #[command(subcommand)]
    pub command: PlaceCommand,
}

#[derive(Subcommand, Debug)]
pub enum PlaceCommand {
    /// Save a place
    Add {
        /// Name to save the place under
        name: String,

        /// Street address or "lat,lng" (prompted for if omitted)
        #[arg(long)]
        location: Option<String>,
    },

    /// Remove saved places
    Remove {
        /// Places to remove
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Show saved places
    Show {
        /// Show only this place
        name: Option<String>,
    },
}

/// Run the place command.
pub async fn run(args: PlaceArgs, ctx: &Context) -> Result<()> {
    match args.command {
        PlaceCommand::Add { name, location } => cmd_add(&name, location, ctx).await,
        PlaceCommand::Remove { names } => cmd_remove(&names, ctx).await,
        PlaceCommand::Show { name } => cmd_show(name.as_deref(), ctx).await,
    }
}

async fn cmd_add(name: &str, input: Option<String>, ctx: &Context) -> Result<()> {
    let store = ctx.store();
    if store.load_place(name).await?.is_some() {
        bail!("place {name:?} already exists; remove before re-adding");
    }

    let location = match input {
        Some(input) => geocode::parse_location_input(&input, || ctx.geocoder()).await?,
        None => ctx
            .prompt_location("Enter location (street address or lat,lng): ")
            .await?
            .ok_or_else(|| anyhow::anyhow!("no location entered"))?,
    };
    store.save_place(name, &location).await?;

    if ctx.json_output {
        return print_json(&location);
    }
    print_location("Added:", &location);
    Ok(())
}

async fn cmd_remove(names: &[String], ctx: &Context) -> Result<()> {
    ctx.store().remove_place(names).await?;
    if !ctx.json_output {
        println!("Removed {}.", names.join(", "));
    }
    Ok(())
}

async fn cmd_show(name: Option<&str>, ctx: &Context) -> Result<()> {
    let store = ctx.store();
    match name {
        Some(name) => {
            let place = ctx.place(name).await?;
            print_json(&place)
        }
        None => {
            let places = store.places().await?;
            if places.is_empty() && !ctx.json_output {
                println!("No saved places. Add one using 'lyft place add <name>'.");
                return Ok(());
            }
            print_json(&places)
        }
    }
}
