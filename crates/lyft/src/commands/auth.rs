//! Auth command - authorization management.

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use lyft_oauth::TokenClient;
use serde::Serialize;

use super::{Context, field, print_json};
use crate::session;
use crate::store::{CredentialStore, StoredCredential};

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Authorize this program to use your Lyft account
    Login {
        /// Re-authorize even if a valid credential is stored
        #[arg(long)]
        force: bool,
    },

    /// Show authorization status
    Status,

    /// Revoke and remove the stored credential
    Logout,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login { force } => cmd_login(force, ctx).await,
        AuthCommand::Status => cmd_status(ctx).await,
        AuthCommand::Logout => cmd_logout(ctx).await,
    }
}

async fn cmd_login(force: bool, ctx: &Context) -> Result<()> {
    let tokens = TokenClient::with_http_client(ctx.settings.oauth_config()?, ctx.http.clone());
    let client_id = tokens.config().client_id.clone();
    let store = ctx.store();

    if !force
        && let Some(stored) = store.load_credential().await?
        && stored.matches(&client_id)
        && (!stored.credential.is_expired() || stored.credential.refresh_token.is_some())
    {
        println!("Already authorized.");
        println!("Run 'lyft auth login --force' to re-authorize.");
        return Ok(());
    }

    let credential = session::authorize(&tokens).await?;
    store
        .save_credential(&StoredCredential {
            client_id,
            credential,
        })
        .await?;

    println!();
    println!("Authorization successful!");
    Ok(())
}

/// Status for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    authorized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    matches_config: bool,
    expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<chrono::DateTime<Utc>>,
    scopes: Vec<String>,
    has_refresh_token: bool,
}

async fn cmd_status(ctx: &Context) -> Result<()> {
    let stored = ctx.store().load_credential().await?;
    let configured = ctx.settings.client_id.as_deref();

    let output = match &stored {
        Some(stored) => StatusOutput {
            authorized: true,
            client_id: Some(stored.client_id.clone()),
            matches_config: configured.is_some_and(|id| stored.matches(id)),
            expired: stored.credential.is_expired(),
            expires_at: Some(stored.credential.expires_at()),
            scopes: stored.credential.scopes.clone(),
            has_refresh_token: stored.credential.refresh_token.is_some(),
        },
        None => StatusOutput {
            authorized: false,
            client_id: None,
            matches_config: false,
            expired: false,
            expires_at: None,
            scopes: Vec::new(),
            has_refresh_token: false,
        },
    };

    if ctx.json_output {
        return print_json(&output);
    }

    println!("Authorization Status");
    println!("--------------------");
    let Some(stored) = stored else {
        println!("Not authorized.");
        println!("  Run 'lyft auth login' to authorize.");
        return Ok(());
    };

    field("Client ID:", &stored.client_id);
    if !output.matches_config {
        println!("  (does not match the configured LYFT_CLIENT_ID; will re-authorize on next use)");
    }
    let expires_at = stored.credential.expires_at();
    if output.expired {
        field("Expired:", expires_at.format("%Y-%m-%d %H:%M UTC"));
    } else {
        let left = expires_at - Utc::now();
        field(
            "Expires:",
            format!(
                "{} (in {}m)",
                expires_at.format("%Y-%m-%d %H:%M UTC"),
                left.num_minutes()
            ),
        );
    }
    field("Scopes:", stored.credential.scopes.join(" "));
    field(
        "Refresh:",
        if output.has_refresh_token { "yes" } else { "no" },
    );
    Ok(())
}

async fn cmd_logout(ctx: &Context) -> Result<()> {
    let store = ctx.store();
    let Some(stored) = store.load_credential().await? else {
        println!("No stored credential found.");
        return Ok(());
    };

    match ctx.settings.oauth_config() {
        Ok(config) => {
            let tokens = TokenClient::with_http_client(config, ctx.http.clone());
            if let Err(e) = tokens.revoke(&stored.credential.access_token).await {
                tracing::warn!(error = %e, "failed to revoke credential");
            }
        }
        Err(e) => tracing::warn!(error = %e, "not revoking credential"),
    }

    store.delete_credential().await?;
    println!("Credential removed.");
    Ok(())
}
