//! Token Minting Tool
//!
//! Prints an access/refresh token pair for a user id without going through
//! login. Useful for poking protected endpoints with curl.
//!
//! Usage:
//!   cargo run --bin mint_token -- <USER_ID> --role creator --status paid
//!   JWT_SECRET=... cargo run --bin mint_token -- <USER_ID> --json

use anyhow::{Context, Result};
use clap::Parser;
use newsletter_backend::auth::models::{AccessClaims, RefreshClaims, Role, SubscriptionStatus};
use newsletter_backend::auth::{TokenCodec, TokenKind};
use newsletter_backend::config::parse_lifetime;
use std::path::Path;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "mint_token")]
#[command(about = "Mint access and refresh tokens for local testing")]
struct Cli {
    /// User id to put in the tokens
    user_id: String,

    /// Role claim: subscriber, creator or admin
    #[arg(long, default_value = "subscriber", value_parser = parse_role)]
    role: Role,

    /// Subscription status claim: free or paid
    #[arg(long, default_value = "free", value_parser = parse_status)]
    status: SubscriptionStatus,

    /// Signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    secret: String,

    /// Access token lifetime
    #[arg(long, env = "ACCESS_TOKEN_EXPIRES_IN", default_value = "15m", value_parser = parse_lifetime)]
    access_ttl: Duration,

    /// Refresh token lifetime
    #[arg(long, env = "REFRESH_TOKEN_EXPIRES_IN", default_value = "7d", value_parser = parse_lifetime)]
    refresh_ttl: Duration,

    /// Print a JSON object instead of plain lines
    #[arg(long)]
    json: bool,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::from_str(raw).ok_or_else(|| format!("unknown role '{}'", raw))
}

fn parse_status(raw: &str) -> Result<SubscriptionStatus, String> {
    SubscriptionStatus::from_str(raw).ok_or_else(|| format!("unknown subscription status '{}'", raw))
}

fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }

    let cli = Cli::parse();
    let codec = TokenCodec::new(cli.secret);

    let access_token = codec
        .encode(
            TokenKind::Access,
            &AccessClaims {
                user_id: cli.user_id.clone(),
                role: cli.role,
                subscription_status: cli.status,
            },
            cli.access_ttl,
        )
        .context("Failed to mint access token")?;

    let refresh_token = codec
        .encode(
            TokenKind::Refresh,
            &RefreshClaims {
                user_id: cli.user_id.clone(),
            },
            cli.refresh_ttl,
        )
        .context("Failed to mint refresh token")?;

    if cli.json {
        let out = serde_json::json!({
            "accessToken": access_token,
            "refreshToken": refresh_token,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("user:          {} ({}, {})", cli.user_id, cli.role.as_str(), cli.status.as_str());
        println!("access token:  {}", access_token);
        println!("refresh token: {}", refresh_token);
    }

    Ok(())
}
