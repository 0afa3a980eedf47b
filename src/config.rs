//! Process Configuration
//! Mission: Read every tunable once at startup and hand out immutable settings
//!
//! Environment:
//!   JWT_SECRET - HMAC secret for access and refresh tokens (required)
//!   ACCESS_TOKEN_EXPIRES_IN - Access token lifetime (default: 15m)
//!   REFRESH_TOKEN_EXPIRES_IN - Refresh token lifetime (default: 7d)
//!   DATABASE_PATH - SQLite file (default: newsletter.db)
//!   STRIPE_SECRET_KEY - Enables the Stripe billing provider when set

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "newsletter")]
#[command(about = "Subscription newsletter platform API server")]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    /// Path to the SQLite database
    #[arg(long, env = "DATABASE_PATH", default_value = "newsletter.db")]
    pub database_path: String,

    /// Secret used to sign tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Access token lifetime (e.g. 900, 30s, 15m, 24h, 7d)
    #[arg(long, env = "ACCESS_TOKEN_EXPIRES_IN", default_value = "15m", value_parser = parse_lifetime)]
    pub access_token_ttl: Duration,

    /// Refresh token lifetime
    #[arg(long, env = "REFRESH_TOKEN_EXPIRES_IN", default_value = "7d", value_parser = parse_lifetime)]
    pub refresh_token_ttl: Duration,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_COST", default_value = "10", value_parser = clap::value_parser!(u32).range(4..=31))]
    pub bcrypt_cost: u32,

    /// Allowed CORS origins (comma-separated, empty = permissive)
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Stripe secret key; billing is disabled without it
    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub stripe_secret_key: Option<String>,

    /// Stripe API base URL
    #[arg(long, env = "STRIPE_API_BASE", default_value = "https://api.stripe.com")]
    pub stripe_api_base: String,

    /// Frontend URL used for checkout redirects
    #[arg(long, env = "CLIENT_URL", default_value = "http://localhost:3000")]
    pub client_url: String,

    /// Monthly subscription price in cents
    #[arg(long, env = "SUBSCRIPTION_PRICE_CENTS", default_value = "999")]
    pub subscription_price_cents: u32,

    /// Expose POST /api/payments/mock (test mode only)
    #[arg(long, env = "ALLOW_MOCK_PAYMENTS")]
    pub allow_mock_payments: bool,

    /// Email of the admin account to create at startup
    #[arg(long, env = "ADMIN_EMAIL")]
    pub admin_email: Option<String>,

    /// Password of the bootstrap admin account
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Login/register attempts allowed per IP per minute
    #[arg(long, env = "AUTH_RATE_LIMIT_PER_MINUTE", default_value = "30")]
    pub auth_rate_limit_per_minute: u32,
}

impl Config {
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            access_token_ttl: self.access_token_ttl,
            refresh_token_ttl: self.refresh_token_ttl,
            bcrypt_cost: self.bcrypt_cost,
        }
    }

    /// Admin credentials, only when both halves are configured.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (self.admin_email.as_deref(), self.admin_password.as_deref()) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some((email.trim(), password))
            }
            _ => None,
        }
    }
}

/// Token and hashing parameters shared by the auth components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSettings {
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Parse a lifetime such as `900`, `30s`, `15m`, `24h` or `7d`.
pub fn parse_lifetime(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid lifetime '{}'", raw))?;

    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        other => return Err(format!("unknown lifetime unit '{}'", other)),
    };

    if value == 0 {
        return Err("lifetime must be greater than zero".to_string());
    }

    value
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("lifetime '{}' is too large", raw))
}
