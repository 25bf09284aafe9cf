//! # Configuration
//!
//! Command line flags, each with an environment variable fallback.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;
use clap::Parser;
use unicred_oid4vci::state::Lifetimes;

/// Issuer server configuration.
#[derive(Clone, Debug, Parser)]
#[command(name = "unicred-server", version, about = "Issue university credentials over OpenID4VCI")]
pub struct Config {
    /// Public base URL of the issuer.
    #[arg(
        long,
        env = "ISSUER_URL",
        default_value = "http://localhost:8080",
        value_parser = issuer_url
    )]
    pub issuer_url: String,

    /// Address to listen on.
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// PKCS#8 PEM file holding the ES256 signing key. Created if missing.
    #[arg(long, env = "SIGNING_KEY_PATH", default_value = "data/issuer-es256.pem")]
    pub key_path: PathBuf,

    /// Issuer display name.
    #[arg(long, env = "ISSUER_NAME", default_value = "University")]
    pub issuer_name: String,

    /// Default offer lifetime in seconds.
    #[arg(long, env = "OFFER_TTL_SECS", default_value_t = 600,
        value_parser = clap::value_parser!(u32).range(1..=86_400))]
    pub offer_ttl: u32,

    /// Maximum access token lifetime in seconds.
    #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = 600,
        value_parser = clap::value_parser!(u32).range(1..))]
    pub token_ttl: u32,

    /// Credential validity in days.
    #[arg(long, env = "CREDENTIAL_TTL_DAYS", default_value_t = 365,
        value_parser = clap::value_parser!(u32).range(1..))]
    pub credential_ttl_days: u32,

    /// Seconds between sweeps of expired offers. `0` disables sweeping.
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = 0)]
    pub sweep_interval: u64,

    /// Ledger registration endpoint. Registrations are only logged when
    /// unset.
    #[arg(long, env = "LEDGER_URL")]
    pub ledger_url: Option<String>,

    /// Timeout for ledger registration requests, in seconds.
    #[arg(long, env = "LEDGER_TIMEOUT_SECS", default_value_t = 10)]
    pub ledger_timeout: u64,
}

impl Config {
    /// Lifetimes applied by the issuance flow.
    #[must_use]
    pub fn lifetimes(&self) -> Lifetimes {
        Lifetimes {
            offer: TimeDelta::seconds(self.offer_ttl.into()),
            access: TimeDelta::seconds(self.token_ttl.into()),
            credential: TimeDelta::days(self.credential_ttl_days.into()),
            ..Lifetimes::default()
        }
    }

    /// Interval between store sweeps, if enabled.
    #[must_use]
    pub const fn sweep_interval(&self) -> Option<Duration> {
        if self.sweep_interval == 0 { None } else { Some(Duration::from_secs(self.sweep_interval)) }
    }

    /// Ledger request timeout.
    #[must_use]
    pub const fn ledger_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger_timeout)
    }
}

// The issuer URL is used as a prefix for every endpoint, so it is stored
// without a trailing slash.
fn issuer_url(s: &str) -> Result<String, String> {
    let url = s.trim().trim_end_matches('/');
    let Some(host) = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://")) else {
        return Err(format!("issuer URL must start with http:// or https://, got `{s}`"));
    };
    if host.is_empty() {
        return Err("issuer URL has no host".to_string());
    }
    Ok(url.to_string())
}
