use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};

// ---------------------------------------------------------------------------
// TLS
// ---------------------------------------------------------------------------

/// PEM files used to serve over TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// How long a device's last status stays visible without a refresh.
    pub cache_ttl: Duration,
    /// How often expired statuses are reclaimed in the background.
    pub sweep_interval: Duration,
    /// Serve over TLS when both `TLS_CERT_PATH` and `TLS_KEY_PATH` are set.
    pub tls: Option<TlsPaths>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            cache_ttl: parse_secs("CACHE_TTL_SECS", &optional("CACHE_TTL_SECS", "10800"))?,
            sweep_interval: parse_secs(
                "SWEEP_INTERVAL_SECS",
                &optional("SWEEP_INTERVAL_SECS", "60"),
            )?,
            tls: parse_tls(
                std::env::var("TLS_CERT_PATH").ok(),
                std::env::var("TLS_KEY_PATH").ok(),
            )?,
        })
    }
}

/// Parse a strictly positive number of seconds.
fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got: {raw:?}"))?;
    if secs == 0 {
        bail!("{key} must be a positive integer, got: 0");
    }
    Ok(Duration::from_secs(secs))
}

/// Both paths enable TLS, neither disables it; one without the other is a
/// configuration mistake.
fn parse_tls(cert: Option<String>, key: Option<String>) -> Result<Option<TlsPaths>> {
    let cert = cert.filter(|s| !s.trim().is_empty());
    let key = key.filter(|s| !s.trim().is_empty());

    match (cert, key) {
        (Some(cert), Some(key)) => Ok(Some(TlsPaths {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        })),
        (None, None) => Ok(None),
        _ => bail!("TLS_CERT_PATH and TLS_KEY_PATH must be set together"),
    }
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
