use std::env;

use anyhow::{Context, Result};
use zeroize::{Zeroize, Zeroizing};

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The secret used to sign session tokens.
    pub signing_secret: Zeroizing<Vec<u8>>,
    /// Lifetime of an issued token in seconds.
    pub token_ttl_seconds: u64,
    /// Maximum attendance records per subject per calendar day.
    pub periods_per_day: u32,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// Startup fails when the signing secret is unset, malformed, or
    /// trivially weak; running with a defaulted secret is never an option.
    pub fn from_env() -> Result<Self> {
        let mut secret_hex = env::var("ATTENDANCE_SIGNING_SECRET")
            .context("ATTENDANCE_SIGNING_SECRET must be set (generate with: openssl rand -hex 32)")?;

        let secret_bytes = hex::decode(&secret_hex)
            .context("ATTENDANCE_SIGNING_SECRET must be valid hexadecimal")?;

        secret_hex.zeroize();

        if secret_bytes.len() != 32 {
            anyhow::bail!("ATTENDANCE_SIGNING_SECRET must be exactly 32 bytes (64 hex characters)");
        }
        if secret_bytes.iter().all(|&b| b == secret_bytes[0]) {
            anyhow::bail!("ATTENDANCE_SIGNING_SECRET must not be a repeated single byte");
        }

        let token_ttl_seconds: u64 = env::var("TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("Invalid TOKEN_TTL_SECONDS")?;
        if token_ttl_seconds == 0 {
            anyhow::bail!("TOKEN_TTL_SECONDS must be at least 1");
        }

        let periods_per_day: u32 = env::var("PERIODS_PER_DAY")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .context("Invalid PERIODS_PER_DAY")?;
        if periods_per_day == 0 {
            anyhow::bail!("PERIODS_PER_DAY must be at least 1");
        }

        Ok(Self {
            signing_secret: Zeroizing::new(secret_bytes),
            token_ttl_seconds,
            periods_per_day,
        })
    }
}

#[cfg(test)]
impl Config {
    /// A fixed configuration for tests; never read from the environment.
    pub fn for_tests() -> Self {
        Self {
            signing_secret: Zeroizing::new((0u8..32).collect()),
            token_ttl_seconds: 10,
            periods_per_day: 7,
        }
    }
}
