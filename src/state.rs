use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::crypto::token::{SECRET_SIZE, TokenCodec};
use crate::error::{AppError, Result};
use crate::ledger::AttendanceLedger;
use crate::registry::SessionRegistry;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// The token codec, holding the signing secret.
    pub codec: TokenCodec,
    /// The time source; swapped for a mock in tests.
    pub clock: Arc<dyn Clock>,
    /// The open-session registry.
    pub registry: SessionRegistry,
    /// The attendance ledger.
    pub ledger: AttendanceLedger,
}

impl AppState {
    /// Creates a new `AppState` on the system clock.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a new `AppState` on the given clock.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let secret: [u8; SECRET_SIZE] = config
            .signing_secret
            .as_slice()
            .try_into()
            .map_err(|_| AppError::Internal("Invalid signing secret size".to_string()))?;

        Ok(Self {
            config: config.clone(),
            codec: TokenCodec::new(secret),
            clock,
            registry: SessionRegistry::new(),
            ledger: AttendanceLedger::new(config.periods_per_day),
        })
    }
}
