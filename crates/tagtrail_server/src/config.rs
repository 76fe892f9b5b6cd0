//! Server configuration.

use std::time::Duration;
use tagtrail_core::{MAX_DISPLAY_NAME_LEN, MIN_DISPLAY_NAME_LEN};

/// Configuration for the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Minimum display name length, in characters.
    pub display_name_min: usize,
    /// Maximum display name length, in characters.
    pub display_name_max: usize,
    /// How many times a profile write is retried after losing a race.
    pub max_write_retries: u32,
    /// Lifetime of issued identity tokens.
    pub token_expiry: Duration,
}

impl ServerConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            display_name_min: MIN_DISPLAY_NAME_LEN,
            display_name_max: MAX_DISPLAY_NAME_LEN,
            max_write_retries: 8,
            token_expiry: Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Sets the accepted display name length range.
    #[must_use]
    pub fn with_display_name_bounds(mut self, min: usize, max: usize) -> Self {
        self.display_name_min = min;
        self.display_name_max = max;
        self
    }

    /// Sets the number of write retries.
    #[must_use]
    pub fn with_max_write_retries(mut self, retries: u32) -> Self {
        self.max_write_retries = retries;
        self
    }

    /// Sets the token lifetime.
    #[must_use]
    pub fn with_token_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
