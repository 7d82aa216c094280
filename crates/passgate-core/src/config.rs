//! Session configuration.

use std::time::Duration;

use passgate_crypto::{CryptoError, DEFAULT_KDF_ROUNDS, validate_rounds};

/// How long a verified password is trusted across restarts.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum age of the last verification for which the persisted
    /// fingerprint is trusted at bootstrap without prompting
    pub freshness_window: Duration,
    /// PBKDF2 rounds used when sealing new secrets
    pub kdf_rounds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { freshness_window: DEFAULT_FRESHNESS_WINDOW, kdf_rounds: DEFAULT_KDF_ROUNDS }
    }
}

impl SessionConfig {
    /// Replace the freshness window.
    #[must_use]
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// Replace the KDF round count.
    #[must_use]
    pub fn with_kdf_rounds(mut self, rounds: u32) -> Self {
        self.kdf_rounds = rounds;
        self
    }

    /// Check the configuration against crypto bounds.
    ///
    /// # Errors
    ///
    /// `InvalidKdfRounds` if `kdf_rounds` is outside the accepted range.
    pub fn validate(self) -> Result<Self, CryptoError> {
        validate_rounds(self.kdf_rounds)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use passgate_crypto::{MAX_KDF_ROUNDS, MIN_KDF_ROUNDS};

    use super::*;

    #[test]
    fn default_is_valid() {
        let config = SessionConfig::default();
        assert_eq!(config.freshness_window, Duration::from_secs(86_400));
        assert_eq!(config.validate(), Ok(config));
    }

    #[test]
    fn builders_replace_fields() {
        let config = SessionConfig::default()
            .with_freshness_window(Duration::from_secs(60))
            .with_kdf_rounds(MIN_KDF_ROUNDS);

        assert_eq!(config.freshness_window, Duration::from_secs(60));
        assert_eq!(config.kdf_rounds, MIN_KDF_ROUNDS);
    }

    #[test]
    fn validate_rejects_out_of_range_rounds() {
        let low = SessionConfig::default().with_kdf_rounds(MIN_KDF_ROUNDS - 1);
        let high = SessionConfig::default().with_kdf_rounds(MAX_KDF_ROUNDS + 1);

        assert_eq!(low.validate(), Err(CryptoError::InvalidKdfRounds(MIN_KDF_ROUNDS - 1)));
        assert_eq!(high.validate(), Err(CryptoError::InvalidKdfRounds(MAX_KDF_ROUNDS + 1)));
    }
}
