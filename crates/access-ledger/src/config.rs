//! Registry configuration.

use chrono::{FixedOffset, Offset, Utc};

/// Configuration for the [`TokenRegistry`](crate::TokenRegistry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Offset used to decide which calendar month a timestamp falls in when
    /// checking monthly replenishment.
    pub month_offset: FixedOffset,
    /// Whether a failed standard issuance refunds the issuer with a
    /// compensating write. When off, the failure is reported as a fatal
    /// inconsistency straight away.
    pub compensate_failed_issuance: bool,
}

impl RegistryConfig {
    /// Use a different offset for month boundaries.
    pub fn with_month_offset(mut self, offset: FixedOffset) -> Self {
        self.month_offset = offset;
        self
    }

    /// Enable or disable the compensating refund.
    pub fn with_compensation(mut self, enabled: bool) -> Self {
        self.compensate_failed_issuance = enabled;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            month_offset: Utc.fix(),
            compensate_failed_issuance: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_utc_with_compensation() {
        let config = RegistryConfig::default();
        assert_eq!(config.month_offset.local_minus_utc(), 0);
        assert!(config.compensate_failed_issuance);
    }

    #[test]
    fn test_builders() {
        let offset = FixedOffset::east_opt(9 * 3600).unwrap();
        let config = RegistryConfig::default()
            .with_month_offset(offset)
            .with_compensation(false);
        assert_eq!(config.month_offset, offset);
        assert!(!config.compensate_failed_issuance);
    }
}
