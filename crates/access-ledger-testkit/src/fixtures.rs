//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use access_ledger::{AccessToken, RegistryConfig, Result, TokenId, TokenRegistry};
use access_ledger_core::ManualClock;
use access_ledger_store::MemoryLedger;

/// Clock reading every fixture starts at: 2023-11-14T22:13:20Z.
pub const FIXTURE_EPOCH: i64 = 1_700_000_000;

/// Registry type used by [`TestFixture`].
pub type FixtureRegistry = TokenRegistry<Arc<MemoryLedger>, Arc<ManualClock>>;

/// A registry on a memory ledger and a manual clock, with handles to both.
pub struct TestFixture {
    pub ledger: Arc<MemoryLedger>,
    pub clock: Arc<ManualClock>,
    pub registry: FixtureRegistry,
}

impl TestFixture {
    /// Create a fixture with default configuration at [`FIXTURE_EPOCH`].
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH));
        let registry = TokenRegistry::new(Arc::clone(&ledger), Arc::clone(&clock), config);
        Self {
            ledger,
            clock,
            registry,
        }
    }

    /// Issue root token `R` and transferable token `T` (owned by `dept`).
    pub async fn seed_hierarchy(&self, amount: i64, monthly_token_quota: i64) -> Result<Hierarchy> {
        let hierarchy = Hierarchy {
            root: TokenId::new("R"),
            transferable: TokenId::new("T"),
        };
        self.registry
            .issue_root(&hierarchy.root, "cert-1", "registrar")
            .await?;
        self.registry
            .issue_transferable(
                &hierarchy.transferable,
                &hierarchy.root,
                "dept",
                amount,
                monthly_token_quota,
                0,
            )
            .await?;
        Ok(hierarchy)
    }

    /// Read a token that the test expects to exist.
    pub async fn token(&self, token_id: &str) -> Result<AccessToken> {
        self.registry.get_token(&TokenId::new(token_id)).await
    }

    /// Total commits made so far.
    pub fn commits(&self) -> u64 {
        self.ledger.commit_count().unwrap_or_default()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Ids issued by [`TestFixture::seed_hierarchy`].
#[derive(Debug, Clone)]
pub struct Hierarchy {
    pub root: TokenId,
    pub transferable: TokenId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_hierarchy() {
        let fixture = TestFixture::new();
        let h = fixture.seed_hierarchy(10, 0).await.unwrap();

        let t = fixture.token(h.transferable.as_str()).await.unwrap();
        assert_eq!(t.issuer_ref, "R");
        assert_eq!(t.available_accesses, 10);
        assert_eq!(fixture.commits(), 2);
    }

    #[tokio::test]
    async fn test_clock_is_shared() {
        let fixture = TestFixture::new();
        fixture.seed_hierarchy(1, 0).await.unwrap();

        fixture.clock.advance(3600);
        let t = fixture.registry.consume(&TokenId::new("T")).await.unwrap();
        assert_eq!(t.last_used_at, FIXTURE_EPOCH + 3600);
    }
}
