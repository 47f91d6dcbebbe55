//! End-to-end token lifecycles against the SQLite ledger.

use std::sync::Arc;

use access_ledger::core::ManualClock;
use access_ledger::store::SqliteLedger;
use access_ledger::{ErrorKind, RegistryConfig, RegistryError, TokenId, TokenRegistry, TokenStatus};
use chrono::FixedOffset;

/// 2023-11-14T22:13:20Z
const NOV_14: i64 = 1_700_000_000;
/// 2023-12-01T00:00:00Z
const DEC_1: i64 = 1_701_388_800;

type Registry = TokenRegistry<SqliteLedger, Arc<ManualClock>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn registry_at(now: i64, config: RegistryConfig) -> (Registry, Arc<ManualClock>) {
    init_tracing();
    let clock = Arc::new(ManualClock::new(now));
    let registry = TokenRegistry::new(SqliteLedger::open_memory().unwrap(), clock.clone(), config);
    (registry, clock)
}

fn id(s: &str) -> TokenId {
    TokenId::new(s)
}

#[tokio::test]
async fn test_issue_spend_and_revoke() -> anyhow::Result<()> {
    let (reg, _) = registry_at(NOV_14, RegistryConfig::default());

    reg.issue_root(&id("R"), "cert-1", "registrar").await?;
    reg.issue_transferable(&id("T"), &id("R"), "dept", 10, 0, 0).await?;
    reg.issue_standard(&id("S1"), &id("T"), "student", 3, 2, 0).await?;

    let t = reg.get_token(&id("T")).await?;
    assert_eq!((t.available_accesses, t.amount), (4, 4));
    let s1 = reg.get_token(&id("S1")).await?;
    assert_eq!((s1.available_accesses, s1.amount), (6, 3));

    for _ in 0..6 {
        reg.consume(&id("S1")).await?;
    }
    let s1 = reg.get_token(&id("S1")).await?;
    assert_eq!((s1.available_accesses, s1.amount), (0, 0));
    assert_eq!(reg.token_status(&id("S1")).await?, TokenStatus::Spent);

    let err = reg.consume(&id("S1")).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidState {
            status: TokenStatus::Spent,
            ..
        }
    ));
    assert_eq!(reg.revoke(&id("S1")).await.unwrap_err().kind(), ErrorKind::InvalidState);

    reg.revoke(&id("T")).await?;
    assert_eq!(reg.token_status(&id("T")).await?, TokenStatus::Revoked);
    let err = reg
        .issue_standard(&id("S2"), &id("T"), "student", 1, 1, 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    Ok(())
}

#[tokio::test]
async fn test_monthly_quota_replenishes_before_consumption() -> anyhow::Result<()> {
    let (reg, clock) = registry_at(NOV_14, RegistryConfig::default());
    reg.issue_root(&id("R"), "cert-1", "registrar").await?;
    reg.issue_transferable(&id("T"), &id("R"), "dept", 5, 5, 0).await?;

    reg.consume(&id("T")).await?;
    reg.consume(&id("T")).await?;
    assert_eq!(reg.get_token(&id("T")).await?.available_accesses, 3);

    clock.set(DEC_1 + 3600);
    let t = reg.consume(&id("T")).await?;
    assert_eq!(t.available_accesses, 4);
    assert_eq!(t.amount, 4);
    assert_eq!(t.last_used_at, DEC_1 + 3600);

    Ok(())
}

#[tokio::test]
async fn test_exhausted_monthly_token_waits_for_next_month() -> anyhow::Result<()> {
    let (reg, clock) = registry_at(NOV_14, RegistryConfig::default());
    reg.issue_root(&id("R"), "cert-1", "registrar").await?;
    reg.issue_transferable(&id("T"), &id("R"), "dept", 2, 2, 0).await?;

    reg.consume(&id("T")).await?;
    reg.consume(&id("T")).await?;
    assert_eq!(reg.token_status(&id("T")).await?, TokenStatus::Valid);

    let err = reg.consume(&id("T")).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InsufficientBalance {
            available: 0,
            required: 1,
            ..
        }
    ));
    assert_eq!(reg.get_token(&id("T")).await?.available_accesses, 0);

    clock.set(DEC_1 + 60);
    assert_eq!(reg.consume(&id("T")).await?.available_accesses, 1);
    Ok(())
}

#[tokio::test]
async fn test_issuer_balance_is_checked_before_replenishment() -> anyhow::Result<()> {
    let (reg, clock) = registry_at(NOV_14, RegistryConfig::default());
    reg.issue_root(&id("R"), "cert-1", "registrar").await?;
    reg.issue_transferable(&id("T"), &id("R"), "dept", 2, 5, 0).await?;
    reg.consume(&id("T")).await?;
    reg.consume(&id("T")).await?;
    let drained = reg.get_token(&id("T")).await?;
    assert_eq!((drained.available_accesses, drained.amount), (0, 0));

    // A new month does not rescue a dry issuer.
    clock.set(DEC_1 + 60);
    let err = reg
        .issue_standard(&id("S1"), &id("T"), "a", 1, 3, 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InsufficientBalance {
            available: 0,
            required: 3,
            ..
        }
    ));
    assert_eq!(reg.get_token(&id("T")).await?, drained);
    assert_eq!(reg.token_history(&id("T")).await?.len(), 3);

    // Consuming in the new month replenishes, then issuing works.
    assert_eq!(reg.consume(&id("T")).await?.available_accesses, 4);
    reg.issue_standard(&id("S1"), &id("T"), "a", 1, 3, 0).await?;
    assert_eq!(reg.get_token(&id("T")).await?.available_accesses, 1);
    Ok(())
}

#[tokio::test]
async fn test_issuer_is_replenished_before_the_debit() -> anyhow::Result<()> {
    let (reg, clock) = registry_at(NOV_14, RegistryConfig::default());
    reg.issue_root(&id("R"), "cert-1", "registrar").await?;
    reg.issue_transferable(&id("T"), &id("R"), "dept", 5, 3, 0).await?;
    reg.issue_transferable(&id("U"), &id("R"), "lab", 5, 2, 0).await?;
    reg.issue_standard(&id("S1"), &id("T"), "a", 1, 1, 0).await?;
    reg.issue_standard(&id("S2"), &id("U"), "a", 1, 1, 0).await?;

    clock.set(DEC_1 + 60);

    // 4 stored covers 3; the month resets T to 3, which is then debited.
    reg.issue_standard(&id("S3"), &id("T"), "b", 3, 1, 0).await?;
    let t = reg.get_token(&id("T")).await?;
    assert_eq!((t.available_accesses, t.amount, t.last_used_at), (0, 0, DEC_1 + 60));

    // 4 stored covers 3, but the reset leaves only 2.
    let before = reg.get_token(&id("U")).await?;
    let err = reg
        .issue_standard(&id("S4"), &id("U"), "b", 3, 1, 0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InsufficientBalance {
            available: 2,
            required: 3,
            ..
        }
    ));
    assert_eq!(reg.get_token(&id("U")).await?, before);
    Ok(())
}

#[tokio::test]
async fn test_month_boundary_follows_configured_offset() -> anyhow::Result<()> {
    // Last used at 23:30Z on Nov 30, consumed at 00:30Z on Dec 1.
    let last_used = DEC_1 - 1800;
    let now = DEC_1 + 1800;

    for (offset_hours, expect_reset) in [(0, true), (-2, false)] {
        let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        let config = RegistryConfig::default().with_month_offset(offset);
        let (reg, clock) = registry_at(last_used, config);

        reg.issue_root(&id("R"), "cert-1", "registrar").await?;
        reg.issue_transferable(&id("T"), &id("R"), "dept", 5, 5, 0).await?;
        reg.consume(&id("T")).await?;

        clock.set(now);
        let t = reg.consume(&id("T")).await?;
        let expected = if expect_reset { 4 } else { 3 };
        assert_eq!(t.available_accesses, expected, "offset {offset_hours}h");
    }
    Ok(())
}

#[tokio::test]
async fn test_expiry_is_checked_at_issue_and_use() -> anyhow::Result<()> {
    let (reg, clock) = registry_at(NOV_14, RegistryConfig::default());
    reg.issue_root(&id("R"), "cert-1", "registrar").await?;

    let err = reg
        .issue_transferable(&id("T"), &id("R"), "dept", 5, 0, NOV_14 - 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    reg.issue_transferable(&id("T"), &id("R"), "dept", 5, 0, NOV_14)
        .await?;
    assert_eq!(reg.token_status(&id("T")).await?, TokenStatus::Valid);

    clock.advance(1);
    assert_eq!(reg.token_status(&id("T")).await?, TokenStatus::Expired);
    let err = reg
        .issue_standard(&id("S"), &id("T"), "a", 1, 1, 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    Ok(())
}

#[tokio::test]
async fn test_registry_survives_reopen() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tokens.db");
    let clock = Arc::new(ManualClock::new(NOV_14));

    {
        let reg = TokenRegistry::new(SqliteLedger::open(&path)?, clock.clone(), RegistryConfig::default());
        reg.issue_root(&id("R"), "cert-1", "registrar").await?;
        reg.issue_transferable(&id("T"), &id("R"), "dept", 3, 0, 0).await?;
        reg.consume(&id("T")).await?;
    }

    let reg = TokenRegistry::new(SqliteLedger::open(&path)?, clock, RegistryConfig::default());
    assert_eq!(reg.get_token(&id("T")).await?.available_accesses, 2);
    assert_eq!(reg.token_history(&id("T")).await?.len(), 2);
    Ok(())
}
