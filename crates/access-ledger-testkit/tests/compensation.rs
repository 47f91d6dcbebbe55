//! Failure of the second write in a standard issuance.

use std::sync::Arc;

use access_ledger::{ErrorKind, RegistryConfig, RegistryError, TokenId, TokenRegistry};
use access_ledger_core::ManualClock;
use access_ledger_store::{Ledger, MemoryLedger, SqliteLedger};
use access_ledger_testkit::scenarios::NEXT_MONTH;
use access_ledger_testkit::{FlakyLedger, FIXTURE_EPOCH};

type Registry<L> = TokenRegistry<FlakyLedger<L>, Arc<ManualClock>>;

async fn seeded<L: Ledger>(inner: L, config: RegistryConfig) -> anyhow::Result<Registry<L>> {
    let registry = TokenRegistry::new(
        FlakyLedger::new(inner),
        Arc::new(ManualClock::new(FIXTURE_EPOCH)),
        config,
    );
    registry
        .issue_root(&TokenId::new("R"), "cert-1", "registrar")
        .await?;
    registry
        .issue_transferable(&TokenId::new("T"), &TokenId::new("R"), "dept", 10, 0, 0)
        .await?;
    Ok(registry)
}

async fn issue_s1<L: Ledger>(registry: &Registry<L>) -> access_ledger::Result<()> {
    registry
        .issue_standard(&TokenId::new("S1"), &TokenId::new("T"), "student", 3, 2, 0)
        .await
        .map(|_| ())
}

#[tokio::test]
async fn test_failed_token_write_refunds_issuer() -> anyhow::Result<()> {
    let registry = seeded(MemoryLedger::new(), RegistryConfig::default()).await?;
    let before = registry.get_token(&TokenId::new("T")).await?;

    registry.ledger().plan().fail_puts_to("S1", 1);
    let err = issue_s1(&registry).await.unwrap_err();
    assert!(matches!(err, RegistryError::Storage(_)));
    assert_eq!(err.kind(), ErrorKind::StorageFailure);

    let after = registry.get_token(&TokenId::new("T")).await?;
    assert_eq!(after, before);
    assert_eq!(
        registry.get_token(&TokenId::new("S1")).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );

    // issue, debit, refund
    let history = registry.token_history(&TokenId::new("T")).await?;
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].value.as_ref().map(|t| t.available_accesses), Some(4));
    assert_eq!(history[2].value.as_ref(), Some(&before));

    issue_s1(&registry).await?;
    assert_eq!(
        registry.get_token(&TokenId::new("T")).await?.available_accesses,
        4
    );
    Ok(())
}

#[tokio::test]
async fn test_failed_refund_is_fatal() -> anyhow::Result<()> {
    let registry = seeded(MemoryLedger::new(), RegistryConfig::default()).await?;
    let plan = registry.ledger().plan();
    plan.fail_puts_to("S1", 1);
    plan.fail_puts_to_after("T", 1, 1);

    let err = issue_s1(&registry).await.unwrap_err();
    match &err {
        RegistryError::FatalInconsistency {
            issuer_token_id,
            token_id,
            amount_before,
            accesses_before,
            primary,
            compensation,
        } => {
            assert_eq!(issuer_token_id.as_str(), "T");
            assert_eq!(token_id.as_str(), "S1");
            assert_eq!((*amount_before, *accesses_before), (10, 10));
            assert!(primary.contains("S1"));
            assert!(compensation.contains("T"));
        }
        other => panic!("expected fatal inconsistency, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::FatalInconsistency);
    assert_eq!(plan.injected_failures(), 2);

    // The issuer stays debited until reconciled by hand.
    let t = registry.get_token(&TokenId::new("T")).await?;
    assert_eq!(t.available_accesses, 4);
    Ok(())
}

#[tokio::test]
async fn test_disabled_compensation_reports_fatal() -> anyhow::Result<()> {
    let config = RegistryConfig::default().with_compensation(false);
    let registry = seeded(MemoryLedger::new(), config).await?;
    registry.ledger().plan().fail_puts_to("S1", 1);

    let attempted_before = registry.ledger().plan().attempted_puts();
    let err = issue_s1(&registry).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::FatalInconsistency { ref compensation, .. } if compensation == "compensation disabled"
    ));
    // debit and token write only
    assert_eq!(registry.ledger().plan().attempted_puts() - attempted_before, 2);
    Ok(())
}

#[tokio::test]
async fn test_failed_debit_needs_no_refund() -> anyhow::Result<()> {
    let registry = seeded(MemoryLedger::new(), RegistryConfig::default()).await?;
    registry.ledger().plan().fail_puts_to("T", 1);

    let attempted_before = registry.ledger().plan().attempted_puts();
    let err = issue_s1(&registry).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageFailure);
    assert_eq!(registry.ledger().plan().attempted_puts() - attempted_before, 1);

    assert_eq!(
        registry.get_token(&TokenId::new("T")).await?.available_accesses,
        10
    );
    assert_eq!(registry.token_history(&TokenId::new("T")).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_root_issuer_has_nothing_to_refund() -> anyhow::Result<()> {
    let registry = seeded(MemoryLedger::new(), RegistryConfig::default()).await?;
    registry.ledger().plan().fail_puts_to("S1", 1);

    let err = registry
        .issue_standard(&TokenId::new("S1"), &TokenId::new("R"), "student", 1, 1, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Storage(_)));
    assert_eq!(registry.token_history(&TokenId::new("R")).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_refund_on_sqlite() -> anyhow::Result<()> {
    let registry = seeded(SqliteLedger::open_memory()?, RegistryConfig::default()).await?;
    registry.ledger().plan().fail_puts_to("S1", 1);

    assert!(issue_s1(&registry).await.is_err());
    let t = registry.get_token(&TokenId::new("T")).await?;
    assert_eq!((t.available_accesses, t.amount, t.last_used_at), (10, 10, 0));
    Ok(())
}

/// T (monthly quota 6) spent 2 of 10 last month; S2 is issued next month.
async fn monthly_issuer(
    refund_fails: bool,
) -> anyhow::Result<(Registry<MemoryLedger>, RegistryError)> {
    let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH));
    let registry = TokenRegistry::new(
        FlakyLedger::new(MemoryLedger::new()),
        clock.clone(),
        RegistryConfig::default(),
    );
    let (r, t) = (TokenId::new("R"), TokenId::new("T"));
    registry.issue_root(&r, "cert-1", "registrar").await?;
    registry.issue_transferable(&t, &r, "dept", 10, 6, 0).await?;
    registry
        .issue_standard(&TokenId::new("S1"), &t, "student", 2, 1, 0)
        .await?;

    clock.set(NEXT_MONTH + 60);
    let plan = registry.ledger().plan();
    plan.fail_puts_to("S2", 1);
    if refund_fails {
        plan.fail_puts_to_after("T", 1, 1);
    }
    let err = registry
        .issue_standard(&TokenId::new("S2"), &t, "student", 3, 1, 0)
        .await
        .unwrap_err();
    Ok((registry, err))
}

#[tokio::test]
async fn test_refund_keeps_monthly_replenishment() -> anyhow::Result<()> {
    let (registry, err) = monthly_issuer(false).await?;
    assert_eq!(err.kind(), ErrorKind::StorageFailure);

    let t = registry.get_token(&TokenId::new("T")).await?;
    assert_eq!(
        (t.available_accesses, t.amount, t.last_used_at),
        (6, 6, NEXT_MONTH + 60)
    );
    Ok(())
}

#[tokio::test]
async fn test_fatal_refund_reports_replenished_balance() -> anyhow::Result<()> {
    let (registry, err) = monthly_issuer(true).await?;
    assert!(matches!(
        err,
        RegistryError::FatalInconsistency {
            amount_before: 6,
            accesses_before: 6,
            ..
        }
    ));

    let t = registry.get_token(&TokenId::new("T")).await?;
    assert_eq!(t.available_accesses, 3);
    Ok(())
}
